//! Cabnet CLI - inspection tool for cabinet protocol data
//!
//! # Commands
//!
//! - `cabnet doc` - Convert a document between binary and textual form
//! - `cabnet compress` / `cabnet decompress` - Raw LZ77 streams
//! - `cabnet list` - Enumerate the files inside an `.ifs` container
//! - `cabnet extract` - Unpack an `.ifs` container to a directory
//!
//! # Usage
//!
//! ```bash
//! # Dump a captured binary request as XML
//! cabnet doc request.bin request.xml
//!
//! # Re-encode it for the wire, Shift-JIS strings
//! cabnet doc request.xml request.bin --to bin --charset shift-jis
//!
//! # Unpack an asset container, decoding textures to PNG
//! cabnet extract sounds.ifs out/ --textures
//! ```

mod doc;
mod ifs;
mod lz;

use anyhow::Result;
use clap::{Parser, Subcommand};

/// Cabnet CLI - inspection tool for cabinet protocol data
#[derive(Parser)]
#[command(name = "cabnet")]
#[command(about = "Inspect cabinet protocol documents and IFS containers")]
#[command(version)]
struct Cli {
    /// Enable debug logging (overridden by RUST_LOG)
    #[arg(long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert a document between binary and textual form
    Doc(doc::DocArgs),

    /// Compress a file with the sliding-window LZ77 scheme
    Compress(lz::CompressArgs),

    /// Decompress an LZ77 stream
    Decompress(lz::DecompressArgs),

    /// Enumerate the files inside an .ifs container
    List(ifs::ListArgs),

    /// Unpack an .ifs container to a directory
    Extract(ifs::ExtractArgs),
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let fallback = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(fallback)),
        )
        .init();

    match cli.command {
        Commands::Doc(args) => doc::execute(args),
        Commands::Compress(args) => lz::compress(args),
        Commands::Decompress(args) => lz::decompress(args),
        Commands::List(args) => ifs::list(args),
        Commands::Extract(args) => ifs::extract(args),
    }
}
