//! Compress / decompress commands for raw LZ77 streams.
//!
//! `--framed` selects the variant with the 8-byte length prefix used by
//! `avslz` container payloads; the bare variant is what the request
//! envelope carries.

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;

/// Arguments for the compress command
#[derive(Args)]
pub struct CompressArgs {
    /// Input file
    pub input: PathBuf,

    /// Output path for the compressed stream
    pub output: PathBuf,

    /// Prepend the 8-byte length frame used by container payloads
    #[arg(long)]
    pub framed: bool,
}

/// Arguments for the decompress command
#[derive(Args)]
pub struct DecompressArgs {
    /// Compressed input file
    pub input: PathBuf,

    /// Output path for the recovered bytes
    pub output: PathBuf,

    /// Input carries the 8-byte length frame
    #[arg(long)]
    pub framed: bool,
}

/// Execute the compress command
pub fn compress(args: CompressArgs) -> Result<()> {
    let data = fs::read(&args.input)
        .with_context(|| format!("Failed to read {}", args.input.display()))?;

    let out = if args.framed {
        cab_lz77::compress_framed(&data)
    } else {
        cab_lz77::compress(&data)
    };
    fs::write(&args.output, &out)
        .with_context(|| format!("Failed to write {}", args.output.display()))?;

    println!(
        "Compressed {} -> {} bytes ({:.1}%)",
        data.len(),
        out.len(),
        out.len() as f64 / data.len().max(1) as f64 * 100.0
    );
    Ok(())
}

/// Execute the decompress command
pub fn decompress(args: DecompressArgs) -> Result<()> {
    let data = fs::read(&args.input)
        .with_context(|| format!("Failed to read {}", args.input.display()))?;

    let out = if args.framed {
        cab_lz77::decompress_framed(&data).context("Failed to decompress framed stream")?
    } else {
        cab_lz77::decompress(&data).context("Failed to decompress stream")?
    };
    fs::write(&args.output, &out)
        .with_context(|| format!("Failed to write {}", args.output.display()))?;

    println!("Decompressed {} -> {} bytes", data.len(), out.len());
    Ok(())
}
