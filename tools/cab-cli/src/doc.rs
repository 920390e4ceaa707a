//! Doc command - convert documents between binary and textual form.
//!
//! The input codec is detected from the first byte (binary documents open
//! with the `0xA0` signature). The output defaults to the opposite form,
//! keeping the input's charset unless `--charset` overrides it.

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use cab_protocol::{BINARY_MAGIC, Charset, binary, text};
use clap::{Args, ValueEnum};

/// Arguments for the doc command
#[derive(Args)]
pub struct DocArgs {
    /// Input document (binary or XML)
    pub input: PathBuf,

    /// Output path
    pub output: PathBuf,

    /// Output form; defaults to the opposite of the input
    #[arg(long, value_enum)]
    pub to: Option<Form>,

    /// String charset for the output; defaults to the input's
    #[arg(long)]
    pub charset: Option<String>,
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Form {
    Bin,
    Xml,
}

/// Execute the doc command
pub fn execute(args: DocArgs) -> Result<()> {
    let data = fs::read(&args.input)
        .with_context(|| format!("Failed to read {}", args.input.display()))?;

    let input_is_binary = data.first() == Some(&BINARY_MAGIC);
    let (root, input_charset) = if input_is_binary {
        binary::decode(&data).context("Failed to decode binary document")?
    } else {
        text::decode(&data).context("Failed to decode textual document")?
    };

    let form = args.to.unwrap_or(if input_is_binary {
        Form::Xml
    } else {
        Form::Bin
    });
    let charset = match &args.charset {
        Some(name) => parse_charset(name)?,
        None => input_charset,
    };

    let out = match form {
        Form::Bin => binary::encode(&root, charset).context("Failed to encode binary document")?,
        Form::Xml => text::encode(&root, charset).context("Failed to encode textual document")?,
    };
    fs::write(&args.output, &out)
        .with_context(|| format!("Failed to write {}", args.output.display()))?;

    println!(
        "Wrote {} ({} bytes, {})",
        args.output.display(),
        out.len(),
        charset.xml_name()
    );
    Ok(())
}

fn parse_charset(name: &str) -> Result<Charset> {
    let normalized = name.replace('-', "_");
    match Charset::from_xml_name(&normalized).or_else(|| Charset::from_xml_name(name)) {
        Some(charset) => Ok(charset),
        None => bail!("Unknown charset {name:?} (try shift_jis, euc-jp, utf-8, ascii)"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_charset_spellings() {
        assert_eq!(parse_charset("shift-jis").unwrap(), Charset::ShiftJis);
        assert_eq!(parse_charset("UTF-8").unwrap(), Charset::Utf8);
        assert!(parse_charset("latin1").is_err());
    }
}
