//! List / extract commands for `.ifs` asset containers.

use std::fs;
use std::path::{Component, Path, PathBuf};

use anyhow::{Context, Result, bail};
use cab_ifs::IfsContainer;
use clap::Args;
use tracing::warn;

/// Arguments for the list command
#[derive(Args)]
pub struct ListArgs {
    /// Container file (.ifs)
    pub container: PathBuf,
}

/// Arguments for the extract command
#[derive(Args)]
pub struct ExtractArgs {
    /// Container file (.ifs)
    pub container: PathBuf,

    /// Output directory (created if missing)
    pub output: PathBuf,

    /// Decode texture entries to PNG instead of raw atlas bytes
    #[arg(long)]
    pub textures: bool,
}

/// Execute the list command
pub fn list(args: ListArgs) -> Result<()> {
    let container = open(&args.container)?;
    println!(
        "{} (v{}, packed {})",
        args.container.display(),
        container.version(),
        container.pack_time()
    );
    for path in container.paths() {
        match container.texture_info(path) {
            Some(info) => println!("  {path}  [{} {}x{}]", info.format, info.width(), info.height()),
            None => println!("  {path}"),
        }
    }
    Ok(())
}

/// Execute the extract command
pub fn extract(args: ExtractArgs) -> Result<()> {
    let container = open(&args.container)?;
    let mut count = 0usize;

    for path in container.paths() {
        let dest = sanitize(&args.output, path)?;
        if let Some(parent) = dest.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }

        let decode = args.textures && container.texture_info(path).is_some();
        let bytes = if decode {
            match container.read_texture(path) {
                Ok(png) => png,
                Err(err) => {
                    // Broken geometry falls back to the raw payload.
                    warn!(path, %err, "texture decode failed, writing raw bytes");
                    container.read_file(path)?
                }
            }
        } else {
            container.read_file(path)?
        };

        fs::write(&dest, &bytes)
            .with_context(|| format!("Failed to write {}", dest.display()))?;
        count += 1;
    }

    println!("Extracted {count} files to {}", args.output.display());
    Ok(())
}

fn open(path: &Path) -> Result<IfsContainer> {
    let data = fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
    IfsContainer::parse(data).with_context(|| format!("Failed to parse {}", path.display()))
}

/// Joins a container path onto the output directory, rejecting traversal.
fn sanitize(root: &Path, path: &str) -> Result<PathBuf> {
    let relative = Path::new(path);
    for component in relative.components() {
        match component {
            Component::Normal(_) => {}
            _ => bail!("Refusing container path {path:?}"),
        }
    }
    Ok(root.join(relative))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_rejects_traversal() {
        let root = Path::new("/tmp/out");
        assert!(sanitize(root, "a/b/c").is_ok());
        assert!(sanitize(root, "../escape").is_err());
        assert!(sanitize(root, "/abs/path").is_err());
    }
}
