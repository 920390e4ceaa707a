//! Manifest walk: turns the `<imgfs>` document into a path -> entry map.
//!
//! File names inside the manifest are escaped so they pack into element
//! names: a leading `_` guards a digit-initial segment, `_E` stands for
//! `.`, and `__` for `_`. Each leaf carries an `s32_array` of
//! `(offset, length, timestamp)`; a `compress="avslz"` attribute marks
//! the payload as compressed and is inherited by descendants.

use cab_protocol::{Node, Value};
use hashbrown::HashMap;
use tracing::debug;

/// One file in the container body.
#[derive(Debug, Clone, Copy)]
pub(crate) struct FileEntry {
    /// Offset relative to the start of the body.
    pub offset: usize,
    pub length: usize,
    /// Per-file pack timestamp, unix seconds.
    pub timestamp: u32,
    /// Payload is a framed LZ77 stream.
    pub compressed: bool,
}

/// Reverses the packer's segment escaping.
pub(crate) fn unescape_segment(segment: &str) -> String {
    // Leading underscore guards a digit-initial name.
    let trimmed = match segment.strip_prefix('_') {
        Some(rest) if rest.starts_with(|c: char| c.is_ascii_digit()) => rest,
        _ => segment,
    };
    // `_E` before `__` so the doubled form is not consumed twice.
    trimmed.replace("_E", ".").replace("__", "_")
}

/// Walks `root` (the `<imgfs>` element) and collects every file leaf.
pub(crate) fn collect_files(root: &Node) -> HashMap<String, FileEntry> {
    let mut files = HashMap::new();
    for child in root.children() {
        // The `_info_` element carries packer metadata, not files.
        if child.name() == "_info_" {
            continue;
        }
        walk(child, "", false, &mut files);
    }
    files
}

fn walk(node: &Node, prefix: &str, inherited_avslz: bool, files: &mut HashMap<String, FileEntry>) {
    let segment = unescape_segment(node.name());
    let path = if prefix.is_empty() {
        segment
    } else {
        format!("{prefix}/{segment}")
    };

    let compressed = match node.attribute("compress") {
        Some(value) => value == "avslz",
        None => inherited_avslz,
    };

    if let Some(Value::S32Array(triple)) = node.value() {
        if node.children().is_empty() && triple.len() == 3 {
            // A damaged or hostile manifest can carry negative extents;
            // such a triple is not a usable file entry.
            let (Ok(offset), Ok(length)) =
                (usize::try_from(triple[0]), usize::try_from(triple[1]))
            else {
                debug!(%path, offset = triple[0], length = triple[1], "negative file extent, skipped");
                return;
            };
            let entry = FileEntry {
                offset,
                length,
                timestamp: triple[2] as u32,
                compressed,
            };
            debug!(%path, offset = entry.offset, length = entry.length, "manifest file");
            files.insert(path, entry);
            return;
        }
    }

    for child in node.children() {
        walk(child, &path, compressed, files);
    }
}

// ============================================================================
// Tests
// ============================================================================
