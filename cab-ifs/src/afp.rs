//! AFP-list pass.
//!
//! Animation assets are stored like textures: the payloads sit under MD5
//! hashes of their names. An `afplist.xml` in the same directory declares
//! the real names. Each entry owns up to three payload families:
//!
//! * the animation itself, surfaced as `<name>.afp`,
//! * a binary seek index under the `bsi/` subdirectory,
//! * referenced shapes `<name>_shape<id>` in a `geo/` directory parallel
//!   to the animation directory.

use cab_protocol::{Charset, Node};

use crate::texture::{hashed_name, join};

/// One rename produced by the AFP-list pass.
pub(crate) struct AfpRename {
    pub hashed: String,
    pub logical: String,
}

/// Walks a parsed `afplist.xml` document for the directory `dir`.
pub(crate) fn afp_renames(doc: &Node, dir: &str, charset: Charset) -> Vec<AfpRename> {
    let parent = match dir.rsplit_once('/') {
        Some((parent, _)) => parent,
        None => "",
    };
    let geo_dir = join(parent, "geo");
    let bsi_dir = join(dir, "bsi");

    let mut renames = Vec::new();
    for part in doc.children() {
        let Some(name) = part.attribute("name") else {
            continue;
        };
        let hash = hashed_name(name, charset);
        renames.push(AfpRename {
            hashed: join(dir, &hash),
            logical: join(dir, &format!("{name}.afp")),
        });
        renames.push(AfpRename {
            hashed: join(&bsi_dir, &hash),
            logical: join(&bsi_dir, name),
        });
        if let Some(ids) = part.child("geo").and_then(|g| g.value()?.as_integers()) {
            for id in ids {
                let shape = format!("{name}_shape{id}");
                renames.push(AfpRename {
                    hashed: join(&geo_dir, &hashed_name(&shape, charset)),
                    logical: join(&geo_dir, &shape),
                });
            }
        }
    }
    renames
}

// ============================================================================
// Tests
// ============================================================================
