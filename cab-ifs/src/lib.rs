//! # cab-ifs
//!
//! Decoder for the `.ifs` asset container shipped to arcade cabinets.
//!
//! A container is a header, a manifest document, and a body of raw file
//! payloads. The manifest is an ordinary protocol document (binary or
//! textual codec) rooted at `<imgfs>`; its leaves carry `(offset, length,
//! timestamp)` triples pointing into the body. On top of the raw listing
//! this crate applies the secondary naming passes the packer performed:
//! escaped path segments are unescaped, and files referenced by
//! `texturelist.xml` / `afplist.xml` under their MD5 hashes are surfaced
//! under their human-readable names.
//!
//! ## Container layout
//!
//! ```text
//! +-------------------+
//! | u32 magic         |  0x6CAD8F89, big-endian
//! | u16 version       |
//! | u16 check         |  version ^ check == 0xFFFF
//! | u32 pack_time     |  unix seconds
//! | u32 manifest_size |  plaintext size of the manifest document
//! | u32 manifest_end  |  absolute offset of the first body byte
//! | [u8; 16] md5      |  version >= 2 only, digest of the manifest
//! +-------------------+
//! | manifest document |  header end .. manifest_end
//! +-------------------+
//! | file payloads     |  offsets in the manifest are body-relative
//! +-------------------+
//! ```

mod afp;
mod container;
mod header;
mod manifest;
mod texture;

pub use container::IfsContainer;
pub use texture::TextureInfo;

use cab_lz77::Lz77Error;
use cab_protocol::DocumentError;

/// Magic number at offset 0 of every container, big-endian.
pub const IFS_MAGIC: u32 = 0x6CAD_8F89;

// ============================================================================
// Error Types
// ============================================================================

/// Errors produced while parsing or reading a container.
#[derive(Debug, thiserror::Error)]
pub enum IfsError {
    /// Structural damage in the container header or body.
    #[error("malformed container at offset {offset}: {reason}")]
    MalformedContainer { offset: usize, reason: String },

    /// The manifest parsed but its root element is not `<imgfs>`.
    #[error("manifest root is <{name}>, expected <imgfs>")]
    UnknownManifestRoot { name: String },

    /// Lookup of a path the container does not contain.
    #[error("no such file in container: {path}")]
    NoSuchFile { path: String },

    /// A manifest entry points past the end of the container body.
    #[error("payload for {path} extends past the container end")]
    PayloadOutOfBounds { path: String },

    /// A texture payload could not be decoded to an image.
    #[error("texture {path}: {reason}")]
    Texture { path: String, reason: String },

    /// The manifest or an embedded document failed to parse.
    #[error(transparent)]
    Document(#[from] DocumentError),

    /// A compressed payload failed to inflate.
    #[error(transparent)]
    Stream(#[from] Lz77Error),
}

impl IfsError {
    pub(crate) fn malformed(offset: usize, reason: impl Into<String>) -> Self {
        IfsError::MalformedContainer {
            offset,
            reason: reason.into(),
        }
    }
}
