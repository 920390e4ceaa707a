//! Protocol error types
//!
//! Two layers: [`NodeError`] for tree-construction and accessor contract
//! violations, [`DocumentError`] for wire-level parse and encode failures.
//! Every wire-level variant carries the byte offset it was detected at.

use thiserror::Error;

/// Document tree contract violations
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NodeError {
    /// Name outside the sixbit alphabet, too long, or empty
    #[error("invalid name {name:?}")]
    InvalidName { name: String },

    /// Typed accessor used against a node of a different type
    #[error("node holds {actual}, accessor expects {expected}")]
    TypeMismatch {
        expected: &'static str,
        actual: &'static str,
    },

    /// Integer value outside the node type's representable range
    #[error("value {value} out of range for {ty}")]
    OutOfRange { ty: &'static str, value: i128 },
}

/// Binary/textual codec failures
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DocumentError {
    /// First byte is not the binary magic
    #[error("bad magic byte 0x{found:02X} at offset {offset}")]
    BadMagic { offset: usize, found: u8 },

    /// Encoding id and its complement pair disagree
    #[error("encoding parity mismatch: id 0x{id:02X}, parity byte 0x{parity:02X}")]
    BadParity { id: u8, parity: u8 },

    /// Encoding id outside the reserved ranges
    #[error("unknown encoding id 0x{id:02X}")]
    UnknownEncoding { id: u8 },

    /// Type tag byte not in the closed type set
    #[error("unknown type tag 0x{tag:02X} at offset {offset}")]
    UnknownTypeTag { offset: usize, tag: u8 },

    /// Input ended inside a header, name, payload or pool
    #[error("document truncated at offset {offset}")]
    UnexpectedEof { offset: usize },

    /// Pool reference reaches outside the data pool
    #[error("pool reference {offset}+{len} outside pool of {pool_len} bytes")]
    PoolOverrun {
        offset: usize,
        len: usize,
        pool_len: usize,
    },

    /// Array byte length is not a multiple of the element size
    #[error("array of {len} bytes at offset {offset} is not a whole number of {elem}-byte elements")]
    BadArrayLength {
        offset: usize,
        len: usize,
        elem: usize,
    },

    /// More than the tolerated single residue byte follows the data pool
    #[error("unexpected trailing bytes starting at offset {offset}")]
    Trailing { offset: usize },

    /// Packed name record with an impossible length
    #[error("packed name length {count} at offset {offset} outside 1..=64")]
    BadName { offset: usize, count: usize },

    /// Pooled string is not valid in the document charset
    #[error("string at pool offset {offset} is not valid in the document charset")]
    BadString { offset: usize },

    /// A string in the tree cannot be represented in the chosen charset
    #[error("string {text:?} is not encodable as {charset}")]
    Unencodable { charset: &'static str, text: String },

    /// Structural violation in the binary node stream
    #[error("malformed node stream at offset {offset}: {reason}")]
    Stream { offset: usize, reason: &'static str },

    /// Textual document scan failure
    #[error("malformed xml at offset {offset}: {reason}")]
    Xml { offset: usize, reason: String },

    /// Tree-level violation surfaced while decoding (bad value, bad range)
    #[error(transparent)]
    Node(#[from] NodeError),
}

impl DocumentError {
    /// Shorthand for textual-codec scan errors.
    pub(crate) fn xml(offset: usize, reason: impl Into<String>) -> Self {
        DocumentError::Xml {
            offset,
            reason: reason.into(),
        }
    }
}
