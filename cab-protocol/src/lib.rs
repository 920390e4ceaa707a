//! Cab-Protocol: the cabinet document model and its two wire codecs.
//!
//! Every request and response a cabinet exchanges with the network is a tree
//! of typed, attributed [`Node`]s. The same tree travels in one of two wire
//! shapes, chosen per request:
//!
//! - **Binary** ([`binary`]): magic `0xA0`, sixbit-packed names, big-endian
//!   scalars, and a shared data pool for strings, binaries and arrays.
//! - **Textual** ([`text`]): XML-shaped, one tag per node, the node type
//!   carried in a `__type` attribute.
//!
//! Both codecs obey the round-trip law `decode(encode(t)) == t` for every
//! tree constructible through the [`Node`] API. The codecs are pure
//! functions over byte slices; compression and HTTP framing live in the
//! service layer.
//!
//! # Example
//!
//! ```
//! use cab_protocol::{Charset, Node, binary};
//!
//! let mut call = Node::void("call").unwrap();
//! call.set_attribute("model", "M39:J:B:A:2021042600").unwrap();
//! let bytes = binary::encode(&call, Charset::Utf8).unwrap();
//! let (decoded, charset) = binary::decode(&bytes).unwrap();
//! assert_eq!(decoded, call);
//! assert_eq!(charset, Charset::Utf8);
//! ```

pub mod binary;
mod encoding;
mod error;
mod node;
mod sixbit;
pub mod text;
mod types;

pub use encoding::Charset;
pub use error::{DocumentError, NodeError};
pub use node::{Node, Value};
pub use types::{NodeType, TypeInfo};

// =============================================================================
// Wire constants shared by both codecs
// =============================================================================

/// First byte of every binary-encoded document
pub const BINARY_MAGIC: u8 = 0xA0;

/// Longest permitted node or attribute name, in characters
pub const MAX_NAME_LEN: usize = 64;
