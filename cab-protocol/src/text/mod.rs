//! Textual document codec.
//!
//! The XML-shaped wire form: one tag per node, the node type in a `__type`
//! attribute, array lengths in `__count`, `<name/>` for void nodes. This is
//! deliberately not a general XML implementation - the dialect has no
//! DOCTYPE, no namespaces, no CDATA, no processing instructions beyond the
//! leading `<?xml?>` declaration, and only the five named entities.
//!
//! The writer emits compact markup (no indentation), so `str` payloads
//! round-trip byte-exact; the reader trims whitespace around every
//! non-string payload, which also makes it accept pretty-printed vendor
//! documents.

mod read;
mod write;

#[cfg(test)]
mod tests;

pub use read::decode;
pub use write::encode;

/// Reserved attribute carrying the node type.
pub(crate) const TYPE_ATTR: &str = "__type";

/// Reserved attribute carrying the element count of arrays.
pub(crate) const COUNT_ATTR: &str = "__count";
