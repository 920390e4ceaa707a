//! Binary document codec.
//!
//! A binary document is four regions back to back:
//!
//! ```text
//! header (8 bytes):  A0 | encoding id | !id | !id | node-stream len (u32 BE)
//! node stream:       depth-first preorder, sixbit names, aligned payloads
//! pool length:       u32 BE
//! data pool:         strings (NUL-terminated), binaries and array bodies,
//!                    each entry aligned to 4 bytes
//! ```
//!
//! Per node: one tag byte (`| 0x40` when attributed), the packed name, the
//! payload, then attribute records (`0x2E`, packed name, u32 pool offset),
//! then children, then `0xFE`. A final `0xFF` ends the stream. Fixed-size
//! scalars sit inline in the stream at their element alignment; strings,
//! binaries and arrays live in the pool and the stream carries 4-aligned
//! `(length, offset)` references (offset only, for NUL-terminated strings).
//!
//! The encoder de-duplicates identical pooled strings; the decoder never
//! relies on that. A single trailing byte after the pool is tolerated -
//! some firmware revisions leave the envelope's compression flag glued to
//! the document when re-hashing responses.

mod read;
mod write;

#[cfg(test)]
mod tests;

pub use read::decode;
pub use write::encode;
