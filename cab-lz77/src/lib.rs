//! Cab-LZ77: the sliding-window compression used on the cabinet wire.
//!
//! Game cabinets compress request/response documents and embedded asset
//! payloads with a byte-oriented LZ77 variant. **This is a pure codec** - the
//! envelope layer decides whether a payload is compressed at all, and the
//! asset-container layer supplies the framed variant's length header.
//!
//! # Stream format
//!
//! ```text
//! Repeating groups:
//!   control (u8)        one flag bit per token, consumed LSB first
//!   8 tokens            bit set   -> literal: 1 byte copied to output
//!                       bit clear -> reference: 2 bytes
//!
//! Reference (2 bytes b0 b1):
//!   window offset = (b0 << 4) | (b1 >> 4)   absolute position in the window
//!   copy length   = (b1 & 0x0F) + 3
//!   offset == 0 && length field == 0        end-of-stream sentinel
//! ```
//!
//! The window is 4096 bytes, zero-filled at start; every output byte is
//! echoed into it at a wrapping write pointer. A reference may overlap the
//! write pointer, which replicates recent output (run-length style).
//!
//! # Framed variant
//!
//! Embedded asset payloads carry an 8-byte big-endian prefix
//! `(uncompressed_len, compressed_len)` where `compressed_len` excludes the
//! prefix itself. Documents on the HTTP wire do not - their length travels
//! in the envelope.
//!
//! # Usage
//!
//! ```
//! use cab_lz77::{compress, decompress};
//!
//! let data = b"the quick brown fox jumps over the lazy dog";
//! let packed = compress(data);
//! assert_eq!(decompress(&packed).unwrap(), data);
//! ```

mod decode;
mod encode;

pub use decode::{decompress, decompress_framed, decompress_sized};
pub use encode::{compress, compress_framed};

use thiserror::Error;

// =============================================================================
// Constants
// =============================================================================

/// Sliding-window size in bytes
pub const WINDOW_SIZE: usize = 4096;

/// Shortest encodable back-reference
pub const MIN_MATCH: usize = 3;

/// Longest encodable back-reference (4-bit length field + 3)
pub const MAX_MATCH: usize = 18;

/// Size of the `(uncompressed_len, compressed_len)` frame prefix
pub const FRAME_HEADER_SIZE: usize = 8;

// =============================================================================
// Errors
// =============================================================================

/// LZ77 decode error types
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Lz77Error {
    /// Stream ended before the end-of-stream sentinel
    #[error("compressed stream truncated at offset {offset}")]
    Truncated { offset: usize },

    /// Back-reference into window space nothing has been written to yet
    #[error(
        "back-reference at offset {offset} points at window position {window_offset} \
         before the stream start"
    )]
    UnwrittenReference { offset: usize, window_offset: usize },

    /// Output grew past the caller-declared plaintext length
    #[error("decompressed output exceeds declared length {declared}")]
    OutputOverrun { declared: usize },

    /// Framed payload shorter than the 8-byte length prefix
    #[error("framed payload of {len} bytes is too short for the length prefix")]
    FrameTooShort { len: usize },

    /// Frame body length disagrees with the compressed_len field
    #[error("frame declares {declared} compressed bytes but carries {actual}")]
    FrameLengthMismatch { declared: usize, actual: usize },

    /// Recovered plaintext shorter than the uncompressed_len field
    #[error("frame declares {declared} plain bytes but inflates to {actual}")]
    PlainLengthMismatch { declared: usize, actual: usize },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_roundtrip_ascending_bytes() {
        // 0x00..=0xFF has no 3-byte repeats, so every token is a literal:
        // 256 literals + 32 control bytes + sentinel group fits in 300 bytes.
        let data: Vec<u8> = (0u8..=255).collect();
        let packed = compress(&data);
        assert!(packed.len() <= 300, "packed {} bytes", packed.len());
        assert_eq!(decompress(&packed).unwrap(), data);
        // Sentinel reference is the last token: offset 0, length field 0.
        assert_eq!(&packed[packed.len() - 2..], &[0x00, 0x00]);
    }

    #[test]
    fn test_roundtrip_repetitive() {
        let data = b"abcabcabcabcabcabcabcabcabc".repeat(40);
        let packed = compress(&data);
        assert!(packed.len() < data.len());
        assert_eq!(decompress(&packed).unwrap(), data);
    }

    #[test]
    fn test_roundtrip_empty() {
        let packed = compress(&[]);
        assert_eq!(decompress(&packed).unwrap(), Vec::<u8>::new());
    }

    #[test]
    fn test_roundtrip_larger_than_window() {
        // Force the window pointer to wrap several times.
        let mut data = Vec::new();
        for i in 0u32..6000 {
            data.push((i % 251) as u8);
            data.push((i / 7) as u8);
        }
        let packed = compress(&data);
        assert_eq!(decompress(&packed).unwrap(), data);
    }

    #[test]
    fn test_framed_roundtrip() {
        let data = b"framed payload framed payload framed payload";
        let framed = compress_framed(data);
        let plain_len = u32::from_be_bytes([framed[0], framed[1], framed[2], framed[3]]);
        let packed_len = u32::from_be_bytes([framed[4], framed[5], framed[6], framed[7]]);
        assert_eq!(plain_len as usize, data.len());
        assert_eq!(packed_len as usize + FRAME_HEADER_SIZE, framed.len());
        assert_eq!(decompress_framed(&framed).unwrap(), data);
    }
}
