//! LZ77 decoder implementation
//!
//! The decoder mirrors the cabinet firmware: a 4096-byte zero-filled window,
//! control bits consumed LSB first, and a hard stop at the
//! `(offset 0, length 0)` sentinel. Anything past the sentinel is ignored.

use crate::{FRAME_HEADER_SIZE, Lz77Error, WINDOW_SIZE};

/// Decompress an LZ77 stream to its exact plaintext.
///
/// # Errors
/// Returns `Lz77Error` if the stream ends before the sentinel or a
/// back-reference points at window space nothing has been written to.
pub fn decompress(data: &[u8]) -> Result<Vec<u8>, Lz77Error> {
    inflate(data, None)
}

/// Decompress with a caller-declared plaintext length.
///
/// Identical to [`decompress`] except that output growing past `declared`
/// is an error rather than silently accepted. Used by the asset container,
/// where the manifest states every payload's plain size up front.
pub fn decompress_sized(data: &[u8], declared: usize) -> Result<Vec<u8>, Lz77Error> {
    inflate(data, Some(declared))
}

/// Decompress a framed payload: 8-byte `(uncompressed_len, compressed_len)`
/// big-endian prefix followed by the stream.
///
/// # Errors
/// Fails if the body length disagrees with `compressed_len`, or the stream
/// does not inflate to exactly `uncompressed_len` bytes.
pub fn decompress_framed(data: &[u8]) -> Result<Vec<u8>, Lz77Error> {
    if data.len() < FRAME_HEADER_SIZE {
        return Err(Lz77Error::FrameTooShort { len: data.len() });
    }
    let plain_len = u32::from_be_bytes([data[0], data[1], data[2], data[3]]) as usize;
    let packed_len = u32::from_be_bytes([data[4], data[5], data[6], data[7]]) as usize;
    if data.len() != packed_len + FRAME_HEADER_SIZE {
        return Err(Lz77Error::FrameLengthMismatch {
            declared: packed_len,
            actual: data.len() - FRAME_HEADER_SIZE,
        });
    }

    let plain = decompress_sized(&data[FRAME_HEADER_SIZE..], plain_len)?;
    if plain.len() != plain_len {
        return Err(Lz77Error::PlainLengthMismatch {
            declared: plain_len,
            actual: plain.len(),
        });
    }
    Ok(plain)
}

fn inflate(data: &[u8], declared: Option<usize>) -> Result<Vec<u8>, Lz77Error> {
    let mut window = [0u8; WINDOW_SIZE];
    let mut window_pos = 0usize;
    let mut wrapped = false;

    let mut out = Vec::with_capacity(declared.unwrap_or(data.len().saturating_mul(2)));
    let mut idx = 0usize;

    loop {
        let Some(&control) = data.get(idx) else {
            return Err(Lz77Error::Truncated { offset: idx });
        };
        idx += 1;

        for bit in 0..8 {
            if control & (1 << bit) != 0 {
                // Literal byte
                let Some(&byte) = data.get(idx) else {
                    return Err(Lz77Error::Truncated { offset: idx });
                };
                idx += 1;

                if let Some(limit) = declared
                    && out.len() >= limit
                {
                    return Err(Lz77Error::OutputOverrun { declared: limit });
                }
                out.push(byte);
                window[window_pos] = byte;
                window_pos = advance(window_pos, &mut wrapped);
            } else {
                // Back-reference or sentinel
                if idx + 2 > data.len() {
                    return Err(Lz77Error::Truncated { offset: idx });
                }
                let b0 = data[idx] as usize;
                let b1 = data[idx + 1] as usize;
                let token_offset = idx;
                idx += 2;

                let offset = (b0 << 4) | (b1 >> 4);
                let raw_len = b1 & 0x0F;
                if offset == 0 && raw_len == 0 {
                    return Ok(out);
                }
                if !wrapped && offset >= window_pos {
                    return Err(Lz77Error::UnwrittenReference {
                        offset: token_offset,
                        window_offset: offset,
                    });
                }

                let mut src = offset;
                for _ in 0..raw_len + 3 {
                    let byte = window[src];
                    src = (src + 1) % WINDOW_SIZE;

                    if let Some(limit) = declared
                        && out.len() >= limit
                    {
                        return Err(Lz77Error::OutputOverrun { declared: limit });
                    }
                    out.push(byte);
                    window[window_pos] = byte;
                    window_pos = advance(window_pos, &mut wrapped);
                }
            }
        }
    }
}

#[inline]
fn advance(window_pos: usize, wrapped: &mut bool) -> usize {
    if window_pos + 1 == WINDOW_SIZE {
        *wrapped = true;
        0
    } else {
        window_pos + 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Hand-assembled stream: literals "ab", reference to them, sentinel.
    #[test]
    fn test_decode_hand_assembled() {
        // control 0b0000_0011: two literals, then references.
        // Reference: offset 0, length field 1 -> copy 4 bytes from window[0].
        let stream = [
            0b0000_0011,
            b'a',
            b'b',
            0x00,
            0x01, // offset 0, len 4: "abab"
            0x00,
            0x00, // sentinel
        ];
        assert_eq!(decompress(&stream).unwrap(), b"ababab");
    }

    #[test]
    fn test_decode_truncated_control() {
        assert_eq!(
            decompress(&[]),
            Err(Lz77Error::Truncated { offset: 0 })
        );
    }

    #[test]
    fn test_decode_truncated_reference() {
        // Control promises a reference but only one byte follows.
        assert_eq!(
            decompress(&[0b0000_0000, 0x01]),
            Err(Lz77Error::Truncated { offset: 1 })
        );
    }

    #[test]
    fn test_decode_missing_sentinel() {
        // One literal then the stream just stops.
        let err = decompress(&[0b0000_0001, b'x']).unwrap_err();
        assert!(matches!(err, Lz77Error::Truncated { .. }));
    }

    #[test]
    fn test_decode_unwritten_reference() {
        // First token references window position 5 with nothing written.
        let err = decompress(&[0b0000_0000, 0x00, 0x51, 0x00, 0x00]).unwrap_err();
        assert_eq!(
            err,
            Lz77Error::UnwrittenReference {
                offset: 1,
                window_offset: 5
            }
        );
    }

    #[test]
    fn test_decode_sized_overrun() {
        let stream = [0b0000_0011, b'a', b'b', 0x00, 0x00];
        assert_eq!(
            decompress_sized(&stream, 1),
            Err(Lz77Error::OutputOverrun { declared: 1 })
        );
        assert_eq!(decompress_sized(&stream, 2).unwrap(), b"ab");
    }

    #[test]
    fn test_decode_ignores_trailing_garbage() {
        let stream = [0b0000_0001, b'x', 0x00, 0x00, 0xDE, 0xAD];
        assert_eq!(decompress(&stream).unwrap(), b"x");
    }

    #[test]
    fn test_framed_length_mismatch() {
        let mut framed = crate::compress_framed(b"hello hello hello");
        framed.push(0);
        assert!(matches!(
            decompress_framed(&framed),
            Err(Lz77Error::FrameLengthMismatch { .. })
        ));
    }
}
