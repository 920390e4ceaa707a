//! Sixbit name packing.
//!
//! Node and attribute names on the binary wire are bit-packed against a
//! 64-symbol alphabet `0-9 A-Z _ a-z .`, six bits per character, MSB first.
//! A name record is one length byte (character count) followed by the
//! packed bits, zero-padded to a byte boundary.

use crate::MAX_NAME_LEN;
use crate::error::DocumentError;

/// The 64-symbol alphabet, in symbol-index order.
pub(crate) const ALPHABET: &[u8; 64] =
    b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ_abcdefghijklmnopqrstuvwxyz.";

/// True when `byte` is a member of the alphabet.
pub(crate) fn in_alphabet(byte: u8) -> bool {
    symbol_index(byte).is_some()
}

fn symbol_index(byte: u8) -> Option<u8> {
    match byte {
        b'0'..=b'9' => Some(byte - b'0'),
        b'A'..=b'Z' => Some(byte - b'A' + 10),
        b'_' => Some(36),
        b'a'..=b'z' => Some(byte - b'a' + 37),
        b'.' => Some(63),
        _ => None,
    }
}

/// Append a packed name record to `out`.
///
/// The caller validated the name through the node API, so every character
/// is a member of the alphabet; unknown characters would have been rejected
/// at tree construction.
pub(crate) fn pack(name: &str, out: &mut Vec<u8>) {
    out.push(name.len() as u8);
    let mut acc: u32 = 0;
    let mut bits = 0u32;
    for &byte in name.as_bytes() {
        let sym = symbol_index(byte).unwrap_or(0) as u32;
        acc = (acc << 6) | sym;
        bits += 6;
        while bits >= 8 {
            bits -= 8;
            out.push((acc >> bits) as u8);
        }
    }
    if bits > 0 {
        out.push((acc << (8 - bits)) as u8);
    }
}

/// Read a packed name record from `data` at `pos`, returning the name and
/// the number of bytes consumed.
pub(crate) fn unpack(data: &[u8], pos: usize) -> Result<(String, usize), DocumentError> {
    let Some(&count) = data.get(pos) else {
        return Err(DocumentError::UnexpectedEof { offset: pos });
    };
    let count = count as usize;
    if count == 0 || count > MAX_NAME_LEN {
        return Err(DocumentError::BadName { offset: pos, count });
    }
    let packed_len = (count * 6).div_ceil(8);
    let Some(packed) = data.get(pos + 1..pos + 1 + packed_len) else {
        return Err(DocumentError::UnexpectedEof {
            offset: data.len(),
        });
    };

    let mut name = String::with_capacity(count);
    let mut acc: u32 = 0;
    let mut bits = 0u32;
    let mut bytes = packed.iter();
    for _ in 0..count {
        while bits < 6 {
            acc = (acc << 8) | u32::from(*bytes.next().unwrap_or(&0));
            bits += 8;
        }
        bits -= 6;
        let sym = ((acc >> bits) & 0x3F) as usize;
        name.push(ALPHABET[sym] as char);
    }
    Ok((name, 1 + packed_len))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn roundtrip(name: &str) {
        let mut buf = Vec::new();
        pack(name, &mut buf);
        let (out, used) = unpack(&buf, 0).unwrap();
        assert_eq!(out, name);
        assert_eq!(used, buf.len());
    }

    #[test]
    fn test_pack_roundtrip() {
        roundtrip("a");
        roundtrip("pc");
        roundtrip("call");
        roundtrip("player.name_2");
        roundtrip("ABC_xyz.09");
        roundtrip(&"z".repeat(64));
    }

    #[test]
    fn test_packed_width() {
        // 4 chars = 24 bits = exactly 3 packed bytes + 1 length byte.
        let mut buf = Vec::new();
        pack("call", &mut buf);
        assert_eq!(buf.len(), 4);
        assert_eq!(buf[0], 4);
    }

    #[test]
    fn test_dot_and_underscore_survive() {
        roundtrip("a._b");
    }

    #[test]
    fn test_unpack_truncated() {
        let mut buf = Vec::new();
        pack("prolonged_name", &mut buf);
        buf.truncate(buf.len() - 1);
        assert!(matches!(
            unpack(&buf, 0),
            Err(DocumentError::UnexpectedEof { .. })
        ));
    }
}
