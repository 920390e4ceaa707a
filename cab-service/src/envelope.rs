//! Envelope framing.
//!
//! The outer HTTP body wrapping every document:
//!
//! ```text
//! offset 0: compression flag (0 = plain, 1 = lz77)
//! offset 1: encoding id (0xA0..=0xA3 binary, 0xE0..=0xE3 textual)
//! offset 2: payload length (u16 BE)
//! offset 4: payload
//! ```
//!
//! A compressed payload is a bare LZ77 stream - no 8-byte length frame,
//! the inflater stops at the stream sentinel. After inflation the first
//! payload byte selects the codec: the binary magic `0xA0` means binary,
//! anything else is textual.

use cab_protocol::{BINARY_MAGIC, Charset, Node, binary, text};

use crate::error::ServiceError;

/// Fixed envelope header size
pub const HEADER_SIZE: usize = 4;

/// Payloads this size and up get compressed by [`encode_auto`]
const AUTO_COMPRESS_THRESHOLD: usize = 1024;

/// A decoded request or response envelope.
#[derive(Debug)]
pub struct Envelope {
    pub document: Node,
    pub charset: Charset,
    /// Wire payload was LZ77-compressed
    pub compressed: bool,
    /// Wire payload was the textual codec
    pub textual: bool,
}

/// Unwrap an HTTP body into its document.
pub fn decode(data: &[u8]) -> Result<Envelope, ServiceError> {
    if data.len() < HEADER_SIZE {
        return Err(ServiceError::envelope(data.len(), "body shorter than header"));
    }
    let compressed = match data[0] {
        0 => false,
        1 => true,
        flag => {
            return Err(ServiceError::envelope(
                0,
                format!("unknown compression flag 0x{flag:02X}"),
            ));
        }
    };
    // The id is validated here; the document's own declaration is
    // authoritative for string decoding.
    Charset::from_wire_id(data[1])?;

    let declared = u16::from_be_bytes([data[2], data[3]]) as usize;
    let payload = &data[HEADER_SIZE..];
    if payload.len() != declared {
        return Err(ServiceError::envelope(
            2,
            format!("declared {declared} payload bytes, got {}", payload.len()),
        ));
    }

    let plain;
    let payload = if compressed {
        plain = cab_lz77::decompress(payload)?;
        plain.as_slice()
    } else {
        payload
    };

    let textual = payload.first() != Some(&BINARY_MAGIC);
    let (document, charset) = if textual {
        text::decode(payload)?
    } else {
        binary::decode(payload)?
    };
    Ok(Envelope {
        document,
        charset,
        compressed,
        textual,
    })
}

/// Wrap a document into an HTTP body with explicit codec and compression
/// choices.
pub fn encode(
    document: &Node,
    charset: Charset,
    textual: bool,
    compress: bool,
) -> Result<Vec<u8>, ServiceError> {
    let payload = if textual {
        text::encode(document, charset)?
    } else {
        binary::encode(document, charset)?
    };
    let payload = if compress {
        cab_lz77::compress(&payload)
    } else {
        payload
    };
    if payload.len() > u16::MAX as usize {
        return Err(ServiceError::envelope(
            2,
            format!("payload of {} bytes exceeds the length field", payload.len()),
        ));
    }

    let mut out = Vec::with_capacity(HEADER_SIZE + payload.len());
    out.push(u8::from(compress));
    out.push(if textual {
        charset.text_id()
    } else {
        charset.binary_id()
    });
    out.extend_from_slice(&(payload.len() as u16).to_be_bytes());
    out.extend_from_slice(&payload);
    Ok(out)
}

/// Wrap a document, compressing when the payload is large enough for it to
/// plausibly pay off.
pub fn encode_auto(
    document: &Node,
    charset: Charset,
    textual: bool,
) -> Result<Vec<u8>, ServiceError> {
    let plain = encode(document, charset, textual, false)?;
    if plain.len() - HEADER_SIZE < AUTO_COMPRESS_THRESHOLD {
        return Ok(plain);
    }
    let packed = encode(document, charset, textual, true)?;
    Ok(if packed.len() < plain.len() { packed } else { plain })
}
