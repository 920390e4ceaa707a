//! String charsets.
//!
//! Documents declare their charset through an encoding id: `0xA0..=0xA3`
//! for binary documents, `0xE0..=0xE3` for textual ones, same meaning.
//! Decoders select the charset by the id - never by sniffing the payload.
//! The older games ship Shift-JIS firmware, so that id is the family
//! default; everything after roughly 2019 negotiates UTF-8.

use encoding_rs::{EUC_JP, SHIFT_JIS, UTF_8};

use crate::error::DocumentError;

/// String charset of a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Charset {
    /// Shift-JIS with ASCII fallback (id `0xA0` / `0xE0`)
    ShiftJis,
    /// EUC-JP (id `0xA1` / `0xE1`)
    EucJp,
    /// UTF-8 (id `0xA2` / `0xE2`)
    Utf8,
    /// Plain ASCII only (id `0xA3` / `0xE3`)
    Ascii,
}

impl Charset {
    const ORDER: [Charset; 4] = [
        Charset::ShiftJis,
        Charset::EucJp,
        Charset::Utf8,
        Charset::Ascii,
    ];

    /// Encoding id used in the binary codec header and the envelope.
    pub fn binary_id(self) -> u8 {
        0xA0 + self.index()
    }

    /// Encoding id used for textual payloads in the envelope.
    pub fn text_id(self) -> u8 {
        0xE0 + self.index()
    }

    fn index(self) -> u8 {
        Self::ORDER.iter().position(|c| *c == self).unwrap_or(0) as u8
    }

    pub fn from_binary_id(id: u8) -> Result<Charset, DocumentError> {
        match id {
            0xA0..=0xA3 => Ok(Self::ORDER[(id - 0xA0) as usize]),
            _ => Err(DocumentError::UnknownEncoding { id }),
        }
    }

    pub fn from_text_id(id: u8) -> Result<Charset, DocumentError> {
        match id {
            0xE0..=0xE3 => Ok(Self::ORDER[(id - 0xE0) as usize]),
            _ => Err(DocumentError::UnknownEncoding { id }),
        }
    }

    /// Either kind of encoding id.
    pub fn from_wire_id(id: u8) -> Result<Charset, DocumentError> {
        match id {
            0xA0..=0xA3 => Self::from_binary_id(id),
            _ => Self::from_text_id(id),
        }
    }

    /// Name used in the textual codec's `<?xml encoding="…"?>` declaration.
    pub fn xml_name(self) -> &'static str {
        match self {
            Charset::ShiftJis => "Shift_JIS",
            Charset::EucJp => "EUC-JP",
            Charset::Utf8 => "UTF-8",
            Charset::Ascii => "ASCII",
        }
    }

    pub fn from_xml_name(name: &str) -> Option<Charset> {
        Self::ORDER
            .into_iter()
            .find(|c| c.xml_name().eq_ignore_ascii_case(name))
    }

    /// Encode a string, `None` when a character has no representation.
    pub fn encode(self, s: &str) -> Option<Vec<u8>> {
        match self {
            Charset::Utf8 => Some(s.as_bytes().to_vec()),
            Charset::Ascii => s.is_ascii().then(|| s.as_bytes().to_vec()),
            Charset::ShiftJis => {
                let (bytes, _, had_errors) = SHIFT_JIS.encode(s);
                (!had_errors).then(|| bytes.into_owned())
            }
            Charset::EucJp => {
                let (bytes, _, had_errors) = EUC_JP.encode(s);
                (!had_errors).then(|| bytes.into_owned())
            }
        }
    }

    /// Decode bytes, `None` on any malformed sequence.
    pub fn decode(self, bytes: &[u8]) -> Option<String> {
        match self {
            Charset::Utf8 => UTF_8
                .decode_without_bom_handling_and_without_replacement(bytes)
                .map(|s| s.into_owned()),
            Charset::Ascii => bytes
                .is_ascii()
                .then(|| String::from_utf8_lossy(bytes).into_owned()),
            Charset::ShiftJis => SHIFT_JIS
                .decode_without_bom_handling_and_without_replacement(bytes)
                .map(|s| s.into_owned()),
            Charset::EucJp => EUC_JP
                .decode_without_bom_handling_and_without_replacement(bytes)
                .map(|s| s.into_owned()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_id_roundtrip() {
        for charset in Charset::ORDER {
            assert_eq!(
                Charset::from_binary_id(charset.binary_id()).unwrap(),
                charset
            );
            assert_eq!(Charset::from_text_id(charset.text_id()).unwrap(), charset);
        }
    }

    #[test]
    fn test_unknown_id_rejected() {
        assert!(Charset::from_binary_id(0xA4).is_err());
        assert!(Charset::from_text_id(0x42).is_err());
    }

    #[test]
    fn test_shift_jis_roundtrip() {
        let text = "プレイヤー";
        let bytes = Charset::ShiftJis.encode(text).unwrap();
        assert_ne!(bytes, text.as_bytes());
        assert_eq!(Charset::ShiftJis.decode(&bytes).unwrap(), text);
    }

    #[test]
    fn test_ascii_rejects_non_ascii() {
        assert!(Charset::Ascii.encode("café").is_none());
        assert!(Charset::Ascii.decode(&[0x80]).is_none());
    }

    #[test]
    fn test_xml_name_roundtrip() {
        assert_eq!(Charset::from_xml_name("shift_jis"), Some(Charset::ShiftJis));
        assert_eq!(Charset::from_xml_name("UTF-8"), Some(Charset::Utf8));
        assert_eq!(Charset::from_xml_name("koi8-r"), None);
    }
}
