//! Fixed-size container header.

use crate::{IfsError, IFS_MAGIC};

/// Header length for version 1 containers (no manifest digest).
const HEADER_V1_SIZE: usize = 20;
/// Header length for version 2 and later (16-byte MD5 appended).
const HEADER_V2_SIZE: usize = 36;

/// Parsed container header.
#[derive(Debug, Clone)]
pub(crate) struct IfsHeader {
    pub version: u16,
    /// Unix timestamp recorded by the packer.
    pub pack_time: u32,
    /// Plaintext size of the manifest document in bytes.
    pub manifest_size: u32,
    /// Absolute offset of the first body byte; the manifest document
    /// occupies `header_len..manifest_end`.
    pub manifest_end: usize,
    /// MD5 digest of the manifest, absent from version 1 containers.
    pub digest: Option<[u8; 16]>,
    /// Total header length in bytes.
    pub header_len: usize,
}

impl IfsHeader {
    /// Parses and validates the header at the front of `data`.
    ///
    /// # Errors
    ///
    /// Returns [`IfsError::MalformedContainer`] on a bad magic number,
    /// a failed version checksum, or a manifest range that does not fit
    /// inside `data`.
    pub fn parse(data: &[u8]) -> Result<IfsHeader, IfsError> {
        if data.len() < HEADER_V1_SIZE {
            return Err(IfsError::malformed(data.len(), "truncated header"));
        }

        let magic = u32::from_be_bytes([data[0], data[1], data[2], data[3]]);
        if magic != IFS_MAGIC {
            return Err(IfsError::malformed(0, format!("bad magic {magic:#010X}")));
        }

        let version = u16::from_be_bytes([data[4], data[5]]);
        let check = u16::from_be_bytes([data[6], data[7]]);
        if version ^ check != 0xFFFF {
            return Err(IfsError::malformed(
                4,
                format!("version checksum failed ({version:#06X} vs {check:#06X})"),
            ));
        }

        let pack_time = u32::from_be_bytes([data[8], data[9], data[10], data[11]]);
        let manifest_size = u32::from_be_bytes([data[12], data[13], data[14], data[15]]);
        let manifest_end = u32::from_be_bytes([data[16], data[17], data[18], data[19]]) as usize;

        let (header_len, digest) = if version == 1 {
            (HEADER_V1_SIZE, None)
        } else {
            if data.len() < HEADER_V2_SIZE {
                return Err(IfsError::malformed(data.len(), "truncated header digest"));
            }
            let mut digest = [0u8; 16];
            digest.copy_from_slice(&data[20..36]);
            (HEADER_V2_SIZE, Some(digest))
        };

        if manifest_end < header_len || manifest_end > data.len() {
            return Err(IfsError::malformed(
                16,
                format!("manifest end {manifest_end} outside container"),
            ));
        }

        Ok(IfsHeader {
            version,
            pack_time,
            manifest_size,
            manifest_end,
            digest,
            header_len,
        })
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn minimal(version: u16) -> Vec<u8> {
        let header_len: u32 = if version == 1 { 20 } else { 36 };
        let mut data = Vec::new();
        data.extend_from_slice(&IFS_MAGIC.to_be_bytes());
        data.extend_from_slice(&version.to_be_bytes());
        data.extend_from_slice(&(version ^ 0xFFFF).to_be_bytes());
        data.extend_from_slice(&0x1234_5678u32.to_be_bytes()); // pack_time
        data.extend_from_slice(&0u32.to_be_bytes()); // manifest_size
        data.extend_from_slice(&header_len.to_be_bytes()); // manifest_end
        if version >= 2 {
            data.extend_from_slice(&[0xAB; 16]);
        }
        data
    }

    #[test]
    fn test_parse_v1() {
        let header = IfsHeader::parse(&minimal(1)).unwrap();
        assert_eq!(header.version, 1);
        assert_eq!(header.header_len, 20);
        assert_eq!(header.pack_time, 0x1234_5678);
        assert!(header.digest.is_none());
    }

    #[test]
    fn test_parse_v2_digest() {
        let header = IfsHeader::parse(&minimal(3)).unwrap();
        assert_eq!(header.header_len, 36);
        assert_eq!(header.digest, Some([0xAB; 16]));
    }

    #[test]
    fn test_bad_magic() {
        let mut data = minimal(1);
        data[0] = 0x00;
        assert!(matches!(
            IfsHeader::parse(&data),
            Err(IfsError::MalformedContainer { offset: 0, .. })
        ));
    }

    #[test]
    fn test_bad_version_check() {
        let mut data = minimal(1);
        data[6] ^= 0x01;
        assert!(matches!(
            IfsHeader::parse(&data),
            Err(IfsError::MalformedContainer { offset: 4, .. })
        ));
    }

    #[test]
    fn test_manifest_end_outside_container() {
        let mut data = minimal(1);
        data[16..20].copy_from_slice(&0xFFFFu32.to_be_bytes());
        assert!(IfsHeader::parse(&data).is_err());
    }
}
