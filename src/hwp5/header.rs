//! FileHeader parsing for HWP 5.0 documents.

use crate::error::{Error, Result};
use std::path::Path;

/// HWP 5.0 file header signature.
const HWP_SIGNATURE: &str = "HWP Document File";

/// Signature field length (null-padded).
const SIGNATURE_LEN: usize = 32;

/// Offset of the property flags byte.
const FLAGS_OFFSET: usize = 36;

/// Smallest header that carries a flags byte.
pub const MIN_HEADER_SIZE: usize = FLAGS_OFFSET + 1;

/// Property flags bit positions.
mod flags {
    /// Document is compressed
    pub const COMPRESSED: u8 = 1 << 0;
    /// Document is encrypted
    pub const ENCRYPTED: u8 = 1 << 1;
    /// Document is a distribution document
    pub const DISTRIBUTION: u8 = 1 << 2;
    /// Script present
    pub const SCRIPT: u8 = 1 << 3;
}

/// HWP 5.0 FileHeader structure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileHeader {
    /// Signature text with trailing NULs removed
    pub signature: String,
    /// Document version
    pub version: Version,
    /// Property flags byte
    pub properties: u8,
}

impl FileHeader {
    /// Parses a FileHeader from the raw `FileHeader` stream of `source`.
    pub fn parse(data: &[u8], source: &Path) -> Result<Self> {
        if data.len() < MIN_HEADER_SIZE {
            return Err(Error::TruncatedHeader {
                path: source.to_path_buf(),
                len: data.len(),
            });
        }

        let raw_signature = &data[..SIGNATURE_LEN];
        let end = raw_signature
            .iter()
            .rposition(|&b| b != 0)
            .map_or(0, |pos| pos + 1);
        let signature = String::from_utf8_lossy(&raw_signature[..end])
            .chars()
            .filter(|&c| c != char::REPLACEMENT_CHARACTER)
            .collect();

        // Components are reported in stream byte order.
        let version = Version::new(data[32], data[33], data[34], data[35]);

        Ok(Self {
            signature,
            version,
            properties: data[FLAGS_OFFSET],
        })
    }

    /// Returns the version as a string (e.g., "5.1.0.1").
    pub fn version_string(&self) -> String {
        self.version.to_string()
    }

    /// Returns true if the signature is the HWP 5.0 one.
    pub fn has_valid_signature(&self) -> bool {
        self.signature == HWP_SIGNATURE
    }

    /// Returns true if the document is compressed.
    pub fn is_compressed(&self) -> bool {
        self.properties & flags::COMPRESSED != 0
    }

    /// Returns true if the document is encrypted.
    pub fn is_encrypted(&self) -> bool {
        self.properties & flags::ENCRYPTED != 0
    }

    /// Returns true if the document is a distribution document.
    pub fn is_distribution(&self) -> bool {
        self.properties & flags::DISTRIBUTION != 0
    }

    /// Returns true if scripts are present.
    pub fn has_scripts(&self) -> bool {
        self.properties & flags::SCRIPT != 0
    }
}

/// HWP document version.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Version {
    pub major: u8,
    pub minor: u8,
    pub build: u8,
    pub revision: u8,
}

impl Version {
    /// Creates a new version.
    pub fn new(major: u8, minor: u8, build: u8, revision: u8) -> Self {
        Self {
            major,
            minor,
            build,
            revision,
        }
    }
}

impl std::fmt::Display for Version {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}.{}.{}.{}",
            self.major, self.minor, self.build, self.revision
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn header_bytes(len: usize, flags: u8) -> Vec<u8> {
        let mut data = vec![0u8; len.max(MIN_HEADER_SIZE)];
        data[..17].copy_from_slice(b"HWP Document File");
        data[32..36].copy_from_slice(&[5, 1, 0, 0]);
        data[36] = flags;
        data.truncate(len);
        data
    }

    #[test]
    fn test_version_display() {
        let v = Version::new(5, 1, 0, 1);
        assert_eq!(v.to_string(), "5.1.0.1");
    }

    #[test]
    fn test_parse_header() {
        let header = FileHeader::parse(&header_bytes(256, 0x01), Path::new("a.hwp")).unwrap();
        assert_eq!(header.signature, "HWP Document File");
        assert!(header.has_valid_signature());
        assert_eq!(header.version_string(), "5.1.0.0");
        assert!(header.is_compressed());
        assert!(!header.is_encrypted());
        assert!(!header.is_distribution());
        assert!(!header.has_scripts());
    }

    #[test]
    fn test_flags_are_independent() {
        let header = FileHeader::parse(&header_bytes(37, 0x0E), Path::new("a.hwp")).unwrap();
        assert!(!header.is_compressed());
        assert!(header.is_encrypted());
        assert!(header.is_distribution());
        assert!(header.has_scripts());
    }

    #[test]
    fn test_minimum_length() {
        assert!(FileHeader::parse(&header_bytes(37, 0), Path::new("a.hwp")).is_ok());

        match FileHeader::parse(&header_bytes(36, 0), Path::new("a.hwp")) {
            Err(Error::TruncatedHeader { path, len }) => {
                assert_eq!(path, Path::new("a.hwp"));
                assert_eq!(len, 36);
            }
            other => panic!("expected TruncatedHeader, got {:?}", other),
        }
    }

    #[test]
    fn test_foreign_signature_is_reported() {
        let mut data = header_bytes(64, 0);
        data[..32].fill(0);
        data[..5].copy_from_slice(b"OTHER");
        let header = FileHeader::parse(&data, Path::new("a.hwp")).unwrap();
        assert_eq!(header.signature, "OTHER");
        assert!(!header.has_valid_signature());
    }
}
