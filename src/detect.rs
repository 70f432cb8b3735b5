//! Format detection for HWP/HWPX documents.
//!
//! Dispatch is decided by file extension alone, before any I/O. Magic-byte
//! sniffing is available separately for diagnostics (for instance when a
//! `.hwp` file turns out to be a ZIP package).

use crate::error::{Error, Result};
use crate::hwp5::OLE_MAGIC;
use std::path::Path;

/// Magic bytes for ZIP archive (HWPX)
const ZIP_MAGIC: [u8; 4] = [0x50, 0x4B, 0x03, 0x04];

/// Supported document format types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FormatType {
    /// HWP 5.0+ binary format (OLE container)
    Hwp5,
    /// HWPX XML-based format (ZIP container)
    Hwpx,
}

impl FormatType {
    /// Selects the format from the file extension, case-insensitively.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let ext = path
            .extension()
            .map(|e| e.to_string_lossy().to_lowercase())
            .unwrap_or_default();

        match ext.as_str() {
            "hwp" => Ok(FormatType::Hwp5),
            "hwpx" => Ok(FormatType::Hwpx),
            "" => Err(Error::UnsupportedExtension(format!(
                "(none) in {}",
                path.display()
            ))),
            other => Err(Error::UnsupportedExtension(format!(".{}", other))),
        }
    }

    /// Returns the canonical extension for this format, without the dot.
    pub fn extension(&self) -> &'static str {
        match self {
            FormatType::Hwp5 => "hwp",
            FormatType::Hwpx => "hwpx",
        }
    }
}

impl std::fmt::Display for FormatType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FormatType::Hwp5 => write!(f, "HWP"),
            FormatType::Hwpx => write!(f, "HWPX"),
        }
    }
}

/// Detect document format from the leading bytes of a file.
pub fn detect_format_from_bytes(data: &[u8]) -> Result<FormatType> {
    if data.starts_with(&OLE_MAGIC) {
        return Ok(FormatType::Hwp5);
    }

    if data.starts_with(&ZIP_MAGIC) {
        return Ok(FormatType::Hwpx);
    }

    Err(Error::InvalidData(
        "neither an OLE compound file nor a ZIP package".into(),
    ))
}

/// Detect document format by reading the first bytes of a file.
pub fn detect_format_from_file(path: impl AsRef<Path>) -> Result<FormatType> {
    use std::io::Read;

    let mut buffer = Vec::with_capacity(OLE_MAGIC.len());
    std::fs::File::open(path)?
        .take(OLE_MAGIC.len() as u64)
        .read_to_end(&mut buffer)?;
    detect_format_from_bytes(&buffer)
}
