//! Error types for hwpkit.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for hwpkit operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for hwpkit.
#[derive(Error, Debug)]
pub enum Error {
    /// I/O error during file operations.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The file extension is neither `.hwp` nor `.hwpx`.
    #[error("Unsupported file extension: {0}")]
    UnsupportedExtension(String),

    /// The container signature check failed; the file cannot be binary HWP.
    #[error("Not a valid HWP file: {}: {reason}", .path.display())]
    NotACompoundFile { path: PathBuf, reason: String },

    /// The FileHeader stream is shorter than 37 bytes.
    #[error("FileHeader too small in {}: {len} bytes, expected at least 37", .path.display())]
    TruncatedHeader { path: PathBuf, len: usize },

    /// A record header word could not be read.
    #[error("Truncated record header at offset {offset}")]
    TruncatedRecord { offset: usize },

    /// Raw-deflate decompression of a section stream failed.
    #[error("Failed to decompress {section}: {message}")]
    SectionDecompressionFailed { section: String, message: String },

    /// The document body is encrypted and cannot be read.
    #[error("Document is encrypted: {}", .0.display())]
    Encrypted(PathBuf),

    /// ZIP archive parsing or writing error.
    #[error("ZIP archive error: {0}")]
    ZipArchive(String),

    /// XML parsing error in HWPX format.
    #[error("XML parsing error: {0}")]
    XmlParse(String),

    /// JSON input or output error.
    #[error("JSON error: {0}")]
    Json(String),

    /// Invalid or malformed data.
    #[error("Invalid data: {0}")]
    InvalidData(String),

    /// Required stream or file is missing.
    #[error("Missing required component: {0}")]
    MissingComponent(String),

    /// An external converter exited unsuccessfully.
    #[error("{tool} failed: {message}")]
    ExternalTool { tool: String, message: String },

    /// An external converter exceeded its time limit.
    #[error("{tool} timed out after {seconds}s")]
    Timeout { tool: String, seconds: u64 },

    /// Every text extraction strategy failed.
    #[error("Failed to read file: {} ({})", .path.display(), .attempts.join("; "))]
    AllStrategiesFailed { path: PathBuf, attempts: Vec<String> },
}

impl From<zip::result::ZipError> for Error {
    fn from(err: zip::result::ZipError) -> Self {
        Error::ZipArchive(err.to_string())
    }
}

impl From<quick_xml::Error> for Error {
    fn from(err: quick_xml::Error) -> Self {
        Error::XmlParse(err.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Json(err.to_string())
    }
}

impl From<std::str::Utf8Error> for Error {
    fn from(err: std::str::Utf8Error) -> Self {
        Error::XmlParse(err.to_string())
    }
}
