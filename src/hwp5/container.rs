//! OLE container wrapper for HWP 5.0 documents.

use super::FileHeader;
use crate::error::{Error, Result};
use cfb::CompoundFile;
use flate2::read::DeflateDecoder;
use std::cell::RefCell;
use std::io::{Cursor, Read};
use std::path::{Component, Path, PathBuf};

/// Magic bytes for OLE Compound File.
pub const OLE_MAGIC: [u8; 8] = [0xD0, 0xCF, 0x11, 0xE0, 0xA1, 0xB1, 0x1A, 0xE1];

/// Returns true if `data` starts with the OLE2 compound file signature.
pub fn is_compound_file(data: &[u8]) -> bool {
    data.len() >= OLE_MAGIC.len() && data[..OLE_MAGIC.len()] == OLE_MAGIC
}

/// OLE container wrapper for HWP 5.0 documents.
///
/// The whole file is read into memory on open; dropping the container
/// releases it.
pub struct Hwp5Container {
    cfb: RefCell<CompoundFile<Cursor<Vec<u8>>>>,
    source: PathBuf,
}

impl Hwp5Container {
    /// Opens an HWP 5.0 container from a file path.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let data = std::fs::read(path)?;
        Self::from_bytes(data, path)
    }

    /// Opens an HWP 5.0 container from bytes; `source` names it in errors.
    pub fn from_bytes(data: Vec<u8>, source: impl Into<PathBuf>) -> Result<Self> {
        let source = source.into();

        if !is_compound_file(&data) {
            return Err(Error::NotACompoundFile {
                path: source,
                reason: "missing OLE2 signature".into(),
            });
        }

        let cfb = CompoundFile::open(Cursor::new(data)).map_err(|e| Error::NotACompoundFile {
            path: source.clone(),
            reason: e.to_string(),
        })?;

        Ok(Self {
            cfb: RefCell::new(cfb),
            source,
        })
    }

    /// Returns the path (or label) this container was opened from.
    pub fn source(&self) -> &Path {
        &self.source
    }

    /// Reads the FileHeader stream (always uncompressed).
    pub fn read_file_header(&self) -> Result<FileHeader> {
        let data = self.read_stream_raw("FileHeader")?;
        FileHeader::parse(&data, &self.source)
    }

    /// Checks if a stream exists.
    pub fn stream_exists(&self, name: &str) -> bool {
        self.cfb.borrow().is_stream(name)
    }

    /// Reads a raw stream without decompression.
    pub fn read_stream_raw(&self, name: &str) -> Result<Vec<u8>> {
        let mut cfb = self.cfb.borrow_mut();

        let mut stream = cfb
            .open_stream(name)
            .map_err(|_| Error::MissingComponent(name.to_string()))?;

        let mut data = Vec::new();
        stream.read_to_end(&mut data)?;
        Ok(data)
    }

    /// Reads a stream, inflating it when `compressed` is set.
    pub fn read_stream_decompressed(&self, name: &str, compressed: bool) -> Result<Vec<u8>> {
        let raw = self.read_stream_raw(name)?;

        if compressed {
            decompress_stream(name, &raw)
        } else {
            Ok(raw)
        }
    }

    /// Lists every stream with its byte size, in container order.
    ///
    /// Names use `/` separators without a leading slash (`BodyText/Section0`).
    pub fn list_streams(&self) -> Vec<(String, u64)> {
        let cfb = self.cfb.borrow();
        cfb.walk()
            .filter(|entry| entry.is_stream())
            .map(|entry| (stream_name(entry.path()), entry.len()))
            .collect()
    }

    /// Lists BodyText section streams by probing `Section0`, `Section1`, ...
    pub fn section_names(&self) -> Vec<String> {
        (0..)
            .map(|index| format!("BodyText/Section{}", index))
            .take_while(|name| self.stream_exists(name))
            .collect()
    }

    /// Reads the preview text (PrvText), keeping at most `limit` characters.
    pub fn read_preview_text(&self, limit: usize) -> Result<String> {
        let data = self.read_stream_raw("PrvText")?;
        Ok(decode_utf16le_lossy(&data, limit))
    }
}

/// Joins the normal components of a container path with `/`.
fn stream_name(path: &Path) -> String {
    path.components()
        .filter_map(|c| match c {
            Component::Normal(part) => Some(part.to_string_lossy()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}

/// Decompresses a stream using raw deflate.
pub fn decompress_stream(name: &str, data: &[u8]) -> Result<Vec<u8>> {
    let mut decoder = DeflateDecoder::new(data);
    let mut output = Vec::new();

    decoder
        .read_to_end(&mut output)
        .map_err(|e| Error::SectionDecompressionFailed {
            section: name.to_string(),
            message: e.to_string(),
        })?;

    Ok(output)
}

/// Decodes UTF-16LE bytes, dropping unpaired surrogates and a trailing odd byte.
fn decode_utf16le_lossy(data: &[u8], limit: usize) -> String {
    let units = data
        .chunks_exact(2)
        .map(|chunk| u16::from_le_bytes([chunk[0], chunk[1]]));

    char::decode_utf16(units)
        .filter_map(|c| c.ok())
        .take(limit)
        .collect()
}
