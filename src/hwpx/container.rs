//! ZIP container wrapper for HWPX documents.

use crate::error::{Error, Result};
use crate::model::EntryInfo;
use quick_xml::events::Event;
use quick_xml::Reader;
use std::collections::HashMap;
use std::io::{Cursor, Read};
use std::path::Path;
use zip::ZipArchive;

/// HWPX container paths.
pub(crate) mod paths {
    pub const MIMETYPE: &str = "mimetype";
    pub const VERSION_XML: &str = "version.xml";
    pub const CONTENT_HPF: &str = "Contents/content.hpf";
    pub const SECTION_PREFIX: &str = "Contents/section";
    pub const BINDATA_DIRS: [&str; 2] = ["BinData/", "Contents/BinData/"];
}

/// ZIP container wrapper for HWPX files.
pub struct HwpxContainer {
    archive: ZipArchive<Cursor<Vec<u8>>>,
}

impl HwpxContainer {
    /// Opens an HWPX container from a file path.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let data = std::fs::read(path)?;
        Self::from_bytes(data)
    }

    /// Opens an HWPX container from bytes.
    pub fn from_bytes(data: Vec<u8>) -> Result<Self> {
        let archive = ZipArchive::new(Cursor::new(data))?;
        Ok(Self { archive })
    }

    /// Returns the underlying archive.
    pub(crate) fn archive(&mut self) -> &mut ZipArchive<Cursor<Vec<u8>>> {
        &mut self.archive
    }

    /// Lists every entry with its sizes, in archive order.
    pub fn entries(&mut self) -> Result<Vec<EntryInfo>> {
        let mut entries = Vec::with_capacity(self.archive.len());
        for i in 0..self.archive.len() {
            let file = self.archive.by_index_raw(i)?;
            entries.push(EntryInfo {
                name: file.name().to_string(),
                size: file.size(),
                compressed_size: file.compressed_size(),
            });
        }
        Ok(entries)
    }

    /// Lists entry names in archive order.
    pub fn names(&self) -> Vec<String> {
        (0..self.archive.len())
            .filter_map(|i| self.archive.name_for_index(i).map(str::to_string))
            .collect()
    }

    /// Reads a file from the archive as UTF-8 string.
    pub fn read_file(&mut self, path: &str) -> Result<String> {
        let data = self.read_binary(path)?;
        String::from_utf8(data).map_err(|e| Error::InvalidData(format!("{}: {}", path, e)))
    }

    /// Reads a file from the archive as text, replacing invalid UTF-8.
    pub fn read_file_lossy(&mut self, path: &str) -> Result<String> {
        let data = self.read_binary(path)?;
        Ok(String::from_utf8_lossy(&data).into_owned())
    }

    /// Reads a binary file from the archive.
    pub fn read_binary(&mut self, path: &str) -> Result<Vec<u8>> {
        let mut file = self
            .archive
            .by_name(path)
            .map_err(|_| Error::MissingComponent(path.to_string()))?;

        let mut data = Vec::new();
        file.read_to_end(&mut data)?;
        Ok(data)
    }

    /// Checks if a file exists in the archive.
    pub fn file_exists(&self, path: &str) -> bool {
        self.archive.index_for_name(path).is_some()
    }

    /// Lists section files in reading order.
    ///
    /// The spine of `Contents/content.hpf` decides the order; when it names
    /// no existing section, `Contents/section*.xml` entries are used sorted
    /// by section number. Returns an empty list if there are none.
    pub fn section_names(&mut self) -> Vec<String> {
        let mut sections = match self.read_file_lossy(paths::CONTENT_HPF) {
            Ok(hpf) => parse_section_order(&hpf),
            Err(_) => Vec::new(),
        };
        sections.retain(|name| self.file_exists(name));

        if sections.is_empty() {
            sections = self
                .names()
                .into_iter()
                .filter(|name| name.starts_with(paths::SECTION_PREFIX) && name.ends_with(".xml"))
                .collect();
            sections.sort_by_key(|name| section_number(name));
        }

        sections
    }

    /// Lists embedded binaries under `BinData/` or `Contents/BinData/`.
    pub fn image_names(&self) -> Vec<String> {
        self.names()
            .into_iter()
            .filter(|name| {
                !name.ends_with('/') && paths::BINDATA_DIRS.iter().any(|dir| name.starts_with(dir))
            })
            .collect()
    }
}

/// Numeric suffix of `Contents/sectionN.xml`, for ordering.
fn section_number(name: &str) -> (usize, String) {
    let number = name
        .trim_start_matches(paths::SECTION_PREFIX)
        .trim_end_matches(".xml")
        .parse()
        .unwrap_or(usize::MAX);
    (number, name.to_string())
}

/// Parses section order from the content.hpf manifest and spine.
fn parse_section_order(hpf_content: &str) -> Vec<String> {
    let mut reader = Reader::from_str(hpf_content);
    let mut hrefs: HashMap<String, String> = HashMap::new();
    let mut spine: Vec<String> = Vec::new();

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) | Ok(Event::Empty(e)) => {
                let name = e.local_name();
                let mut id = None;
                let mut href = None;
                let mut idref = None;
                for attr in e.attributes().flatten() {
                    let value = String::from_utf8_lossy(&attr.value).into_owned();
                    match attr.key.local_name().as_ref() {
                        b"id" => id = Some(value),
                        b"href" => href = Some(value),
                        b"idref" => idref = Some(value),
                        _ => {}
                    }
                }
                match name.as_ref() {
                    b"item" => {
                        if let (Some(id), Some(href)) = (id, href) {
                            hrefs.insert(id, href);
                        }
                    }
                    b"itemref" => spine.extend(idref),
                    _ => {}
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                tracing::debug!("content.hpf is not well-formed: {}", e);
                break;
            }
            _ => {}
        }
    }

    spine
        .into_iter()
        .filter(|idref| idref.starts_with("section"))
        .map(|idref| match hrefs.get(&idref) {
            Some(href) if href.starts_with("Contents/") => href.clone(),
            Some(href) => format!("Contents/{}", href),
            None => format!("Contents/{}.xml", idref),
        })
        .collect()
}
