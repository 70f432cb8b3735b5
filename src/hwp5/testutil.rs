//! In-memory HWP 5.0 fixtures for tests.

use super::record::{encode_record, tag};
use flate2::write::DeflateEncoder;
use flate2::Compression;
use std::io::{Cursor, Write};
use std::path::{Path, PathBuf};

/// Builds a compound file laid out like an HWP 5.0 document.
pub(crate) struct SyntheticHwp {
    header: Vec<u8>,
    sections: Vec<Vec<u8>>,
    streams: Vec<(String, Vec<u8>)>,
}

impl SyntheticHwp {
    /// Starts a document whose FileHeader carries `flags` and version 5.1.0.0.
    pub fn new(flags: u8) -> Self {
        let mut header = vec![0u8; 256];
        header[..17].copy_from_slice(b"HWP Document File");
        header[32..36].copy_from_slice(&[5, 1, 0, 0]);
        header[36] = flags;

        Self {
            header,
            sections: Vec::new(),
            streams: Vec::new(),
        }
    }

    /// Replaces the FileHeader stream contents.
    pub fn header(mut self, header: Vec<u8>) -> Self {
        self.header = header;
        self
    }

    /// Appends a section stored exactly as given.
    pub fn section(mut self, raw: Vec<u8>) -> Self {
        self.sections.push(raw);
        self
    }

    /// Appends a section deflated from the given record bytes.
    pub fn compressed_section(self, records: &[u8]) -> Self {
        self.section(deflate(records))
    }

    /// Adds an arbitrary stream; parent storages are created as needed.
    pub fn stream(mut self, name: &str, data: Vec<u8>) -> Self {
        self.streams.push((name.to_string(), data));
        self
    }

    /// Serialises the compound file.
    pub fn build(self) -> Vec<u8> {
        let mut cfb = cfb::CompoundFile::create(Cursor::new(Vec::new())).unwrap();

        write_stream(&mut cfb, "FileHeader", &self.header);
        for (index, section) in self.sections.iter().enumerate() {
            write_stream(&mut cfb, &format!("BodyText/Section{}", index), section);
        }
        for (name, data) in &self.streams {
            write_stream(&mut cfb, name, data);
        }

        cfb.flush().unwrap();
        cfb.into_inner().into_inner()
    }

    /// Writes the compound file to `dir/name` and returns the path.
    pub fn write_to(self, dir: &Path, name: &str) -> PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, self.build()).unwrap();
        path
    }
}

fn write_stream(cfb: &mut cfb::CompoundFile<Cursor<Vec<u8>>>, name: &str, data: &[u8]) {
    if let Some((parent, _)) = name.rsplit_once('/') {
        let parent = format!("/{}", parent);
        if !cfb.is_storage(&parent) {
            cfb.create_storage_all(&parent).unwrap();
        }
    }
    let mut stream = cfb.create_stream(format!("/{}", name)).unwrap();
    stream.write_all(data).unwrap();
    stream.flush().unwrap();
}

/// Raw-deflates `data`.
pub(crate) fn deflate(data: &[u8]) -> Vec<u8> {
    let mut encoder = DeflateEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(data).unwrap();
    encoder.finish().unwrap()
}

/// Encodes a PARA_HEADER + PARA_TEXT pair for `text`.
pub(crate) fn paragraph_records(text: &str) -> Vec<u8> {
    let mut payload: Vec<u8> = text.encode_utf16().flat_map(|u| u.to_le_bytes()).collect();
    payload.extend_from_slice(&0x000Du16.to_le_bytes());

    let mut out = encode_record(tag::PARA_HEADER, 0, &[0u8; 22]);
    out.extend(encode_record(tag::PARA_TEXT, 1, &payload));
    out
}
