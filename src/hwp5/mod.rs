//! HWP 5.0 binary format parser.
//!
//! This module handles parsing of HWP 5.0 documents stored in OLE containers.
//! Every section is tokenized by one shared [`Records`] iterator; statistics
//! and text extraction are independent consumers of that sequence.

mod container;
mod header;
mod record;
mod stats;
mod text;

#[cfg(test)]
pub(crate) mod testutil;

pub use container::{decompress_stream, is_compound_file, Hwp5Container, OLE_MAGIC};
pub use header::{FileHeader, Version, MIN_HEADER_SIZE};
pub use record::{tag, Record, RecordHeader, Records};
pub use stats::RecordStats;
pub use text::decode_para_text;

use crate::error::{Error, Result};
use crate::model::{
    Document, ExtractedText, HwpAnalysis, HwpMetadata, HwpStats, Paragraph, Section,
    StreamInfo, StructureStats,
};
use crate::options::ReadOptions;
use std::path::Path;

/// Maximum number of preview characters reported by analysis.
pub const PREVIEW_LIMIT: usize = 500;

/// Prefix of embedded binary (image) streams.
const BINDATA_PREFIX: &str = "BinData/";

/// HWP 5.0 document parser.
pub struct Hwp5Parser {
    container: Hwp5Container,
    header: FileHeader,
}

impl Hwp5Parser {
    /// Opens an HWP 5.0 document from a file path.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        Self::with_container(Hwp5Container::open(path)?)
    }

    /// Opens an HWP 5.0 document from bytes; `source` names it in reports.
    pub fn from_bytes(data: Vec<u8>, source: impl AsRef<Path>) -> Result<Self> {
        Self::with_container(Hwp5Container::from_bytes(data, source.as_ref())?)
    }

    fn with_container(container: Hwp5Container) -> Result<Self> {
        let header = container.read_file_header()?;
        if !header.has_valid_signature() {
            tracing::warn!(signature = %header.signature, "unexpected FileHeader signature");
        }
        Ok(Self { container, header })
    }

    /// Returns the file header.
    pub fn header(&self) -> &FileHeader {
        &self.header
    }

    /// Returns true if the document is compressed.
    pub fn is_compressed(&self) -> bool {
        self.header.is_compressed()
    }

    /// Returns true if the document is encrypted.
    pub fn is_encrypted(&self) -> bool {
        self.header.is_encrypted()
    }

    /// Builds the structural analysis report.
    ///
    /// Stream listing and header metadata are always reported. Record
    /// statistics are summed over every section that can be read; sections
    /// that fail to decompress are left out, and the statistics are absent
    /// entirely when no section could be read or the body is encrypted.
    pub fn analyze(&self) -> HwpAnalysis {
        let streams: Vec<StreamInfo> = self
            .container
            .list_streams()
            .into_iter()
            .map(|(name, size)| StreamInfo { name, size })
            .collect();

        let preview = if self.container.stream_exists("PrvText") {
            match self.container.read_preview_text(PREVIEW_LIMIT) {
                Ok(text) => Some(text),
                Err(e) => {
                    tracing::warn!("Failed to read preview text: {}", e);
                    None
                }
            }
        } else {
            None
        };

        let metadata = HwpMetadata {
            signature: self.header.signature.clone(),
            version: self.header.version_string(),
            compressed: self.header.is_compressed(),
            encrypted: self.header.is_encrypted(),
            distributed: self.header.is_distribution(),
            has_script: self.header.has_scripts(),
            preview,
        };

        let images: Vec<String> = streams
            .iter()
            .filter(|s| s.name.starts_with(BINDATA_PREFIX))
            .map(|s| s.name.clone())
            .collect();

        let sections = self.container.section_names();

        let structure = self.record_stats(&sections).map(|stats| StructureStats {
            total_records: stats.total_records,
            has_tables: stats.has_tables(),
            table_count: stats.table_count,
            paragraph_count: stats.paragraph_count,
        });

        HwpAnalysis {
            format: "HWP",
            path: self.container.source().to_string_lossy().into_owned(),
            streams,
            metadata,
            stats: HwpStats {
                image_count: images.len(),
                images,
                section_count: sections.len(),
                structure,
            },
        }
    }

    fn record_stats(&self, sections: &[String]) -> Option<RecordStats> {
        if self.is_encrypted() {
            tracing::warn!(
                "{} is encrypted; skipping record statistics",
                self.container.source().display()
            );
            return None;
        }

        let compressed = self.is_compressed();
        let mut total: Option<RecordStats> = None;

        for name in sections {
            match self.container.read_stream_decompressed(name, compressed) {
                Ok(data) => {
                    let stats = RecordStats::from_records(Records::new(&data).recovered());
                    tracing::debug!(section = %name, records = stats.total_records, "counted section");
                    total.get_or_insert_with(RecordStats::default).merge(&stats);
                }
                Err(e) => tracing::warn!("Skipping {} in statistics: {}", name, e),
            }
        }

        total
    }

    /// Extracts the decoded text of every non-blank PARA_TEXT record.
    pub fn extract_text(&self, options: &ReadOptions) -> Result<ExtractedText> {
        let paragraphs = self
            .section_paragraphs(options)?
            .into_iter()
            .flatten()
            .collect();
        Ok(ExtractedText { paragraphs })
    }

    /// Parses the document into the document model, one section per stream.
    pub fn parse(&self, options: &ReadOptions) -> Result<Document> {
        let mut document = Document::new();
        document.metadata.format_version = Some(self.header.version_string());

        for (index, paragraphs) in self.section_paragraphs(options)?.into_iter().enumerate() {
            let mut section = Section::new(index);
            for text in paragraphs {
                section.push_paragraph(Paragraph::text(text));
            }
            document.sections.push(section);
        }

        Ok(document)
    }

    /// Decodes the paragraphs of each readable section, in order.
    fn section_paragraphs(&self, options: &ReadOptions) -> Result<Vec<Vec<String>>> {
        if self.is_encrypted() {
            return Err(Error::Encrypted(self.container.source().to_path_buf()));
        }

        let compressed = self.is_compressed();
        let mut sections = Vec::new();

        for name in self.container.section_names() {
            let data = match self.container.read_stream_decompressed(&name, compressed) {
                Ok(data) => data,
                Err(e) if options.is_lenient() => {
                    tracing::warn!("Skipping {}: {}", name, e);
                    continue;
                }
                Err(e) => return Err(e),
            };

            let paragraphs: Vec<String> = Records::new(&data)
                .recovered()
                .filter(Record::is_para_text)
                .map(|record| decode_para_text(record.payload()))
                .filter(|text| !text.trim().is_empty())
                .collect();

            tracing::debug!(section = %name, paragraphs = paragraphs.len(), "decoded section");
            sections.push(paragraphs);
        }

        Ok(sections)
    }
}

/// Analyzes the structure of an HWP file.
pub fn analyze(path: impl AsRef<Path>) -> Result<HwpAnalysis> {
    Ok(Hwp5Parser::open(path)?.analyze())
}

/// Extracts the text of an HWP file.
pub fn extract_text(path: impl AsRef<Path>, options: &ReadOptions) -> Result<ExtractedText> {
    Hwp5Parser::open(path)?.extract_text(options)
}

/// Parses an HWP file into the document model.
pub fn parse_document(path: impl AsRef<Path>, options: &ReadOptions) -> Result<Document> {
    Hwp5Parser::open(path)?.parse(options)
}

#[cfg(test)]
mod tests {
    use super::testutil::{paragraph_records, SyntheticHwp};
    use super::*;
    use super::record::encode_record;

    fn two_paragraphs() -> Vec<u8> {
        let mut records = paragraph_records("A");
        records.extend(paragraph_records("B"));
        records
    }

    fn minimal_compressed() -> Vec<u8> {
        SyntheticHwp::new(0x01)
            .compressed_section(&two_paragraphs())
            .build()
    }

    #[test]
    fn test_end_to_end_minimal_document() {
        let parser = Hwp5Parser::from_bytes(minimal_compressed(), "mem.hwp").unwrap();

        let text = parser.extract_text(&ReadOptions::default()).unwrap();
        assert_eq!(text.paragraphs, vec!["A", "B"]);
        assert_eq!(text.joined(), "A\nB");

        let analysis = parser.analyze();
        assert_eq!(analysis.format, "HWP");
        assert_eq!(analysis.path, "mem.hwp");
        assert_eq!(analysis.metadata.signature, "HWP Document File");
        assert_eq!(analysis.metadata.version, "5.1.0.0");
        assert!(analysis.metadata.compressed);
        assert!(!analysis.metadata.encrypted);
        assert_eq!(analysis.stats.section_count, 1);

        let structure = analysis.stats.structure.unwrap();
        assert_eq!(structure.paragraph_count, 2);
        assert_eq!(structure.table_count, 0);
        assert!(!structure.has_tables);
        assert_eq!(structure.total_records, 4);
    }

    #[test]
    fn test_analysis_is_idempotent() {
        let parser = Hwp5Parser::from_bytes(minimal_compressed(), "mem.hwp").unwrap();
        let first = serde_json::to_string(&parser.analyze()).unwrap();
        let second = serde_json::to_string(&parser.analyze()).unwrap();
        assert_eq!(first, second);

        let reopened = Hwp5Parser::from_bytes(minimal_compressed(), "mem.hwp").unwrap();
        assert_eq!(first, serde_json::to_string(&reopened.analyze()).unwrap());
    }

    #[test]
    fn test_uncompressed_sections_are_summed() {
        let mut table_section = paragraph_records("표");
        table_section.extend(encode_record(tag::TABLE, 1, &[0u8; 8]));

        let bytes = SyntheticHwp::new(0x00)
            .section(paragraph_records("첫 구역"))
            .section(table_section)
            .build();
        let parser = Hwp5Parser::from_bytes(bytes, "two.hwp").unwrap();

        let analysis = parser.analyze();
        assert_eq!(analysis.stats.section_count, 2);
        let structure = analysis.stats.structure.unwrap();
        assert_eq!(structure.paragraph_count, 2);
        assert_eq!(structure.table_count, 1);
        assert!(structure.has_tables);
        assert_eq!(structure.total_records, 5);

        let doc = parser.parse(&ReadOptions::default()).unwrap();
        assert_eq!(doc.sections.len(), 2);
        assert_eq!(doc.plain_text(), "첫 구역\n표");
        assert_eq!(doc.metadata.format_version.as_deref(), Some("5.1.0.0"));
    }

    #[test]
    fn test_blank_paragraphs_dropped() {
        let mut records = paragraph_records("   ");
        records.extend(paragraph_records("내용"));
        let bytes = SyntheticHwp::new(0x00).section(records).build();
        let parser = Hwp5Parser::from_bytes(bytes, "blank.hwp").unwrap();

        let text = parser.extract_text(&ReadOptions::default()).unwrap();
        assert_eq!(text.paragraphs, vec!["내용"]);
        assert_eq!(parser.analyze().stats.structure.unwrap().paragraph_count, 2);
    }

    #[test]
    fn test_bad_section_degrades_analysis_but_fails_extraction() {
        let bytes = SyntheticHwp::new(0x01)
            .compressed_section(&paragraph_records("좋음"))
            .section(vec![0xFF, 0xFF, 0xFF, 0xFF])
            .build();
        let parser = Hwp5Parser::from_bytes(bytes, "bad.hwp").unwrap();

        let analysis = parser.analyze();
        assert_eq!(analysis.stats.section_count, 2);
        assert_eq!(analysis.stats.structure.unwrap().paragraph_count, 1);

        match parser.extract_text(&ReadOptions::default()) {
            Err(Error::SectionDecompressionFailed { section, .. }) => {
                assert_eq!(section, "BodyText/Section1")
            }
            other => panic!("expected SectionDecompressionFailed, got {:?}", other),
        }

        let lenient = parser.extract_text(&ReadOptions::new().lenient()).unwrap();
        assert_eq!(lenient.paragraphs, vec!["좋음"]);
    }

    #[test]
    fn test_all_sections_unreadable_omits_structure() {
        let bytes = SyntheticHwp::new(0x01)
            .section(vec![0xFF, 0xFF, 0xFF, 0xFF])
            .build();
        let analysis = Hwp5Parser::from_bytes(bytes, "bad.hwp").unwrap().analyze();
        assert_eq!(analysis.stats.section_count, 1);
        assert!(analysis.stats.structure.is_none());
    }

    #[test]
    fn test_no_sections_omits_structure() {
        let bytes = SyntheticHwp::new(0x01).build();
        let parser = Hwp5Parser::from_bytes(bytes, "empty.hwp").unwrap();
        assert_eq!(parser.analyze().stats.section_count, 0);
        assert!(parser.analyze().stats.structure.is_none());
        assert!(parser.extract_text(&ReadOptions::default()).unwrap().is_empty());
    }

    #[test]
    fn test_encrypted_reports_metadata_only() {
        let bytes = SyntheticHwp::new(0x03)
            .section(vec![0x13, 0x37, 0xC0, 0xDE, 0x00])
            .build();
        let parser = Hwp5Parser::from_bytes(bytes, "secret.hwp").unwrap();

        let analysis = parser.analyze();
        assert!(analysis.metadata.encrypted);
        assert!(analysis.metadata.compressed);
        assert_eq!(analysis.stats.section_count, 1);
        assert!(analysis.stats.structure.is_none());

        assert!(matches!(
            parser.extract_text(&ReadOptions::new().lenient()),
            Err(Error::Encrypted(_))
        ));
    }

    #[test]
    fn test_preview_and_images() {
        let preview: Vec<u8> = "미".repeat(600).encode_utf16().flat_map(|u| u.to_le_bytes()).collect();
        let bytes = SyntheticHwp::new(0x01)
            .compressed_section(&two_paragraphs())
            .stream("PrvText", preview)
            .stream("BinData/BIN0001.png", vec![1, 2, 3])
            .stream("BinData/BIN0002.jpg", vec![4])
            .build();
        let analysis = Hwp5Parser::from_bytes(bytes, "img.hwp").unwrap().analyze();

        assert_eq!(analysis.metadata.preview.as_ref().unwrap().chars().count(), PREVIEW_LIMIT);
        assert_eq!(analysis.stats.image_count, 2);
        assert!(analysis.stats.images.contains(&"BinData/BIN0001.png".to_string()));
        assert!(analysis
            .streams
            .contains(&StreamInfo { name: "BinData/BIN0002.jpg".into(), size: 1 }));
    }

    #[test]
    fn test_truncated_header_is_fatal() {
        let bytes = SyntheticHwp::new(0x00).header(vec![0u8; 36]).build();
        assert!(matches!(
            Hwp5Parser::from_bytes(bytes, "short.hwp"),
            Err(Error::TruncatedHeader { len: 36, .. })
        ));
    }

    #[test]
    fn test_foreign_signature_still_reads() {
        let mut header = vec![0u8; 256];
        header[..9].copy_from_slice(b"HWP Other");
        header[32..36].copy_from_slice(&[5, 0, 3, 0]);
        let bytes = SyntheticHwp::new(0x00)
            .header(header)
            .section(paragraph_records("본문"))
            .build();

        let parser = Hwp5Parser::from_bytes(bytes, "odd.hwp").unwrap();
        assert!(!parser.header().has_valid_signature());
        assert_eq!(parser.analyze().metadata.signature, "HWP Other");
        assert_eq!(parser.extract_text(&ReadOptions::default()).unwrap().paragraphs, vec!["본문"]);
    }

    #[test]
    fn test_file_level_functions() {
        let dir = tempfile::tempdir().unwrap();
        let path = SyntheticHwp::new(0x01)
            .compressed_section(&two_paragraphs())
            .write_to(dir.path(), "doc.hwp");

        assert_eq!(extract_text(&path, &ReadOptions::default()).unwrap().joined(), "A\nB");
        assert_eq!(analyze(&path).unwrap().stats.section_count, 1);
        assert_eq!(parse_document(&path, &ReadOptions::default()).unwrap().paragraph_count(), 2);

        let missing = dir.path().join("missing.hwp");
        assert!(matches!(analyze(&missing), Err(Error::Io(_))));
    }
}
