//! HWPX (OWPML) XML format support.
//!
//! HWPX files are ZIP archives containing XML documents following the
//! KS X 6101 OWPML standard. This module reads them into the document model,
//! reports their package structure, and creates and edits them.

mod container;
pub mod edit;
mod markup;
mod section;
pub mod writer;

#[cfg(test)]
pub(crate) mod testutil;

pub use container::HwpxContainer;
pub use edit::{add_memo, add_paragraph, add_table, append_blocks, replace_text};
pub use section::parse_section;
pub use writer::{to_bytes, with_hwpx_extension, write_document, HWPX_MIMETYPE};

use crate::error::{Error, Result};
use crate::model::{
    Document, ExtractedText, HwpxAnalysis, HwpxMetadata, HwpxStats, HwpxStructureStats,
};
use container::paths;
use quick_xml::events::Event;
use quick_xml::Reader;
use std::path::Path;

/// HWPX XML namespaces.
pub mod ns {
    /// Hancom Paragraph namespace
    pub const HP: &str = "http://www.hancom.co.kr/hwpml/2011/paragraph";
    /// Hancom Section namespace
    pub const HS: &str = "http://www.hancom.co.kr/hwpml/2011/section";
    /// Hancom Core namespace
    pub const HC: &str = "http://www.hancom.co.kr/hwpml/2011/core";
    /// Hancom Head namespace
    pub const HH: &str = "http://www.hancom.co.kr/hwpml/2011/head";
}

/// HWPX document parser.
pub struct HwpxParser {
    container: HwpxContainer,
}

impl HwpxParser {
    /// Opens an HWPX document from a file path.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let container = HwpxContainer::open(path)?;
        Ok(Self { container })
    }

    /// Opens an HWPX document from bytes.
    pub fn from_bytes(data: Vec<u8>) -> Result<Self> {
        let container = HwpxContainer::from_bytes(data)?;
        Ok(Self { container })
    }

    /// Returns the underlying container.
    pub fn container(&mut self) -> &mut HwpxContainer {
        &mut self.container
    }

    /// Parses the document into the unified document model.
    pub fn parse(&mut self) -> Result<Document> {
        let mut document = Document::new();
        document.metadata.format_version = Some("HWPX".to_string());

        self.parse_metadata(&mut document);
        self.parse_sections(&mut document)?;

        Ok(document)
    }

    /// Reads title and author from content.hpf, if present.
    fn parse_metadata(&mut self, document: &mut Document) {
        let Ok(hpf) = self.container.read_file_lossy(paths::CONTENT_HPF) else {
            return;
        };
        let (title, creator) = parse_package_metadata(&hpf);
        document.metadata.title = title;
        document.metadata.author = creator;
    }

    fn parse_sections(&mut self, document: &mut Document) -> Result<()> {
        let section_files = self.container.section_names();
        if section_files.is_empty() {
            return Err(Error::MissingComponent("Contents/section*.xml".to_string()));
        }

        for (index, section_path) in section_files.iter().enumerate() {
            let section_xml = self.container.read_file_lossy(section_path)?;
            let section = section::parse_section(&section_xml, index)?;
            tracing::debug!(
                section = %section_path,
                blocks = section.content.len(),
                "parsed HWPX section"
            );
            document.sections.push(section);
        }

        Ok(())
    }
}

/// Extracts `dc:title` and `dc:creator` from the package document.
fn parse_package_metadata(hpf: &str) -> (Option<String>, Option<String>) {
    let mut reader = Reader::from_str(hpf);
    let mut title = None;
    let mut creator = None;
    let mut current: Option<Vec<u8>> = None;

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => {
                let is_dc = e.name().prefix().is_some_and(|p| p.as_ref() == b"dc");
                let local = e.local_name().as_ref().to_vec();
                current = (is_dc && (local == b"title" || local == b"creator")).then_some(local);
            }
            Ok(Event::Text(t)) => {
                if let Some(field) = current.as_deref() {
                    let value = t.unescape().map(|v| v.trim().to_string()).unwrap_or_default();
                    if !value.is_empty() {
                        match field {
                            b"title" => title = Some(value),
                            _ => creator = Some(value),
                        }
                    }
                }
            }
            Ok(Event::End(_)) => current = None,
            Ok(Event::Eof) => break,
            Err(e) => {
                tracing::debug!("content.hpf metadata unreadable: {}", e);
                break;
            }
            _ => {}
        }
    }

    (title, creator)
}

/// Parses an HWPX file into the document model.
pub fn parse_document(path: impl AsRef<Path>) -> Result<Document> {
    HwpxParser::open(path)?.parse()
}

/// Extracts the non-blank text lines of an HWPX file, including table cells.
pub fn extract_text(path: impl AsRef<Path>) -> Result<ExtractedText> {
    let document = parse_document(path)?;
    Ok(ExtractedText {
        paragraphs: document
            .plain_text()
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .collect(),
    })
}

/// Reports the package structure of an HWPX file.
///
/// Paragraph and table counts come from a structural parse; when that fails
/// they are left out and the rest of the report is still returned.
pub fn analyze(path: impl AsRef<Path>) -> Result<HwpxAnalysis> {
    let path = path.as_ref();
    let mut parser = HwpxParser::open(path)?;

    let container = parser.container();
    let entries = container.entries()?;
    let mimetype = container
        .read_file_lossy(paths::MIMETYPE)
        .ok()
        .map(|m| m.trim().to_string());
    let version_xml = container.read_file_lossy(paths::VERSION_XML).ok();
    let section_count = container.section_names().len();
    let images = container.image_names();

    let structure = match parser.parse() {
        Ok(document) => {
            let table_count = document.table_count();
            Some(HwpxStructureStats {
                paragraph_count: document.paragraph_count(),
                table_count,
                has_tables: table_count > 0,
            })
        }
        Err(e) => {
            tracing::warn!(path = %path.display(), "structural parse failed: {}", e);
            None
        }
    };

    Ok(HwpxAnalysis {
        format: "HWPX",
        path: path.display().to_string(),
        entries,
        metadata: HwpxMetadata {
            mimetype,
            version_xml,
        },
        stats: HwpxStats {
            section_count,
            image_count: images.len(),
            images,
            structure,
        },
    })
}

#[cfg(test)]
mod tests {
    use super::testutil::HwpxFixture;
    use super::*;
    use crate::model::Block;

    #[test]
    fn test_parse_fixture() {
        let bytes = HwpxFixture::new()
            .section(
                "Contents/section1.xml",
                &HwpxFixture::section_with_paragraphs(&["둘째 구역"]),
            )
            .build();
        let doc = HwpxParser::from_bytes(bytes).unwrap().parse().unwrap();

        assert_eq!(doc.metadata.format_version.as_deref(), Some("HWPX"));
        assert_eq!(doc.metadata.title.as_deref(), Some("Fixture"));
        assert_eq!(doc.sections.len(), 2);
        let texts: Vec<&str> = doc.paragraphs().map(|p| p.text.as_str()).collect();
        assert_eq!(texts, vec!["안녕하세요", "둘째 구역"]);
    }

    #[test]
    fn test_no_sections_is_missing_component() {
        let bytes = HwpxFixture::empty().build();
        assert!(matches!(
            HwpxParser::from_bytes(bytes).unwrap().parse(),
            Err(Error::MissingComponent(_))
        ));
    }

    #[test]
    fn test_package_metadata() {
        let hpf = r#"<opf:package xmlns:opf="http://www.idpf.org/2007/opf/" xmlns:dc="http://purl.org/dc/elements/1.1/">
            <opf:metadata><opf:title>ignored</opf:title><dc:title> 제목 &amp; 부제 </dc:title><dc:creator>작성자</dc:creator></opf:metadata>
        </opf:package>"#;
        let (title, creator) = parse_package_metadata(hpf);
        assert_eq!(title.as_deref(), Some("제목 & 부제"));
        assert_eq!(creator.as_deref(), Some("작성자"));

        assert_eq!(parse_package_metadata("<x/>"), (None, None));
    }

    #[test]
    fn test_analyze_created_document() {
        let dir = tempfile::tempdir().unwrap();
        let mut doc = Document::new();
        let section = doc.first_section_mut();
        section.push_paragraph(crate::model::Paragraph::text("하나"));
        section.push_paragraph(crate::model::Paragraph::text("둘"));
        section.push_table(crate::model::Table::from_grid(&["A"], &[vec!["1"]]));
        let path = write_document(&doc, dir.path().join("a.hwpx")).unwrap();

        let report = analyze(&path).unwrap();
        assert_eq!(report.format, "HWPX");
        assert_eq!(report.metadata.mimetype.as_deref(), Some(HWPX_MIMETYPE));
        assert!(report.metadata.version_xml.as_deref().unwrap().contains("HCFVersion"));
        assert_eq!(report.stats.section_count, 1);
        assert_eq!(report.stats.image_count, 0);
        assert_eq!(report.entries[0].name, "mimetype");

        let structure = report.stats.structure.unwrap();
        assert!(structure.paragraph_count >= 2);
        assert_eq!(structure.table_count, 1);
        assert!(structure.has_tables);

        assert_eq!(analyze(&path).unwrap(), analyze(&path).unwrap());
    }

    #[test]
    fn test_analyze_degrades_on_bad_section_xml() {
        let dir = tempfile::tempdir().unwrap();
        let path = HwpxFixture::new()
            .section("Contents/section0.xml", "<hs:sec><hp:p></hs:sec>")
            .binary("BinData/image1.png", &[0x89, b'P', b'N', b'G'])
            .write_to(dir.path(), "broken.hwpx");

        let report = analyze(&path).unwrap();
        assert!(report.stats.structure.is_none());
        assert_eq!(report.stats.section_count, 1);
        assert_eq!(report.stats.images, vec!["BinData/image1.png"]);

        let json = serde_json::to_value(&report).unwrap();
        assert!(json["stats"].get("paragraph_count").is_none());
    }

    #[test]
    fn test_extract_text_includes_cells() {
        let dir = tempfile::tempdir().unwrap();
        let mut doc = Document::new();
        let section = doc.first_section_mut();
        section.push_paragraph(crate::model::Paragraph::text("  본문  "));
        section.push_table(crate::model::Table::from_grid(&["머리"], &[vec!["셀"]]));
        let path = write_document(&doc, dir.path().join("t")).unwrap();

        let text = extract_text(&path).unwrap();
        assert_eq!(text.paragraphs, vec!["본문", "머리", "셀"]);

        let parsed = parse_document(&path).unwrap();
        assert!(matches!(parsed.sections[0].content[1], Block::Table(_)));
    }
}
