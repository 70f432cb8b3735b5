//! In-memory HWPX packages for tests.

use std::io::{Cursor, Write};
use std::path::{Path, PathBuf};
use zip::write::SimpleFileOptions;
use zip::ZipWriter;

/// Builds a small HWPX archive entry by entry.
///
/// Sections are listed in `content.hpf` in the order they were added, unless
/// the package is built without one.
pub(crate) struct HwpxFixture {
    title: String,
    content_hpf: bool,
    sections: Vec<(String, String)>,
    binaries: Vec<(String, Vec<u8>)>,
}

impl HwpxFixture {
    /// A package with one section holding the paragraph "안녕하세요".
    pub fn new() -> Self {
        Self::empty().section(
            "Contents/section0.xml",
            &Self::section_with_paragraphs(&["안녕하세요"]),
        )
    }

    /// A package with no sections.
    pub fn empty() -> Self {
        Self {
            title: "Fixture".to_string(),
            content_hpf: true,
            sections: Vec::new(),
            binaries: Vec::new(),
        }
    }

    pub fn without_content_hpf(mut self) -> Self {
        self.content_hpf = false;
        self
    }

    /// Adds or replaces a section entry.
    pub fn section(mut self, name: &str, xml: &str) -> Self {
        match self.sections.iter_mut().find(|(n, _)| n == name) {
            Some(existing) => existing.1 = xml.to_string(),
            None => self.sections.push((name.to_string(), xml.to_string())),
        }
        self
    }

    pub fn binary(mut self, name: &str, data: &[u8]) -> Self {
        self.binaries.push((name.to_string(), data.to_vec()));
        self
    }

    /// Section XML with one `hp:p` per text.
    pub fn section_with_paragraphs(texts: &[&str]) -> String {
        let mut xml = String::from(
            r#"<?xml version="1.0" encoding="UTF-8"?><hs:sec xmlns:hs="http://www.hancom.co.kr/hwpml/2011/section" xmlns:hp="http://www.hancom.co.kr/hwpml/2011/paragraph">"#,
        );
        for (i, text) in texts.iter().enumerate() {
            xml.push_str(&format!(
                r#"<hp:p id="{}" paraPrIDRef="0" styleIDRef="0"><hp:run charPrIDRef="0"><hp:t>{}</hp:t></hp:run></hp:p>"#,
                i, text
            ));
        }
        xml.push_str("</hs:sec>");
        xml
    }

    pub fn build(self) -> Vec<u8> {
        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
        let stored = SimpleFileOptions::default().compression_method(zip::CompressionMethod::Stored);
        let deflated =
            SimpleFileOptions::default().compression_method(zip::CompressionMethod::Deflated);

        zip.start_file("mimetype", stored).unwrap();
        zip.write_all(b"application/hwp+zip").unwrap();

        zip.start_file("version.xml", deflated).unwrap();
        zip.write_all(br#"<?xml version="1.0"?><hv:HCFVersion xmlns:hv="http://www.hancom.co.kr/hwpml/2011/version" major="5" minor="1"/>"#)
            .unwrap();

        if self.content_hpf {
            zip.start_file("Contents/content.hpf", deflated).unwrap();
            zip.write_all(self.content_hpf_xml().as_bytes()).unwrap();
        }

        zip.start_file("Contents/header.xml", deflated).unwrap();
        zip.write_all(br#"<hh:head xmlns:hh="http://www.hancom.co.kr/hwpml/2011/head" secCnt="1"/>"#)
            .unwrap();

        for (name, xml) in &self.sections {
            zip.start_file(name.as_str(), deflated).unwrap();
            zip.write_all(xml.as_bytes()).unwrap();
        }
        for (name, data) in &self.binaries {
            zip.start_file(name.as_str(), stored).unwrap();
            zip.write_all(data).unwrap();
        }

        zip.finish().unwrap().into_inner()
    }

    pub fn write_to(self, dir: &Path, name: &str) -> PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, self.build()).unwrap();
        path
    }

    fn content_hpf_xml(&self) -> String {
        let mut manifest = String::new();
        let mut spine = String::new();
        for (name, _) in &self.sections {
            let id = name
                .trim_start_matches("Contents/")
                .trim_end_matches(".xml");
            manifest.push_str(&format!(
                r#"<opf:item id="{}" href="{}" media-type="application/xml"/>"#,
                id, name
            ));
            spine.push_str(&format!(r#"<opf:itemref idref="{}" linear="yes"/>"#, id));
        }
        format!(
            r#"<?xml version="1.0" encoding="UTF-8"?><opf:package xmlns:opf="http://www.idpf.org/2007/opf/" xmlns:dc="http://purl.org/dc/elements/1.1/"><opf:metadata><dc:title>{}</dc:title></opf:metadata><opf:manifest>{}</opf:manifest><opf:spine>{}</opf:spine></opf:package>"#,
            self.title, manifest, spine
        )
    }
}
