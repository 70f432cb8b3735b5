//! HWPX package creation.
//!
//! Produces a minimal OWPML package that Hangul and the reader in this crate
//! both open: the `mimetype` entry stored first and uncompressed, followed by
//! version, settings, container metadata, the package manifest, the header
//! and one `Contents/sectionN.xml` per document section.

use super::markup::{self, IdSeq};
use super::ns;
use crate::error::Result;
use crate::model::{Document, Metadata, Section};
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;
use std::io::{Cursor, Write};
use std::path::{Path, PathBuf};
use zip::write::SimpleFileOptions;
use zip::ZipWriter;

/// MIME type stored in the `mimetype` entry.
pub const HWPX_MIMETYPE: &str = "application/hwp+zip";

const VERSION_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<hv:HCFVersion xmlns:hv="http://www.hancom.co.kr/hwpml/2011/version" tagetApplication="WORDPROCESSOR" major="5" minor="1" micro="0" buildNumber="1" os="1" xmlVersion="1.4" application="hwpkit" appVersion="0.1.0"/>"#;

const SETTINGS_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<ha:HWPApplicationSetting xmlns:ha="http://www.hancom.co.kr/hwpml/2011/app"><ha:CaretPosition listIDRef="0" paraIDRef="0" pos="0"/></ha:HWPApplicationSetting>"#;

const CONTAINER_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<ocf:container xmlns:ocf="urn:oasis:names:tc:opendocument:xmlns:container" xmlns:hpf="http://www.hancom.co.kr/schema/2011/hpf"><ocf:rootfiles><ocf:rootfile full-path="Contents/content.hpf" media-type="application/hwpml-package+xml"/></ocf:rootfiles></ocf:container>"#;

const MANIFEST_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<odf:manifest xmlns:odf="urn:oasis:names:tc:opendocument:xmlns:manifest:1.0"/>"#;

const HEADER_XML: &str = r##"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<hh:head xmlns:hh="http://www.hancom.co.kr/hwpml/2011/head" xmlns:hc="http://www.hancom.co.kr/hwpml/2011/core" version="1.4" secCnt="1"><hh:beginNum page="1" footnote="1" endnote="1" pic="1" tbl="1" equation="1"/><hh:refList><hh:fontfaces itemCnt="2"><hh:fontface lang="HANGUL" fontCnt="1"><hh:font id="0" face="함초롬바탕" type="TTF" isEmbedded="0"/></hh:fontface><hh:fontface lang="LATIN" fontCnt="1"><hh:font id="0" face="함초롬바탕" type="TTF" isEmbedded="0"/></hh:fontface></hh:fontfaces><hh:borderFills itemCnt="1"><hh:borderFill id="1" threeD="0" shadow="0" centerLine="NONE" breakCellSeparateLine="0"><hh:leftBorder type="SOLID" width="0.12 mm" color="#000000"/><hh:rightBorder type="SOLID" width="0.12 mm" color="#000000"/><hh:topBorder type="SOLID" width="0.12 mm" color="#000000"/><hh:bottomBorder type="SOLID" width="0.12 mm" color="#000000"/></hh:borderFill></hh:borderFills><hh:charProperties itemCnt="1"><hh:charPr id="0" height="1000" textColor="#000000" shadeColor="none" useFontSpace="0" useKerning="0" symMark="NONE" borderFillIDRef="1"><hh:fontRef hangul="0" latin="0" hanja="0" japanese="0" other="0" symbol="0" user="0"/></hh:charPr></hh:charProperties><hh:tabProperties itemCnt="1"><hh:tabPr id="0" autoTabLeft="0" autoTabRight="0"/></hh:tabProperties><hh:paraProperties itemCnt="1"><hh:paraPr id="0" tabPrIDRef="0" condense="0"><hh:align horizontal="JUSTIFY" vertical="BASELINE"/><hh:lineSpacing type="PERCENT" value="160" unit="HWPUNIT"/></hh:paraPr></hh:paraProperties><hh:styles itemCnt="1"><hh:style id="0" type="PARA" name="바탕글" engName="Normal" paraPrIDRef="0" charPrIDRef="0" nextStyleIDRef="0" langID="1042" lockForm="0"/></hh:styles></hh:refList></hh:head>"##;

/// Serialises a document to HWPX bytes.
pub fn to_bytes(document: &Document) -> Result<Vec<u8>> {
    let default_section = [Section::new(0)];
    let sections: &[Section] = if document.sections.is_empty() {
        &default_section
    } else {
        &document.sections
    };

    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    let stored = SimpleFileOptions::default().compression_method(zip::CompressionMethod::Stored);
    let deflated = SimpleFileOptions::default().compression_method(zip::CompressionMethod::Deflated);

    // mimetype must be the first entry and uncompressed
    zip.start_file("mimetype", stored)?;
    zip.write_all(HWPX_MIMETYPE.as_bytes())?;

    let section_count = sections.len();
    let entries: Vec<(String, Vec<u8>)> = vec![
        ("version.xml".into(), VERSION_XML.as_bytes().to_vec()),
        ("settings.xml".into(), SETTINGS_XML.as_bytes().to_vec()),
        ("META-INF/container.xml".into(), CONTAINER_XML.as_bytes().to_vec()),
        ("META-INF/manifest.xml".into(), MANIFEST_XML.as_bytes().to_vec()),
        (
            "Contents/content.hpf".into(),
            content_hpf(&document.metadata, section_count)?,
        ),
        ("Contents/header.xml".into(), header_xml(section_count).into_bytes()),
    ];

    for (name, data) in entries {
        zip.start_file(name, deflated)?;
        zip.write_all(&data)?;
    }

    for (index, section) in sections.iter().enumerate() {
        zip.start_file(format!("Contents/section{}.xml", index), deflated)?;
        zip.write_all(&section_xml(section)?)?;
    }

    Ok(zip.finish()?.into_inner())
}

/// Writes a document to an HWPX file and returns the path written.
///
/// `.hwpx` is appended when the path does not already end with it, and
/// missing parent directories are created.
pub fn write_document(document: &Document, path: impl AsRef<Path>) -> Result<PathBuf> {
    let path = with_hwpx_extension(path.as_ref());
    let bytes = to_bytes(document)?;

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(&path, bytes)?;

    tracing::debug!(path = %path.display(), "wrote HWPX package");
    Ok(path)
}

/// Appends `.hwpx` unless the path already ends with it.
pub fn with_hwpx_extension(path: &Path) -> PathBuf {
    if path.to_string_lossy().ends_with(".hwpx") {
        path.to_path_buf()
    } else {
        let mut name = path.as_os_str().to_os_string();
        name.push(".hwpx");
        PathBuf::from(name)
    }
}

fn header_xml(section_count: usize) -> String {
    HEADER_XML.replacen(r#"secCnt="1""#, &format!(r#"secCnt="{}""#, section_count), 1)
}

fn content_hpf(metadata: &Metadata, section_count: usize) -> Result<Vec<u8>> {
    let mut writer = Writer::new(Cursor::new(Vec::new()));
    writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), Some("yes"))))?;

    writer.write_event(Event::Start(BytesStart::new("opf:package").with_attributes([
        ("xmlns:opf", "http://www.idpf.org/2007/opf/"),
        ("xmlns:dc", "http://purl.org/dc/elements/1.1/"),
        ("version", ""),
        ("unique-identifier", ""),
        ("id", ""),
    ])))?;

    writer.write_event(Event::Start(BytesStart::new("opf:metadata")))?;
    let title = metadata.title.as_deref().unwrap_or_default();
    write_text_element(&mut writer, "opf:title", title)?;
    write_text_element(&mut writer, "opf:language", "ko")?;
    write_text_element(&mut writer, "dc:title", title)?;
    if let Some(author) = metadata.author.as_deref().filter(|a| !a.is_empty()) {
        write_text_element(&mut writer, "dc:creator", author)?;
    }
    writer.write_event(Event::End(BytesEnd::new("opf:metadata")))?;

    writer.write_event(Event::Start(BytesStart::new("opf:manifest")))?;
    write_item(&mut writer, "header", "Contents/header.xml")?;
    for index in 0..section_count {
        let id = format!("section{}", index);
        let href = format!("Contents/section{}.xml", index);
        write_item(&mut writer, &id, &href)?;
    }
    write_item(&mut writer, "settings", "settings.xml")?;
    writer.write_event(Event::End(BytesEnd::new("opf:manifest")))?;

    writer.write_event(Event::Start(BytesStart::new("opf:spine")))?;
    write_itemref(&mut writer, "header")?;
    for index in 0..section_count {
        write_itemref(&mut writer, &format!("section{}", index))?;
    }
    writer.write_event(Event::End(BytesEnd::new("opf:spine")))?;

    writer.write_event(Event::End(BytesEnd::new("opf:package")))?;
    Ok(writer.into_inner().into_inner())
}

fn write_text_element<W: Write>(writer: &mut Writer<W>, name: &str, text: &str) -> Result<()> {
    writer.write_event(Event::Start(BytesStart::new(name)))?;
    writer.write_event(Event::Text(BytesText::new(text)))?;
    writer.write_event(Event::End(BytesEnd::new(name)))?;
    Ok(())
}

fn write_item<W: Write>(writer: &mut Writer<W>, id: &str, href: &str) -> Result<()> {
    writer.write_event(Event::Empty(BytesStart::new("opf:item").with_attributes([
        ("id", id),
        ("href", href),
        ("media-type", "application/xml"),
    ])))?;
    Ok(())
}

fn write_itemref<W: Write>(writer: &mut Writer<W>, idref: &str) -> Result<()> {
    writer.write_event(Event::Empty(BytesStart::new("opf:itemref").with_attributes([
        ("idref", idref),
        ("linear", "yes"),
    ])))?;
    Ok(())
}

/// Opening tag of a section root with the namespaces used in this crate.
fn section_root() -> BytesStart<'static> {
    BytesStart::new("hs:sec").with_attributes([
        ("xmlns:hp", ns::HP),
        ("xmlns:hs", ns::HS),
        ("xmlns:hc", ns::HC),
        ("xmlns:hh", ns::HH),
    ])
}

fn section_xml(section: &Section) -> Result<Vec<u8>> {
    let mut writer = Writer::new(Cursor::new(Vec::new()));
    let mut ids = IdSeq::default();

    writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), Some("yes"))))?;
    writer.write_event(Event::Start(section_root()))?;

    if section.index == 0 {
        write_section_properties(&mut writer, &mut ids)?;
    }
    for block in &section.content {
        markup::write_block(&mut writer, &mut ids, block)?;
    }

    writer.write_event(Event::End(BytesEnd::new("hs:sec")))?;
    Ok(writer.into_inner().into_inner())
}

/// Writes the leading paragraph that carries page setup (A4, portrait).
fn write_section_properties<W: Write>(writer: &mut Writer<W>, ids: &mut IdSeq) -> Result<()> {
    writer.write_event(Event::Start(markup::paragraph_start(ids)))?;
    writer.write_event(Event::Start(markup::run_start()))?;
    writer.write_event(Event::Start(BytesStart::new("hp:secPr").with_attributes([
        ("id", ""),
        ("textDirection", "HORIZONTAL"),
        ("spaceColumns", "1134"),
        ("tabStop", "8000"),
        ("outlineShapeIDRef", "1"),
        ("memoShapeIDRef", "0"),
        ("textVerticalWidthHead", "0"),
        ("masterPageCnt", "0"),
    ])))?;
    writer.write_event(Event::Start(BytesStart::new("hp:pagePr").with_attributes([
        ("landscape", "WIDELY"),
        ("width", "59528"),
        ("height", "84186"),
        ("gutterType", "LEFT_ONLY"),
    ])))?;
    writer.write_event(Event::Empty(BytesStart::new("hp:margin").with_attributes([
        ("header", "4252"),
        ("footer", "4252"),
        ("gutter", "0"),
        ("left", "8504"),
        ("right", "8504"),
        ("top", "5668"),
        ("bottom", "4252"),
    ])))?;
    writer.write_event(Event::End(BytesEnd::new("hp:pagePr")))?;
    writer.write_event(Event::End(BytesEnd::new("hp:secPr")))?;
    writer.write_event(Event::End(BytesEnd::new("hp:run")))?;
    writer.write_event(Event::End(BytesEnd::new("hp:p")))?;
    Ok(())
}
