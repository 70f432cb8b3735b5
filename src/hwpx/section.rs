//! Section parsing for HWPX documents.
//!
//! Reads `Contents/sectionN.xml` into the document model. Only the text
//! carrying elements are interpreted: `p`, `run`, `t` (with inline `tab` and
//! `lineBreak`), and `tbl`/`tr`/`tc`. Anything else inside a paragraph or run
//! (line segments, controls, pictures, footnotes) is skipped whole, as is the
//! section's `memogroup`.

use crate::error::Result;
use crate::model::{Paragraph, Section, Table, TableCell, TableRow};
use quick_xml::events::{BytesEnd, BytesStart, Event};
use quick_xml::Reader;

/// Parses a section XML file.
pub fn parse_section(xml: &str, section_index: usize) -> Result<Section> {
    let mut section = Section::new(section_index);
    let mut parser = SectionParser::new(xml);
    parser.parse(&mut section)?;
    Ok(section)
}

/// A paragraph together with the tables anchored in its runs.
struct ParsedParagraph {
    paragraph: Paragraph,
    tables: Vec<Table>,
}

/// Section parser state machine.
struct SectionParser<'a> {
    reader: Reader<&'a [u8]>,
}

impl<'a> SectionParser<'a> {
    fn new(xml: &'a str) -> Self {
        Self {
            reader: Reader::from_str(xml),
        }
    }

    fn parse(&mut self, section: &mut Section) -> Result<()> {
        loop {
            match self.reader.read_event()? {
                Event::Start(e) => match local_name(&e).as_str() {
                    "p" => {
                        let parsed = self.parse_paragraph()?;
                        if !parsed.paragraph.is_empty() {
                            section.push_paragraph(parsed.paragraph);
                        }
                        for table in parsed.tables {
                            section.push_table(table);
                        }
                    }
                    "tbl" => {
                        let table = self.parse_table()?;
                        section.push_table(table);
                    }
                    // Memo bodies are annotations, not document text.
                    "memogroup" => self.skip_element()?,
                    _ => {}
                },
                Event::Eof => break,
                _ => {}
            }
        }

        Ok(())
    }

    /// Parses a `<hp:p>` paragraph element.
    fn parse_paragraph(&mut self) -> Result<ParsedParagraph> {
        let mut parsed = ParsedParagraph {
            paragraph: Paragraph::new(),
            tables: Vec::new(),
        };

        loop {
            match self.reader.read_event()? {
                Event::Start(e) => {
                    if local_name(&e) == "run" {
                        self.parse_run(&mut parsed)?;
                    } else {
                        self.skip_element()?;
                    }
                }
                Event::End(e) if local_name_end(&e) == "p" => break,
                Event::Eof => break,
                _ => {}
            }
        }

        Ok(parsed)
    }

    /// Parses a `<hp:run>` element, appending its text to the paragraph.
    fn parse_run(&mut self, parsed: &mut ParsedParagraph) -> Result<()> {
        loop {
            match self.reader.read_event()? {
                Event::Start(e) => match local_name(&e).as_str() {
                    "t" => self.parse_text(&mut parsed.paragraph)?,
                    "tbl" => {
                        let table = self.parse_table()?;
                        parsed.tables.push(table);
                    }
                    _ => self.skip_element()?,
                },
                Event::Empty(e) => push_inline(&e, &mut parsed.paragraph),
                Event::End(e) if local_name_end(&e) == "run" => break,
                Event::Eof => break,
                _ => {}
            }
        }

        Ok(())
    }

    /// Reads the mixed content of a `<hp:t>` element.
    fn parse_text(&mut self, paragraph: &mut Paragraph) -> Result<()> {
        loop {
            match self.reader.read_event()? {
                Event::Text(t) => paragraph.push_str(&t.unescape()?),
                Event::CData(t) => paragraph.push_str(&String::from_utf8_lossy(&t)),
                Event::Empty(e) => push_inline(&e, paragraph),
                Event::Start(_) => self.skip_element()?,
                Event::End(e) if local_name_end(&e) == "t" => break,
                Event::Eof => break,
                _ => {}
            }
        }

        Ok(())
    }

    /// Parses a `<hp:tbl>` table element.
    fn parse_table(&mut self) -> Result<Table> {
        let mut table = Table::new();

        loop {
            match self.reader.read_event()? {
                Event::Start(e) => {
                    if local_name(&e) == "tr" {
                        let row = self.parse_table_row()?;
                        table.rows.push(row);
                    } else {
                        self.skip_element()?;
                    }
                }
                Event::End(e) if local_name_end(&e) == "tbl" => break,
                Event::Eof => break,
                _ => {}
            }
        }

        Ok(table)
    }

    /// Parses a `<hp:tr>` table row element.
    fn parse_table_row(&mut self) -> Result<TableRow> {
        let mut row = TableRow::new();

        loop {
            match self.reader.read_event()? {
                Event::Start(e) => {
                    if local_name(&e) == "tc" {
                        let mut cell = TableCell::merged(
                            get_attr_u32(&e, "rowSpan").unwrap_or(1),
                            get_attr_u32(&e, "colSpan").unwrap_or(1),
                        );
                        self.parse_table_cell(&mut cell)?;
                        row.cells.push(cell);
                    } else {
                        self.skip_element()?;
                    }
                }
                Event::End(e) if local_name_end(&e) == "tr" => break,
                Event::Eof => break,
                _ => {}
            }
        }

        Ok(row)
    }

    /// Parses a `<hp:tc>` table cell element.
    ///
    /// Cell content lives in `subList > p`. Tables nested in a cell are
    /// flattened into the cell's paragraphs.
    fn parse_table_cell(&mut self, cell: &mut TableCell) -> Result<()> {
        loop {
            match self.reader.read_event()? {
                Event::Start(e) => match local_name(&e).as_str() {
                    "subList" => {}
                    "p" => {
                        let parsed = self.parse_paragraph()?;
                        if !parsed.paragraph.is_empty() {
                            cell.paragraphs.push(parsed.paragraph);
                        }
                        for nested in parsed.tables {
                            flatten_into(cell, &nested);
                        }
                    }
                    _ => self.skip_element()?,
                },
                Event::Empty(e) if local_name(&e) == "cellSpan" => {
                    if let Some(rowspan) = get_attr_u32(&e, "rowSpan") {
                        cell.rowspan = rowspan.max(1);
                    }
                    if let Some(colspan) = get_attr_u32(&e, "colSpan") {
                        cell.colspan = colspan.max(1);
                    }
                }
                Event::End(e) if local_name_end(&e) == "tc" => break,
                Event::Eof => break,
                _ => {}
            }
        }

        Ok(())
    }

    /// Skips an element and all its children.
    fn skip_element(&mut self) -> Result<()> {
        let mut depth = 1;

        loop {
            match self.reader.read_event()? {
                Event::Start(_) => depth += 1,
                Event::End(_) => {
                    depth -= 1;
                    if depth == 0 {
                        break;
                    }
                }
                Event::Eof => break,
                _ => {}
            }
        }

        Ok(())
    }
}

/// Appends the character for an empty inline element (`tab`, `lineBreak`).
fn push_inline(e: &BytesStart, paragraph: &mut Paragraph) {
    match local_name(e).as_str() {
        "tab" => paragraph.push('\t'),
        "lineBreak" => paragraph.push('\n'),
        _ => {}
    }
}

fn flatten_into(cell: &mut TableCell, table: &Table) {
    for row in &table.rows {
        for inner in &row.cells {
            cell.paragraphs.extend(inner.paragraphs.iter().cloned());
        }
    }
}

/// Gets the local name of an element (without namespace prefix).
pub(crate) fn local_name(e: &BytesStart) -> String {
    String::from_utf8_lossy(e.local_name().as_ref()).into_owned()
}

pub(crate) fn local_name_end(e: &BytesEnd) -> String {
    String::from_utf8_lossy(e.local_name().as_ref()).into_owned()
}

/// Gets a u32 attribute value by local name.
fn get_attr_u32(e: &BytesStart, name: &str) -> Option<u32> {
    e.attributes()
        .flatten()
        .find(|attr| attr.key.local_name().as_ref() == name.as_bytes())
        .and_then(|attr| std::str::from_utf8(&attr.value).ok()?.parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Block;

    const NS: &str = r#"xmlns:hp="http://www.hancom.co.kr/hwpml/2011/paragraph" xmlns:hs="http://www.hancom.co.kr/hwpml/2011/section""#;

    fn sec(body: &str) -> String {
        format!(r#"<?xml version="1.0" encoding="UTF-8"?><hs:sec {}>{}</hs:sec>"#, NS, body)
    }

    #[test]
    fn test_simple_paragraphs() {
        let xml = sec(
            r#"<hp:p><hp:run><hp:t>첫 번째</hp:t></hp:run></hp:p>
               <hp:p><hp:run><hp:t>A &amp; B</hp:t></hp:run><hp:run><hp:t> 이어짐</hp:t></hp:run></hp:p>"#,
        );
        let section = parse_section(&xml, 0).unwrap();

        assert_eq!(section.content.len(), 2);
        match &section.content[1] {
            Block::Paragraph(p) => assert_eq!(p.text, "A & B 이어짐"),
            other => panic!("expected paragraph, got {:?}", other),
        }
    }

    #[test]
    fn test_tab_and_line_break() {
        let xml = sec(r#"<hp:p><hp:run><hp:t>A<hp:tab/>B<hp:lineBreak/>C</hp:t><hp:tab/></hp:run></hp:p>"#);
        let section = parse_section(&xml, 0).unwrap();

        match &section.content[0] {
            Block::Paragraph(p) => assert_eq!(p.text, "A\tB\nC\t"),
            other => panic!("expected paragraph, got {:?}", other),
        }
    }

    #[test]
    fn test_skips_line_segments_and_controls() {
        let xml = sec(
            r#"<hp:p><hp:run><hp:ctrl><hp:footNote><hp:subList><hp:p><hp:run><hp:t>각주</hp:t></hp:run></hp:p></hp:subList></hp:footNote></hp:ctrl><hp:t>본문</hp:t></hp:run>
               <hp:linesegarray><hp:lineseg textpos="0"/></hp:linesegarray></hp:p>"#,
        );
        let section = parse_section(&xml, 0).unwrap();

        assert_eq!(section.content.len(), 1);
        match &section.content[0] {
            Block::Paragraph(p) => assert_eq!(p.text, "본문"),
            other => panic!("expected paragraph, got {:?}", other),
        }
    }

    #[test]
    fn test_table_in_run_is_lifted_after_paragraph() {
        let xml = sec(
            r#"<hp:p><hp:run><hp:t>표 앞</hp:t><hp:tbl rowCnt="2" colCnt="2">
                 <hp:sz width="100" height="100"/>
                 <hp:tr>
                   <hp:tc><hp:subList><hp:p><hp:run><hp:t>이름</hp:t></hp:run></hp:p></hp:subList><hp:cellSpan colSpan="2" rowSpan="1"/></hp:tc>
                 </hp:tr>
                 <hp:tr>
                   <hp:tc><hp:subList><hp:p><hp:run><hp:t>홍길동</hp:t></hp:run></hp:p></hp:subList></hp:tc>
                   <hp:tc><hp:subList><hp:p><hp:run><hp:t>30</hp:t></hp:run></hp:p></hp:subList></hp:tc>
                 </hp:tr>
               </hp:tbl></hp:run></hp:p>
               <hp:p><hp:run><hp:t>표 뒤</hp:t></hp:run></hp:p>"#,
        );
        let section = parse_section(&xml, 3).unwrap();

        assert_eq!(section.index, 3);
        assert_eq!(section.content.len(), 3);
        assert!(matches!(&section.content[0], Block::Paragraph(p) if p.text == "표 앞"));
        match &section.content[1] {
            Block::Table(t) => {
                assert_eq!(t.row_count(), 2);
                assert_eq!(t.column_count(), 2);
                assert_eq!(t.rows[0].cells[0].colspan, 2);
                assert_eq!(t.get_cell(1, 0).unwrap().plain_text(), "홍길동");
                assert_eq!(t.get_cell(1, 1).unwrap().plain_text(), "30");
            }
            other => panic!("expected table, got {:?}", other),
        }
        assert!(matches!(&section.content[2], Block::Paragraph(p) if p.text == "표 뒤"));
    }

    #[test]
    fn test_table_only_paragraph_is_dropped() {
        let xml = sec(
            r#"<hp:p><hp:run><hp:tbl><hp:tr><hp:tc><hp:subList><hp:p><hp:run><hp:t>x</hp:t></hp:run></hp:p></hp:subList></hp:tc></hp:tr></hp:tbl></hp:run></hp:p>"#,
        );
        let section = parse_section(&xml, 0).unwrap();
        assert_eq!(section.content.len(), 1);
        assert!(matches!(&section.content[0], Block::Table(_)));
    }

    #[test]
    fn test_memo_text_stays_out_of_body() {
        let xml = sec(
            r#"<hp:p><hp:run><hp:ctrl><hp:fieldBegin id="9" type="MEMO"><hp:parameters cnt="1"><hp:stringParam name="MemoID">1</hp:stringParam></hp:parameters></hp:fieldBegin></hp:ctrl></hp:run><hp:run><hp:t>본문</hp:t></hp:run><hp:run><hp:ctrl><hp:fieldEnd beginIDRef="9"/></hp:ctrl></hp:run></hp:p>
               <hp:memogroup><hp:memo id="1"><hp:paraList><hp:p><hp:run><hp:t>메모</hp:t></hp:run></hp:p></hp:paraList></hp:memo></hp:memogroup>"#,
        );
        let section = parse_section(&xml, 0).unwrap();
        assert_eq!(section.content, vec![Block::Paragraph(Paragraph::text("본문"))]);
    }

    #[test]
    fn test_malformed_xml_is_error() {
        let xml = sec("<hp:p><hp:run><hp:t>x</hp:run></hp:p>");
        assert!(parse_section(&xml, 0).is_err());
    }
}
