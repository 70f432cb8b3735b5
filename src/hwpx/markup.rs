//! OWPML markup for paragraphs, tables and memos.
//!
//! Shared by package creation and in-place editing. Elements are written with
//! the conventional `hp:` prefix, which every section root declares.

use crate::error::Result;
use crate::model::{Block, Paragraph, Table};
use quick_xml::events::{BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;
use std::io::Write;

/// Usable text width of an A4 page with default margins, in HWPUNIT.
const TEXT_WIDTH: u32 = 42520;

/// Default table row height, in HWPUNIT.
const ROW_HEIGHT: u32 = 1000;

/// Memo shape referenced by new memos; the first one in `header.xml`.
const MEMO_SHAPE: &str = "0";

/// Sequential element ids within one section.
#[derive(Debug, Default)]
pub(crate) struct IdSeq(u32);

impl IdSeq {
    /// Starts numbering after `last`.
    pub fn after(last: u32) -> Self {
        Self(last.saturating_add(1))
    }

    /// Returns the next id.
    pub fn next_id(&mut self) -> String {
        let id = self.0;
        self.0 = self.0.wrapping_add(1);
        id.to_string()
    }
}

/// Opening tag of a body paragraph with the default style references.
pub(crate) fn paragraph_start(ids: &mut IdSeq) -> BytesStart<'static> {
    BytesStart::new("hp:p").with_attributes([
        ("id", ids.next_id().as_str()),
        ("paraPrIDRef", "0"),
        ("styleIDRef", "0"),
        ("pageBreak", "0"),
        ("columnBreak", "0"),
        ("merged", "0"),
    ])
}

/// Opening tag of a run with the default character shape.
pub(crate) fn run_start() -> BytesStart<'static> {
    BytesStart::new("hp:run").with_attributes([("charPrIDRef", "0")])
}

/// Writes a block as one `hp:p` element.
pub(crate) fn write_block<W: Write>(writer: &mut Writer<W>, ids: &mut IdSeq, block: &Block) -> Result<()> {
    match block {
        Block::Paragraph(p) => write_paragraph(writer, ids, &p.text),
        Block::Table(t) => write_table(writer, ids, t),
    }
}

/// Writes a paragraph holding `text`; `\t` and `\n` become `hp:tab` and
/// `hp:lineBreak`.
pub(crate) fn write_paragraph<W: Write>(writer: &mut Writer<W>, ids: &mut IdSeq, text: &str) -> Result<()> {
    writer.write_event(Event::Start(paragraph_start(ids)))?;
    writer.write_event(Event::Start(run_start()))?;
    write_text(writer, text)?;
    writer.write_event(Event::End(BytesEnd::new("hp:run")))?;
    writer.write_event(Event::End(BytesEnd::new("hp:p")))?;
    Ok(())
}

fn write_text<W: Write>(writer: &mut Writer<W>, text: &str) -> Result<()> {
    if text.is_empty() {
        return Ok(());
    }

    writer.write_event(Event::Start(BytesStart::new("hp:t")))?;
    let mut chunk = String::new();
    for ch in text.chars() {
        let inline = match ch {
            '\t' => "hp:tab",
            '\n' => "hp:lineBreak",
            _ => {
                chunk.push(ch);
                continue;
            }
        };
        if !chunk.is_empty() {
            writer.write_event(Event::Text(BytesText::new(&chunk)))?;
            chunk.clear();
        }
        writer.write_event(Event::Empty(BytesStart::new(inline)))?;
    }
    if !chunk.is_empty() {
        writer.write_event(Event::Text(BytesText::new(&chunk)))?;
    }
    writer.write_event(Event::End(BytesEnd::new("hp:t")))?;
    Ok(())
}

/// Writes a table anchored in its own paragraph.
pub(crate) fn write_table<W: Write>(writer: &mut Writer<W>, ids: &mut IdSeq, table: &Table) -> Result<()> {
    let rows = table.row_count();
    let cols = table.column_count().max(1);
    let col_width = TEXT_WIDTH / cols as u32;

    writer.write_event(Event::Start(paragraph_start(ids)))?;
    writer.write_event(Event::Start(run_start()))?;

    let rows_attr = rows.to_string();
    let cols_attr = cols.to_string();
    let table_id = ids.next_id();
    writer.write_event(Event::Start(BytesStart::new("hp:tbl").with_attributes([
        ("id", table_id.as_str()),
        ("zOrder", "0"),
        ("numberingType", "TABLE"),
        ("textWrap", "TOP_AND_BOTTOM"),
        ("pageBreak", "CELL"),
        ("repeatHeader", "1"),
        ("rowCnt", rows_attr.as_str()),
        ("colCnt", cols_attr.as_str()),
        ("cellSpacing", "0"),
        ("borderFillIDRef", "1"),
        ("noAdjust", "0"),
    ])))?;

    let width = (col_width * cols as u32).to_string();
    let height = (ROW_HEIGHT * rows as u32).to_string();
    writer.write_event(Event::Empty(BytesStart::new("hp:sz").with_attributes([
        ("width", width.as_str()),
        ("widthRelTo", "ABSOLUTE"),
        ("height", height.as_str()),
        ("heightRelTo", "ABSOLUTE"),
        ("protect", "0"),
    ])))?;

    let cell_width = col_width.to_string();
    let cell_height = ROW_HEIGHT.to_string();
    for (row_index, row) in table.rows.iter().enumerate() {
        writer.write_event(Event::Start(BytesStart::new("hp:tr")))?;
        for (col_index, cell) in row.cells.iter().enumerate() {
            writer.write_event(Event::Start(BytesStart::new("hp:tc").with_attributes([
                ("header", if row_index == 0 { "1" } else { "0" }),
                ("hasMargin", "0"),
                ("protect", "0"),
                ("editable", "0"),
                ("dirty", "0"),
                ("borderFillIDRef", "1"),
            ])))?;
            writer.write_event(Event::Start(BytesStart::new("hp:subList").with_attributes([
                ("textDirection", "HORIZONTAL"),
                ("lineWrap", "BREAK"),
                ("vertAlign", "CENTER"),
            ])))?;

            if cell.paragraphs.is_empty() {
                write_paragraph(writer, ids, "")?;
            }
            for Paragraph { text } in &cell.paragraphs {
                write_paragraph(writer, ids, text)?;
            }

            writer.write_event(Event::End(BytesEnd::new("hp:subList")))?;

            let col_addr = col_index.to_string();
            let row_addr = row_index.to_string();
            let colspan = cell.colspan.to_string();
            let rowspan = cell.rowspan.to_string();
            writer.write_event(Event::Empty(BytesStart::new("hp:cellAddr").with_attributes([
                ("colAddr", col_addr.as_str()),
                ("rowAddr", row_addr.as_str()),
            ])))?;
            writer.write_event(Event::Empty(BytesStart::new("hp:cellSpan").with_attributes([
                ("colSpan", colspan.as_str()),
                ("rowSpan", rowspan.as_str()),
            ])))?;
            writer.write_event(Event::Empty(BytesStart::new("hp:cellSz").with_attributes([
                ("width", cell_width.as_str()),
                ("height", cell_height.as_str()),
            ])))?;
            writer.write_event(Event::End(BytesEnd::new("hp:tc")))?;
        }
        writer.write_event(Event::End(BytesEnd::new("hp:tr")))?;
    }

    writer.write_event(Event::End(BytesEnd::new("hp:tbl")))?;
    writer.write_event(Event::End(BytesEnd::new("hp:run")))?;
    writer.write_event(Event::End(BytesEnd::new("hp:p")))?;
    Ok(())
}

/// Writes the run that opens the memo field `field_id` for memo `memo_id`.
pub(crate) fn write_memo_field_begin<W: Write>(writer: &mut Writer<W>, field_id: &str, memo_id: &str) -> Result<()> {
    writer.write_event(Event::Start(run_start()))?;
    writer.write_event(Event::Start(BytesStart::new("hp:ctrl")))?;
    writer.write_event(Event::Start(BytesStart::new("hp:fieldBegin").with_attributes([
        ("id", field_id),
        ("type", "MEMO"),
        ("name", ""),
        ("editable", "true"),
        ("dirty", "false"),
        ("zorder", "-1"),
        ("fieldid", field_id),
    ])))?;
    writer.write_event(Event::Start(
        BytesStart::new("hp:parameters").with_attributes([("cnt", "2"), ("name", "")]),
    ))?;
    for (name, value) in [("MemoID", memo_id), ("MemoShapeIDRef", MEMO_SHAPE)] {
        writer.write_event(Event::Start(
            BytesStart::new("hp:stringParam").with_attributes([("name", name)]),
        ))?;
        writer.write_event(Event::Text(BytesText::new(value)))?;
        writer.write_event(Event::End(BytesEnd::new("hp:stringParam")))?;
    }
    writer.write_event(Event::End(BytesEnd::new("hp:parameters")))?;
    writer.write_event(Event::End(BytesEnd::new("hp:fieldBegin")))?;
    writer.write_event(Event::End(BytesEnd::new("hp:ctrl")))?;
    writer.write_event(Event::End(BytesEnd::new("hp:run")))?;
    Ok(())
}

/// Writes the run that closes the memo field `field_id`.
pub(crate) fn write_memo_field_end<W: Write>(writer: &mut Writer<W>, field_id: &str) -> Result<()> {
    writer.write_event(Event::Start(run_start()))?;
    writer.write_event(Event::Start(BytesStart::new("hp:ctrl")))?;
    writer.write_event(Event::Empty(
        BytesStart::new("hp:fieldEnd").with_attributes([("beginIDRef", field_id), ("fieldid", field_id)]),
    ))?;
    writer.write_event(Event::End(BytesEnd::new("hp:ctrl")))?;
    writer.write_event(Event::End(BytesEnd::new("hp:run")))?;
    Ok(())
}

/// Writes one `hp:memo` whose body is a paragraph holding `text`.
pub(crate) fn write_memo<W: Write>(writer: &mut Writer<W>, ids: &mut IdSeq, memo_id: &str, text: &str) -> Result<()> {
    writer.write_event(Event::Start(
        BytesStart::new("hp:memo").with_attributes([("id", memo_id), ("memoShapeIDRef", MEMO_SHAPE)]),
    ))?;
    writer.write_event(Event::Start(BytesStart::new("hp:paraList")))?;
    write_paragraph(writer, ids, text)?;
    writer.write_event(Event::End(BytesEnd::new("hp:paraList")))?;
    writer.write_event(Event::End(BytesEnd::new("hp:memo")))?;
    Ok(())
}

/// Writes a `hp:memogroup` holding a single memo.
pub(crate) fn write_memo_group<W: Write>(writer: &mut Writer<W>, ids: &mut IdSeq, memo_id: &str, text: &str) -> Result<()> {
    writer.write_event(Event::Start(BytesStart::new("hp:memogroup")))?;
    write_memo(writer, ids, memo_id, text)?;
    writer.write_event(Event::End(BytesEnd::new("hp:memogroup")))?;
    Ok(())
}
