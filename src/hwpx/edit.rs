//! In-place editing of HWPX packages.
//!
//! Section XML is streamed through a `quick-xml` reader and writer so
//! untouched markup is reproduced as read. Entries that are not rewritten are
//! copied without recompression, and entry order is kept, so `mimetype`
//! stays first.

use super::container::HwpxContainer;
use super::markup::{self, IdSeq};
use super::ns;
use super::section::{local_name, local_name_end};
use crate::compose::TableSpec;
use crate::error::{Error, Result};
use crate::model::{Block, Paragraph};
use quick_xml::events::{BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};
use std::collections::HashMap;
use std::io::{Cursor, Write};
use std::path::Path;
use zip::write::SimpleFileOptions;
use zip::ZipWriter;

/// Replaces every occurrence of `find` in the text nodes of every section.
///
/// Matching is done within a single `hp:t` element; text split across runs
/// is not matched. Returns the number of replacements made.
pub fn replace_text(
    input: impl AsRef<Path>,
    output: impl AsRef<Path>,
    find: &str,
    replace: &str,
) -> Result<usize> {
    if find.is_empty() {
        return Err(Error::InvalidData("search text must not be empty".to_string()));
    }

    let mut container = HwpxContainer::open(input)?;
    let mut rewritten = HashMap::new();
    let mut total = 0;

    for name in container.section_names() {
        let xml = container.read_file_lossy(&name)?;
        let (updated, count) = replace_in_section(&xml, find, replace)?;
        if count > 0 {
            tracing::debug!(section = %name, count, "replaced text");
            total += count;
            rewritten.insert(name, updated);
        }
    }

    save(&mut container, &rewritten, output.as_ref())?;
    Ok(total)
}

/// Appends a paragraph to the end of the first section.
pub fn add_paragraph(input: impl AsRef<Path>, output: impl AsRef<Path>, text: &str) -> Result<()> {
    append_blocks(input, output, &[Block::Paragraph(Paragraph::text(text))])
}

/// Appends a table to the end of the first section.
pub fn add_table(input: impl AsRef<Path>, output: impl AsRef<Path>, table: &TableSpec) -> Result<()> {
    let table = table
        .to_table()
        .ok_or_else(|| Error::InvalidData("table has no columns".to_string()))?;
    append_blocks(input, output, &[Block::Table(table)])
}

/// Adds a memo holding `text`, anchored to paragraph `para_index`.
///
/// Paragraphs are the top-level `hp:p` elements of every section in reading
/// order. The memo body goes into the anchor section's `hp:memogroup`. An
/// index past the last paragraph writes the package unchanged and returns
/// `false`.
pub fn add_memo(
    input: impl AsRef<Path>,
    output: impl AsRef<Path>,
    text: &str,
    para_index: usize,
) -> Result<bool> {
    let mut container = HwpxContainer::open(input)?;
    let mut rewritten = HashMap::new();
    let mut remaining = para_index;

    for name in container.section_names() {
        let xml = container.read_file_lossy(&name)?;
        let count = top_level_paragraphs(&xml);
        if remaining < count {
            let updated = anchor_memo(&xml, remaining, text)?;
            tracing::debug!(section = %name, paragraph = remaining, "anchored memo");
            rewritten.insert(name, updated);
            break;
        }
        remaining -= count;
    }

    let anchored = !rewritten.is_empty();
    if !anchored {
        tracing::warn!(para_index, "no paragraph at index; memo not added");
    }
    save(&mut container, &rewritten, output.as_ref())?;
    Ok(anchored)
}

/// Appends blocks to the end of the first section.
pub fn append_blocks(input: impl AsRef<Path>, output: impl AsRef<Path>, blocks: &[Block]) -> Result<()> {
    let mut container = HwpxContainer::open(input)?;
    let first = container
        .section_names()
        .into_iter()
        .next()
        .ok_or_else(|| Error::MissingComponent("Contents/section*.xml".to_string()))?;

    let xml = container.read_file_lossy(&first)?;
    let updated = append_to_section(&xml, blocks)?;

    let rewritten = HashMap::from([(first, updated)]);
    save(&mut container, &rewritten, output.as_ref())
}

fn replace_in_section(xml: &str, find: &str, replace: &str) -> Result<(Vec<u8>, usize)> {
    let mut reader = Reader::from_str(xml);
    let mut writer = Writer::new(Cursor::new(Vec::new()));
    let mut text_depth = 0usize;
    let mut count = 0;

    loop {
        match reader.read_event()? {
            Event::Eof => break,
            Event::Start(e) => {
                if local_name(&e) == "t" {
                    text_depth += 1;
                }
                writer.write_event(Event::Start(e))?;
            }
            Event::End(e) => {
                if local_name_end(&e) == "t" {
                    text_depth = text_depth.saturating_sub(1);
                }
                writer.write_event(Event::End(e))?;
            }
            Event::Text(e) if text_depth > 0 => {
                let replaced = match e.unescape() {
                    Ok(text) if text.contains(find) => {
                        count += text.matches(find).count();
                        Some(text.replace(find, replace))
                    }
                    _ => None,
                };
                match replaced {
                    Some(text) => writer.write_event(Event::Text(BytesText::new(&text)))?,
                    None => writer.write_event(Event::Text(e))?,
                }
            }
            event => writer.write_event(event)?,
        }
    }

    Ok((writer.into_inner().into_inner(), count))
}

fn append_to_section(xml: &str, blocks: &[Block]) -> Result<Vec<u8>> {
    let mut ids = paragraph_ids(xml);

    let mut reader = Reader::from_str(xml);
    let mut writer = Writer::new(Cursor::new(Vec::new()));
    let mut depth = 0usize;

    loop {
        match reader.read_event()? {
            Event::Eof => break,
            Event::Start(e) => {
                let e = if depth == 0 { with_paragraph_ns(e) } else { e };
                depth += 1;
                writer.write_event(Event::Start(e))?;
            }
            Event::End(e) => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    write_blocks(&mut writer, &mut ids, blocks)?;
                }
                writer.write_event(Event::End(e))?;
            }
            Event::Empty(e) if depth == 0 => {
                // Childless root: open it so the blocks have a parent.
                let root = with_paragraph_ns(e);
                let end = root.to_end().into_owned();
                writer.write_event(Event::Start(root))?;
                write_blocks(&mut writer, &mut ids, blocks)?;
                writer.write_event(Event::End(end))?;
            }
            event => writer.write_event(event)?,
        }
    }

    Ok(writer.into_inner().into_inner())
}

fn write_blocks<W: Write>(writer: &mut Writer<W>, ids: &mut IdSeq, blocks: &[Block]) -> Result<()> {
    for block in blocks {
        markup::write_block(writer, ids, block)?;
    }
    Ok(())
}

/// Declares the `hp` prefix on the section root when it is missing.
fn with_paragraph_ns(root: BytesStart<'_>) -> BytesStart<'static> {
    let declared = root
        .attributes()
        .flatten()
        .any(|attr| attr.key.as_ref() == b"xmlns:hp");
    let mut root = root.into_owned();
    if !declared {
        root.push_attribute(("xmlns:hp", ns::HP));
    }
    root
}

/// Largest numeric `id` on an element named `name`.
fn max_element_id(xml: &str, name: &str) -> Option<u32> {
    let mut reader = Reader::from_str(xml);
    let mut max = None;

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) | Ok(Event::Empty(e)) if local_name(&e) == name => {
                let id = e
                    .attributes()
                    .flatten()
                    .find(|attr| attr.key.local_name().as_ref() == b"id")
                    .and_then(|attr| String::from_utf8_lossy(&attr.value).parse::<u32>().ok());
                if let Some(id) = id {
                    max = max.max(Some(id));
                }
            }
            Ok(Event::Eof) | Err(_) => break,
            _ => {}
        }
    }

    max
}

/// Paragraph ids continuing after the largest one in the section.
fn paragraph_ids(xml: &str) -> IdSeq {
    match max_element_id(xml, "p") {
        Some(last) => IdSeq::after(last),
        None => IdSeq::default(),
    }
}

/// Number of `p` elements directly under the section root.
fn top_level_paragraphs(xml: &str) -> usize {
    let mut reader = Reader::from_str(xml);
    let mut depth = 0usize;
    let mut count = 0;

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => {
                if depth == 1 && local_name(&e) == "p" {
                    count += 1;
                }
                depth += 1;
            }
            Ok(Event::Empty(e)) if depth == 1 && local_name(&e) == "p" => count += 1,
            Ok(Event::End(_)) => depth = depth.saturating_sub(1),
            Ok(Event::Eof) | Err(_) => break,
            _ => {}
        }
    }

    count
}

/// Progress of the memo field inside the anchor paragraph.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    Pending,
    Open,
    Closed,
}

/// Wraps the runs of top-level paragraph `index` in a memo field and adds
/// the memo to the section's memo group, creating the group when missing.
fn anchor_memo(xml: &str, index: usize, text: &str) -> Result<Vec<u8>> {
    let mut ids = paragraph_ids(xml);
    let memo_id = next_id_after(max_element_id(xml, "memo"));
    let field_id = next_id_after(max_element_id(xml, "fieldBegin"));

    let mut reader = Reader::from_str(xml);
    let mut writer = Writer::new(Cursor::new(Vec::new()));
    let mut depth = 0usize;
    let mut paragraphs = 0usize;
    let mut field: Option<Field> = None;
    let mut memo_written = false;

    loop {
        match reader.read_event()? {
            Event::Eof => break,
            Event::Start(e) => {
                let e = if depth == 0 { with_paragraph_ns(e) } else { e };
                if depth == 1 && local_name(&e) == "p" {
                    if paragraphs == index {
                        field = Some(Field::Pending);
                    }
                    paragraphs += 1;
                } else if depth == 2 {
                    if let Some(state) = field.as_mut() {
                        advance_field(&mut writer, state, local_name(&e) == "run", &field_id, &memo_id)?;
                    }
                }
                depth += 1;
                writer.write_event(Event::Start(e))?;
            }
            Event::Empty(e) => {
                if depth == 1 && local_name(&e) == "p" {
                    let anchor = paragraphs == index;
                    paragraphs += 1;
                    if anchor {
                        // Childless anchor: open it so the field has a place.
                        let para = e.into_owned();
                        let end = para.to_end().into_owned();
                        writer.write_event(Event::Start(para))?;
                        markup::write_memo_field_begin(&mut writer, &field_id, &memo_id)?;
                        markup::write_memo_field_end(&mut writer, &field_id)?;
                        writer.write_event(Event::End(end))?;
                        continue;
                    }
                }
                if depth == 1 && local_name(&e) == "memogroup" && !memo_written {
                    let group = e.into_owned();
                    let end = group.to_end().into_owned();
                    writer.write_event(Event::Start(group))?;
                    markup::write_memo(&mut writer, &mut ids, &memo_id, text)?;
                    writer.write_event(Event::End(end))?;
                    memo_written = true;
                    continue;
                }
                if depth == 2 {
                    if let Some(state) = field.as_mut() {
                        advance_field(&mut writer, state, local_name(&e) == "run", &field_id, &memo_id)?;
                    }
                }
                writer.write_event(Event::Empty(e))?;
            }
            Event::End(e) => {
                depth = depth.saturating_sub(1);
                if depth == 1 {
                    if let Some(state) = field.take() {
                        if state == Field::Pending {
                            markup::write_memo_field_begin(&mut writer, &field_id, &memo_id)?;
                        }
                        if state != Field::Closed {
                            markup::write_memo_field_end(&mut writer, &field_id)?;
                        }
                    } else if local_name_end(&e) == "memogroup" && !memo_written {
                        markup::write_memo(&mut writer, &mut ids, &memo_id, text)?;
                        memo_written = true;
                    }
                } else if depth == 0 && !memo_written {
                    markup::write_memo_group(&mut writer, &mut ids, &memo_id, text)?;
                    memo_written = true;
                }
                writer.write_event(Event::End(e))?;
            }
            event => writer.write_event(event)?,
        }
    }

    Ok(writer.into_inner().into_inner())
}

/// Opens the field before the first child of the anchor paragraph and closes
/// it before the first child that is not a run.
fn advance_field<W: Write>(
    writer: &mut Writer<W>,
    state: &mut Field,
    is_run: bool,
    field_id: &str,
    memo_id: &str,
) -> Result<()> {
    if *state == Field::Pending {
        markup::write_memo_field_begin(writer, field_id, memo_id)?;
        *state = Field::Open;
    }
    if *state == Field::Open && !is_run {
        markup::write_memo_field_end(writer, field_id)?;
        *state = Field::Closed;
    }
    Ok(())
}

fn next_id_after(last: Option<u32>) -> String {
    last.map_or(1, |id| id.saturating_add(1)).to_string()
}

/// Writes the package to `output`, substituting rewritten entries.
///
/// The whole archive is assembled in memory first, so `output` may be the
/// input path.
fn save(container: &mut HwpxContainer, rewritten: &HashMap<String, Vec<u8>>, output: &Path) -> Result<()> {
    let archive = container.archive();
    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));

    for i in 0..archive.len() {
        let file = archive.by_index_raw(i)?;
        match rewritten.get(file.name()) {
            Some(data) => {
                let name = file.name().to_string();
                let options = SimpleFileOptions::default().compression_method(file.compression());
                drop(file);
                zip.start_file(name, options)?;
                zip.write_all(data)?;
            }
            None => zip.raw_copy_file(file)?,
        }
    }

    let bytes = zip.finish()?.into_inner();
    if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(output, bytes)?;

    tracing::debug!(path = %output.display(), entries = archive.len(), "wrote edited HWPX package");
    Ok(())
}
