//! Markdown rendering of the document model.

use crate::model::{Block, Document, Paragraph, Table};

/// Renders a document to a Markdown string.
///
/// Paragraphs are separated by blank lines and keep their line breaks as
/// hard breaks. Tables become pipe tables with the first row as header;
/// tables with merged cells are written as HTML so the spans survive.
pub fn render_document(document: &Document) -> String {
    let mut output = String::new();

    for block in document.blocks() {
        match block {
            Block::Paragraph(para) => render_paragraph(para, &mut output),
            Block::Table(table) => render_table(table, &mut output),
        }
    }

    let trimmed_len = output.trim_end().len();
    output.truncate(trimmed_len);
    if !output.is_empty() {
        output.push('\n');
    }
    output
}

fn render_paragraph(para: &Paragraph, output: &mut String) {
    let text = para.text.trim();
    if text.is_empty() {
        return;
    }

    let lines: Vec<&str> = text.lines().map(str::trim_end).collect();
    output.push_str(&lines.join("  \n"));
    output.push_str("\n\n");
}

fn render_table(table: &Table, output: &mut String) {
    if table.rows.is_empty() {
        return;
    }

    if has_merged_cells(table) {
        render_table_html(table, output);
    } else {
        render_table_markdown(table, output);
    }
}

/// Renders a table as a pipe table with the first row as header.
fn render_table_markdown(table: &Table, output: &mut String) {
    let col_count = table.column_count();

    for (row_idx, row) in table.rows.iter().enumerate() {
        output.push('|');
        for col in 0..col_count {
            let text = row
                .cells
                .get(col)
                .map(|cell| escape_cell(&cell.plain_text()))
                .unwrap_or_default();
            output.push_str(&format!(" {} |", text));
        }
        output.push('\n');

        if row_idx == 0 {
            output.push('|');
            output.push_str(&" --- |".repeat(col_count));
            output.push('\n');
        }
    }

    output.push('\n');
}

/// Renders a table with merged cells as HTML.
fn render_table_html(table: &Table, output: &mut String) {
    output.push_str("<table>\n");

    for (row_idx, row) in table.rows.iter().enumerate() {
        let tag = if row_idx == 0 { "th" } else { "td" };
        output.push_str("  <tr>\n");

        for cell in &row.cells {
            let mut attrs = String::new();
            if cell.rowspan > 1 {
                attrs.push_str(&format!(" rowspan=\"{}\"", cell.rowspan));
            }
            if cell.colspan > 1 {
                attrs.push_str(&format!(" colspan=\"{}\"", cell.colspan));
            }

            let text = escape_html(cell.plain_text().trim()).replace('\n', "<br>");
            output.push_str(&format!("    <{}{}>{}</{}>\n", tag, attrs, text, tag));
        }

        output.push_str("  </tr>\n");
    }

    output.push_str("</table>\n\n");
}

fn has_merged_cells(table: &Table) -> bool {
    table
        .rows
        .iter()
        .flat_map(|row| row.cells.iter())
        .any(|cell| cell.rowspan > 1 || cell.colspan > 1)
}

/// Cell text on one line with pipes escaped.
fn escape_cell(text: &str) -> String {
    text.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .replace('|', "\\|")
}

fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Section, TableCell, TableRow};

    fn doc_with(blocks: Vec<Block>) -> Document {
        let mut doc = Document::new();
        let mut section = Section::new(0);
        section.content = blocks;
        doc.sections.push(section);
        doc
    }

    #[test]
    fn test_render_simple_paragraphs() {
        let doc = doc_with(vec![
            Block::Paragraph(Paragraph::text("Hello, world!")),
            Block::Paragraph(Paragraph::text("   ")),
            Block::Paragraph(Paragraph::text("둘째")),
        ]);
        assert_eq!(render_document(&doc), "Hello, world!\n\n둘째\n");
    }

    #[test]
    fn test_line_breaks_are_hard_breaks() {
        let doc = doc_with(vec![Block::Paragraph(Paragraph::text("a \nb"))]);
        assert_eq!(render_document(&doc), "a  \nb\n");
    }

    #[test]
    fn test_pipe_table() {
        let table = Table::from_grid(&["이름", "비고"], &[vec!["a|b", "x\ny"]]);
        let doc = doc_with(vec![Block::Table(table)]);
        assert_eq!(
            render_document(&doc),
            "| 이름 | 비고 |\n| --- | --- |\n| a\\|b | x y |\n"
        );
    }

    #[test]
    fn test_merged_table_as_html() {
        let mut table = Table::new();
        let mut header = TableRow::new();
        let mut merged = TableCell::text("병합");
        merged.colspan = 2;
        header.cells.push(merged);
        table.rows.push(header);
        let mut body = TableRow::new();
        body.cells.push(TableCell::text("<1>"));
        body.cells.push(TableCell::text("2"));
        table.rows.push(body);
        let doc = doc_with(vec![Block::Table(table)]);

        let html = render_document(&doc);
        assert!(html.starts_with("<table>\n"));
        assert!(html.contains("<th colspan=\"2\">병합</th>"));
        assert!(html.contains("<td>&lt;1&gt;</td>"));
    }

    #[test]
    fn test_empty_document() {
        assert_eq!(render_document(&Document::new()), "");
    }
}
