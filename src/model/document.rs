//! Document structure and metadata.

use super::{Paragraph, Table};
use serde::Serialize;

/// A complete document read from HWP/HWPX or composed for writing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Document {
    /// Document metadata
    pub metadata: Metadata,
    /// Document sections
    pub sections: Vec<Section>,
}

impl Document {
    /// Creates a new empty document.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the total number of top-level paragraphs in the document.
    pub fn paragraph_count(&self) -> usize {
        self.paragraphs().count()
    }

    /// Returns the total number of tables in the document.
    pub fn table_count(&self) -> usize {
        self.blocks()
            .filter(|b| matches!(b, Block::Table(_)))
            .count()
    }

    /// Returns an iterator over all blocks in section order.
    pub fn blocks(&self) -> impl Iterator<Item = &Block> {
        self.sections.iter().flat_map(|s| s.content.iter())
    }

    /// Returns an iterator over all top-level paragraphs in the document.
    pub fn paragraphs(&self) -> impl Iterator<Item = &Paragraph> {
        self.blocks().filter_map(|b| match b {
            Block::Paragraph(p) => Some(p),
            _ => None,
        })
    }

    /// Returns the plain text content of the entire document.
    ///
    /// Non-blank paragraphs and table cells are trimmed and joined with `\n`.
    pub fn plain_text(&self) -> String {
        let mut lines = Vec::new();
        for block in self.blocks() {
            match block {
                Block::Paragraph(p) => lines.push(p.text.trim().to_string()),
                Block::Table(t) => {
                    for row in &t.rows {
                        for cell in &row.cells {
                            lines.push(cell.plain_text().trim().to_string());
                        }
                    }
                }
            }
        }
        lines.retain(|line| !line.is_empty());
        lines.join("\n")
    }

    /// Returns the first section, creating it when the document is empty.
    pub fn first_section_mut(&mut self) -> &mut Section {
        if self.sections.is_empty() {
            self.sections.push(Section::new(0));
        }
        &mut self.sections[0]
    }
}

/// Document metadata.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Metadata {
    /// Document title
    pub title: Option<String>,
    /// Document author
    pub author: Option<String>,
    /// HWP/HWPX version
    pub format_version: Option<String>,
}

/// A section of the document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Section {
    /// Section index (0-based)
    pub index: usize,
    /// Content blocks in this section
    pub content: Vec<Block>,
}

impl Section {
    /// Creates a new empty section.
    pub fn new(index: usize) -> Self {
        Self {
            index,
            content: Vec::new(),
        }
    }

    /// Adds a paragraph to this section.
    pub fn push_paragraph(&mut self, paragraph: Paragraph) {
        self.content.push(Block::Paragraph(paragraph));
    }

    /// Adds a table to this section.
    pub fn push_table(&mut self, table: Table) {
        self.content.push(Block::Table(table));
    }
}

/// A block-level content element.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum Block {
    /// A paragraph
    Paragraph(Paragraph),
    /// A table
    Table(Table),
}
