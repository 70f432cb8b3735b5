//! Structured input for creating HWPX documents.
//!
//! A [`DocumentSpec`] is what the `create` command accepts: a title, an
//! author, plain paragraphs and simple header-plus-rows tables. It can be
//! read from JSON, from plain text (one paragraph per line) or from Markdown.

use crate::error::Result;
use crate::model::{Document, Paragraph, Section, Table};
use pulldown_cmark::{Event, Options, Parser, Tag, TagEnd};
use serde::{Deserialize, Deserializer, Serialize};

/// Content of a document to create.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DocumentSpec {
    /// Title, written as the first paragraph and as package metadata
    pub title: String,
    /// Author, written as package metadata
    pub author: String,
    /// Body paragraphs in order
    pub paragraphs: Vec<String>,
    /// Tables, placed after the paragraphs
    pub tables: Vec<TableSpec>,
}

/// A table given as a header row and body rows.
///
/// Cells may be given as JSON strings, numbers or booleans.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TableSpec {
    #[serde(deserialize_with = "deserialize_row")]
    pub headers: Vec<String>,
    #[serde(deserialize_with = "deserialize_rows")]
    pub rows: Vec<Vec<String>>,
}

impl DocumentSpec {
    /// Creates an empty spec with a title and author.
    pub fn new(title: impl Into<String>, author: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            author: author.into(),
            ..Self::default()
        }
    }

    /// Parses a JSON spec (`{"title", "author", "paragraphs", "tables"}`).
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// One paragraph per non-blank line of `text`.
    pub fn from_body(text: &str) -> Self {
        Self {
            paragraphs: text
                .lines()
                .filter(|line| !line.trim().is_empty())
                .map(str::to_string)
                .collect(),
            ..Self::default()
        }
    }

    /// Reads Markdown into paragraphs and tables.
    ///
    /// Headings, list items and each line of a paragraph become plain
    /// paragraphs with emphasis markers dropped. Pipe tables become tables.
    pub fn from_markdown(markdown: &str) -> Self {
        let mut collector = MarkdownCollector::default();
        for event in Parser::new_ext(markdown, Options::ENABLE_TABLES | Options::ENABLE_STRIKETHROUGH) {
            collector.handle(event);
        }
        collector.flush();

        Self {
            paragraphs: collector.paragraphs,
            tables: collector.tables,
            ..Self::default()
        }
    }

    /// Fills the title when none was given.
    pub fn with_default_title(mut self, title: &str) -> Self {
        if self.title.trim().is_empty() {
            self.title = title.to_string();
        }
        self
    }

    /// Fills the author when none was given.
    pub fn with_default_author(mut self, author: &str) -> Self {
        if self.author.trim().is_empty() {
            self.author = author.to_string();
        }
        self
    }

    /// Builds the single-section document: title first, then the non-blank
    /// paragraphs trimmed, then the tables.
    pub fn into_document(self) -> Document {
        let mut document = Document::new();
        let mut section = Section::new(0);

        let title = self.title.trim();
        if !title.is_empty() {
            document.metadata.title = Some(title.to_string());
            section.push_paragraph(Paragraph::text(title));
        }
        let author = self.author.trim();
        if !author.is_empty() {
            document.metadata.author = Some(author.to_string());
        }

        for text in &self.paragraphs {
            let text = text.trim();
            if !text.is_empty() {
                section.push_paragraph(Paragraph::text(text));
            }
        }

        for spec in &self.tables {
            match spec.to_table() {
                Some(table) => section.push_table(table),
                None => tracing::warn!("Skipping table without columns"),
            }
        }

        document.sections.push(section);
        document
    }
}

impl TableSpec {
    /// Creates a table spec.
    pub fn new(headers: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        Self { headers, rows }
    }

    /// Returns the header row, naming columns `Col1..ColN` after the first
    /// body row when no headers were given.
    pub fn effective_headers(&self) -> Vec<String> {
        if !self.headers.is_empty() {
            return self.headers.clone();
        }
        let width = self.rows.first().map_or(0, Vec::len);
        (1..=width).map(|i| format!("Col{}", i)).collect()
    }

    /// Converts to a model table, or `None` when there are no columns.
    ///
    /// Body cells beyond the header width are dropped.
    pub fn to_table(&self) -> Option<Table> {
        let headers = self.effective_headers();
        if headers.is_empty() {
            return None;
        }
        Some(Table::from_grid(&headers, &self.rows))
    }
}

fn cell_to_string(value: serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s,
        serde_json::Value::Null => String::new(),
        other => other.to_string(),
    }
}

fn deserialize_row<'de, D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Vec<String>, D::Error> {
    let values = Vec::<serde_json::Value>::deserialize(deserializer)?;
    Ok(values.into_iter().map(cell_to_string).collect())
}

fn deserialize_rows<'de, D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Vec<Vec<String>>, D::Error> {
    let rows = Vec::<Vec<serde_json::Value>>::deserialize(deserializer)?;
    Ok(rows
        .into_iter()
        .map(|row| row.into_iter().map(cell_to_string).collect())
        .collect())
}

#[derive(Default)]
struct MarkdownCollector {
    paragraphs: Vec<String>,
    tables: Vec<TableSpec>,
    text: String,
    in_code_block: bool,
    table: Option<TableSpec>,
    row: Vec<String>,
}

impl MarkdownCollector {
    fn handle(&mut self, event: Event<'_>) {
        match event {
            Event::Start(Tag::Table(_)) => {
                self.flush();
                self.table = Some(TableSpec::default());
            }
            Event::End(TagEnd::Table) => {
                if let Some(table) = self.table.take() {
                    self.tables.push(table);
                }
            }
            Event::End(TagEnd::TableCell) => {
                self.row.push(std::mem::take(&mut self.text).trim().to_string());
            }
            Event::End(TagEnd::TableHead) => {
                if let Some(table) = self.table.as_mut() {
                    table.headers = std::mem::take(&mut self.row);
                }
            }
            Event::End(TagEnd::TableRow) => {
                if let Some(table) = self.table.as_mut() {
                    table.rows.push(std::mem::take(&mut self.row));
                }
            }
            Event::Start(Tag::CodeBlock(_)) => {
                self.flush();
                self.in_code_block = true;
            }
            Event::End(TagEnd::CodeBlock) => self.in_code_block = false,
            Event::Start(Tag::List(_)) | Event::Start(Tag::Item) => self.flush(),
            Event::End(TagEnd::Paragraph)
            | Event::End(TagEnd::Heading(_))
            | Event::End(TagEnd::Item)
            | Event::SoftBreak
            | Event::HardBreak => self.flush(),
            Event::Text(text) if self.in_code_block => {
                self.paragraphs.extend(
                    text.lines()
                        .filter(|line| !line.trim().is_empty())
                        .map(|line| line.trim().to_string()),
                );
            }
            Event::Text(text) | Event::Code(text) => self.text.push_str(&text),
            _ => {}
        }
    }

    fn flush(&mut self) {
        if self.table.is_some() {
            return;
        }
        let text = std::mem::take(&mut self.text);
        let text = text.trim();
        if !text.is_empty() {
            self.paragraphs.push(text.to_string());
        }
    }
}
