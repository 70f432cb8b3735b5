//! Paragraph definition.

use serde::Serialize;

/// A paragraph of plain text.
///
/// Line breaks inside the paragraph are kept as `\n`, tabs as `\t`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Paragraph {
    /// The text content
    pub text: String,
}

impl Paragraph {
    /// Creates a new empty paragraph.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a paragraph with the given text.
    pub fn text(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }

    /// Appends text to this paragraph.
    pub fn push_str(&mut self, text: &str) {
        self.text.push_str(text);
    }

    /// Appends a single character to this paragraph.
    pub fn push(&mut self, ch: char) {
        self.text.push(ch);
    }

    /// Returns true if this paragraph has no text at all.
    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    /// Returns true if this paragraph is empty or whitespace only.
    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }
}
