//! Markdown and HTML rendering for documents.

mod html;
mod markdown;

pub use html::markdown_to_html_page;

use crate::model::Document;

/// Renders a document to Markdown.
pub fn render_markdown(document: &Document) -> String {
    markdown::render_document(document)
}

/// Renders a document to a standalone HTML page.
///
/// When `title` is `None` the document title is used, then `"Document"`.
pub fn render_html(document: &Document, title: Option<&str>) -> String {
    let title = title
        .or(document.metadata.title.as_deref())
        .unwrap_or("Document");
    markdown_to_html_page(&render_markdown(document), title)
}
