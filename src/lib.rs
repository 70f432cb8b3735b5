//! # hwpkit
//!
//! Analyze, extract, create, and edit documents of the Hangul word processor.
//!
//! ## Supported Formats
//!
//! - **HWP 5.0+**: Binary format using OLE containers (read and analyze)
//! - **HWPX**: XML-based format using ZIP containers (read, analyze, create, edit)
//!
//! ## Quick Start
//!
//! ```no_run
//! use hwpkit::{DocumentSpec, OutputFormat, ReadOptions};
//!
//! fn main() -> hwpkit::Result<()> {
//!     // Structural report, serialisable to JSON
//!     let analysis = hwpkit::analyze("document.hwp")?;
//!     println!("{}", analysis.to_json_pretty()?);
//!
//!     // Markdown, falling back to plain text extraction
//!     let markdown = hwpkit::read_file("document.hwp", OutputFormat::Markdown, &ReadOptions::default())?;
//!     println!("{}", markdown);
//!
//!     // A new HWPX document
//!     let spec = DocumentSpec::from_markdown("# 보고서\n\n본문입니다.");
//!     hwpkit::create_document(spec, "report.hwpx")?;
//!     Ok(())
//! }
//! ```

pub mod compose;
pub mod detect;
pub mod error;
pub mod external;
pub mod hwp5;
pub mod hwpx;
pub mod model;
pub mod options;
pub mod reader;
pub mod render;

// Re-exports
pub use compose::{DocumentSpec, TableSpec};
pub use detect::{detect_format_from_bytes, detect_format_from_file, FormatType};
pub use error::{Error, Result};
pub use hwpx::{add_memo, add_paragraph, add_table, replace_text};
pub use model::{Analysis, Document, ExtractedText};
pub use options::{ConvertTarget, ErrorMode, OutputFormat, ReadOptions};
pub use reader::{convert, convert_to_file, read_file};
pub use render::{render_html, render_markdown};

use rayon::prelude::*;
use std::path::{Path, PathBuf};

/// Analyzes a document's container, metadata and structure.
///
/// The format is chosen by file extension before the file is opened.
pub fn analyze(path: impl AsRef<Path>) -> Result<Analysis> {
    let path = path.as_ref();
    match FormatType::from_path(path)? {
        FormatType::Hwp5 => hwp5::analyze(path).map(Analysis::Hwp),
        FormatType::Hwpx => hwpx::analyze(path).map(Analysis::Hwpx),
    }
}

/// Analyzes several files in parallel.
///
/// Each file is analyzed independently; results are in input order.
pub fn analyze_many<P: AsRef<Path> + Sync>(paths: &[P]) -> Vec<Result<Analysis>> {
    paths.par_iter().map(analyze).collect()
}

/// Extracts the paragraph text of a document with default options.
pub fn extract_text(path: impl AsRef<Path>) -> Result<ExtractedText> {
    extract_text_with(path, &ReadOptions::default())
}

/// Extracts the paragraph text of a document.
///
/// For binary HWP a section that fails to decompress fails the whole call
/// unless `options` is lenient.
pub fn extract_text_with(path: impl AsRef<Path>, options: &ReadOptions) -> Result<ExtractedText> {
    let path = path.as_ref();
    match FormatType::from_path(path)? {
        FormatType::Hwp5 => hwp5::extract_text(path, options),
        FormatType::Hwpx => hwpx::extract_text(path),
    }
}

/// Parses a document into the document model with default options.
pub fn parse_file(path: impl AsRef<Path>) -> Result<Document> {
    parse_file_with(path, &ReadOptions::default())
}

/// Parses a document into the document model.
pub fn parse_file_with(path: impl AsRef<Path>, options: &ReadOptions) -> Result<Document> {
    let path = path.as_ref();
    match FormatType::from_path(path)? {
        FormatType::Hwp5 => hwp5::parse_document(path, options),
        FormatType::Hwpx => hwpx::parse_document(path),
    }
}

/// Creates an HWPX document and returns the path written.
///
/// `.hwpx` is appended to `output` when missing.
pub fn create_document(spec: DocumentSpec, output: impl AsRef<Path>) -> Result<PathBuf> {
    hwpx::write_document(&spec.into_document(), output)
}
