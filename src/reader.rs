//! Reading and converting with a fallback chain of text extractors.
//!
//! Text is taken from the first strategy that yields any. The native parsers
//! come first; an external `hwp5txt` converter can follow for binary HWP files
//! the native parser cannot read.

use crate::detect::FormatType;
use crate::error::{Error, Result};
use crate::external::run_converter;
use crate::options::{ConvertTarget, OutputFormat, ReadOptions};
use crate::render::{markdown_to_html_page, render_markdown};
use crate::{hwp5, hwpx};
use std::path::{Path, PathBuf};

/// One way of getting plain text out of a document.
pub trait TextStrategy: Send + Sync {
    /// Name used in logs and failure reports.
    fn name(&self) -> &'static str;

    /// Whether this strategy can handle the format at all.
    fn applies_to(&self, format: FormatType) -> bool;

    /// Extracts the document text.
    fn extract(&self, path: &Path, options: &ReadOptions) -> Result<String>;
}

/// The native binary HWP record parser.
#[derive(Debug, Default)]
pub struct NativeHwp;

impl TextStrategy for NativeHwp {
    fn name(&self) -> &'static str {
        "hwp5 record parser"
    }

    fn applies_to(&self, format: FormatType) -> bool {
        format == FormatType::Hwp5
    }

    fn extract(&self, path: &Path, options: &ReadOptions) -> Result<String> {
        Ok(hwp5::extract_text(path, options)?.joined())
    }
}

/// The native HWPX XML parser.
#[derive(Debug, Default)]
pub struct NativeHwpx;

impl TextStrategy for NativeHwpx {
    fn name(&self) -> &'static str {
        "hwpx parser"
    }

    fn applies_to(&self, format: FormatType) -> bool {
        format == FormatType::Hwpx
    }

    fn extract(&self, path: &Path, _options: &ReadOptions) -> Result<String> {
        Ok(hwpx::extract_text(path)?.joined())
    }
}

/// The external `hwp5txt` converter, for binary HWP only.
#[derive(Debug, Default)]
pub struct Hwp5Txt;

impl TextStrategy for Hwp5Txt {
    fn name(&self) -> &'static str {
        "hwp5txt"
    }

    fn applies_to(&self, format: FormatType) -> bool {
        format == FormatType::Hwp5
    }

    fn extract(&self, path: &Path, options: &ReadOptions) -> Result<String> {
        run_converter(
            &options.hwp5txt_command,
            &[path.as_os_str()],
            options.converter_timeout,
        )
    }
}

/// The strategies tried for `options`, in order.
pub fn default_strategies(options: &ReadOptions) -> Vec<Box<dyn TextStrategy>> {
    let mut strategies: Vec<Box<dyn TextStrategy>> = vec![Box::new(NativeHwp), Box::new(NativeHwpx)];
    if options.external_converters {
        strategies.push(Box::new(Hwp5Txt));
    }
    strategies
}

/// Runs `strategies` in order and returns the first non-blank text.
///
/// When every applicable strategy either fails or finds no text, the blank
/// result of the first that succeeded is returned. With no success at all the
/// failures are reported together.
pub fn extract_with(
    path: &Path,
    format: FormatType,
    strategies: &[Box<dyn TextStrategy>],
    options: &ReadOptions,
) -> Result<String> {
    let mut attempts = Vec::new();
    let mut blank = None;

    for strategy in strategies.iter().filter(|s| s.applies_to(format)) {
        match strategy.extract(path, options) {
            Ok(text) if !text.trim().is_empty() => {
                tracing::debug!(strategy = strategy.name(), "extracted text");
                return Ok(text);
            }
            Ok(text) => {
                tracing::info!(strategy = strategy.name(), "no text found, trying next");
                blank.get_or_insert(text);
            }
            Err(e) => {
                tracing::warn!(strategy = strategy.name(), "extraction failed: {}", e);
                attempts.push(format!("{}: {}", strategy.name(), e));
            }
        }
    }

    blank.ok_or_else(|| Error::AllStrategiesFailed {
        path: path.to_path_buf(),
        attempts,
    })
}

/// Extracts plain text through the default fallback chain.
pub fn extract_text_with_fallback(path: impl AsRef<Path>, options: &ReadOptions) -> Result<String> {
    let path = path.as_ref();
    let format = FormatType::from_path(path)?;
    extract_with(path, format, &default_strategies(options), options)
}

/// Markdown for the document, or the fallback chain's plain text when the
/// document cannot be parsed or renders empty.
fn markdown_content(path: &Path, options: &ReadOptions) -> Result<String> {
    match crate::parse_file_with(path, options) {
        Ok(document) => {
            let markdown = render_markdown(&document);
            if !markdown.trim().is_empty() {
                return Ok(markdown);
            }
            tracing::info!(path = %path.display(), "document rendered empty, using plain text");
        }
        Err(e @ Error::UnsupportedExtension(_)) => return Err(e),
        Err(e) => tracing::warn!(path = %path.display(), "parse failed, using plain text: {}", e),
    }
    extract_text_with_fallback(path, options)
}

/// Reads a document in the requested output format.
///
/// `Json` wraps the Markdown content as `{"source": path, "content": ...}`.
pub fn read_file(path: impl AsRef<Path>, format: OutputFormat, options: &ReadOptions) -> Result<String> {
    let path = path.as_ref();
    FormatType::from_path(path)?;

    match format {
        OutputFormat::Markdown => markdown_content(path, options),
        OutputFormat::Text => extract_text_with_fallback(path, options),
        OutputFormat::Json => {
            let content = markdown_content(path, options)?;
            let envelope = serde_json::json!({
                "source": path.display().to_string(),
                "content": content,
            });
            Ok(serde_json::to_string_pretty(&envelope)?)
        }
    }
}

/// Converts a document to Markdown, a standalone HTML page, or plain text.
///
/// The HTML page is titled with the file name.
pub fn convert(path: impl AsRef<Path>, target: ConvertTarget, options: &ReadOptions) -> Result<String> {
    let path = path.as_ref();
    FormatType::from_path(path)?;

    match target {
        ConvertTarget::Markdown => markdown_content(path, options),
        ConvertTarget::Text => extract_text_with_fallback(path, options),
        ConvertTarget::Html => {
            let markdown = markdown_content(path, options)?;
            let title = path
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_default();
            Ok(markdown_to_html_page(&markdown, &title))
        }
    }
}

/// Converts a document and writes the result.
///
/// Without `output`, the input path with the target's extension is used.
/// Returns the path written.
pub fn convert_to_file(
    path: impl AsRef<Path>,
    target: ConvertTarget,
    output: Option<&Path>,
    options: &ReadOptions,
) -> Result<PathBuf> {
    let path = path.as_ref();
    let content = convert(path, target, options)?;
    let output = output
        .map(Path::to_path_buf)
        .unwrap_or_else(|| path.with_extension(target.extension()));

    if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(&output, content)?;
    Ok(output)
}
