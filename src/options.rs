//! Options for reading and converting documents.

use crate::error::Error;
use std::str::FromStr;
use std::time::Duration;

/// Default time limit for external converter processes.
pub const DEFAULT_CONVERTER_TIMEOUT: Duration = Duration::from_secs(30);

/// Options for controlling text extraction and conversion.
#[derive(Debug, Clone)]
pub struct ReadOptions {
    /// How to handle sections that cannot be decompressed.
    pub error_mode: ErrorMode,

    /// Whether the fallback chain may run external converters.
    pub external_converters: bool,

    /// Wall-clock limit for each external converter run.
    pub converter_timeout: Duration,

    /// Program used as the external HWP text converter.
    pub hwp5txt_command: String,
}

impl Default for ReadOptions {
    fn default() -> Self {
        Self {
            error_mode: ErrorMode::Strict,
            external_converters: true,
            converter_timeout: DEFAULT_CONVERTER_TIMEOUT,
            hwp5txt_command: "hwp5txt".to_string(),
        }
    }
}

impl ReadOptions {
    /// Creates new options with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets lenient error handling (skip sections that fail to decompress).
    pub fn lenient(mut self) -> Self {
        self.error_mode = ErrorMode::Lenient;
        self
    }

    /// Sets strict error handling (fail on any section error).
    pub fn strict(mut self) -> Self {
        self.error_mode = ErrorMode::Strict;
        self
    }

    /// Disables external converters in the fallback chain.
    pub fn without_external_converters(mut self) -> Self {
        self.external_converters = false;
        self
    }

    /// Sets the time limit for external converters.
    pub fn with_converter_timeout(mut self, timeout: Duration) -> Self {
        self.converter_timeout = timeout;
        self
    }

    /// Sets the program used for HWP text conversion.
    pub fn with_hwp5txt_command(mut self, command: impl Into<String>) -> Self {
        self.hwp5txt_command = command.into();
        self
    }

    /// Returns true if section errors should be skipped.
    pub fn is_lenient(&self) -> bool {
        matches!(self.error_mode, ErrorMode::Lenient)
    }
}

/// How to handle section errors during extraction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ErrorMode {
    /// Fail the whole extraction.
    #[default]
    Strict,
    /// Skip the section and continue.
    Lenient,
}

/// Output format for [`crate::read_file`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    /// Markdown
    #[default]
    Markdown,
    /// Plain text
    Text,
    /// JSON envelope `{"source", "content"}`
    Json,
}

impl FromStr for OutputFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "md" | "markdown" => Ok(Self::Markdown),
            "txt" | "text" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            other => Err(Error::InvalidData(format!(
                "unsupported output format '{}', expected md, txt or json",
                other
            ))),
        }
    }
}

/// Target for [`crate::convert`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConvertTarget {
    /// Markdown
    Markdown,
    /// Standalone HTML page
    Html,
    /// Plain text
    Text,
}

impl ConvertTarget {
    /// Returns the file extension for this target.
    pub fn extension(&self) -> &'static str {
        match self {
            ConvertTarget::Markdown => "md",
            ConvertTarget::Html => "html",
            ConvertTarget::Text => "txt",
        }
    }
}

impl FromStr for ConvertTarget {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "md" | "markdown" => Ok(Self::Markdown),
            "html" => Ok(Self::Html),
            "txt" | "text" => Ok(Self::Text),
            other => Err(Error::InvalidData(format!(
                "unsupported conversion target '{}', expected md, html or txt",
                other
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let options = ReadOptions::default();
        assert!(!options.is_lenient());
        assert!(options.external_converters);
        assert_eq!(options.converter_timeout, Duration::from_secs(30));
        assert_eq!(options.hwp5txt_command, "hwp5txt");
    }

    #[test]
    fn test_builder_chain() {
        let options = ReadOptions::new()
            .lenient()
            .without_external_converters()
            .with_converter_timeout(Duration::from_secs(5))
            .with_hwp5txt_command("/opt/bin/hwp5txt");
        assert!(options.is_lenient());
        assert!(!options.external_converters);
        assert_eq!(options.converter_timeout, Duration::from_secs(5));
        assert_eq!(options.hwp5txt_command, "/opt/bin/hwp5txt");
        assert!(!options.strict().is_lenient());
    }

    #[test]
    fn test_parse_formats() {
        assert_eq!("md".parse::<OutputFormat>().unwrap(), OutputFormat::Markdown);
        assert_eq!("TXT".parse::<OutputFormat>().unwrap(), OutputFormat::Text);
        assert_eq!("json".parse::<OutputFormat>().unwrap(), OutputFormat::Json);
        assert!("pdf".parse::<OutputFormat>().is_err());

        assert_eq!("html".parse::<ConvertTarget>().unwrap(), ConvertTarget::Html);
        assert_eq!(ConvertTarget::Text.extension(), "txt");
        assert!("odt".parse::<ConvertTarget>().is_err());
    }
}
