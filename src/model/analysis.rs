//! Analysis and extraction reports.
//!
//! Field names are the JSON keys consumed by downstream tooling and must not
//! change: `format`, `path`, `streams`/`entries`, `metadata`, `stats`.

use serde::Serialize;

/// Structural analysis of either format.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Analysis {
    /// Binary HWP 5.0 report
    Hwp(HwpAnalysis),
    /// HWPX report
    Hwpx(HwpxAnalysis),
}

impl Analysis {
    /// Returns the format tag (`"HWP"` or `"HWPX"`).
    pub fn format(&self) -> &'static str {
        match self {
            Analysis::Hwp(a) => a.format,
            Analysis::Hwpx(a) => a.format,
        }
    }

    /// Returns the analysed path.
    pub fn path(&self) -> &str {
        match self {
            Analysis::Hwp(a) => &a.path,
            Analysis::Hwpx(a) => &a.path,
        }
    }

    /// Returns the paragraph count, when the analysis could determine it.
    pub fn paragraph_count(&self) -> Option<usize> {
        match self {
            Analysis::Hwp(a) => a.stats.structure.map(|s| s.paragraph_count),
            Analysis::Hwpx(a) => a.stats.structure.map(|s| s.paragraph_count),
        }
    }

    /// Serialises the report as pretty-printed JSON.
    pub fn to_json_pretty(&self) -> crate::Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Serialises the report as single-line JSON.
    pub fn to_json(&self) -> crate::Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

/// Analysis of a binary HWP file.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HwpAnalysis {
    /// Always `"HWP"`
    pub format: &'static str,
    /// Path as given by the caller
    pub path: String,
    /// Every stream in the compound file
    pub streams: Vec<StreamInfo>,
    /// Header fields and preview
    pub metadata: HwpMetadata,
    /// Counts
    pub stats: HwpStats,
}

/// A named stream and its exact byte length.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StreamInfo {
    pub name: String,
    pub size: u64,
}

/// FileHeader fields of an HWP file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HwpMetadata {
    pub signature: String,
    pub version: String,
    pub compressed: bool,
    pub encrypted: bool,
    pub distributed: bool,
    pub has_script: bool,
    /// First characters of the PrvText stream, when present
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preview: Option<String>,
}

/// Statistics for an HWP file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HwpStats {
    pub image_count: usize,
    pub images: Vec<String>,
    pub section_count: usize,
    /// Record statistics; absent when no section could be read
    #[serde(flatten, skip_serializing_if = "Option::is_none")]
    pub structure: Option<StructureStats>,
}

/// Record-level counts summed over all readable sections.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StructureStats {
    pub total_records: usize,
    pub has_tables: bool,
    pub table_count: usize,
    pub paragraph_count: usize,
}

/// Analysis of an HWPX package.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HwpxAnalysis {
    /// Always `"HWPX"`
    pub format: &'static str,
    /// Path as given by the caller
    pub path: String,
    /// Every ZIP entry, in archive order
    pub entries: Vec<EntryInfo>,
    pub metadata: HwpxMetadata,
    pub stats: HwpxStats,
}

/// A ZIP entry with its sizes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EntryInfo {
    pub name: String,
    pub size: u64,
    pub compressed_size: u64,
}

/// Package metadata of an HWPX file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct HwpxMetadata {
    /// Trimmed `mimetype` entry
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mimetype: Option<String>,
    /// Raw `version.xml` entry
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version_xml: Option<String>,
}

/// Statistics for an HWPX package.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HwpxStats {
    pub section_count: usize,
    pub image_count: usize,
    pub images: Vec<String>,
    /// Best-effort counts from a structural parse
    #[serde(flatten, skip_serializing_if = "Option::is_none")]
    pub structure: Option<HwpxStructureStats>,
}

/// Counts from parsing HWPX section XML.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct HwpxStructureStats {
    pub paragraph_count: usize,
    pub table_count: usize,
    pub has_tables: bool,
}

/// Text extracted from a document, one entry per non-blank paragraph.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ExtractedText {
    pub paragraphs: Vec<String>,
}

impl ExtractedText {
    /// Returns the paragraphs joined with a single newline.
    pub fn joined(&self) -> String {
        self.paragraphs.join("\n")
    }

    /// Returns true if no paragraph was extracted.
    pub fn is_empty(&self) -> bool {
        self.paragraphs.is_empty()
    }
}

impl std::fmt::Display for ExtractedText {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.joined())
    }
}
