//! Document model and analysis reports.
//!
//! The document model is the intermediate representation shared by the
//! readers (HWP, HWPX), the HWPX writer, and the renderers. Analysis reports
//! are the JSON-serialisable outputs of structural analysis.

mod analysis;
mod document;
mod paragraph;
mod table;

pub use analysis::*;
pub use document::*;
pub use paragraph::*;
pub use table::*;
