//! Record tag statistics over BodyText sections.

use super::record::Record;

/// Tag-frequency counts summed over one or more sections.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RecordStats {
    /// Every record seen, regardless of tag
    pub total_records: usize,
    /// PARA_TEXT records
    pub paragraph_count: usize,
    /// Table records
    pub table_count: usize,
}

impl RecordStats {
    /// Counts the records of one section.
    pub fn from_records<'a>(records: impl IntoIterator<Item = Record<'a>>) -> Self {
        let mut stats = Self::default();
        for record in records {
            stats.count(&record);
        }
        stats
    }

    /// Adds a single record to the counts.
    pub fn count(&mut self, record: &Record<'_>) {
        self.total_records += 1;
        if record.is_para_text() {
            self.paragraph_count += 1;
        } else if record.is_table() {
            self.table_count += 1;
        }
    }

    /// Sums another section's counts into this one.
    pub fn merge(&mut self, other: &RecordStats) {
        self.total_records += other.total_records;
        self.paragraph_count += other.paragraph_count;
        self.table_count += other.table_count;
    }

    /// Returns true if at least one table record was seen.
    pub fn has_tables(&self) -> bool {
        self.table_count > 0
    }
}
