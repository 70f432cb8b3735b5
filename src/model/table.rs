//! Table structures for the document model.

use super::Paragraph;
use serde::Serialize;

/// A table in the document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Table {
    /// Table rows; the first row is treated as the header when rendering
    pub rows: Vec<TableRow>,
}

impl Table {
    /// Creates a new empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a table with one header row and the given body rows.
    ///
    /// Body cells beyond the header width are dropped; short rows are padded
    /// with empty cells.
    pub fn from_grid<S: AsRef<str>>(headers: &[S], rows: &[Vec<S>]) -> Self {
        let width = headers.len();
        let mut table = Self::new();

        table.rows.push(TableRow {
            cells: headers.iter().map(|h| TableCell::text(h.as_ref())).collect(),
        });

        for row in rows {
            let mut cells: Vec<TableCell> = row
                .iter()
                .take(width)
                .map(|c| TableCell::text(c.as_ref()))
                .collect();
            cells.resize_with(width, TableCell::new);
            table.rows.push(TableRow { cells });
        }

        table
    }

    /// Returns the number of rows.
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Returns the number of columns (widest row).
    pub fn column_count(&self) -> usize {
        self.rows.iter().map(|r| r.cells.len()).max().unwrap_or(0)
    }

    /// Gets a cell at the specified position.
    pub fn get_cell(&self, row: usize, col: usize) -> Option<&TableCell> {
        self.rows.get(row).and_then(|r| r.cells.get(col))
    }
}

/// A row in a table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TableRow {
    /// Cells in this row
    pub cells: Vec<TableCell>,
}

impl TableRow {
    /// Creates a new empty row.
    pub fn new() -> Self {
        Self::default()
    }
}

/// A cell in a table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TableCell {
    /// Paragraphs inside the cell
    pub paragraphs: Vec<Paragraph>,
    /// Number of rows this cell spans
    pub rowspan: u32,
    /// Number of columns this cell spans
    pub colspan: u32,
}

impl Default for TableCell {
    fn default() -> Self {
        Self {
            paragraphs: Vec::new(),
            rowspan: 1,
            colspan: 1,
        }
    }
}

impl TableCell {
    /// Creates a new empty cell.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a cell holding a single paragraph.
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            paragraphs: vec![Paragraph::text(text)],
            ..Self::default()
        }
    }

    /// Creates a cell with merge information.
    pub fn merged(rowspan: u32, colspan: u32) -> Self {
        Self {
            paragraphs: Vec::new(),
            rowspan: rowspan.max(1),
            colspan: colspan.max(1),
        }
    }

    /// Returns the cell text, paragraphs joined by `\n`.
    pub fn plain_text(&self) -> String {
        self.paragraphs
            .iter()
            .map(|p| p.text.as_str())
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_grid_trims_and_pads() {
        let table = Table::from_grid(
            &["A", "B"],
            &[vec!["1", "2", "3"], vec!["4"]],
        );

        assert_eq!(table.row_count(), 3);
        assert_eq!(table.column_count(), 2);
        assert_eq!(table.get_cell(1, 1).unwrap().plain_text(), "2");
        assert_eq!(table.get_cell(2, 0).unwrap().plain_text(), "4");
        assert_eq!(table.get_cell(2, 1).unwrap().plain_text(), "");
        assert!(table.get_cell(1, 2).is_none());
    }

    #[test]
    fn test_merged_cell_clamps() {
        let cell = TableCell::merged(0, 3);
        assert_eq!(cell.rowspan, 1);
        assert_eq!(cell.colspan, 3);
    }

    #[test]
    fn test_cell_plain_text() {
        let mut cell = TableCell::text("첫째");
        cell.paragraphs.push(Paragraph::text("둘째"));
        assert_eq!(cell.plain_text(), "첫째\n둘째");
    }
}
