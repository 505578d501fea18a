use ledgerlens_analysis::{CellInput, RawRow};

use crate::error::LoadError;

/// Logical columns every input must normalize to.
pub const EXPECTED_COLUMNS: usize = 3;

#[derive(Debug, Clone)]
pub struct LoadOptions {
    /// First non-blank row is a header and is skipped.
    pub has_headers: bool,
    /// Sheet name for multi-sheet workbooks (first sheet when `None`).
    pub sheet: Option<String>,
    /// CSV delimiter (sniffed when `None`).
    pub delimiter: Option<u8>,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            has_headers: true,
            sheet: None,
            delimiter: None,
        }
    }
}

/// Rows handed to the analysis engine, in source order.
#[derive(Debug, Clone)]
pub struct LoadedTable {
    pub rows: Vec<RawRow>,
    /// Header cells, when a header row was skipped.
    pub headers: Option<Vec<String>>,
    /// Sheet the rows came from (spreadsheets only).
    pub sheet: Option<String>,
}

/// Accumulates source rows, dropping blank ones and enforcing the column count.
pub(crate) struct TableBuilder {
    has_headers: bool,
    headers: Option<Vec<String>>,
    rows: Vec<RawRow>,
    widest: usize,
}

impl TableBuilder {
    pub(crate) fn new(has_headers: bool) -> Self {
        Self {
            has_headers,
            headers: None,
            rows: Vec::new(),
            widest: 0,
        }
    }

    /// Push one source row. `line` is the 1-indexed source row for messages.
    pub(crate) fn push(&mut self, line: usize, mut cells: Vec<CellInput>) -> Result<(), LoadError> {
        while matches!(cells.last(), Some(CellInput::Empty)) {
            cells.pop();
        }
        if cells.is_empty() {
            return Ok(());
        }
        if cells.len() > EXPECTED_COLUMNS {
            return Err(LoadError::ColumnCount {
                found: cells.len(),
                row: Some(line),
            });
        }
        self.widest = self.widest.max(cells.len());

        if self.has_headers && self.headers.is_none() {
            self.headers = Some(cells.iter().map(CellInput::raw).collect());
            return Ok(());
        }

        let mut cells = cells.into_iter();
        let label = match cells.next() {
            Some(CellInput::Number(n)) => format_number_label(n),
            Some(CellInput::Text(s)) => s.trim().to_string(),
            Some(CellInput::Empty) | None => String::new(),
        };
        let prior = cells.next().unwrap_or(CellInput::Empty);
        let current = cells.next().unwrap_or(CellInput::Empty);
        self.rows.push(RawRow { label, prior, current });
        Ok(())
    }

    pub(crate) fn finish(self, sheet: Option<String>) -> Result<LoadedTable, LoadError> {
        if self.widest < EXPECTED_COLUMNS {
            if self.widest == 0 || (self.rows.is_empty() && self.headers.is_some()) {
                return Err(LoadError::Empty);
            }
            return Err(LoadError::ColumnCount {
                found: self.widest,
                row: None,
            });
        }
        if self.rows.is_empty() {
            return Err(LoadError::Empty);
        }
        Ok(LoadedTable {
            rows: self.rows,
            headers: self.headers,
            sheet,
        })
    }
}

/// Integers without decimals, as a spreadsheet would display them.
fn format_number_label(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{}", n)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(s: &str) -> CellInput {
        CellInput::text(s)
    }

    #[test]
    fn test_header_skipped_and_short_rows_padded() {
        let mut b = TableBuilder::new(true);
        b.push(1, vec![text("Item"), text("Prior"), text("Current")]).unwrap();
        b.push(2, vec![text("A. ASSETS")]).unwrap();
        b.push(3, vec![text("Cash"), text("10"), text("12")]).unwrap();
        let table = b.finish(None).unwrap();
        assert_eq!(table.headers.as_deref(), Some(&["Item".to_string(), "Prior".into(), "Current".into()][..]));
        assert_eq!(table.rows.len(), 2);
        assert_eq!(table.rows[0].label, "A. ASSETS");
        assert_eq!(table.rows[0].prior, CellInput::Empty);
    }

    #[test]
    fn test_trailing_empty_cells_ignored() {
        let mut b = TableBuilder::new(false);
        b.push(1, vec![text("Cash"), text("1"), text("2"), CellInput::Empty, CellInput::Empty])
            .unwrap();
        assert_eq!(b.finish(None).unwrap().rows.len(), 1);
    }

    #[test]
    fn test_extra_column_rejected() {
        let mut b = TableBuilder::new(false);
        let err = b
            .push(4, vec![text("Cash"), text("1"), text("2"), text("3")])
            .unwrap_err();
        assert!(matches!(err, LoadError::ColumnCount { found: 4, row: Some(4) }));
    }

    #[test]
    fn test_too_narrow_rejected() {
        let mut b = TableBuilder::new(false);
        b.push(1, vec![text("Cash"), text("1")]).unwrap();
        let err = b.finish(None).unwrap_err();
        assert!(matches!(err, LoadError::ColumnCount { found: 2, row: None }));
    }

    #[test]
    fn test_blank_rows_and_header_only_is_empty() {
        let mut b = TableBuilder::new(true);
        b.push(1, vec![text("Item"), text("Prior"), text("Current")]).unwrap();
        b.push(2, vec![CellInput::Empty, CellInput::Empty]).unwrap();
        assert!(matches!(b.finish(None).unwrap_err(), LoadError::Empty));
    }

    #[test]
    fn test_numeric_label_formatting() {
        assert_eq!(format_number_label(2024.0), "2024");
        assert_eq!(format_number_label(1.5), "1.5");
    }
}
