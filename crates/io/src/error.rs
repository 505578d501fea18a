use std::fmt;

#[derive(Debug)]
pub enum LoadError {
    /// File could not be read.
    Io(String),
    /// Extension not recognized as CSV/TSV or a spreadsheet format.
    UnsupportedFormat(String),
    /// Spreadsheet container could not be opened or a sheet not read.
    Workbook(String),
    /// Requested sheet does not exist.
    SheetNotFound { name: String, available: Vec<String> },
    /// A row (1-indexed, source numbering) has more than three columns, or
    /// the widest row has fewer than three.
    ColumnCount { found: usize, row: Option<usize> },
    /// CSV record could not be parsed.
    Parse(String),
    /// No data rows after the header.
    Empty,
}

impl fmt::Display for LoadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(msg) => write!(f, "IO error: {msg}"),
            Self::UnsupportedFormat(ext) if ext.is_empty() => {
                write!(f, "unsupported file type (no extension); expected .csv, .tsv, .xlsx, .xls or .ods")
            }
            Self::UnsupportedFormat(ext) => {
                write!(f, "unsupported file type '.{ext}'; expected .csv, .tsv, .xlsx, .xls or .ods")
            }
            Self::Workbook(msg) => write!(f, "cannot read spreadsheet: {msg}"),
            Self::SheetNotFound { name, available } => {
                write!(f, "sheet '{name}' not found (available: {})", available.join(", "))
            }
            Self::ColumnCount { found, row: Some(row) } => {
                write!(f, "row {row}: expected 3 columns (line item, prior, current), found {found}")
            }
            Self::ColumnCount { found, row: None } => {
                write!(f, "expected 3 columns (line item, prior, current), found {found}")
            }
            Self::Parse(msg) => write!(f, "parse error: {msg}"),
            Self::Empty => write!(f, "no data rows found"),
        }
    }
}

impl std::error::Error for LoadError {}
