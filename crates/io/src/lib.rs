// Tabular loaders
//
// Turn an uploaded balance-sheet file into the ordered three-column row set
// the analysis engine consumes (line item, prior period, current period).
// Only the column count is validated; numeric coercion is the engine's job.

pub mod csv;
pub mod error;
pub mod table;
pub mod xlsx;

use std::path::Path;

pub use error::LoadError;
pub use table::{LoadOptions, LoadedTable};

/// Load a balance sheet, dispatching on the file extension.
pub fn load(path: &Path, options: &LoadOptions) -> Result<LoadedTable, LoadError> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default();

    let table = match ext.as_str() {
        "csv" | "tsv" | "txt" => csv::load(path, options)?,
        "xlsx" | "xlsm" | "xls" | "xlsb" | "ods" => xlsx::load(path, options)?,
        other => return Err(LoadError::UnsupportedFormat(other.to_string())),
    };

    log::info!(
        "loaded {} line item(s) from {}",
        table.rows.len(),
        path.display()
    );
    Ok(table)
}
