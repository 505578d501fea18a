// Excel/ODS import (xlsx, xlsm, xls, xlsb, ods) via calamine

use std::path::Path;

use calamine::{open_workbook_auto, Data, Reader};
use ledgerlens_analysis::CellInput;

use crate::error::LoadError;
use crate::table::{LoadOptions, LoadedTable, TableBuilder};

pub fn load(path: &Path, options: &LoadOptions) -> Result<LoadedTable, LoadError> {
    let mut workbook = open_workbook_auto(path).map_err(|e| LoadError::Workbook(e.to_string()))?;

    let sheet_names: Vec<String> = workbook.sheet_names().to_vec();
    let sheet_name = match &options.sheet {
        Some(name) => sheet_names
            .iter()
            .find(|s| s.eq_ignore_ascii_case(name))
            .cloned()
            .ok_or_else(|| LoadError::SheetNotFound {
                name: name.clone(),
                available: sheet_names.clone(),
            })?,
        None => sheet_names
            .first()
            .cloned()
            .ok_or_else(|| LoadError::Workbook("file contains no sheets".to_string()))?,
    };

    let range = workbook
        .worksheet_range(&sheet_name)
        .map_err(|e| LoadError::Workbook(format!("failed to read sheet '{sheet_name}': {e}")))?;

    // Range start offset (data may not begin at A1)
    let (start_row, _) = range.start().unwrap_or((0, 0));

    let mut builder = TableBuilder::new(options.has_headers);
    for (row_idx, row) in range.rows().enumerate() {
        let line = start_row as usize + row_idx + 1;
        let cells = row.iter().map(cell_input).collect();
        builder.push(line, cells)?;
    }
    builder.finish(Some(sheet_name))
}

fn cell_input(cell: &Data) -> CellInput {
    match cell {
        Data::Empty => CellInput::Empty,
        Data::Float(n) => CellInput::Number(*n),
        Data::Int(n) => CellInput::Number(*n as f64),
        Data::String(s) => CellInput::text(s.as_str()),
        Data::Bool(b) => CellInput::Text(if *b { "TRUE" } else { "FALSE" }.to_string()),
        Data::Error(e) => CellInput::Text(format!("#{e:?}")),
        // Dates are not amounts; keep them as text so coercion reports them
        Data::DateTime(dt) => CellInput::Text(format!("date serial {}", dt.as_f64())),
        Data::DateTimeIso(s) | Data::DurationIso(s) => CellInput::Text(s.clone()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_xlsxwriter::Workbook;
    use tempfile::tempdir;

    fn write_fixture(path: &Path) {
        let mut workbook = Workbook::new();
        let sheet = workbook.add_worksheet();
        sheet.set_name("Balance").unwrap();
        sheet.write_string(0, 0, "Item").unwrap();
        sheet.write_string(0, 1, "Prior").unwrap();
        sheet.write_string(0, 2, "Current").unwrap();
        sheet.write_string(1, 0, "Cash").unwrap();
        sheet.write_number(1, 1, 100.0).unwrap();
        sheet.write_number(1, 2, 150.0).unwrap();
        sheet.write_string(2, 0, "Total assets").unwrap();
        sheet.write_number(2, 1, 1000.0).unwrap();
        sheet.write_string(2, 2, "n/a").unwrap();
        workbook.save(path).unwrap();
    }

    #[test]
    fn test_load_xlsx_first_sheet() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("bs.xlsx");
        write_fixture(&path);

        let table = load(&path, &LoadOptions::default()).unwrap();
        assert_eq!(table.sheet.as_deref(), Some("Balance"));
        assert_eq!(table.rows.len(), 2);
        assert_eq!(table.rows[0].prior, CellInput::Number(100.0));
        assert_eq!(table.rows[1].current, CellInput::Text("n/a".into()));
    }

    #[test]
    fn test_missing_sheet_lists_available() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("bs.xlsx");
        write_fixture(&path);

        let options = LoadOptions {
            sheet: Some("Income".into()),
            ..LoadOptions::default()
        };
        let err = load(&path, &options).unwrap_err();
        match err {
            LoadError::SheetNotFound { name, available } => {
                assert_eq!(name, "Income");
                assert_eq!(available, vec!["Balance".to_string()]);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_not_a_workbook() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("broken.xlsx");
        std::fs::write(&path, b"not a zip").unwrap();
        assert!(matches!(load(&path, &LoadOptions::default()), Err(LoadError::Workbook(_))));
    }
}
