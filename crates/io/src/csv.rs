// CSV/TSV import

use std::io::Read;
use std::path::Path;

use ledgerlens_analysis::CellInput;

use crate::error::LoadError;
use crate::table::{LoadOptions, LoadedTable, TableBuilder};

pub fn load(path: &Path, options: &LoadOptions) -> Result<LoadedTable, LoadError> {
    let content = read_file_as_utf8(path)?;
    let is_tsv = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("tsv"));
    let delimiter = match options.delimiter {
        Some(d) => d,
        None if is_tsv => b'\t',
        None => sniff_delimiter(&content),
    };
    load_from_str(&content, delimiter, options)
}

pub fn load_from_str(content: &str, delimiter: u8, options: &LoadOptions) -> Result<LoadedTable, LoadError> {
    // Excel-exported UTF-8 CSVs often start with a BOM
    let content = content.strip_prefix('\u{feff}').unwrap_or(content);

    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(false)
        .flexible(true)
        .from_reader(content.as_bytes());

    let mut builder = TableBuilder::new(options.has_headers);
    for (idx, result) in reader.records().enumerate() {
        let record = result.map_err(|e| LoadError::Parse(e.to_string()))?;
        let cells = record.iter().map(CellInput::text).collect();
        builder.push(idx + 1, cells)?;
    }
    builder.finish(None)
}

/// Detect the most likely field delimiter by checking consistency across the first few lines.
///
/// For each candidate (tab, semicolon, comma, pipe), count fields per line. The delimiter
/// that produces the most consistent field count (>1 field) wins.
fn sniff_delimiter(content: &str) -> u8 {
    let candidates: &[u8] = &[b'\t', b';', b',', b'|'];
    let sample_lines: Vec<&str> = content.lines().filter(|l| !l.trim().is_empty()).take(10).collect();

    if sample_lines.is_empty() {
        return b',';
    }

    let mut best = b',';
    let mut best_score = 0u64;

    for &delim in candidates {
        let counts: Vec<usize> = sample_lines
            .iter()
            .map(|line| {
                csv::ReaderBuilder::new()
                    .delimiter(delim)
                    .has_headers(false)
                    .flexible(true)
                    .from_reader(line.as_bytes())
                    .records()
                    .next()
                    .and_then(|r| r.ok())
                    .map(|r| r.len())
                    .unwrap_or(1)
            })
            .collect();

        if counts.first().copied().unwrap_or(0) <= 1 {
            continue;
        }

        // Lines agreeing with line 1, weighted by field count. A balance sheet
        // has 3 columns, so an exact 3 gets a bonus over wider splits that
        // come from thousands separators.
        let target = counts[0];
        let consistent = counts.iter().filter(|&&c| c == target).count() as u64;
        let mut score = consistent * target as u64;
        if target == 3 {
            score *= 2;
        }

        if score > best_score {
            best_score = score;
            best = delim;
        }
    }

    best
}

/// Read file and convert to UTF-8 if needed (handles Windows-1252, Latin-1, etc.)
pub fn read_file_as_utf8(path: &Path) -> Result<String, LoadError> {
    let mut file = std::fs::File::open(path).map_err(|e| LoadError::Io(format!("{}: {e}", path.display())))?;
    let mut bytes = Vec::new();
    file.read_to_end(&mut bytes)
        .map_err(|e| LoadError::Io(format!("{}: {e}", path.display())))?;

    match String::from_utf8(bytes) {
        Ok(s) => Ok(s),
        Err(e) => {
            let bytes = e.into_bytes();
            log::debug!("{} is not UTF-8, decoding as Windows-1252", path.display());
            let (decoded, _, _) = encoding_rs::WINDOWS_1252.decode(&bytes);
            Ok(decoded.into_owned())
        }
    }
}
