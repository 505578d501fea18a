// analyze / context commands

use std::path::Path;

use serde::Serialize;

use ledgerlens_analysis::{
    derive_analysis, serialize_context, AnalysisResult, CoercionFallback, EnrichedRow, RatioPair,
};
use ledgerlens_config::Settings;

use crate::input::load_table;
use crate::util::{display_width, format_amount, pad_left, pad_right};
use crate::{CliError, LoadArgs};

const MAX_LABEL_WIDTH: usize = 40;

#[derive(Serialize)]
struct AnalyzeReport<'a> {
    file: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    sheet: Option<&'a str>,
    totals_label: &'a str,
    rows: &'a [EnrichedRow],
    ratios: &'a RatioPair,
    ratio_change: Option<f64>,
    coercions: &'a [CoercionFallback],
    warnings: Vec<String>,
}

/// Load and derive; the full pipeline every command starts from.
pub fn analyze_file(settings: &Settings, path: &Path, args: &LoadArgs) -> Result<(AnalysisResult, Option<String>), CliError> {
    let table = load_table(settings, path, args)?;
    let labels = settings.labels.to_label_set();
    let result = derive_analysis(&table.rows, &labels).map_err(CliError::analysis)?;
    Ok((result, table.sheet))
}

/// Coercion fallbacks first, then ratio problems.
pub fn warnings(result: &AnalysisResult) -> Vec<String> {
    let mut out: Vec<String> = result.coercions.iter().map(CoercionFallback::message).collect();
    out.extend(result.ratios.warnings());
    out
}

pub fn print_warnings(result: &AnalysisResult) {
    for warning in warnings(result) {
        eprintln!("warning: {}", warning);
    }
}

pub fn cmd_analyze(settings: &Settings, path: &Path, args: &LoadArgs, json: bool) -> Result<(), CliError> {
    let (result, sheet) = analyze_file(settings, path, args)?;

    if json {
        let report = AnalyzeReport {
            file: path.display().to_string(),
            sheet: sheet.as_deref(),
            totals_label: &result.totals().label,
            rows: &result.rows,
            ratios: &result.ratios,
            ratio_change: result.ratios.delta(),
            coercions: &result.coercions,
            warnings: warnings(&result),
        };
        let out = serde_json::to_string_pretty(&report)
            .map_err(|e| CliError::general(format!("JSON serialization error: {e}")))?;
        println!("{out}");
        return Ok(());
    }

    print_warnings(&result);
    print!("{}", render_report(&result));
    Ok(())
}

pub fn cmd_context(settings: &Settings, path: &Path, args: &LoadArgs) -> Result<(), CliError> {
    let (result, _) = analyze_file(settings, path, args)?;
    print_warnings(&result);
    print!("{}", serialize_context(&result, &result.ratios));
    Ok(())
}

/// Aligned terminal table plus the liquidity block.
fn render_report(result: &AnalysisResult) -> String {
    let headers = ["Line item", "Prior", "Current", "Growth %", "Prior wt %", "Current wt %"];

    let cells: Vec<[String; 6]> = result
        .rows
        .iter()
        .map(|row| {
            [
                row.label.clone(),
                format_amount(row.prior),
                format_amount(row.current),
                format!("{:.2}", row.growth_pct),
                format!("{:.2}", row.prior_weight_pct),
                format!("{:.2}", row.current_weight_pct),
            ]
        })
        .collect();

    let mut widths = headers.map(display_width);
    for row in &cells {
        for (w, cell) in widths.iter_mut().zip(row.iter()) {
            *w = (*w).max(display_width(cell));
        }
    }
    widths[0] = widths[0].min(MAX_LABEL_WIDTH);

    let mut out = String::new();
    let mut push_line = |row: &[String]| {
        let mut line = pad_right(&row[0], widths[0]);
        for (cell, width) in row.iter().zip(widths.iter()).skip(1) {
            line.push_str("  ");
            line.push_str(&pad_left(cell, *width));
        }
        out.push_str(line.trim_end());
        out.push('\n');
    };

    push_line(&headers.map(str::to_string));
    push_line(&widths.map(|w| "-".repeat(w)));
    for row in &cells {
        push_line(row);
    }

    out.push('\n');
    out.push_str(&format!(
        "Current ratio: {} (prior) -> {} (current)",
        result.ratios.prior.display(),
        result.ratios.current.display()
    ));
    if let Some(delta) = result.ratios.delta() {
        out.push_str(&format!(", change {delta:+.2}"));
    }
    out.push('\n');
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use ledgerlens_analysis::{LabelSet, RawRow};

    fn result() -> AnalysisResult {
        derive_analysis(
            &[
                RawRow::new("Current assets", 400.0, 500.0),
                RawRow::new("Total assets", 1000.0, 1200.0),
                RawRow::new("Current liabilities", 200.0, "n/a"),
            ],
            &LabelSet::default(),
        )
        .unwrap()
    }

    #[test]
    fn test_report_aligns_columns() {
        let report = render_report(&result());
        let lines: Vec<&str> = report.lines().collect();
        assert!(lines[0].starts_with("Line item"));
        assert!(lines[3].starts_with("Total assets"));
        assert!(lines[3].contains("1,200.00"));
        assert!(lines[3].ends_with("100.00"));
        assert_eq!(display_width(lines[2]), display_width(lines[3]));
    }

    #[test]
    fn test_report_marks_unavailable_ratio() {
        let report = render_report(&result());
        assert!(report.contains("Current ratio: 2.00 (prior) -> N/A (current)"));
        assert!(!report.contains("change"));
    }

    #[test]
    fn test_warnings_list_coercions_then_ratios() {
        let warnings = warnings(&result());
        assert_eq!(warnings.len(), 2);
        assert!(warnings[0].contains("'n/a'"));
        assert!(warnings[1].contains("current liabilities are 0"));
    }
}
