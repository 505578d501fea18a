// Context serialization
//
// Renders an analysis as plain text for AI grounding. The rendering doubles as
// the change-detection key for the chat session, so it must be byte-stable:
// fixed column order, fixed two-decimal precision, no timestamps.

use crate::labels::LabelSet;
use crate::model::AnalysisResult;
use crate::ratios::{current_assets_growth, RatioPair};

const HEADERS: [&str; 6] = [
    "Line item",
    "Prior period",
    "Current period",
    "Growth (%)",
    "Prior weight (%)",
    "Current weight (%)",
];

/// Text rendering of an analysis used as conversational grounding.
///
/// Compared by value: two snapshots are the same data epoch iff their text is
/// identical.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ContextSnapshot(String);

impl ContextSnapshot {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Short stable identifier for logs (never log the snapshot itself).
    pub fn fingerprint(&self) -> String {
        let hash = blake3::hash(self.0.as_bytes());
        hash.to_hex()[..16].to_string()
    }
}

impl From<String> for ContextSnapshot {
    fn from(text: String) -> Self {
        Self(text)
    }
}

impl std::fmt::Display for ContextSnapshot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Render the analysis table plus the liquidity ratios.
pub fn serialize_context(result: &AnalysisResult, ratios: &RatioPair) -> ContextSnapshot {
    let mut out = render_table(result);
    out.push('\n');
    out.push_str("Liquidity\n");
    out.push_str(&format!("Current ratio (prior period): {}\n", ratios.prior.display()));
    out.push_str(&format!("Current ratio (current period): {}\n", ratios.current.display()));
    ContextSnapshot(out)
}

/// Markdown pipe table of every row and every computed column.
pub fn render_table(result: &AnalysisResult) -> String {
    let mut out = String::new();
    push_row(&mut out, HEADERS.iter().map(|h| h.to_string()));
    push_row(&mut out, HEADERS.iter().map(|_| "---".to_string()));
    for row in &result.rows {
        push_row(
            &mut out,
            [
                escape_cell(&row.label),
                format!("{:.2}", row.prior),
                format!("{:.2}", row.current),
                format!("{:.2}", row.growth_pct),
                format!("{:.2}", row.prior_weight_pct),
                format!("{:.2}", row.current_weight_pct),
            ]
            .into_iter(),
        );
    }
    out
}

/// Indicator/value table submitted with the one-shot summary request.
pub fn summary_payload(result: &AnalysisResult, labels: &LabelSet) -> String {
    let growth = current_assets_growth(result, labels)
        .map(|g| format!("{g:.2}%"))
        .unwrap_or_else(|| "N/A".to_string());

    let mut out = String::new();
    out.push_str("| Indicator | Value |\n");
    out.push_str("| --- | --- |\n");
    out.push_str("| Current-assets growth (%) | ");
    out.push_str(&growth);
    out.push_str(" |\n");
    out.push_str("| Current ratio (prior period) | ");
    out.push_str(&result.ratios.prior.display());
    out.push_str(" |\n");
    out.push_str("| Current ratio (current period) | ");
    out.push_str(&result.ratios.current.display());
    out.push_str(" |\n\n");
    out.push_str("Full analysis table:\n\n");
    out.push_str(&render_table(result));
    out
}

fn push_row(out: &mut String, cells: impl Iterator<Item = String>) {
    out.push('|');
    for cell in cells {
        out.push(' ');
        out.push_str(&cell);
        out.push_str(" |");
    }
    out.push('\n');
}

fn escape_cell(s: &str) -> String {
    s.trim().replace('|', "\\|").replace(['\r', '\n'], " ")
}
