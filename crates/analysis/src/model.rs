use serde::Serialize;

use crate::ratios::RatioPair;

// ---------------------------------------------------------------------------
// Input
// ---------------------------------------------------------------------------

/// One value cell as handed over by the tabular loader.
///
/// Spreadsheet loaders pass numbers through as `Number`; text-based loaders
/// (CSV) pass the raw field as `Text` and leave coercion to the engine.
#[derive(Debug, Clone, PartialEq)]
pub enum CellInput {
    Number(f64),
    Text(String),
    Empty,
}

impl CellInput {
    pub fn text(s: impl Into<String>) -> Self {
        let s = s.into();
        if s.trim().is_empty() {
            CellInput::Empty
        } else {
            CellInput::Text(s)
        }
    }

    /// Raw representation used for fallback reports and cache keys.
    pub fn raw(&self) -> String {
        match self {
            CellInput::Number(n) => n.to_string(),
            CellInput::Text(s) => s.clone(),
            CellInput::Empty => String::new(),
        }
    }
}

impl From<f64> for CellInput {
    fn from(n: f64) -> Self {
        CellInput::Number(n)
    }
}

impl From<&str> for CellInput {
    fn from(s: &str) -> Self {
        CellInput::text(s)
    }
}

/// A single line item of the two-period balance sheet, in spreadsheet order.
#[derive(Debug, Clone, PartialEq)]
pub struct RawRow {
    pub label: String,
    pub prior: CellInput,
    pub current: CellInput,
}

impl RawRow {
    pub fn new(label: impl Into<String>, prior: impl Into<CellInput>, current: impl Into<CellInput>) -> Self {
        Self {
            label: label.into(),
            prior: prior.into(),
            current: current.into(),
        }
    }
}

// ---------------------------------------------------------------------------
// Output
// ---------------------------------------------------------------------------

/// Reporting period of a value column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Period {
    Prior,
    Current,
}

impl std::fmt::Display for Period {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Prior => write!(f, "prior period"),
            Self::Current => write!(f, "current period"),
        }
    }
}

/// A value cell that could not be read as a number and was treated as zero.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CoercionFallback {
    /// 0-indexed position in the input sequence.
    pub row: usize,
    pub label: String,
    pub period: Period,
    pub raw: String,
}

impl CoercionFallback {
    pub fn message(&self) -> String {
        format!(
            "row {} ('{}'): {} value '{}' is not a number, treated as 0",
            self.row + 1,
            self.label,
            self.period,
            self.raw
        )
    }
}

/// Raw row plus its derived growth and composition columns.
///
/// All derived fields are finite.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EnrichedRow {
    pub label: String,
    pub prior: f64,
    pub current: f64,
    pub growth_pct: f64,
    pub prior_weight_pct: f64,
    pub current_weight_pct: f64,
}

/// Result of one successful derivation. Immutable; a new upload replaces it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisResult {
    pub rows: Vec<EnrichedRow>,
    /// Index of the row used as the composition denominator.
    pub totals_row: usize,
    pub ratios: RatioPair,
    pub coercions: Vec<CoercionFallback>,
}

impl AnalysisResult {
    pub fn totals(&self) -> &EnrichedRow {
        &self.rows[self.totals_row]
    }
}
