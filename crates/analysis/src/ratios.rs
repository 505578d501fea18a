// Liquidity ratio extraction (current ratio = current assets / current liabilities).
//
// Liquidity analysis is optional: a missing line item or a zero denominator
// marks the ratio unavailable, it never fails the analysis.

use serde::Serialize;

use crate::derive::saturate;
use crate::labels::{find_first, LabelSet};
use crate::model::{AnalysisResult, EnrichedRow, Period};

/// Why a ratio could not be computed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum RatioUnavailable {
    /// One or both required line items are absent.
    MissingLabel { labels: Vec<String> },
    /// Current liabilities are exactly zero for this period.
    ZeroDenominator,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RatioValue {
    Computed { value: f64 },
    Unavailable { cause: RatioUnavailable },
}

impl RatioValue {
    pub fn value(&self) -> Option<f64> {
        match self {
            RatioValue::Computed { value } => Some(*value),
            RatioValue::Unavailable { .. } => None,
        }
    }

    pub fn cause(&self) -> Option<&RatioUnavailable> {
        match self {
            RatioValue::Computed { .. } => None,
            RatioValue::Unavailable { cause } => Some(cause),
        }
    }

    /// Two-decimal rendering, `N/A` when unavailable.
    pub fn display(&self) -> String {
        match self.value() {
            Some(v) => format!("{v:.2}"),
            None => "N/A".to_string(),
        }
    }
}

/// Current ratio for both reporting periods.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RatioPair {
    pub prior: RatioValue,
    pub current: RatioValue,
}

impl RatioPair {
    pub fn get(&self, period: Period) -> &RatioValue {
        match period {
            Period::Prior => &self.prior,
            Period::Current => &self.current,
        }
    }

    /// Change from prior to current ratio, when both exist.
    pub fn delta(&self) -> Option<f64> {
        Some(self.current.value()? - self.prior.value()?)
    }

    /// User-facing warnings, one per distinct cause.
    pub fn warnings(&self) -> Vec<String> {
        let mut out = Vec::new();
        if let Some(RatioUnavailable::MissingLabel { labels }) = self.prior.cause().or(self.current.cause()) {
            let quoted: Vec<String> = labels.iter().map(|l| format!("'{l}'")).collect();
            out.push(format!(
                "Missing line item {} needed for the current ratio",
                quoted.join(" and ")
            ));
            return out;
        }
        for period in [Period::Prior, Period::Current] {
            if let Some(RatioUnavailable::ZeroDenominator) = self.get(period).cause() {
                out.push(format!(
                    "Current ratio ({period}) cannot be computed: current liabilities are 0"
                ));
            }
        }
        out
    }
}

/// Recompute the liquidity ratios of an existing analysis.
pub fn extract_liquidity_ratios(result: &AnalysisResult, labels: &LabelSet) -> RatioPair {
    ratios_from_rows(&result.rows, labels)
}

pub(crate) fn ratios_from_rows(rows: &[EnrichedRow], labels: &LabelSet) -> RatioPair {
    let assets = find_first(rows.iter().map(|r| r.label.as_str()), &labels.current_assets);
    let liabilities = find_first(rows.iter().map(|r| r.label.as_str()), &labels.current_liabilities);

    let (assets, liabilities) = match (assets, liabilities) {
        (Some(a), Some(l)) => (&rows[a], &rows[l]),
        (a, l) => {
            let mut missing = Vec::new();
            if a.is_none() {
                missing.push(LabelSet::canonical(&labels.current_assets).to_string());
            }
            if l.is_none() {
                missing.push(LabelSet::canonical(&labels.current_liabilities).to_string());
            }
            let cause = RatioUnavailable::MissingLabel { labels: missing };
            return RatioPair {
                prior: RatioValue::Unavailable { cause: cause.clone() },
                current: RatioValue::Unavailable { cause },
            };
        }
    };

    RatioPair {
        prior: ratio(assets.prior, liabilities.prior),
        current: ratio(assets.current, liabilities.current),
    }
}

fn ratio(assets: f64, liabilities: f64) -> RatioValue {
    if liabilities == 0.0 {
        return RatioValue::Unavailable {
            cause: RatioUnavailable::ZeroDenominator,
        };
    }
    RatioValue::Computed {
        value: saturate(assets / liabilities),
    }
}

/// Growth of the current-assets line, used by the summary prompt.
pub fn current_assets_growth(result: &AnalysisResult, labels: &LabelSet) -> Option<f64> {
    find_first(result.rows.iter().map(|r| r.label.as_str()), &labels.current_assets)
        .map(|i| result.rows[i].growth_pct)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(label: &str, prior: f64, current: f64) -> EnrichedRow {
        EnrichedRow {
            label: label.to_string(),
            prior,
            current,
            growth_pct: 0.0,
            prior_weight_pct: 0.0,
            current_weight_pct: 0.0,
        }
    }

    #[test]
    fn test_ratio_both_periods() {
        let rows = vec![
            row("Current assets", 200.0, 300.0),
            row("Current liabilities", 100.0, 150.0),
        ];
        let pair = ratios_from_rows(&rows, &LabelSet::default());
        assert_eq!(pair.prior.value(), Some(2.0));
        assert_eq!(pair.current.value(), Some(2.0));
        assert_eq!(pair.delta(), Some(0.0));
        assert!(pair.warnings().is_empty());
    }

    #[test]
    fn test_missing_liabilities_marks_both_absent() {
        let rows = vec![row("Current assets", 200.0, 300.0)];
        let pair = ratios_from_rows(&rows, &LabelSet::default());
        assert_eq!(pair.prior.value(), None);
        assert_eq!(pair.current.value(), None);
        assert_eq!(
            pair.current.cause(),
            Some(&RatioUnavailable::MissingLabel {
                labels: vec!["CURRENT LIABILITIES".into()]
            })
        );
        let warnings = pair.warnings();
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].contains("CURRENT LIABILITIES"));
    }

    #[test]
    fn test_zero_denominator_is_per_period() {
        let rows = vec![
            row("Current assets", 200.0, 300.0),
            row("Current liabilities", 50.0, 0.0),
        ];
        let pair = ratios_from_rows(&rows, &LabelSet::default());
        assert_eq!(pair.prior.value(), Some(4.0));
        assert_eq!(pair.current.cause(), Some(&RatioUnavailable::ZeroDenominator));
        let warnings = pair.warnings();
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].contains("current period"));
    }

    #[test]
    fn test_first_matching_row_wins() {
        let rows = vec![
            row("Current assets", 100.0, 100.0),
            row("Other current assets", 900.0, 900.0),
            row("Current liabilities", 50.0, 25.0),
        ];
        let pair = ratios_from_rows(&rows, &LabelSet::default());
        assert_eq!(pair.prior.value(), Some(2.0));
        assert_eq!(pair.current.value(), Some(4.0));
    }

    #[test]
    fn test_display() {
        assert_eq!(RatioValue::Computed { value: 1.23456 }.display(), "1.23");
        assert_eq!(
            RatioValue::Unavailable { cause: RatioUnavailable::ZeroDenominator }.display(),
            "N/A"
        );
    }
}
