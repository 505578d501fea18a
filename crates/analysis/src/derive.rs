use crate::coerce::{coerce_cell, Coerced};
use crate::error::AnalysisError;
use crate::labels::{find_first, LabelSet};
use crate::model::{AnalysisResult, CoercionFallback, EnrichedRow, Period, RawRow};
use crate::ratios::ratios_from_rows;

/// Substitute divisor for a zero baseline or a zero total.
pub const EPSILON: f64 = 1e-9;

/// Derive growth, composition weights and liquidity ratios from raw rows.
///
/// Pure and deterministic: the same rows and labels always produce the same
/// result. Row order is preserved. Fails only when no total-assets row exists.
pub fn derive_analysis(rows: &[RawRow], labels: &LabelSet) -> Result<AnalysisResult, AnalysisError> {
    let mut coercions = Vec::new();
    let mut values = Vec::with_capacity(rows.len());

    for (idx, row) in rows.iter().enumerate() {
        let prior = coerce(idx, row, Period::Prior, &mut coercions);
        let current = coerce(idx, row, Period::Current, &mut coercions);
        values.push((prior, current));
    }

    let totals_row = find_first(rows.iter().map(|r| r.label.as_str()), &labels.total_assets)
        .ok_or_else(|| AnalysisError::MissingTotalsRow {
            aliases: labels.total_assets.clone(),
        })?;

    let (total_prior, total_current) = values[totals_row];
    let prior_divisor = or_epsilon(total_prior);
    let current_divisor = or_epsilon(total_current);

    let enriched: Vec<EnrichedRow> = rows
        .iter()
        .zip(&values)
        .map(|(row, &(prior, current))| EnrichedRow {
            label: row.label.clone(),
            prior,
            current,
            growth_pct: growth_pct(prior, current),
            prior_weight_pct: saturate(prior / prior_divisor * 100.0),
            current_weight_pct: saturate(current / current_divisor * 100.0),
        })
        .collect();

    if !coercions.is_empty() {
        log::warn!("{} value cell(s) were not numeric and were treated as 0", coercions.len());
    }

    let ratios = ratios_from_rows(&enriched, labels);

    Ok(AnalysisResult {
        rows: enriched,
        totals_row,
        ratios,
        coercions,
    })
}

/// Percentage change from prior to current, with an ε baseline for zero.
pub fn growth_pct(prior: f64, current: f64) -> f64 {
    saturate((current - prior) / or_epsilon(prior) * 100.0)
}

/// Clamp overflow to the largest finite value with the same sign.
pub(crate) fn saturate(value: f64) -> f64 {
    if value.is_finite() {
        value
    } else if value.is_nan() {
        0.0
    } else {
        f64::MAX.copysign(value)
    }
}

fn or_epsilon(value: f64) -> f64 {
    if value == 0.0 {
        EPSILON
    } else {
        value
    }
}

fn coerce(idx: usize, row: &RawRow, period: Period, fallbacks: &mut Vec<CoercionFallback>) -> f64 {
    let cell = match period {
        Period::Prior => &row.prior,
        Period::Current => &row.current,
    };
    let coerced = coerce_cell(cell);
    if coerced == Coerced::Fallback {
        fallbacks.push(CoercionFallback {
            row: idx,
            label: row.label.clone(),
            period,
            raw: cell.raw(),
        });
    }
    coerced.value()
}
