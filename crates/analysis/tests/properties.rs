// Property-based tests for the derivation engine.
// CI: 256 cases (default). Soak: PROPTEST_CASES=10000 cargo test --release

use proptest::prelude::*;

use ledgerlens_analysis::labels::label_matches;
use ledgerlens_analysis::{
    derive_analysis, extract_liquidity_ratios, serialize_context, AnalysisError, CellInput, LabelSet, RawRow,
};

fn config() -> ProptestConfig {
    ProptestConfig {
        cases: std::env::var("PROPTEST_CASES")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(256),
        failure_persistence: None,
        ..ProptestConfig::default()
    }
}

// ---------------------------------------------------------------------------
// Generators
// ---------------------------------------------------------------------------

/// Arbitrary value cell: mostly numeric, sometimes text, sometimes empty.
fn arb_cell() -> impl Strategy<Value = CellInput> {
    prop_oneof![
        4 => (-1e12f64..1e12).prop_map(CellInput::Number),
        2 => r"-?[0-9]{1,9}(\.[0-9]{1,2})?".prop_map(CellInput::Text),
        1 => r"[a-zA-Z/ ]{1,8}".prop_map(CellInput::Text),
        1 => Just(CellInput::Number(0.0)),
        1 => Just(CellInput::Empty),
    ]
}

fn arb_label() -> impl Strategy<Value = String> {
    r"[A-Za-z][A-Za-z ]{0,11}"
}

/// Component rows plus a totals row equal to their sum, inserted at a random position.
fn arb_balanced_sheet() -> impl Strategy<Value = (Vec<RawRow>, usize)> {
    proptest::collection::vec((arb_label(), 1.0f64..1e9, 1.0f64..1e9), 1..20).prop_flat_map(|items| {
        let n = items.len();
        (Just(items), 0..=n)
    })
    .prop_map(|(items, pos)| {
        let total_prior: f64 = items.iter().map(|(_, p, _)| p).sum();
        let total_current: f64 = items.iter().map(|(_, _, c)| c).sum();
        let mut rows: Vec<RawRow> = items
            .into_iter()
            .enumerate()
            .map(|(i, (label, p, c))| RawRow::new(format!("Item {i} {label}"), p, c))
            .collect();
        rows.insert(pos, RawRow::new("TOTAL ASSETS", total_prior, total_current));
        (rows, pos)
    })
}

fn arb_sheet_with_totals() -> impl Strategy<Value = Vec<RawRow>> {
    (
        proptest::collection::vec((arb_label(), arb_cell(), arb_cell()), 0..20),
        arb_cell(),
        arb_cell(),
    )
        .prop_map(|(items, tp, tc)| {
            let mut rows: Vec<RawRow> = items
                .into_iter()
                .map(|(l, p, c)| RawRow { label: l, prior: p, current: c })
                .collect();
            rows.push(RawRow { label: "Total assets".into(), prior: tp, current: tc });
            rows
        })
}

// ---------------------------------------------------------------------------
// Properties
// ---------------------------------------------------------------------------

proptest! {
    #![proptest_config(config())]

    #[test]
    fn derived_columns_always_finite(rows in arb_sheet_with_totals()) {
        let result = derive_analysis(&rows, &LabelSet::default()).unwrap();
        prop_assert_eq!(result.rows.len(), rows.len());
        for row in &result.rows {
            prop_assert!(row.prior.is_finite());
            prop_assert!(row.current.is_finite());
            prop_assert!(row.growth_pct.is_finite());
            prop_assert!(row.prior_weight_pct.is_finite());
            prop_assert!(row.current_weight_pct.is_finite());
        }
        for ratio in [&result.ratios.prior, &result.ratios.current] {
            if let Some(v) = ratio.value() {
                prop_assert!(v.is_finite());
            }
        }
    }

    #[test]
    fn component_weights_sum_to_hundred((rows, totals_at) in arb_balanced_sheet()) {
        let result = derive_analysis(&rows, &LabelSet::default()).unwrap();
        prop_assert_eq!(result.totals_row, totals_at);

        let (mut prior_sum, mut current_sum) = (0.0, 0.0);
        for (i, row) in result.rows.iter().enumerate() {
            if i != totals_at {
                prior_sum += row.prior_weight_pct;
                current_sum += row.current_weight_pct;
            }
        }
        prop_assert!((prior_sum - 100.0).abs() < 1e-6, "prior weights sum to {}", prior_sum);
        prop_assert!((current_sum - 100.0).abs() < 1e-6, "current weights sum to {}", current_sum);
        prop_assert!((result.totals().prior_weight_pct - 100.0).abs() < 1e-9);
        prop_assert!((result.totals().current_weight_pct - 100.0).abs() < 1e-9);
    }

    #[test]
    fn missing_totals_row_always_fails(
        items in proptest::collection::vec((arb_label(), arb_cell(), arb_cell()), 0..20)
    ) {
        let labels = LabelSet::default();
        prop_assume!(!items.iter().any(|(l, _, _)| label_matches(l, &labels.total_assets)));
        let rows: Vec<RawRow> = items
            .into_iter()
            .map(|(l, p, c)| RawRow { label: l, prior: p, current: c })
            .collect();
        let err = derive_analysis(&rows, &labels).unwrap_err();
        let is_missing_totals = matches!(err, AnalysisError::MissingTotalsRow { .. });
        prop_assert!(is_missing_totals);
    }

    #[test]
    fn derivation_and_snapshot_are_deterministic(rows in arb_sheet_with_totals()) {
        let labels = LabelSet::default();
        let a = derive_analysis(&rows, &labels).unwrap();
        let b = derive_analysis(&rows.clone(), &labels).unwrap();
        prop_assert_eq!(&a, &b);
        prop_assert_eq!(serialize_context(&a, &a.ratios), serialize_context(&b, &b.ratios));
        prop_assert_eq!(extract_liquidity_ratios(&a, &labels), a.ratios.clone());
    }
}

// ---------------------------------------------------------------------------
// Fixed scenarios
// ---------------------------------------------------------------------------

#[test]
fn zero_baseline_growth_is_large_and_finite() {
    let rows = vec![
        RawRow::new("New line", 0.0, 100.0),
        RawRow::new("Total assets", 100.0, 200.0),
    ];
    let result = derive_analysis(&rows, &LabelSet::default()).unwrap();
    let growth = result.rows[0].growth_pct;
    assert!(growth.is_finite());
    assert!(growth > 1e10, "growth = {growth}");
}

#[test]
fn missing_current_liabilities_leaves_both_ratios_absent() {
    let rows = vec![
        RawRow::new("Current assets", 40.0, 50.0),
        RawRow::new("Total assets", 100.0, 200.0),
    ];
    let labels = LabelSet::default();
    let result = derive_analysis(&rows, &labels).unwrap();
    let ratios = extract_liquidity_ratios(&result, &labels);
    assert!(ratios.prior.value().is_none());
    assert!(ratios.current.value().is_none());
}

#[test]
fn zero_current_liabilities_only_blanks_that_period() {
    let rows = vec![
        RawRow::new("Current assets", 40.0, 50.0),
        RawRow::new("Current liabilities", 20.0, 0.0),
        RawRow::new("Total assets", 100.0, 200.0),
    ];
    let labels = LabelSet::default();
    let result = derive_analysis(&rows, &labels).unwrap();
    let ratios = extract_liquidity_ratios(&result, &labels);
    assert_eq!(ratios.prior.value(), Some(2.0));
    assert!(ratios.current.value().is_none());
}

#[test]
fn vietnamese_statement_is_recognized() {
    let rows = vec![
        RawRow::new("A. TÀI SẢN NGẮN HẠN", 500.0, 600.0),
        RawRow::new("TỔNG CỘNG TÀI SẢN", 1000.0, 1200.0),
        RawRow::new("I. Nợ ngắn hạn", 250.0, 200.0),
    ];
    let result = derive_analysis(&rows, &LabelSet::default()).unwrap();
    assert_eq!(result.totals_row, 1);
    assert_eq!(result.ratios.prior.value(), Some(2.0));
    assert_eq!(result.ratios.current.value(), Some(3.0));
}

#[test]
fn result_serializes_to_json() {
    let rows = vec![RawRow::new("Total assets", 10.0, 20.0)];
    let result = derive_analysis(&rows, &LabelSet::default()).unwrap();
    let json = serde_json::to_value(&result).unwrap();
    assert_eq!(json["rows"][0]["label"], "Total assets");
    assert_eq!(json["ratios"]["prior"]["status"], "unavailable");
    assert_eq!(json["ratios"]["prior"]["cause"]["reason"], "missing_label");
}
