//! Property-based tests for detection determinism and summary invariants.

use chrono::NaiveDate;
use proptest::prelude::*;
use rust_decimal::Decimal;

use super::rules::detect;
use super::types::DetectionConfig;
use crate::ingest::NormalizedRow;

/// Strategy for a plausible transaction date.
fn date_strategy() -> impl Strategy<Value = NaiveDate> {
    (0u32..=3650).prop_map(|offset| {
        NaiveDate::from_ymd_opt(2020, 1, 1)
            .unwrap()
            .checked_add_days(chrono::Days::new(u64::from(offset)))
            .unwrap()
    })
}

/// Strategy for signed amounts between -20,000.00 and 20,000.00.
fn amount_strategy() -> impl Strategy<Value = Decimal> {
    (-2_000_000i64..=2_000_000).prop_map(|cents| Decimal::new(cents, 2))
}

/// Strategy for a small category vocabulary (plus missing).
fn category_strategy() -> impl Strategy<Value = Option<String>> {
    prop_oneof![
        Just(None),
        Just(Some("Retail".to_string())),
        Just(Some("Wholesale".to_string())),
        Just(Some("Services".to_string())),
    ]
}

fn rows_strategy() -> impl Strategy<Value = Vec<NormalizedRow>> {
    prop::collection::vec(
        (date_strategy(), amount_strategy(), category_strategy()),
        0..40,
    )
    .prop_map(|cells| {
        cells
            .into_iter()
            .enumerate()
            .map(|(row_index, (date, amount, category))| NormalizedRow {
                row_index,
                date,
                amount,
                category,
            })
            .collect()
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Two runs over the same rows produce identical findings and summary,
    /// including the serialized form.
    #[test]
    fn prop_detect_is_deterministic(rows in rows_strategy()) {
        let config = DetectionConfig::default();

        let first = detect(&rows, 0, &config);
        let second = detect(&rows, 0, &config);

        prop_assert_eq!(&first.findings, &second.findings);
        prop_assert_eq!(&first.summary, &second.summary);
        prop_assert_eq!(
            serde_json::to_string(&first.summary).unwrap(),
            serde_json::to_string(&second.summary).unwrap()
        );
    }

    /// The per-rule breakdown always sums to the flagged total, and the
    /// flagged total never exceeds rows * rule count.
    #[test]
    fn prop_summary_totals_are_consistent(rows in rows_strategy()) {
        let config = DetectionConfig::default();
        let outcome = detect(&rows, 0, &config);

        let breakdown_sum: u64 = outcome.summary.by_rule.values().sum();
        prop_assert_eq!(breakdown_sum, outcome.summary.total_flagged);
        prop_assert_eq!(outcome.summary.total_flagged, outcome.findings.len() as u64);
        prop_assert_eq!(outcome.summary.rows_processed, rows.len() as u64);
    }

    /// Duplicate findings never point at a row's first occurrence.
    #[test]
    fn prop_first_occurrence_never_flagged_duplicate(rows in rows_strategy()) {
        let outcome = detect(&rows, 0, &DetectionConfig::default());

        for finding in outcome
            .findings
            .iter()
            .filter(|f| f.rule == super::types::RuleKind::Duplicate)
        {
            let flagged = &rows[finding.row_index];
            let earlier = rows[..finding.row_index].iter().any(|r| {
                r.date == flagged.date
                    && r.amount == flagged.amount
                    && r.category == flagged.category
            });
            prop_assert!(earlier, "duplicate finding without an earlier twin");
        }
    }
}
