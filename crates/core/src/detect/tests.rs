//! Leakage detector tests.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use super::*;
use crate::ingest::NormalizedRow;

fn date(day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 6, day).unwrap()
}

fn row(index: usize, day: u32, amount: Decimal, category: Option<&str>) -> NormalizedRow {
    NormalizedRow {
        row_index: index,
        date: date(day),
        amount,
        category: category.map(ToString::to_string),
    }
}

fn config() -> DetectionConfig {
    DetectionConfig {
        amount_ceiling: dec!(1000),
    }
}

#[test]
fn test_clean_rows_produce_no_findings() {
    let rows = vec![
        row(0, 1, dec!(100), Some("Retail")),
        row(1, 2, dec!(200), Some("Retail")),
    ];

    let outcome = detect(&rows, 0, &config());

    assert!(outcome.findings.is_empty());
    assert_eq!(outcome.summary.rows_processed, 2);
    assert_eq!(outcome.summary.total_flagged, 0);
    assert_eq!(outcome.summary.total_impact, Decimal::ZERO);
}

#[test]
fn test_duplicate_flags_second_occurrence_only() {
    let rows = vec![
        row(0, 1, dec!(50), Some("Retail")),
        row(1, 1, dec!(50), Some("Retail")),
    ];

    let outcome = detect(&rows, 0, &config());

    assert_eq!(outcome.findings.len(), 1);
    let finding = &outcome.findings[0];
    assert_eq!(finding.rule, RuleKind::Duplicate);
    assert_eq!(finding.row_index, 1);
    assert_eq!(finding.impact, dec!(50));
}

#[test]
fn test_every_repeat_after_the_first_is_flagged() {
    let rows = vec![
        row(0, 1, dec!(50), Some("Retail")),
        row(1, 1, dec!(50), Some("Retail")),
        row(2, 1, dec!(50), Some("Retail")),
    ];

    let outcome = detect(&rows, 0, &config());

    let duplicate_indices: Vec<usize> = outcome
        .findings
        .iter()
        .filter(|f| f.rule == RuleKind::Duplicate)
        .map(|f| f.row_index)
        .collect();
    assert_eq!(duplicate_indices, vec![1, 2]);
}

#[test]
fn test_differing_category_is_not_a_duplicate() {
    let rows = vec![
        row(0, 1, dec!(50), Some("Retail")),
        row(1, 1, dec!(50), Some("Wholesale")),
    ];

    let outcome = detect(&rows, 0, &config());
    assert!(outcome.findings.is_empty());
}

#[test]
fn test_ceiling_is_a_strict_inequality() {
    let rows = vec![
        row(0, 1, dec!(1000), Some("Retail")),
        row(1, 2, dec!(1001), Some("Retail")),
    ];

    let outcome = detect(&rows, 0, &config());

    assert_eq!(outcome.findings.len(), 1);
    assert_eq!(outcome.findings[0].rule, RuleKind::AnomalousAmount);
    assert_eq!(outcome.findings[0].row_index, 1);
    assert_eq!(outcome.findings[0].impact, dec!(1));
}

#[test]
fn test_negative_amount_magnitude_breaches_ceiling() {
    let rows = vec![row(0, 1, dec!(-2500), Some("Refunds"))];

    let outcome = detect(&rows, 0, &config());

    assert_eq!(outcome.findings[0].rule, RuleKind::AnomalousAmount);
    assert_eq!(outcome.findings[0].impact, dec!(1500));
}

#[test]
fn test_missing_category_is_incomplete_record() {
    let rows = vec![row(0, 1, dec!(10), None)];

    let outcome = detect(&rows, 0, &config());

    assert_eq!(outcome.findings.len(), 1);
    assert_eq!(outcome.findings[0].rule, RuleKind::IncompleteRecord);
    assert_eq!(outcome.findings[0].impact, Decimal::ZERO);
}

#[test]
fn test_one_row_can_trigger_several_rules() {
    let rows = vec![
        row(0, 1, dec!(5000), None),
        row(1, 1, dec!(5000), None),
    ];

    let outcome = detect(&rows, 0, &config());

    // Second row: duplicate + anomalous + incomplete, in rule order.
    let second_row_rules: Vec<RuleKind> = outcome
        .findings
        .iter()
        .filter(|f| f.row_index == 1)
        .map(|f| f.rule)
        .collect();
    assert_eq!(
        second_row_rules,
        vec![
            RuleKind::Duplicate,
            RuleKind::AnomalousAmount,
            RuleKind::IncompleteRecord
        ]
    );
}

#[test]
fn test_summary_breakdown_and_totals() {
    let rows = vec![
        row(0, 1, dec!(100), Some("Retail")),
        row(1, 1, dec!(100), Some("Retail")),
        row(2, 2, dec!(1500), Some("Retail")),
        row(3, 3, dec!(10), None),
    ];

    let outcome = detect(&rows, 2, &config());
    let summary = &outcome.summary;

    assert_eq!(summary.rows_processed, 4);
    assert_eq!(summary.rows_skipped, 2);
    assert_eq!(summary.total_flagged, 3);
    assert_eq!(summary.rule_count(RuleKind::Duplicate), 1);
    assert_eq!(summary.rule_count(RuleKind::AnomalousAmount), 1);
    assert_eq!(summary.rule_count(RuleKind::IncompleteRecord), 1);
    // 100 (duplicate) + 500 (excess over ceiling) + 0 (incomplete)
    assert_eq!(summary.total_impact, dec!(600));
}

#[test]
fn test_fingerprints_do_not_leak_across_invocations() {
    let rows = vec![row(0, 1, dec!(50), Some("Retail"))];

    let first = detect(&rows, 0, &config());
    let second = detect(&rows, 0, &config());

    // If the seen-set leaked between calls, the second run would flag a
    // duplicate.
    assert!(first.findings.is_empty());
    assert!(second.findings.is_empty());
}

#[test]
fn test_empty_input() {
    let outcome = detect(&[], 0, &config());

    assert!(outcome.findings.is_empty());
    assert_eq!(outcome.summary.rows_processed, 0);
    assert_eq!(outcome.summary.rule_count(RuleKind::Duplicate), 0);
}
