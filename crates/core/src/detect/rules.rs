//! Rule evaluation over normalized rows.

use std::collections::{BTreeMap, HashSet};

use chrono::NaiveDate;
use rust_decimal::Decimal;

use super::types::{DetectionConfig, DetectionOutcome, LeakageFinding, RuleKind, SummaryMetrics};
use crate::ingest::NormalizedRow;

/// Transaction fingerprint used for duplicate detection.
type Fingerprint<'a> = (NaiveDate, Decimal, Option<&'a str>);

/// Scans normalized rows against the fixed rule list.
///
/// Rules run in the order of [`RuleKind::ALL`] for each row; a row may
/// trigger several rules. The duplicate fingerprint set is created fresh
/// here and never leaves this call, so concurrent invocations share no
/// state. Deterministic: identical input produces identical findings and
/// summary.
#[must_use]
pub fn detect(
    rows: &[NormalizedRow],
    rows_skipped: u64,
    config: &DetectionConfig,
) -> DetectionOutcome {
    let mut findings = Vec::new();
    let mut seen: HashSet<Fingerprint<'_>> = HashSet::with_capacity(rows.len());

    for row in rows {
        let fingerprint = (row.date, row.amount, row.category.as_deref());
        if !seen.insert(fingerprint) {
            findings.push(finding(
                RuleKind::Duplicate,
                row,
                format!(
                    "amount {} on {} repeats an earlier transaction with the same category",
                    row.amount, row.date
                ),
                row.amount.abs(),
            ));
        }

        if row.amount.abs() > config.amount_ceiling {
            findings.push(finding(
                RuleKind::AnomalousAmount,
                row,
                format!(
                    "amount {} exceeds the configured ceiling of {}",
                    row.amount, config.amount_ceiling
                ),
                row.amount.abs() - config.amount_ceiling,
            ));
        }

        if row.category.is_none() {
            findings.push(finding(
                RuleKind::IncompleteRecord,
                row,
                "transaction has no category".to_string(),
                Decimal::ZERO,
            ));
        }
    }

    let summary = summarize(rows.len() as u64, rows_skipped, &findings);

    DetectionOutcome { findings, summary }
}

fn finding(
    rule: RuleKind,
    row: &NormalizedRow,
    description: String,
    impact: Decimal,
) -> LeakageFinding {
    LeakageFinding {
        rule,
        severity: rule.severity(),
        row_index: row.row_index,
        description,
        impact,
    }
}

fn summarize(rows_processed: u64, rows_skipped: u64, findings: &[LeakageFinding]) -> SummaryMetrics {
    let mut by_rule: BTreeMap<String, u64> = RuleKind::ALL
        .iter()
        .map(|rule| (rule.as_str().to_string(), 0))
        .collect();

    let mut total_impact = Decimal::ZERO;
    for finding in findings {
        total_impact += finding.impact;
        if let Some(count) = by_rule.get_mut(finding.rule.as_str()) {
            *count += 1;
        }
    }

    SummaryMetrics {
        rows_processed,
        rows_skipped,
        total_flagged: findings.len() as u64,
        total_impact,
        by_rule,
    }
}
