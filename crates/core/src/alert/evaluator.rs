//! Alert rule evaluation.

use rust_decimal::Decimal;

use super::types::{Advisory, AlertRuleSpec, Evaluation, NotificationDraft};
use crate::detect::{RuleKind, SummaryMetrics};

/// Outcome of resolving a metric name against the current summary.
enum MetricLookup {
    /// The metric resolved to a value.
    Value(Decimal),
    /// The metric name is not in the catalog.
    Unknown,
    /// A delta metric was requested but no previous summary exists.
    MissingBaseline,
}

/// Resolves a metric name against the current (and optionally previous)
/// summary.
///
/// Returns `None` for names outside the catalog or delta metrics without a
/// baseline; callers distinguishing those cases use [`evaluate`].
#[must_use]
pub fn metric_value(
    name: &str,
    current: &SummaryMetrics,
    previous: Option<&SummaryMetrics>,
) -> Option<Decimal> {
    match lookup(name, current, previous) {
        MetricLookup::Value(value) => Some(value),
        MetricLookup::Unknown | MetricLookup::MissingBaseline => None,
    }
}

fn lookup(name: &str, current: &SummaryMetrics, previous: Option<&SummaryMetrics>) -> MetricLookup {
    let value = match name {
        "rows_processed" => Decimal::from(current.rows_processed),
        "rows_skipped" => Decimal::from(current.rows_skipped),
        "total_flagged" => Decimal::from(current.total_flagged),
        "total_impact" => current.total_impact,
        "duplicate_count" => Decimal::from(current.rule_count(RuleKind::Duplicate)),
        "anomalous_amount_count" => Decimal::from(current.rule_count(RuleKind::AnomalousAmount)),
        "incomplete_record_count" => Decimal::from(current.rule_count(RuleKind::IncompleteRecord)),
        "total_impact_delta" => match previous {
            Some(prev) => current.total_impact - prev.total_impact,
            None => return MetricLookup::MissingBaseline,
        },
        "total_flagged_delta" => match previous {
            Some(prev) => {
                Decimal::from(current.total_flagged) - Decimal::from(prev.total_flagged)
            }
            None => return MetricLookup::MissingBaseline,
        },
        _ => return MetricLookup::Unknown,
    };
    MetricLookup::Value(value)
}

/// Evaluates alert rules against the current summary.
///
/// Each satisfied rule emits exactly one notification draft; repeated
/// firings across uploads are NOT deduplicated here (that is a caller
/// concern by design). Rules that cannot be evaluated are skipped with an
/// advisory; this function never fails.
#[must_use]
pub fn evaluate(
    rules: &[AlertRuleSpec],
    current: &SummaryMetrics,
    previous: Option<&SummaryMetrics>,
) -> Evaluation {
    let mut evaluation = Evaluation::default();

    for rule in rules {
        let observed = match lookup(&rule.metric, current, previous) {
            MetricLookup::Value(value) => value,
            MetricLookup::Unknown => {
                evaluation.advisories.push(Advisory {
                    rule_id: rule.id,
                    rule_name: rule.name.clone(),
                    metric: rule.metric.clone(),
                    reason: "unknown metric, rule skipped".to_string(),
                });
                continue;
            }
            MetricLookup::MissingBaseline => {
                evaluation.advisories.push(Advisory {
                    rule_id: rule.id,
                    rule_name: rule.name.clone(),
                    metric: rule.metric.clone(),
                    reason: "metric requires a previous upload summary, rule skipped".to_string(),
                });
                continue;
            }
        };

        if rule.comparator.compare(observed, rule.threshold) {
            evaluation.notifications.push(NotificationDraft {
                rule_id: rule.id,
                title: format!("{}: {}", rule.severity.as_str().to_uppercase(), rule.name),
                message: format!(
                    "Alert '{}' fired: {} is {}, threshold {} {}",
                    rule.name,
                    rule.metric,
                    observed,
                    rule.comparator.symbol(),
                    rule.threshold
                ),
                severity: rule.severity,
            });
        }
    }

    evaluation
}
