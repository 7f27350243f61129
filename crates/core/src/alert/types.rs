//! Alert rule types and the metric catalog.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::types::{ParseVocabError, Severity};

/// Comparison operator of an alert rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Comparator {
    /// Observed value strictly above the threshold.
    GreaterThan,
    /// Observed value strictly below the threshold.
    LessThan,
    /// Observed value equal to the threshold.
    Equals,
    /// Observed value different from the threshold.
    NotEquals,
}

impl Comparator {
    /// Returns the canonical string form.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::GreaterThan => "greater_than",
            Self::LessThan => "less_than",
            Self::Equals => "equals",
            Self::NotEquals => "not_equals",
        }
    }

    /// Short symbol used in notification messages.
    #[must_use]
    pub const fn symbol(self) -> &'static str {
        match self {
            Self::GreaterThan => ">",
            Self::LessThan => "<",
            Self::Equals => "=",
            Self::NotEquals => "!=",
        }
    }

    /// Applies the comparison. Decimal comparison is exact; no float
    /// tolerance is involved.
    #[must_use]
    pub fn compare(self, observed: Decimal, threshold: Decimal) -> bool {
        match self {
            Self::GreaterThan => observed > threshold,
            Self::LessThan => observed < threshold,
            Self::Equals => observed == threshold,
            Self::NotEquals => observed != threshold,
        }
    }
}

impl std::fmt::Display for Comparator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Comparator {
    type Err = ParseVocabError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "greater_than" => Ok(Self::GreaterThan),
            "less_than" => Ok(Self::LessThan),
            "equals" => Ok(Self::Equals),
            "not_equals" => Ok(Self::NotEquals),
            other => Err(ParseVocabError {
                kind: "comparator",
                value: other.to_string(),
            }),
        }
    }
}

/// One active alert rule as seen by the evaluator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlertRuleSpec {
    /// Rule identifier (for the resulting notification reference).
    pub id: Uuid,
    /// User-facing rule name.
    pub name: String,
    /// Metric name; checked against the catalog at evaluation time.
    pub metric: String,
    /// Comparison operator.
    pub comparator: Comparator,
    /// Threshold value.
    pub threshold: Decimal,
    /// Severity the resulting notification carries.
    pub severity: Severity,
}

/// A notification to be persisted by the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationDraft {
    /// The rule that fired.
    pub rule_id: Uuid,
    /// Notification title.
    pub title: String,
    /// Message naming metric, observed value, and threshold.
    pub message: String,
    /// Severity, copied from the rule.
    pub severity: Severity,
}

/// Non-fatal evaluation advisory for a rule that was skipped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Advisory {
    /// The skipped rule.
    pub rule_id: Uuid,
    /// Rule name for display.
    pub rule_name: String,
    /// The metric that could not be resolved.
    pub metric: String,
    /// Why the rule was skipped.
    pub reason: String,
}

/// Result of one evaluation pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Evaluation {
    /// Drafts for every rule that fired, in rule order.
    pub notifications: Vec<NotificationDraft>,
    /// Advisories for rules that were skipped.
    pub advisories: Vec<Advisory>,
}

/// Unit of a catalog metric, for UI formatting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MetricUnit {
    /// Plain count.
    Count,
    /// Monetary value.
    Currency,
}

/// Catalog entry describing one supported metric.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct MetricInfo {
    /// Metric name as referenced by alert rules.
    pub name: &'static str,
    /// Human-readable label.
    pub label: &'static str,
    /// Value unit.
    pub unit: MetricUnit,
    /// True when the metric needs a previous upload summary.
    pub needs_baseline: bool,
}

/// The fixed set of metrics alert rules may reference.
pub const METRIC_CATALOG: &[MetricInfo] = &[
    MetricInfo {
        name: "rows_processed",
        label: "Rows processed",
        unit: MetricUnit::Count,
        needs_baseline: false,
    },
    MetricInfo {
        name: "rows_skipped",
        label: "Rows skipped",
        unit: MetricUnit::Count,
        needs_baseline: false,
    },
    MetricInfo {
        name: "total_flagged",
        label: "Leakage entries flagged",
        unit: MetricUnit::Count,
        needs_baseline: false,
    },
    MetricInfo {
        name: "total_impact",
        label: "Estimated leakage impact",
        unit: MetricUnit::Currency,
        needs_baseline: false,
    },
    MetricInfo {
        name: "duplicate_count",
        label: "Duplicate transactions",
        unit: MetricUnit::Count,
        needs_baseline: false,
    },
    MetricInfo {
        name: "anomalous_amount_count",
        label: "Anomalous amounts",
        unit: MetricUnit::Count,
        needs_baseline: false,
    },
    MetricInfo {
        name: "incomplete_record_count",
        label: "Incomplete records",
        unit: MetricUnit::Count,
        needs_baseline: false,
    },
    MetricInfo {
        name: "total_impact_delta",
        label: "Impact change vs previous upload",
        unit: MetricUnit::Currency,
        needs_baseline: true,
    },
    MetricInfo {
        name: "total_flagged_delta",
        label: "Flagged change vs previous upload",
        unit: MetricUnit::Count,
        needs_baseline: true,
    },
];
