//! Detection types and aggregate metrics.

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::types::{ParseVocabError, Severity};

/// The closed set of leakage rules, in evaluation order.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum RuleKind {
    /// Row repeats the (date, amount, category) fingerprint of an earlier
    /// row in the same upload.
    Duplicate,
    /// Amount magnitude strictly exceeds the configured ceiling.
    AnomalousAmount,
    /// Row parsed but a canonical field carries an empty value.
    IncompleteRecord,
}

impl RuleKind {
    /// All rules in their fixed evaluation order.
    pub const ALL: [Self; 3] = [Self::Duplicate, Self::AnomalousAmount, Self::IncompleteRecord];

    /// Returns the canonical rule identifier.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Duplicate => "duplicate",
            Self::AnomalousAmount => "anomalous_amount",
            Self::IncompleteRecord => "incomplete_record",
        }
    }

    /// The fixed severity a finding from this rule carries.
    #[must_use]
    pub const fn severity(self) -> Severity {
        match self {
            Self::Duplicate => Severity::High,
            Self::AnomalousAmount => Severity::Medium,
            Self::IncompleteRecord => Severity::Low,
        }
    }
}

impl std::fmt::Display for RuleKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for RuleKind {
    type Err = ParseVocabError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "duplicate" => Ok(Self::Duplicate),
            "anomalous_amount" => Ok(Self::AnomalousAmount),
            "incomplete_record" => Ok(Self::IncompleteRecord),
            other => Err(ParseVocabError {
                kind: "rule",
                value: other.to_string(),
            }),
        }
    }
}

/// Thresholds for the detection rules, passed explicitly per call.
#[derive(Debug, Clone, Copy)]
pub struct DetectionConfig {
    /// Absolute amount above which (strictly) a row is flagged anomalous.
    pub amount_ceiling: Decimal,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            amount_ceiling: Decimal::new(10_000, 0),
        }
    }
}

/// One flagged anomaly, owned by exactly one upload. Immutable after
/// creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LeakageFinding {
    /// Which rule fired.
    pub rule: RuleKind,
    /// Severity, fixed per rule.
    pub severity: Severity,
    /// Zero-based source data-row index of the flagged row.
    pub row_index: usize,
    /// Human-readable description of the anomaly.
    pub description: String,
    /// Estimated monetary impact.
    pub impact: Decimal,
}

/// Aggregate metrics for one detection pass.
///
/// `by_rule` is an ordered map keyed by rule identifier so the serialized
/// form is byte-stable across runs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SummaryMetrics {
    /// Rows that survived parsing and were scanned.
    pub rows_processed: u64,
    /// Rows excluded during parsing.
    pub rows_skipped: u64,
    /// Total findings across all rules.
    pub total_flagged: u64,
    /// Sum of finding impact estimates.
    pub total_impact: Decimal,
    /// Finding count per rule identifier; every rule is present, zero or
    /// not.
    pub by_rule: BTreeMap<String, u64>,
}

impl SummaryMetrics {
    /// Finding count for one rule.
    #[must_use]
    pub fn rule_count(&self, rule: RuleKind) -> u64 {
        self.by_rule.get(rule.as_str()).copied().unwrap_or(0)
    }
}

/// Findings plus aggregate summary from one `detect()` invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetectionOutcome {
    /// All findings in row order (rule order within a row).
    pub findings: Vec<LeakageFinding>,
    /// Aggregate metrics.
    pub summary: SummaryMetrics,
}
