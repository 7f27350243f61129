//! Rule-based leakage detection over normalized rows.
//!
//! An ordered, fixed list of rule predicates runs against each row:
//! duplicate detection, anomalous amount, then incomplete record. A row may
//! trigger any number of rules; each hit yields one finding. Detection
//! performs no I/O and is deterministic over its input, which the property
//! tests rely on.

pub mod rules;
pub mod types;

#[cfg(test)]
mod tests;

#[cfg(test)]
mod detect_props;

pub use rules::detect;
pub use types::{
    DetectionConfig, DetectionOutcome, LeakageFinding, RuleKind, SummaryMetrics,
};
