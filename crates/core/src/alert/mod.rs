//! Threshold alert evaluation against summary metrics.
//!
//! After an upload's summary is produced, every active user-defined alert
//! rule is checked against it. Satisfied rules yield notification drafts for
//! the caller to persist; rules that cannot be evaluated (unknown metric,
//! missing baseline) are skipped with a non-fatal advisory. The evaluator
//! itself never fails and never touches storage.

pub mod evaluator;
pub mod types;


pub use evaluator::{evaluate, metric_value};
pub use types::{
    Advisory, AlertRuleSpec, Comparator, Evaluation, MetricInfo, MetricUnit, NotificationDraft,
    METRIC_CATALOG,
};
