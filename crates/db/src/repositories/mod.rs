//! Repository abstractions for data access.
//!
//! Repositories provide a clean interface for database operations,
//! hiding the `SeaORM` implementation details from the rest of the
//! application.

pub mod alert_rule;
pub mod dashboard;
pub mod notification;
pub mod upload;
pub mod user;

pub use alert_rule::{
    AlertRuleError, AlertRuleRepository, CreateAlertRuleInput, UpdateAlertRuleInput, rule_spec,
};
pub use dashboard::{DashboardRepository, DashboardTotals};
pub use notification::NotificationRepository;
pub use upload::{CreateCompletedUploadInput, CreateFailedUploadInput, UploadError, UploadRepository};
pub use user::UserRepository;
