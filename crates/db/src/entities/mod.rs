//! `SeaORM` entity definitions.

pub mod alert_rules;
pub mod leakage_entries;
pub mod notifications;
pub mod uploads;
pub mod users;
