//! Alert rule repository for user-defined threshold rules.

use std::str::FromStr;

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter,
    QueryOrder, Set,
};
use rust_decimal::Decimal;
use uuid::Uuid;

use revguard_core::alert::{AlertRuleSpec, Comparator};
use revguard_core::types::Severity;

use crate::entities::alert_rules;

/// Error types for alert rule operations.
#[derive(Debug, thiserror::Error)]
pub enum AlertRuleError {
    /// Rule not found (or owned by another user).
    #[error("Alert rule not found: {0}")]
    NotFound(Uuid),

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

/// Input for creating an alert rule.
#[derive(Debug, Clone)]
pub struct CreateAlertRuleInput {
    /// Owning user.
    pub user_id: Uuid,
    /// Rule name.
    pub name: String,
    /// Optional description.
    pub description: Option<String>,
    /// Metric name the rule watches.
    pub metric: String,
    /// Comparison operator.
    pub comparator: Comparator,
    /// Threshold value.
    pub threshold: Decimal,
    /// Severity of resulting notifications.
    pub severity: Severity,
}

/// Partial update for an alert rule; `None` fields are left untouched.
#[derive(Debug, Clone, Default)]
pub struct UpdateAlertRuleInput {
    /// New name.
    pub name: Option<String>,
    /// New description.
    pub description: Option<String>,
    /// New threshold.
    pub threshold: Option<Decimal>,
    /// New severity.
    pub severity: Option<Severity>,
    /// New active flag.
    pub is_active: Option<bool>,
}

/// Converts a stored rule into the evaluator's view of it.
///
/// Returns `None` when the stored comparator or severity no longer parses;
/// such rows are skipped rather than failing evaluation.
#[must_use]
pub fn rule_spec(model: &alert_rules::Model) -> Option<AlertRuleSpec> {
    let comparator = Comparator::from_str(&model.comparator).ok()?;
    let severity = Severity::from_str(&model.severity).ok()?;
    Some(AlertRuleSpec {
        id: model.id,
        name: model.name.clone(),
        metric: model.metric.clone(),
        comparator,
        threshold: model.threshold,
        severity,
    })
}

/// Alert rule repository for CRUD operations.
#[derive(Debug, Clone)]
pub struct AlertRuleRepository {
    db: DatabaseConnection,
}

impl AlertRuleRepository {
    /// Creates a new alert rule repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Lists a user's rules, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list_by_user(
        &self,
        user_id: Uuid,
    ) -> Result<Vec<alert_rules::Model>, AlertRuleError> {
        Ok(alert_rules::Entity::find()
            .filter(alert_rules::Column::UserId.eq(user_id))
            .order_by_desc(alert_rules::Column::CreatedAt)
            .all(&self.db)
            .await?)
    }

    /// Lists a user's active rules, for evaluation after an upload.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list_active_by_user(
        &self,
        user_id: Uuid,
    ) -> Result<Vec<alert_rules::Model>, AlertRuleError> {
        Ok(alert_rules::Entity::find()
            .filter(alert_rules::Column::UserId.eq(user_id))
            .filter(alert_rules::Column::IsActive.eq(true))
            .order_by_asc(alert_rules::Column::CreatedAt)
            .all(&self.db)
            .await?)
    }

    /// Creates a new rule, active by default.
    ///
    /// # Errors
    ///
    /// Returns an error if the database insert fails.
    pub async fn create(
        &self,
        input: CreateAlertRuleInput,
    ) -> Result<alert_rules::Model, AlertRuleError> {
        let now = Utc::now().into();
        let rule = alert_rules::ActiveModel {
            id: Set(Uuid::new_v4()),
            user_id: Set(input.user_id),
            name: Set(input.name),
            description: Set(input.description),
            metric: Set(input.metric),
            comparator: Set(input.comparator.as_str().to_string()),
            threshold: Set(input.threshold),
            severity: Set(input.severity.as_str().to_string()),
            is_active: Set(true),
            created_at: Set(now),
            updated_at: Set(now),
        };

        Ok(rule.insert(&self.db).await?)
    }

    /// Finds one rule scoped to its owner.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find_by_id_for_user(
        &self,
        id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<alert_rules::Model>, AlertRuleError> {
        Ok(alert_rules::Entity::find_by_id(id)
            .filter(alert_rules::Column::UserId.eq(user_id))
            .one(&self.db)
            .await?)
    }

    /// Applies a partial update to a rule.
    ///
    /// # Errors
    ///
    /// Returns `AlertRuleError::NotFound` if the rule does not exist for
    /// this user.
    pub async fn update(
        &self,
        id: Uuid,
        user_id: Uuid,
        input: UpdateAlertRuleInput,
    ) -> Result<alert_rules::Model, AlertRuleError> {
        let rule = self
            .find_by_id_for_user(id, user_id)
            .await?
            .ok_or(AlertRuleError::NotFound(id))?;

        let mut active: alert_rules::ActiveModel = rule.into();
        if let Some(name) = input.name {
            active.name = Set(name);
        }
        if let Some(description) = input.description {
            active.description = Set(Some(description));
        }
        if let Some(threshold) = input.threshold {
            active.threshold = Set(threshold);
        }
        if let Some(severity) = input.severity {
            active.severity = Set(severity.as_str().to_string());
        }
        if let Some(is_active) = input.is_active {
            active.is_active = Set(is_active);
        }
        active.updated_at = Set(Utc::now().into());

        Ok(active.update(&self.db).await?)
    }

    /// Flips a rule's active flag.
    ///
    /// # Errors
    ///
    /// Returns `AlertRuleError::NotFound` if the rule does not exist for
    /// this user.
    pub async fn toggle_active(
        &self,
        id: Uuid,
        user_id: Uuid,
    ) -> Result<alert_rules::Model, AlertRuleError> {
        let rule = self
            .find_by_id_for_user(id, user_id)
            .await?
            .ok_or(AlertRuleError::NotFound(id))?;

        let was_active = rule.is_active;
        let mut active: alert_rules::ActiveModel = rule.into();
        active.is_active = Set(!was_active);
        active.updated_at = Set(Utc::now().into());

        Ok(active.update(&self.db).await?)
    }

    /// Deletes a rule.
    ///
    /// # Errors
    ///
    /// Returns an error if the database delete fails.
    pub async fn delete(&self, id: Uuid, user_id: Uuid) -> Result<bool, AlertRuleError> {
        let result = alert_rules::Entity::delete_many()
            .filter(alert_rules::Column::Id.eq(id))
            .filter(alert_rules::Column::UserId.eq(user_id))
            .exec(&self.db)
            .await?;

        Ok(result.rows_affected > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn model(comparator: &str, severity: &str) -> alert_rules::Model {
        alert_rules::Model {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            name: "Impact watch".to_string(),
            description: None,
            metric: "total_impact".to_string(),
            comparator: comparator.to_string(),
            threshold: dec!(1000),
            severity: severity.to_string(),
            is_active: true,
            created_at: Utc::now().into(),
            updated_at: Utc::now().into(),
        }
    }

    #[test]
    fn test_rule_spec_parses_stored_vocabulary() {
        let spec = rule_spec(&model("greater_than", "high")).unwrap();
        assert_eq!(spec.comparator, Comparator::GreaterThan);
        assert_eq!(spec.severity, Severity::High);
        assert_eq!(spec.threshold, dec!(1000));
    }

    #[test]
    fn test_rule_spec_skips_unparseable_rows() {
        assert!(rule_spec(&model("between", "high")).is_none());
        assert!(rule_spec(&model("greater_than", "urgent")).is_none());
    }
}
