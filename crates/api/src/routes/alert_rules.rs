//! Alert rule management routes.

use std::str::FromStr;

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{delete, get, patch, post, put},
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{error, info};
use uuid::Uuid;

use crate::{AppState, middleware::AuthUser};
use revguard_core::alert::{Comparator, METRIC_CATALOG};
use revguard_core::types::Severity;
use revguard_db::AlertRuleRepository;
use revguard_db::entities::alert_rules;
use revguard_db::repositories::{AlertRuleError, CreateAlertRuleInput, UpdateAlertRuleInput};

/// Creates the alert rule routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/alert-rules", get(list_rules))
        .route("/alert-rules", post(create_rule))
        .route("/alert-rules/catalog", get(catalog))
        .route("/alert-rules/{rule_id}", put(update_rule))
        .route("/alert-rules/{rule_id}", delete(delete_rule))
        .route("/alert-rules/{rule_id}/status", patch(toggle_rule))
}

// ============================================================================
// Request/Response Types
// ============================================================================

/// Request body for creating an alert rule.
#[derive(Debug, Deserialize)]
pub struct CreateAlertRuleRequest {
    /// Rule name.
    pub name: String,
    /// Optional description.
    #[serde(default)]
    pub description: Option<String>,
    /// Metric name to watch.
    pub metric: String,
    /// Comparison operator (`greater_than`, `less_than`, `equals`,
    /// `not_equals`).
    pub comparator: String,
    /// Threshold value.
    pub threshold: Decimal,
    /// Severity (`low`, `medium`, `high`, `critical`).
    pub severity: String,
}

/// Request body for updating an alert rule. Absent fields are untouched.
#[derive(Debug, Default, Deserialize)]
pub struct UpdateAlertRuleRequest {
    /// New name.
    #[serde(default)]
    pub name: Option<String>,
    /// New description.
    #[serde(default)]
    pub description: Option<String>,
    /// New threshold.
    #[serde(default)]
    pub threshold: Option<Decimal>,
    /// New severity.
    #[serde(default)]
    pub severity: Option<String>,
    /// New active flag.
    #[serde(default)]
    pub is_active: Option<bool>,
}

/// Response for an alert rule.
#[derive(Debug, Serialize)]
pub struct AlertRuleResponse {
    /// Rule ID.
    pub id: Uuid,
    /// Rule name.
    pub name: String,
    /// Optional description.
    pub description: Option<String>,
    /// Watched metric.
    pub metric: String,
    /// Comparison operator.
    pub comparator: String,
    /// Threshold value.
    pub threshold: Decimal,
    /// Severity.
    pub severity: String,
    /// Whether the rule is evaluated.
    pub is_active: bool,
    /// Created at timestamp (ISO 8601).
    pub created_at: String,
    /// Updated at timestamp (ISO 8601).
    pub updated_at: String,
}

impl From<alert_rules::Model> for AlertRuleResponse {
    fn from(model: alert_rules::Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            description: model.description,
            metric: model.metric,
            comparator: model.comparator,
            threshold: model.threshold,
            severity: model.severity,
            is_active: model.is_active,
            created_at: model.created_at.to_rfc3339(),
            updated_at: model.updated_at.to_rfc3339(),
        }
    }
}

// ============================================================================
// Route Handlers
// ============================================================================

/// GET `/alert-rules`
/// List the caller's rules, newest first.
async fn list_rules(State(state): State<AppState>, auth: AuthUser) -> Response {
    let repo = AlertRuleRepository::new((*state.db).clone());

    match repo.list_by_user(auth.user_id()).await {
        Ok(rules) => {
            let items: Vec<AlertRuleResponse> = rules.into_iter().map(Into::into).collect();
            (StatusCode::OK, Json(json!({ "alert_rules": items }))).into_response()
        }
        Err(e) => {
            error!(error = %e, "Failed to list alert rules");
            internal_error()
        }
    }
}

/// POST `/alert-rules`
/// Create a rule, active by default.
async fn create_rule(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(payload): Json<CreateAlertRuleRequest>,
) -> Response {
    if payload.name.trim().is_empty() {
        return validation_error("name must not be empty");
    }
    let Ok(comparator) = Comparator::from_str(&payload.comparator) else {
        return validation_error("comparator must be one of: greater_than, less_than, equals, not_equals");
    };
    let Ok(severity) = Severity::from_str(&payload.severity) else {
        return validation_error("severity must be one of: low, medium, high, critical");
    };

    let repo = AlertRuleRepository::new((*state.db).clone());
    let input = CreateAlertRuleInput {
        user_id: auth.user_id(),
        name: payload.name,
        description: payload.description,
        metric: payload.metric,
        comparator,
        threshold: payload.threshold,
        severity,
    };

    match repo.create(input).await {
        Ok(rule) => {
            info!(rule_id = %rule.id, user_id = %auth.user_id(), "Alert rule created");
            (StatusCode::CREATED, Json(AlertRuleResponse::from(rule))).into_response()
        }
        Err(e) => {
            error!(error = %e, "Failed to create alert rule");
            internal_error()
        }
    }
}

/// PUT `/alert-rules/{rule_id}`
/// Partially update a rule.
async fn update_rule(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(rule_id): Path<Uuid>,
    Json(payload): Json<UpdateAlertRuleRequest>,
) -> Response {
    let severity = match payload.severity.as_deref().map(Severity::from_str) {
        None => None,
        Some(Ok(severity)) => Some(severity),
        Some(Err(_)) => {
            return validation_error("severity must be one of: low, medium, high, critical");
        }
    };

    let repo = AlertRuleRepository::new((*state.db).clone());
    let input = UpdateAlertRuleInput {
        name: payload.name,
        description: payload.description,
        threshold: payload.threshold,
        severity,
        is_active: payload.is_active,
    };

    match repo.update(rule_id, auth.user_id(), input).await {
        Ok(rule) => {
            info!(rule_id = %rule.id, "Alert rule updated");
            (StatusCode::OK, Json(AlertRuleResponse::from(rule))).into_response()
        }
        Err(AlertRuleError::NotFound(_)) => not_found(),
        Err(e) => {
            error!(error = %e, "Failed to update alert rule");
            internal_error()
        }
    }
}

/// PATCH `/alert-rules/{rule_id}/status`
/// Toggle a rule's active flag.
async fn toggle_rule(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(rule_id): Path<Uuid>,
) -> Response {
    let repo = AlertRuleRepository::new((*state.db).clone());

    match repo.toggle_active(rule_id, auth.user_id()).await {
        Ok(rule) => {
            info!(rule_id = %rule.id, is_active = rule.is_active, "Alert rule toggled");
            (
                StatusCode::OK,
                Json(json!({
                    "id": rule.id,
                    "is_active": rule.is_active,
                })),
            )
                .into_response()
        }
        Err(AlertRuleError::NotFound(_)) => not_found(),
        Err(e) => {
            error!(error = %e, "Failed to toggle alert rule");
            internal_error()
        }
    }
}

/// DELETE `/alert-rules/{rule_id}`
async fn delete_rule(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(rule_id): Path<Uuid>,
) -> Response {
    let repo = AlertRuleRepository::new((*state.db).clone());

    match repo.delete(rule_id, auth.user_id()).await {
        Ok(true) => {
            info!(rule_id = %rule_id, "Alert rule deleted");
            StatusCode::NO_CONTENT.into_response()
        }
        Ok(false) => not_found(),
        Err(e) => {
            error!(error = %e, "Failed to delete alert rule");
            internal_error()
        }
    }
}

/// GET `/alert-rules/catalog`
/// Metric, comparator, and severity vocabulary for the rule editor UI.
async fn catalog() -> Response {
    (
        StatusCode::OK,
        Json(json!({
            "metrics": METRIC_CATALOG,
            "comparators": [
                Comparator::GreaterThan.as_str(),
                Comparator::LessThan.as_str(),
                Comparator::Equals.as_str(),
                Comparator::NotEquals.as_str(),
            ],
            "severities": [
                Severity::Low.as_str(),
                Severity::Medium.as_str(),
                Severity::High.as_str(),
                Severity::Critical.as_str(),
            ],
        })),
    )
        .into_response()
}

fn validation_error(message: &str) -> Response {
    (
        StatusCode::BAD_REQUEST,
        Json(json!({
            "error": "validation_error",
            "message": message
        })),
    )
        .into_response()
}

fn not_found() -> Response {
    (
        StatusCode::NOT_FOUND,
        Json(json!({
            "error": "not_found",
            "message": "Alert rule not found"
        })),
    )
        .into_response()
}

fn internal_error() -> Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({
            "error": "internal_error",
            "message": "An error occurred"
        })),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use rust_decimal_macros::dec;

    #[test]
    fn test_alert_rule_response_from_model() {
        let model = alert_rules::Model {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            name: "Impact watch".to_string(),
            description: Some("fires on big leaks".to_string()),
            metric: "total_impact".to_string(),
            comparator: "greater_than".to_string(),
            threshold: dec!(1000),
            severity: "high".to_string(),
            is_active: true,
            created_at: Utc::now().into(),
            updated_at: Utc::now().into(),
        };

        let response = AlertRuleResponse::from(model.clone());
        assert_eq!(response.id, model.id);
        assert_eq!(response.comparator, "greater_than");
        assert_eq!(response.threshold, dec!(1000));
        assert!(response.is_active);
    }
}
