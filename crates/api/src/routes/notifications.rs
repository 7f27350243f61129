//! Notification routes.
//!
//! The read transition is one-way and idempotent; the list endpoint
//! returns the newest slice without pagination.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, patch, post},
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{error, info};
use uuid::Uuid;

use crate::{AppState, middleware::AuthUser};
use revguard_db::NotificationRepository;
use revguard_db::entities::notifications;

/// Newest notifications returned by the list endpoint.
const LIST_LIMIT: u64 = 50;

/// Creates the notification routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/notifications", get(list_notifications))
        .route("/notifications/unread-count", get(unread_count))
        .route("/notifications/{notification_id}/read", patch(mark_read))
        .route("/notifications/read-all", post(mark_all_read))
}

/// Query flags for the notification list.
#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    /// Only return unread notifications.
    #[serde(default)]
    pub unread_only: bool,
}

/// Response for a notification.
#[derive(Debug, Serialize)]
pub struct NotificationResponse {
    /// Notification ID.
    pub id: Uuid,
    /// Title.
    pub title: String,
    /// Message body.
    pub message: String,
    /// Severity.
    pub severity: String,
    /// Read flag.
    pub is_read: bool,
    /// The alert rule that produced this notification, if any.
    pub alert_rule_id: Option<Uuid>,
    /// Created at timestamp (ISO 8601).
    pub created_at: String,
}

impl From<notifications::Model> for NotificationResponse {
    fn from(model: notifications::Model) -> Self {
        Self {
            id: model.id,
            title: model.title,
            message: model.message,
            severity: model.severity,
            is_read: model.is_read,
            alert_rule_id: model.alert_rule_id,
            created_at: model.created_at.to_rfc3339(),
        }
    }
}

/// GET `/notifications`
async fn list_notifications(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(query): Query<ListQuery>,
) -> Response {
    let repo = NotificationRepository::new((*state.db).clone());

    match repo
        .list_by_user(auth.user_id(), query.unread_only, LIST_LIMIT)
        .await
    {
        Ok(items) => {
            let items: Vec<NotificationResponse> = items.into_iter().map(Into::into).collect();
            (StatusCode::OK, Json(json!({ "notifications": items }))).into_response()
        }
        Err(e) => {
            error!(error = %e, "Failed to list notifications");
            internal_error()
        }
    }
}

/// GET `/notifications/unread-count`
async fn unread_count(State(state): State<AppState>, auth: AuthUser) -> Response {
    let repo = NotificationRepository::new((*state.db).clone());

    match repo.unread_count(auth.user_id()).await {
        Ok(count) => (StatusCode::OK, Json(json!({ "unread": count }))).into_response(),
        Err(e) => {
            error!(error = %e, "Failed to count notifications");
            internal_error()
        }
    }
}

/// PATCH `/notifications/{notification_id}/read`
/// Mark one notification as read (idempotent).
async fn mark_read(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(notification_id): Path<Uuid>,
) -> Response {
    let repo = NotificationRepository::new((*state.db).clone());

    match repo.mark_read(notification_id, auth.user_id()).await {
        Ok(Some(notification)) => (
            StatusCode::OK,
            Json(NotificationResponse::from(notification)),
        )
            .into_response(),
        Ok(None) => (
            StatusCode::NOT_FOUND,
            Json(json!({
                "error": "not_found",
                "message": "Notification not found"
            })),
        )
            .into_response(),
        Err(e) => {
            error!(error = %e, "Failed to mark notification read");
            internal_error()
        }
    }
}

/// POST `/notifications/read-all`
async fn mark_all_read(State(state): State<AppState>, auth: AuthUser) -> Response {
    let repo = NotificationRepository::new((*state.db).clone());

    match repo.mark_all_read(auth.user_id()).await {
        Ok(updated) => {
            info!(user_id = %auth.user_id(), updated, "Marked all notifications read");
            (StatusCode::OK, Json(json!({ "updated": updated }))).into_response()
        }
        Err(e) => {
            error!(error = %e, "Failed to mark all notifications read");
            internal_error()
        }
    }
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

    #[test]
    fn test_notification_response_from_model() {
        let model = notifications::Model {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            title: "HIGH: Impact watch".to_string(),
            message: "Alert 'Impact watch' fired".to_string(),
            severity: "high".to_string(),
            is_read: false,
            alert_rule_id: Some(Uuid::new_v4()),
            created_at: Utc::now().into(),
        };

        let response = NotificationResponse::from(model.clone());
        assert_eq!(response.id, model.id);
        assert!(!response.is_read);
        assert_eq!(response.alert_rule_id, model.alert_rule_id);
    }
}
