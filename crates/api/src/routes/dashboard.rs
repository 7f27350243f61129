//! Dashboard summary route: aggregates across the caller's uploads.

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
};
use serde_json::json;
use tracing::error;

use crate::{AppState, middleware::AuthUser};
use crate::routes::uploads::UploadListItem;
use revguard_db::{DashboardRepository, NotificationRepository, UploadRepository};

/// Uploads shown in the recent-activity strip.
const RECENT_UPLOADS: usize = 5;

/// Creates the dashboard routes.
pub fn routes() -> Router<AppState> {
    Router::new().route("/dashboard/summary", get(summary))
}

/// GET `/dashboard/summary`
async fn summary(State(state): State<AppState>, auth: AuthUser) -> Response {
    let user_id = auth.user_id();
    let dashboard_repo = DashboardRepository::new((*state.db).clone());
    let upload_repo = UploadRepository::new((*state.db).clone());
    let notification_repo = NotificationRepository::new((*state.db).clone());

    let totals = match dashboard_repo.totals(user_id).await {
        Ok(totals) => totals,
        Err(e) => {
            error!(error = %e, "Failed to compute dashboard totals");
            return internal_error();
        }
    };

    let recent: Vec<UploadListItem> = match upload_repo.list_by_user(user_id).await {
        Ok(uploads) => uploads
            .into_iter()
            .take(RECENT_UPLOADS)
            .map(Into::into)
            .collect(),
        Err(e) => {
            error!(error = %e, "Failed to load recent uploads");
            return internal_error();
        }
    };

    let unread = match notification_repo.unread_count(user_id).await {
        Ok(count) => count,
        Err(e) => {
            error!(error = %e, "Failed to count unread notifications");
            return internal_error();
        }
    };

    (
        StatusCode::OK,
        Json(json!({
            "uploads_completed": totals.uploads_completed,
            "uploads_failed": totals.uploads_failed,
            "rows_processed": totals.rows_processed,
            "total_flagged": totals.total_flagged,
            "total_impact": totals.total_impact,
            "by_rule": totals.by_rule,
            "by_severity": totals.by_severity,
            "recent_uploads": recent,
            "unread_notifications": unread,
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
