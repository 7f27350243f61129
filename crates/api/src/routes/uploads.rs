//! Upload ingestion and history routes.
//!
//! `POST /uploads` runs the whole pipeline inside the request: parse the
//! file, detect leakage, persist the upload with its entries and summary,
//! then evaluate the owner's active alert rules and persist any resulting
//! notifications. Nothing is persisted until the pipeline reaches a
//! terminal state for the upload.

use axum::{
    Json, Router,
    extract::{Multipart, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::Serialize;
use serde_json::json;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::{AppState, middleware::AuthUser};
use revguard_core::alert::{Advisory, evaluate};
use revguard_core::detect::{SummaryMetrics, detect};
use revguard_core::ingest::{ColumnMapping, FileFormat, IngestError, parse};
use revguard_db::repositories::{
    CreateCompletedUploadInput, CreateFailedUploadInput, rule_spec,
};
use revguard_db::{AlertRuleRepository, NotificationRepository, UploadRepository};
use revguard_db::entities::{leakage_entries, uploads};

/// Creates the upload routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/uploads", post(upload_file))
        .route("/uploads", get(list_uploads))
        .route("/uploads/{upload_id}", get(get_upload))
}

// ============================================================================
// Request/Response Types
// ============================================================================

/// One persisted leakage entry.
#[derive(Debug, Serialize)]
pub struct LeakageEntryResponse {
    /// Entry ID.
    pub id: Uuid,
    /// Rule identifier.
    pub rule: String,
    /// Severity.
    pub severity: String,
    /// Zero-based source data-row index.
    pub row_index: i32,
    /// Description of the anomaly.
    pub description: String,
    /// Estimated monetary impact.
    pub impact: rust_decimal::Decimal,
}

impl From<leakage_entries::Model> for LeakageEntryResponse {
    fn from(model: leakage_entries::Model) -> Self {
        Self {
            id: model.id,
            rule: model.rule,
            severity: model.severity,
            row_index: model.row_index,
            description: model.description,
            impact: model.impact,
        }
    }
}

/// Upload list item (history view).
#[derive(Debug, Serialize)]
pub struct UploadListItem {
    /// Upload ID.
    pub upload_id: Uuid,
    /// Original filename.
    pub filename: String,
    /// File size in bytes.
    pub file_size: i64,
    /// Declared format.
    pub format: String,
    /// Rows that survived parsing.
    pub rows_processed: i32,
    /// Rows excluded during parsing.
    pub rows_skipped: i32,
    /// Processing status.
    pub status: String,
    /// Total leakage entries.
    pub total_flagged: i32,
    /// Total estimated impact.
    pub total_impact: rust_decimal::Decimal,
    /// Created at timestamp (ISO 8601).
    pub created_at: String,
}

impl From<uploads::Model> for UploadListItem {
    fn from(model: uploads::Model) -> Self {
        Self {
            upload_id: model.id,
            filename: model.filename,
            file_size: model.file_size,
            format: model.format,
            rows_processed: model.row_count,
            rows_skipped: model.rows_skipped,
            status: model.status,
            total_flagged: model.total_flagged,
            total_impact: model.total_impact,
            created_at: model.created_at.to_rfc3339(),
        }
    }
}

/// Successful ingestion response.
#[derive(Debug, Serialize)]
pub struct UploadResponse {
    /// Upload ID.
    pub upload_id: Uuid,
    /// Original filename.
    pub filename: String,
    /// Declared format.
    pub format: String,
    /// Processing status.
    pub status: String,
    /// Rows that survived parsing.
    pub rows_processed: u64,
    /// Rows excluded during parsing.
    pub rows_skipped: u64,
    /// Persisted leakage entries.
    pub leakage_entries: Vec<LeakageEntryResponse>,
    /// Aggregate summary of the detection pass.
    pub summary_metrics: SummaryMetrics,
    /// How many alert rules fired.
    pub alerts_triggered: usize,
    /// Non-fatal advisories from alert evaluation (skipped rules).
    pub advisories: Vec<Advisory>,
}

/// Fields extracted from the multipart form.
struct UploadForm {
    filename: String,
    bytes: axum::body::Bytes,
    mapping: Option<ColumnMapping>,
    mapping_json: Option<serde_json::Value>,
    sheet_name: Option<String>,
}

// ============================================================================
// Route Handlers
// ============================================================================

/// Reads the multipart form fields (`file`, `column_mapping`, `sheet_name`).
async fn read_upload_form(mut multipart: Multipart) -> Result<UploadForm, Response> {
    let mut filename = None;
    let mut bytes = None;
    let mut mapping = None;
    let mut mapping_json = None;
    let mut sheet_name = None;

    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(e) => {
                return Err((
                    e.status(),
                    Json(json!({
                        "error": "invalid_multipart",
                        "message": format!("Unreadable multipart payload: {e}")
                    })),
                )
                    .into_response());
            }
        };

        match field.name() {
            Some("file") => {
                filename = field.file_name().map(ToString::to_string);
                bytes = match field.bytes().await {
                    Ok(bytes) => Some(bytes),
                    Err(e) => {
                        return Err((
                            e.status(),
                            Json(json!({
                                "error": "invalid_multipart",
                                "message": format!("Failed to read file field: {e}")
                            })),
                        )
                            .into_response());
                    }
                };
            }
            Some("column_mapping") => {
                let text = field.text().await.unwrap_or_default();
                let value: serde_json::Value = match serde_json::from_str(&text) {
                    Ok(value) => value,
                    Err(e) => {
                        return Err((
                            StatusCode::BAD_REQUEST,
                            Json(json!({
                                "error": "invalid_column_mapping",
                                "message": format!("column_mapping is not valid JSON: {e}")
                            })),
                        )
                            .into_response());
                    }
                };
                mapping = match serde_json::from_value::<ColumnMapping>(value.clone()) {
                    Ok(mapping) => Some(mapping),
                    Err(e) => {
                        return Err((
                            StatusCode::BAD_REQUEST,
                            Json(json!({
                                "error": "invalid_column_mapping",
                                "message": format!("column_mapping has an invalid shape: {e}")
                            })),
                        )
                            .into_response());
                    }
                };
                mapping_json = Some(value);
            }
            Some("sheet_name") => {
                sheet_name = field.text().await.ok().filter(|s| !s.is_empty());
            }
            _ => {}
        }
    }

    let (Some(filename), Some(bytes)) = (filename, bytes) else {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(json!({
                "error": "missing_file",
                "message": "A 'file' form field with a filename is required"
            })),
        )
            .into_response());
    };

    Ok(UploadForm {
        filename,
        bytes,
        mapping,
        mapping_json,
        sheet_name,
    })
}

/// POST `/uploads`
/// Ingest a file: parse, detect leakage, persist, evaluate alerts.
async fn upload_file(
    State(state): State<AppState>,
    auth: AuthUser,
    multipart: Multipart,
) -> Response {
    let form = match read_upload_form(multipart).await {
        Ok(form) => form,
        Err(response) => return response,
    };
    let user_id = auth.user_id();

    // Declared format comes from the filename extension.
    let Some(format) = FileFormat::from_filename(&form.filename) else {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({
                "error": "unsupported_format",
                "message": format!(
                    "File '{}' is not an accepted format (csv, xlsx, xls)",
                    form.filename
                )
            })),
        )
            .into_response();
    };

    // Size cap before any parsing work. Oversize uploads leave no trace.
    let max_bytes = state.pipeline.upload.max_bytes;
    if form.bytes.len() > max_bytes {
        return (
            StatusCode::PAYLOAD_TOO_LARGE,
            Json(json!({
                "error": "file_too_large",
                "message": format!(
                    "File size {} bytes exceeds the {} byte limit",
                    form.bytes.len(),
                    max_bytes
                )
            })),
        )
            .into_response();
    }

    let upload_repo = UploadRepository::new((*state.db).clone());

    let parsed = match parse(
        &form.bytes,
        format,
        form.mapping.as_ref(),
        form.sheet_name.as_deref(),
        &state.pipeline.header_policy,
        &state.pipeline.upload,
    ) {
        Ok(parsed) => parsed,
        Err(e) => return fail_upload(&upload_repo, user_id, &form, format, &e).await,
    };

    let outcome = detect(&parsed.rows, parsed.rows_skipped, &state.pipeline.detection);

    // Baseline for delta metrics is the previous completed upload, read
    // before this one is persisted.
    let previous_summary = match upload_repo.latest_completed_summary(user_id).await {
        Ok(summary) => summary,
        Err(e) => {
            error!(error = %e, "Failed to load previous summary");
            None
        }
    };

    let (upload, entries) = match upload_repo
        .create_completed(CreateCompletedUploadInput {
            user_id,
            filename: form.filename.clone(),
            file_size: form.bytes.len() as i64,
            format,
            column_mapping: form.mapping_json.clone(),
            row_count: parsed.rows.len() as u64,
            rows_skipped: parsed.rows_skipped,
            summary: outcome.summary.clone(),
            findings: outcome.findings,
        })
        .await
    {
        Ok(result) => result,
        Err(e) => {
            error!(error = %e, "Failed to persist upload");
            return internal_error();
        }
    };

    // Alert evaluation: load active rules, skip rows whose stored
    // vocabulary no longer parses, evaluate, persist the drafts.
    let rule_repo = AlertRuleRepository::new((*state.db).clone());
    let active_rules = match rule_repo.list_active_by_user(user_id).await {
        Ok(rules) => rules,
        Err(e) => {
            error!(error = %e, "Failed to load alert rules");
            Vec::new()
        }
    };
    let specs: Vec<_> = active_rules.iter().filter_map(rule_spec).collect();
    if specs.len() < active_rules.len() {
        warn!(
            user_id = %user_id,
            skipped = active_rules.len() - specs.len(),
            "Skipped alert rules with unparseable stored vocabulary"
        );
    }

    let evaluation = evaluate(&specs, &outcome.summary, previous_summary.as_ref());
    for advisory in &evaluation.advisories {
        warn!(
            rule = %advisory.rule_name,
            metric = %advisory.metric,
            reason = %advisory.reason,
            "Alert rule skipped"
        );
    }

    let notification_repo = NotificationRepository::new((*state.db).clone());
    if let Err(e) = notification_repo
        .create_from_drafts(user_id, &evaluation.notifications)
        .await
    {
        error!(error = %e, "Failed to persist notifications");
    }

    info!(
        upload_id = %upload.id,
        user_id = %user_id,
        rows_processed = parsed.rows.len(),
        rows_skipped = parsed.rows_skipped,
        total_flagged = outcome.summary.total_flagged,
        alerts_triggered = evaluation.notifications.len(),
        "Upload processed"
    );

    let response = UploadResponse {
        upload_id: upload.id,
        filename: upload.filename,
        format: upload.format,
        status: upload.status,
        rows_processed: parsed.rows.len() as u64,
        rows_skipped: parsed.rows_skipped,
        leakage_entries: entries.into_iter().map(Into::into).collect(),
        summary_metrics: outcome.summary,
        alerts_triggered: evaluation.notifications.len(),
        advisories: evaluation.advisories,
    };

    (StatusCode::CREATED, Json(response)).into_response()
}

/// Records a failed parse attempt and maps the error to a response.
async fn fail_upload(
    upload_repo: &UploadRepository,
    user_id: Uuid,
    form: &UploadForm,
    format: FileFormat,
    error: &IngestError,
) -> Response {
    // Oversize input is rejected without persisting anything; other parse
    // failures are documented as a failed upload record (no rows, no
    // entries, no summary).
    let status = match error {
        IngestError::TooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
        IngestError::UnsupportedFormat(_) | IngestError::Malformed(_) => StatusCode::BAD_REQUEST,
    };

    if !matches!(error, IngestError::TooLarge { .. }) {
        let result = upload_repo
            .create_failed(CreateFailedUploadInput {
                user_id,
                filename: form.filename.clone(),
                file_size: form.bytes.len() as i64,
                format,
                column_mapping: form.mapping_json.clone(),
                error_message: error.to_string(),
            })
            .await;
        if let Err(e) = result {
            error!(error = %e, "Failed to record failed upload");
        }
    }

    warn!(user_id = %user_id, filename = %form.filename, error = %error, "Upload rejected");

    (
        status,
        Json(json!({
            "error": error.error_code(),
            "message": error.to_string()
        })),
    )
        .into_response()
}

/// GET `/uploads`
/// The caller's upload history, newest first.
async fn list_uploads(State(state): State<AppState>, auth: AuthUser) -> Response {
    let repo = UploadRepository::new((*state.db).clone());

    match repo.list_by_user(auth.user_id()).await {
        Ok(uploads) => {
            let items: Vec<UploadListItem> = uploads.into_iter().map(Into::into).collect();
            (StatusCode::OK, Json(json!({ "uploads": items }))).into_response()
        }
        Err(e) => {
            error!(error = %e, "Failed to list uploads");
            internal_error()
        }
    }
}

/// GET `/uploads/{upload_id}`
/// One upload with its leakage entries and stored summary.
async fn get_upload(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(upload_id): Path<Uuid>,
) -> Response {
    let repo = UploadRepository::new((*state.db).clone());

    let upload = match repo.find_by_id_for_user(upload_id, auth.user_id()).await {
        Ok(Some(upload)) => upload,
        Ok(None) => {
            return (
                StatusCode::NOT_FOUND,
                Json(json!({
                    "error": "not_found",
                    "message": "Upload not found"
                })),
            )
                .into_response();
        }
        Err(e) => {
            error!(error = %e, "Failed to load upload");
            return internal_error();
        }
    };

    let entries = match repo.list_entries(upload.id).await {
        Ok(entries) => entries,
        Err(e) => {
            error!(error = %e, "Failed to load leakage entries");
            return internal_error();
        }
    };

    let items: Vec<LeakageEntryResponse> = entries.into_iter().map(Into::into).collect();

    (
        StatusCode::OK,
        Json(json!({
            "upload": UploadListItem::from(upload.clone()),
            "column_mapping": upload.column_mapping,
            "summary_metrics": upload.summary,
            "error_message": upload.error_message,
            "leakage_entries": items,
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
    fn test_upload_list_item_from_model() {
        let model = uploads::Model {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            filename: "sales.csv".to_string(),
            file_size: 2048,
            format: "csv".to_string(),
            column_mapping: None,
            row_count: 5,
            rows_skipped: 1,
            status: "done".to_string(),
            error_message: None,
            summary: None,
            total_flagged: 2,
            total_impact: dec!(150.50),
            created_at: Utc::now().into(),
        };

        let item = UploadListItem::from(model.clone());
        assert_eq!(item.upload_id, model.id);
        assert_eq!(item.rows_processed, 5);
        assert_eq!(item.rows_skipped, 1);
        assert_eq!(item.status, "done");
        assert_eq!(item.total_impact, dec!(150.50));
    }

    #[test]
    fn test_leakage_entry_response_from_model() {
        let model = leakage_entries::Model {
            id: Uuid::new_v4(),
            upload_id: Uuid::new_v4(),
            rule: "duplicate".to_string(),
            severity: "high".to_string(),
            description: "repeats an earlier transaction".to_string(),
            row_index: 3,
            impact: dec!(99.99),
            created_at: Utc::now().into(),
        };

        let response = LeakageEntryResponse::from(model.clone());
        assert_eq!(response.rule, "duplicate");
        assert_eq!(response.row_index, 3);
        assert_eq!(response.impact, dec!(99.99));
    }
}
