//! Upload repository for upload records and their leakage entries.

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter,
    QueryOrder, Set, TransactionTrait,
};
use serde_json::Value as JsonValue;
use uuid::Uuid;

use revguard_core::detect::{LeakageFinding, SummaryMetrics};
use revguard_core::ingest::FileFormat;
use revguard_core::types::UploadStatus;

use crate::entities::{leakage_entries, uploads};

/// Error types for upload operations.
#[derive(Debug, thiserror::Error)]
pub enum UploadError {
    /// Upload not found (or owned by another user).
    #[error("Upload not found: {0}")]
    NotFound(Uuid),

    /// Persisted summary could not be serialized or deserialized.
    #[error("Summary serialization failed: {0}")]
    Summary(#[from] serde_json::Error),

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

/// Input for persisting a fully processed upload.
#[derive(Debug, Clone)]
pub struct CreateCompletedUploadInput {
    /// Owning user.
    pub user_id: Uuid,
    /// Original filename.
    pub filename: String,
    /// Input size in bytes.
    pub file_size: i64,
    /// Declared file format.
    pub format: FileFormat,
    /// Column mapping supplied with the upload, if any.
    pub column_mapping: Option<JsonValue>,
    /// Rows that survived parsing.
    pub row_count: u64,
    /// Rows excluded during parsing.
    pub rows_skipped: u64,
    /// Aggregate summary of the detection pass.
    pub summary: SummaryMetrics,
    /// All leakage findings from the detection pass.
    pub findings: Vec<LeakageFinding>,
}

/// Input for recording a failed parse attempt.
///
/// Failure records carry no rows, entries, or summary; they only document
/// the attempt.
#[derive(Debug, Clone)]
pub struct CreateFailedUploadInput {
    /// Owning user.
    pub user_id: Uuid,
    /// Original filename.
    pub filename: String,
    /// Input size in bytes.
    pub file_size: i64,
    /// Declared file format.
    pub format: FileFormat,
    /// Column mapping supplied with the upload, if any.
    pub column_mapping: Option<JsonValue>,
    /// Why parsing failed.
    pub error_message: String,
}

/// Upload repository for CRUD operations.
#[derive(Debug, Clone)]
pub struct UploadRepository {
    db: DatabaseConnection,
}

impl UploadRepository {
    /// Creates a new upload repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Persists a completed upload together with its leakage entries in one
    /// database transaction. Nothing is visible until the whole pipeline
    /// result commits.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or any database operation fails.
    pub async fn create_completed(
        &self,
        input: CreateCompletedUploadInput,
    ) -> Result<(uploads::Model, Vec<leakage_entries::Model>), UploadError> {
        let summary_json = serde_json::to_value(&input.summary)?;
        let now = Utc::now();
        let upload_id = Uuid::new_v4();

        let txn = self.db.begin().await?;

        let upload = uploads::ActiveModel {
            id: Set(upload_id),
            user_id: Set(input.user_id),
            filename: Set(input.filename),
            file_size: Set(input.file_size),
            format: Set(input.format.as_str().to_string()),
            column_mapping: Set(input.column_mapping),
            row_count: Set(clamp_count(input.row_count)),
            rows_skipped: Set(clamp_count(input.rows_skipped)),
            status: Set(UploadStatus::Done.as_str().to_string()),
            error_message: Set(None),
            summary: Set(Some(summary_json)),
            total_flagged: Set(clamp_count(input.summary.total_flagged)),
            total_impact: Set(input.summary.total_impact),
            created_at: Set(now.into()),
        }
        .insert(&txn)
        .await?;

        let mut entries = Vec::with_capacity(input.findings.len());
        for finding in &input.findings {
            let entry = leakage_entries::ActiveModel {
                id: Set(Uuid::new_v4()),
                upload_id: Set(upload_id),
                rule: Set(finding.rule.as_str().to_string()),
                severity: Set(finding.severity.as_str().to_string()),
                description: Set(finding.description.clone()),
                row_index: Set(clamp_count(finding.row_index as u64)),
                impact: Set(finding.impact),
                created_at: Set(now.into()),
            }
            .insert(&txn)
            .await?;
            entries.push(entry);
        }

        txn.commit().await?;

        Ok((upload, entries))
    }

    /// Records a failed parse attempt.
    ///
    /// # Errors
    ///
    /// Returns an error if the database insert fails.
    pub async fn create_failed(
        &self,
        input: CreateFailedUploadInput,
    ) -> Result<uploads::Model, UploadError> {
        let upload = uploads::ActiveModel {
            id: Set(Uuid::new_v4()),
            user_id: Set(input.user_id),
            filename: Set(input.filename),
            file_size: Set(input.file_size),
            format: Set(input.format.as_str().to_string()),
            column_mapping: Set(input.column_mapping),
            row_count: Set(0),
            rows_skipped: Set(0),
            status: Set(UploadStatus::Failed.as_str().to_string()),
            error_message: Set(Some(input.error_message)),
            summary: Set(None),
            total_flagged: Set(0),
            total_impact: Set(rust_decimal::Decimal::ZERO),
            created_at: Set(Utc::now().into()),
        };

        Ok(upload.insert(&self.db).await?)
    }

    /// Lists a user's uploads, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list_by_user(&self, user_id: Uuid) -> Result<Vec<uploads::Model>, UploadError> {
        Ok(uploads::Entity::find()
            .filter(uploads::Column::UserId.eq(user_id))
            .order_by_desc(uploads::Column::CreatedAt)
            .all(&self.db)
            .await?)
    }

    /// Finds one upload scoped to its owner.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find_by_id_for_user(
        &self,
        id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<uploads::Model>, UploadError> {
        Ok(uploads::Entity::find_by_id(id)
            .filter(uploads::Column::UserId.eq(user_id))
            .one(&self.db)
            .await?)
    }

    /// Lists the leakage entries of one upload in row order.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list_entries(
        &self,
        upload_id: Uuid,
    ) -> Result<Vec<leakage_entries::Model>, UploadError> {
        Ok(leakage_entries::Entity::find()
            .filter(leakage_entries::Column::UploadId.eq(upload_id))
            .order_by_asc(leakage_entries::Column::RowIndex)
            .order_by_asc(leakage_entries::Column::Rule)
            .all(&self.db)
            .await?)
    }

    /// Returns the summary of the user's most recent completed upload, used
    /// as the baseline for delta alert metrics.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails or a stored summary no
    /// longer deserializes.
    pub async fn latest_completed_summary(
        &self,
        user_id: Uuid,
    ) -> Result<Option<SummaryMetrics>, UploadError> {
        let latest = uploads::Entity::find()
            .filter(uploads::Column::UserId.eq(user_id))
            .filter(uploads::Column::Status.eq(UploadStatus::Done.as_str()))
            .order_by_desc(uploads::Column::CreatedAt)
            .one(&self.db)
            .await?;

        match latest.and_then(|upload| upload.summary) {
            Some(json) => Ok(Some(serde_json::from_value(json)?)),
            None => Ok(None),
        }
    }
}

/// Clamps an unsigned count into the i32 column range.
fn clamp_count(value: u64) -> i32 {
    i32::try_from(value).unwrap_or(i32::MAX)
}
