//! Dashboard repository: cross-upload aggregates for one user.

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use sea_orm::{
    ColumnTrait, DatabaseConnection, DbErr, EntityTrait, PaginatorTrait, QueryFilter, QuerySelect,
};
use uuid::Uuid;

use revguard_core::types::UploadStatus;

use crate::entities::{leakage_entries, uploads};

/// Aggregates across a user's completed uploads.
#[derive(Debug, Clone, Default)]
pub struct DashboardTotals {
    /// Completed uploads.
    pub uploads_completed: u64,
    /// Failed uploads.
    pub uploads_failed: u64,
    /// Sum of processed rows.
    pub rows_processed: u64,
    /// Total leakage entries.
    pub total_flagged: u64,
    /// Total estimated impact.
    pub total_impact: Decimal,
    /// Leakage entry count per rule identifier.
    pub by_rule: BTreeMap<String, u64>,
    /// Leakage entry count per severity.
    pub by_severity: BTreeMap<String, u64>,
}

/// Dashboard repository.
#[derive(Debug, Clone)]
pub struct DashboardRepository {
    db: DatabaseConnection,
}

impl DashboardRepository {
    /// Creates a new dashboard repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Computes the user's dashboard totals.
    ///
    /// # Errors
    ///
    /// Returns an error if a database query fails.
    pub async fn totals(&self, user_id: Uuid) -> Result<DashboardTotals, DbErr> {
        let completed: Vec<(Uuid, i32, i32, Decimal)> = uploads::Entity::find()
            .filter(uploads::Column::UserId.eq(user_id))
            .filter(uploads::Column::Status.eq(UploadStatus::Done.as_str()))
            .select_only()
            .column(uploads::Column::Id)
            .column(uploads::Column::RowCount)
            .column(uploads::Column::TotalFlagged)
            .column(uploads::Column::TotalImpact)
            .into_tuple()
            .all(&self.db)
            .await?;

        let uploads_failed = uploads::Entity::find()
            .filter(uploads::Column::UserId.eq(user_id))
            .filter(uploads::Column::Status.eq(UploadStatus::Failed.as_str()))
            .count(&self.db)
            .await?;

        let mut totals = DashboardTotals {
            uploads_completed: completed.len() as u64,
            uploads_failed,
            ..DashboardTotals::default()
        };

        let upload_ids: Vec<Uuid> = completed.iter().map(|(id, ..)| *id).collect();
        for (_, row_count, total_flagged, total_impact) in &completed {
            totals.rows_processed += u64::try_from(*row_count).unwrap_or(0);
            totals.total_flagged += u64::try_from(*total_flagged).unwrap_or(0);
            totals.total_impact += *total_impact;
        }

        if !upload_ids.is_empty() {
            let breakdown: Vec<(String, String)> = leakage_entries::Entity::find()
                .filter(leakage_entries::Column::UploadId.is_in(upload_ids))
                .select_only()
                .column(leakage_entries::Column::Rule)
                .column(leakage_entries::Column::Severity)
                .into_tuple()
                .all(&self.db)
                .await?;

            for (rule, severity) in breakdown {
                *totals.by_rule.entry(rule).or_insert(0) += 1;
                *totals.by_severity.entry(severity).or_insert(0) += 1;
            }
        }

        Ok(totals)
    }
}
