//! `SeaORM` Entity for the uploads table.
//!
//! One row per ingested file. Immutable once processing completes except
//! for status; `summary` holds the serialized `SummaryMetrics` of a
//! completed run.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "uploads")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub user_id: Uuid,
    pub filename: String,
    pub file_size: i64,
    pub format: String,
    pub column_mapping: Option<Json>,
    pub row_count: i32,
    pub rows_skipped: i32,
    pub status: String,
    pub error_message: Option<String>,
    pub summary: Option<Json>,
    pub total_flagged: i32,
    pub total_impact: Decimal,
    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::users::Entity",
        from = "Column::UserId",
        to = "super::users::Column::Id"
    )]
    Users,
    #[sea_orm(has_many = "super::leakage_entries::Entity")]
    LeakageEntries,
}

impl Related<super::users::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Users.def()
    }
}

impl Related<super::leakage_entries::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::LeakageEntries.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
