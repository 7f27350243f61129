//! Initial database migration.
//!
//! Creates the core tables: users, uploads, leakage_entries, alert_rules,
//! and notifications, plus the indexes the hot queries depend on.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();

        db.execute_unprepared(USERS_SQL).await?;
        db.execute_unprepared(UPLOADS_SQL).await?;
        db.execute_unprepared(LEAKAGE_ENTRIES_SQL).await?;
        db.execute_unprepared(ALERT_RULES_SQL).await?;
        db.execute_unprepared(NOTIFICATIONS_SQL).await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();
        db.execute_unprepared(DROP_ALL_SQL).await?;
        Ok(())
    }
}

// ============================================================
// SQL CONSTANTS
// ============================================================

const USERS_SQL: &str = r"
CREATE TABLE users (
    id UUID PRIMARY KEY,
    email VARCHAR(255) NOT NULL UNIQUE,
    full_name VARCHAR(255) NOT NULL,
    company_name VARCHAR(255),
    is_active BOOLEAN NOT NULL DEFAULT TRUE,
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
);
";

const UPLOADS_SQL: &str = r"
CREATE TABLE uploads (
    id UUID PRIMARY KEY,
    user_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    filename VARCHAR(512) NOT NULL,
    file_size BIGINT NOT NULL,
    format VARCHAR(8) NOT NULL
        CHECK (format IN ('csv', 'xlsx', 'xls')),
    column_mapping JSONB,
    row_count INTEGER NOT NULL DEFAULT 0,
    rows_skipped INTEGER NOT NULL DEFAULT 0,
    status VARCHAR(16) NOT NULL DEFAULT 'pending'
        CHECK (status IN ('pending', 'done', 'failed')),
    error_message TEXT,
    summary JSONB,
    total_flagged INTEGER NOT NULL DEFAULT 0,
    total_impact NUMERIC(20, 4) NOT NULL DEFAULT 0,
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
);

CREATE INDEX idx_uploads_user_created ON uploads(user_id, created_at DESC);
CREATE INDEX idx_uploads_user_status ON uploads(user_id, status);
";

const LEAKAGE_ENTRIES_SQL: &str = r"
CREATE TABLE leakage_entries (
    id UUID PRIMARY KEY,
    upload_id UUID NOT NULL REFERENCES uploads(id) ON DELETE CASCADE,
    rule VARCHAR(32) NOT NULL
        CHECK (rule IN ('duplicate', 'anomalous_amount', 'incomplete_record')),
    severity VARCHAR(16) NOT NULL
        CHECK (severity IN ('low', 'medium', 'high', 'critical')),
    description TEXT NOT NULL,
    row_index INTEGER NOT NULL,
    impact NUMERIC(20, 4) NOT NULL DEFAULT 0,
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
);

CREATE INDEX idx_leakage_entries_upload ON leakage_entries(upload_id);
";

const ALERT_RULES_SQL: &str = r"
CREATE TABLE alert_rules (
    id UUID PRIMARY KEY,
    user_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    name VARCHAR(255) NOT NULL,
    description TEXT,
    metric VARCHAR(64) NOT NULL,
    comparator VARCHAR(16) NOT NULL
        CHECK (comparator IN ('greater_than', 'less_than', 'equals', 'not_equals')),
    threshold NUMERIC(20, 4) NOT NULL,
    severity VARCHAR(16) NOT NULL
        CHECK (severity IN ('low', 'medium', 'high', 'critical')),
    is_active BOOLEAN NOT NULL DEFAULT TRUE,
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
);

CREATE INDEX idx_alert_rules_user_active ON alert_rules(user_id, is_active);
";

const NOTIFICATIONS_SQL: &str = r"
CREATE TABLE notifications (
    id UUID PRIMARY KEY,
    user_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    title VARCHAR(255) NOT NULL,
    message TEXT NOT NULL,
    severity VARCHAR(16) NOT NULL
        CHECK (severity IN ('low', 'medium', 'high', 'critical')),
    is_read BOOLEAN NOT NULL DEFAULT FALSE,
    alert_rule_id UUID REFERENCES alert_rules(id) ON DELETE SET NULL,
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
);

CREATE INDEX idx_notifications_user_created ON notifications(user_id, created_at DESC);
CREATE INDEX idx_notifications_user_unread ON notifications(user_id) WHERE NOT is_read;
";

const DROP_ALL_SQL: &str = r"
DROP TABLE IF EXISTS notifications;
DROP TABLE IF EXISTS alert_rules;
DROP TABLE IF EXISTS leakage_entries;
DROP TABLE IF EXISTS uploads;
DROP TABLE IF EXISTS users;
";
