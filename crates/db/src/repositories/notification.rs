//! Notification repository.
//!
//! Notifications are append-only from the system's point of view; the only
//! mutation is the monotonic unread -> read transition.

use chrono::Utc;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, Set,
};
use uuid::Uuid;

use revguard_core::alert::NotificationDraft;

use crate::entities::notifications;

/// Notification repository.
#[derive(Debug, Clone)]
pub struct NotificationRepository {
    db: DatabaseConnection,
}

impl NotificationRepository {
    /// Creates a new notification repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Persists the drafts produced by one alert evaluation.
    ///
    /// # Errors
    ///
    /// Returns an error if a database insert fails.
    pub async fn create_from_drafts(
        &self,
        user_id: Uuid,
        drafts: &[NotificationDraft],
    ) -> Result<Vec<notifications::Model>, DbErr> {
        let now = Utc::now();
        let mut created = Vec::with_capacity(drafts.len());

        for draft in drafts {
            let notification = notifications::ActiveModel {
                id: Set(Uuid::new_v4()),
                user_id: Set(user_id),
                title: Set(draft.title.clone()),
                message: Set(draft.message.clone()),
                severity: Set(draft.severity.as_str().to_string()),
                is_read: Set(false),
                alert_rule_id: Set(Some(draft.rule_id)),
                created_at: Set(now.into()),
            }
            .insert(&self.db)
            .await?;
            created.push(notification);
        }

        Ok(created)
    }

    /// Lists a user's notifications, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list_by_user(
        &self,
        user_id: Uuid,
        unread_only: bool,
        limit: u64,
    ) -> Result<Vec<notifications::Model>, DbErr> {
        let mut query = notifications::Entity::find()
            .filter(notifications::Column::UserId.eq(user_id))
            .order_by_desc(notifications::Column::CreatedAt)
            .limit(limit);

        if unread_only {
            query = query.filter(notifications::Column::IsRead.eq(false));
        }

        query.all(&self.db).await
    }

    /// Counts a user's unread notifications.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn unread_count(&self, user_id: Uuid) -> Result<u64, DbErr> {
        notifications::Entity::find()
            .filter(notifications::Column::UserId.eq(user_id))
            .filter(notifications::Column::IsRead.eq(false))
            .count(&self.db)
            .await
    }

    /// Marks one notification as read. Idempotent: marking an already-read
    /// notification succeeds without change (the transition is one-way).
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails. Returns `Ok(None)`
    /// when the notification does not exist for this user.
    pub async fn mark_read(
        &self,
        id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<notifications::Model>, DbErr> {
        let Some(notification) = notifications::Entity::find_by_id(id)
            .filter(notifications::Column::UserId.eq(user_id))
            .one(&self.db)
            .await?
        else {
            return Ok(None);
        };

        if notification.is_read {
            return Ok(Some(notification));
        }

        let mut active: notifications::ActiveModel = notification.into();
        active.is_read = Set(true);
        Ok(Some(active.update(&self.db).await?))
    }

    /// Marks all of a user's notifications as read; returns how many
    /// changed.
    ///
    /// # Errors
    ///
    /// Returns an error if the database update fails.
    pub async fn mark_all_read(&self, user_id: Uuid) -> Result<u64, DbErr> {
        let result = notifications::Entity::update_many()
            .col_expr(notifications::Column::IsRead, Expr::value(true))
            .filter(notifications::Column::UserId.eq(user_id))
            .filter(notifications::Column::IsRead.eq(false))
            .exec(&self.db)
            .await?;

        Ok(result.rows_affected)
    }
}
