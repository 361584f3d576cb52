//! Notification repository.
//!
//! Rows are created by the ledger executor inside commit transactions; this
//! repository covers the recipient-facing lifecycle: listing, read marks,
//! and the unread badge count.

use async_trait::async_trait;
use sqlx::{postgres::PgRow, PgPool, Row};
use tracing::debug;
use uuid::Uuid;

use laneway_core::{Error, Notification, NotificationStore, Result};

fn row_to_notification(row: &PgRow) -> Notification {
    Notification {
        id: row.get("id"),
        activity_id: row.get("activity_id"),
        recipient_id: row.get("recipient_id"),
        read: row.get("read"),
        created_at: row.get("created_at"),
    }
}

/// PostgreSQL implementation of NotificationStore.
pub struct PgNotificationStore {
    pool: PgPool,
}

impl PgNotificationStore {
    /// Create a new PgNotificationStore with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl NotificationStore for PgNotificationStore {
    async fn list_for_recipient(
        &self,
        recipient_id: Uuid,
        unread_only: bool,
        limit: i64,
    ) -> Result<Vec<Notification>> {
        let rows = sqlx::query(
            "SELECT id, activity_id, recipient_id, read, created_at
             FROM notification
             WHERE recipient_id = $1 AND (NOT $2 OR read = FALSE)
             ORDER BY created_at DESC, id DESC
             LIMIT $3",
        )
        .bind(recipient_id)
        .bind(unread_only)
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(rows.iter().map(row_to_notification).collect())
    }

    async fn mark_read(&self, notification_id: Uuid, recipient_id: Uuid) -> Result<Notification> {
        // Recipient-scoped: marking someone else's notification is
        // indistinguishable from it not existing.
        let row = sqlx::query(
            "UPDATE notification SET read = TRUE
             WHERE id = $1 AND recipient_id = $2
             RETURNING id, activity_id, recipient_id, read, created_at",
        )
        .bind(notification_id)
        .bind(recipient_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(Error::Database)?
        .ok_or(Error::NotificationNotFound(notification_id))?;

        Ok(row_to_notification(&row))
    }

    async fn mark_all_read(&self, recipient_id: Uuid) -> Result<u64> {
        let result = sqlx::query(
            "UPDATE notification SET read = TRUE WHERE recipient_id = $1 AND read = FALSE",
        )
        .bind(recipient_id)
        .execute(&self.pool)
        .await
        .map_err(Error::Database)?;

        debug!(
            subsystem = "db",
            component = "notifications",
            op = "mark_all_read",
            result_count = result.rows_affected(),
            "Marked notifications read"
        );
        Ok(result.rows_affected())
    }

    async fn unread_count(&self, recipient_id: Uuid) -> Result<i64> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM notification WHERE recipient_id = $1 AND read = FALSE",
        )
        .bind(recipient_id)
        .fetch_one(&self.pool)
        .await
        .map_err(Error::Database)?;
        Ok(count)
    }
}
