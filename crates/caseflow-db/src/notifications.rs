//! Notification store implementation.

use async_trait::async_trait;
use chrono::Utc;
use sqlx::postgres::PgRow;
use sqlx::{Pool, Postgres, Row};
use uuid::Uuid;

use caseflow_core::{
    CreateNotificationRequest, Error, Notification, NotificationKind, NotificationStore, Result,
};

/// PostgreSQL implementation of NotificationStore.
pub struct PgNotificationStore {
    pool: Pool<Postgres>,
}

impl PgNotificationStore {
    /// Create a new PgNotificationStore with the given connection pool.
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

const NOTIFICATION_COLUMNS: &str =
    "id, user_id, case_id, case_title, message, kind, read, created_at";

fn notification_from_row(row: &PgRow) -> Result<Notification> {
    let kind: String = row.get("kind");
    Ok(Notification {
        id: row.get("id"),
        user_id: row.get("user_id"),
        case_id: row.get("case_id"),
        case_title: row.get("case_title"),
        message: row.get("message"),
        kind: NotificationKind::parse(&kind)?,
        read: row.get("read"),
        created_at: row.get("created_at"),
    })
}

#[async_trait]
impl NotificationStore for PgNotificationStore {
    async fn insert(&self, req: CreateNotificationRequest) -> Result<Notification> {
        let row = sqlx::query(&format!(
            "INSERT INTO notifications (id, user_id, case_id, case_title, message, kind, read, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6, FALSE, $7) \
             RETURNING {NOTIFICATION_COLUMNS}"
        ))
        .bind(Uuid::new_v4())
        .bind(req.user_id)
        .bind(req.case_id)
        .bind(&req.case_title)
        .bind(&req.message)
        .bind(req.kind.as_str())
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await
        .map_err(Error::Database)?;

        notification_from_row(&row)
    }

    async fn list_for_user(&self, user_id: Uuid, unread_only: bool) -> Result<Vec<Notification>> {
        let mut query = format!(
            "SELECT {NOTIFICATION_COLUMNS} FROM notifications WHERE user_id = $1 "
        );
        if unread_only {
            query.push_str("AND NOT read ");
        }
        query.push_str("ORDER BY created_at DESC");

        let rows = sqlx::query(&query)
            .bind(user_id)
            .fetch_all(&self.pool)
            .await
            .map_err(Error::Database)?;

        rows.iter().map(notification_from_row).collect()
    }

    async fn mark_read(&self, id: Uuid) -> Result<()> {
        // read is monotonic: marking an already-read row is a harmless no-op
        let result = sqlx::query("UPDATE notifications SET read = TRUE WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(Error::Database)?;
        if result.rows_affected() == 0 {
            return Err(Error::NotificationNotFound(id));
        }
        Ok(())
    }

    async fn mark_all_read(&self, user_id: Uuid) -> Result<u64> {
        let result =
            sqlx::query("UPDATE notifications SET read = TRUE WHERE user_id = $1 AND NOT read")
                .bind(user_id)
                .execute(&self.pool)
                .await
                .map_err(Error::Database)?;
        Ok(result.rows_affected())
    }

    async fn unread_count(&self, user_id: Uuid) -> Result<i64> {
        let row = sqlx::query(
            "SELECT COUNT(*) AS unread FROM notifications WHERE user_id = $1 AND NOT read",
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await
        .map_err(Error::Database)?;
        Ok(row.get("unread"))
    }
}
