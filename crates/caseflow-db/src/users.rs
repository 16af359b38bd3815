//! User store implementation.
//!
//! Account registration, credentials, and the admin approval gate live in
//! the surrounding system; this store only reads users to resolve
//! notification recipients.

use async_trait::async_trait;
use sqlx::postgres::PgRow;
use sqlx::{Pool, Postgres, Row};
use uuid::Uuid;

use caseflow_core::{Error, Result, Role, User, UserStore};

/// PostgreSQL implementation of UserStore.
pub struct PgUserStore {
    pool: Pool<Postgres>,
}

impl PgUserStore {
    /// Create a new PgUserStore with the given connection pool.
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

fn user_from_row(row: &PgRow) -> Result<User> {
    let role: String = row.get("role");
    Ok(User {
        id: row.get("id"),
        name: row.get("name"),
        email: row.get("email"),
        role: Role::parse(&role)?,
        approved: row.get("approved"),
        created_at: row.get("created_at"),
    })
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn fetch(&self, id: Uuid) -> Result<User> {
        let row = sqlx::query(
            "SELECT id, name, email, role, approved, created_at FROM users WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(Error::Database)?
        .ok_or(Error::UserNotFound(id))?;

        user_from_row(&row)
    }

    async fn list_elevated(&self) -> Result<Vec<User>> {
        let rows = sqlx::query(
            "SELECT id, name, email, role, approved, created_at \
             FROM users \
             WHERE approved AND role IN ('support', 'admin') \
             ORDER BY created_at",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;

        rows.iter().map(user_from_row).collect()
    }
}
