//! # caseflow-db
//!
//! PostgreSQL database layer for caseflow.
//!
//! This crate provides:
//! - Connection pool management
//! - Store implementations for cases, comments, notifications, and users
//! - Embedded schema migrations
//!
//! ## Example
//!
//! ```rust,ignore
//! use caseflow_db::Database;
//! use caseflow_core::CaseStore;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let db = Database::connect("postgres://localhost/caseflow").await?;
//!     db.migrate().await?;
//!
//!     let case = db.cases.fetch(case_id).await?;
//!     println!("{}", case.title);
//!     Ok(())
//! }
//! ```

pub mod cases;
pub mod comments;
pub mod notifications;
pub mod pool;
pub mod users;

// Re-export core types
pub use caseflow_core::*;

// Re-export store implementations
pub use cases::PgCaseStore;
pub use comments::PgCommentStore;
pub use notifications::PgNotificationStore;
pub use pool::{create_pool, create_pool_with_config, log_pool_metrics, PoolConfig};
pub use users::PgUserStore;

use std::sync::Arc;

/// Combined database context with all stores.
#[derive(Clone)]
pub struct Database {
    /// The underlying connection pool.
    pub pool: sqlx::Pool<sqlx::Postgres>,
    /// Case store.
    pub cases: Arc<PgCaseStore>,
    /// Comment store.
    pub comments: Arc<PgCommentStore>,
    /// Notification store.
    pub notifications: Arc<PgNotificationStore>,
    /// User store (read-only here).
    pub users: Arc<PgUserStore>,
}

impl Database {
    /// Connect with default pool configuration.
    pub async fn connect(database_url: &str) -> Result<Self> {
        Self::connect_with_config(database_url, PoolConfig::default()).await
    }

    /// Connect with custom pool configuration.
    pub async fn connect_with_config(database_url: &str, config: PoolConfig) -> Result<Self> {
        let pool = create_pool_with_config(database_url, config).await?;
        Ok(Self::from_pool(pool))
    }

    /// Build the store set over an existing pool.
    pub fn from_pool(pool: sqlx::Pool<sqlx::Postgres>) -> Self {
        Self {
            cases: Arc::new(PgCaseStore::new(pool.clone())),
            comments: Arc::new(PgCommentStore::new(pool.clone())),
            notifications: Arc::new(PgNotificationStore::new(pool.clone())),
            users: Arc::new(PgUserStore::new(pool.clone())),
            pool,
        }
    }

    /// Run embedded schema migrations.
    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| Error::Internal(format!("migration failed: {}", e)))?;
        Ok(())
    }
}
