//! Case store implementation.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use sqlx::postgres::PgRow;
use sqlx::{Pool, Postgres, Row};
use uuid::Uuid;

use caseflow_core::{
    Case, CaseFilter, CaseStatus, CaseStore, CreateCaseRequest, Error, Result, UpdateCaseRequest,
};

/// PostgreSQL implementation of CaseStore.
pub struct PgCaseStore {
    pool: Pool<Postgres>,
}

impl PgCaseStore {
    /// Create a new PgCaseStore with the given connection pool.
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

const CASE_COLUMNS: &str = "id, external_ref, title, description, status, category, keywords, \
     creator_id, assignee_id, opened_at, closed_at, created_at";

fn case_from_row(row: &PgRow) -> Result<Case> {
    let status: String = row.get("status");
    Ok(Case {
        id: row.get("id"),
        external_ref: row.get("external_ref"),
        title: row.get("title"),
        description: row.get("description"),
        status: CaseStatus::parse(&status)?,
        category: row.get("category"),
        keywords: row.get("keywords"),
        creator_id: row.get("creator_id"),
        assignee_id: row.get("assignee_id"),
        opened_at: row.get("opened_at"),
        closed_at: row.get("closed_at"),
        created_at: row.get("created_at"),
    })
}

/// `closed_at` value for a status transition: stamped on entry into a
/// terminal status, cleared otherwise.
fn closed_at_for(status: CaseStatus, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
    status.is_terminal().then_some(now)
}

#[async_trait]
impl CaseStore for PgCaseStore {
    async fn insert(&self, req: CreateCaseRequest) -> Result<Case> {
        let now = Utc::now();
        let id = Uuid::new_v4();
        let opened_at = req.opened_at.unwrap_or(now);

        let row = sqlx::query(&format!(
            "INSERT INTO cases (id, external_ref, title, description, status, category, keywords, \
                 creator_id, assignee_id, opened_at, closed_at, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12) \
             RETURNING {CASE_COLUMNS}"
        ))
        .bind(id)
        .bind(&req.external_ref)
        .bind(&req.title)
        .bind(&req.description)
        .bind(req.status.as_str())
        .bind(&req.category)
        .bind(&req.keywords)
        .bind(req.creator_id)
        .bind(req.assignee_id)
        .bind(opened_at)
        .bind(closed_at_for(req.status, now))
        .bind(now)
        .fetch_one(&self.pool)
        .await
        .map_err(Error::Database)?;

        case_from_row(&row)
    }

    async fn fetch(&self, id: Uuid) -> Result<Case> {
        let row = sqlx::query(&format!(
            "SELECT {CASE_COLUMNS} FROM cases WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(Error::Database)?
        .ok_or(Error::CaseNotFound(id))?;

        case_from_row(&row)
    }

    async fn list(&self, filter: CaseFilter) -> Result<Vec<Case>> {
        let mut query = format!("SELECT {CASE_COLUMNS} FROM cases WHERE 1=1 ");
        let mut param_idx = 1;
        if filter.status.is_some() {
            query.push_str(&format!("AND status = ${} ", param_idx));
            param_idx += 1;
        }
        if filter.assignee_id.is_some() {
            query.push_str(&format!("AND assignee_id = ${} ", param_idx));
            param_idx += 1;
        }
        if filter.opened_within_days.is_some() {
            query.push_str(&format!("AND opened_at >= ${} ", param_idx));
        }
        query.push_str("ORDER BY opened_at DESC");

        let mut q = sqlx::query(&query);
        if let Some(status) = filter.status {
            q = q.bind(status.as_str());
        }
        if let Some(assignee_id) = filter.assignee_id {
            q = q.bind(assignee_id);
        }
        if let Some(days) = filter.opened_within_days {
            q = q.bind(Utc::now() - Duration::days(days));
        }

        let rows = q.fetch_all(&self.pool).await.map_err(Error::Database)?;
        rows.iter().map(case_from_row).collect()
    }

    async fn list_all(&self) -> Result<Vec<Case>> {
        let rows = sqlx::query(&format!(
            "SELECT {CASE_COLUMNS} FROM cases ORDER BY created_at"
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;
        rows.iter().map(case_from_row).collect()
    }

    async fn update(&self, id: Uuid, req: UpdateCaseRequest) -> Result<Case> {
        // Merge in Rust so the closed_at transition rule lives in one place.
        let current = self.fetch(id).await?;
        let now = Utc::now();

        let status = req.status.unwrap_or(current.status);
        let closed_at = if status == current.status {
            current.closed_at
        } else {
            closed_at_for(status, now)
        };

        let row = sqlx::query(&format!(
            "UPDATE cases SET external_ref = $2, title = $3, description = $4, status = $5, \
                 category = $6, keywords = $7, assignee_id = $8, closed_at = $9 \
             WHERE id = $1 \
             RETURNING {CASE_COLUMNS}"
        ))
        .bind(id)
        .bind(req.external_ref.or(current.external_ref))
        .bind(req.title.unwrap_or(current.title))
        .bind(req.description.unwrap_or(current.description))
        .bind(status.as_str())
        .bind(req.category.or(current.category))
        .bind(req.keywords.unwrap_or(current.keywords))
        .bind(req.assignee_id.or(current.assignee_id))
        .bind(closed_at)
        .fetch_one(&self.pool)
        .await
        .map_err(Error::Database)?;

        case_from_row(&row)
    }

    async fn delete(&self, id: Uuid) -> Result<()> {
        let result = sqlx::query("DELETE FROM cases WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(Error::Database)?;
        if result.rows_affected() == 0 {
            return Err(Error::CaseNotFound(id));
        }
        Ok(())
    }

    async fn exists(&self, id: Uuid) -> Result<bool> {
        let row = sqlx::query("SELECT EXISTS(SELECT 1 FROM cases WHERE id = $1) AS present")
            .bind(id)
            .fetch_one(&self.pool)
            .await
            .map_err(Error::Database)?;
        Ok(row.get("present"))
    }
}
