//! Comment store implementation.
//!
//! The internal/external visibility split is enforced in the query itself:
//! a requester-role reader's result set never contains internal rows, so no
//! internal content crosses the boundary to be filtered client-side.

use async_trait::async_trait;
use chrono::Utc;
use sqlx::postgres::PgRow;
use sqlx::{Pool, Postgres, Row};
use uuid::Uuid;

use caseflow_core::{
    Comment, CommentStore, CreateCommentRequest, Error, Result, Role,
};

/// PostgreSQL implementation of CommentStore.
pub struct PgCommentStore {
    pool: Pool<Postgres>,
}

impl PgCommentStore {
    /// Create a new PgCommentStore with the given connection pool.
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

fn comment_from_row(row: &PgRow) -> Result<Comment> {
    let role: String = row.get("author_role");
    Ok(Comment {
        id: row.get("id"),
        case_id: row.get("case_id"),
        author_id: row.get("author_id"),
        author_role: Role::parse(&role)?,
        content: row.get("content"),
        is_internal: row.get("is_internal"),
        created_at: row.get("created_at"),
    })
}

#[async_trait]
impl CommentStore for PgCommentStore {
    async fn insert(&self, req: CreateCommentRequest) -> Result<Comment> {
        let row = sqlx::query(
            "INSERT INTO comments (id, case_id, author_id, author_role, content, is_internal, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) \
             RETURNING id, case_id, author_id, author_role, content, is_internal, created_at",
        )
        .bind(Uuid::new_v4())
        .bind(req.case_id)
        .bind(req.author_id)
        .bind(req.author_role.as_str())
        .bind(&req.content)
        .bind(req.is_internal)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await
        .map_err(Error::Database)?;

        comment_from_row(&row)
    }

    async fn list_for_case(&self, case_id: Uuid, viewer_role: Role) -> Result<Vec<Comment>> {
        let mut query = String::from(
            "SELECT id, case_id, author_id, author_role, content, is_internal, created_at \
             FROM comments WHERE case_id = $1 ",
        );
        if !viewer_role.is_elevated() {
            query.push_str("AND NOT is_internal ");
        }
        query.push_str("ORDER BY created_at ASC");

        let rows = sqlx::query(&query)
            .bind(case_id)
            .fetch_all(&self.pool)
            .await
            .map_err(Error::Database)?;

        rows.iter().map(comment_from_row).collect()
    }
}
