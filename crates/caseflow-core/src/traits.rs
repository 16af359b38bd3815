//! Core traits for caseflow store abstractions.
//!
//! These traits define the boundary to the document store. `caseflow-db`
//! provides the PostgreSQL implementations; tests use lightweight in-memory
//! implementations.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::Result;
use crate::models::*;

// =============================================================================
// CASE STORE
// =============================================================================

/// Request for creating a new case.
#[derive(Debug, Clone)]
pub struct CreateCaseRequest {
    pub external_ref: Option<String>,
    pub title: String,
    pub description: String,
    pub status: CaseStatus,
    pub category: Option<String>,
    pub keywords: Vec<String>,
    pub creator_id: Option<Uuid>,
    pub assignee_id: Option<Uuid>,
    pub opened_at: Option<DateTime<Utc>>,
}

/// Partial update for a case. `None` fields are left untouched.
#[derive(Debug, Clone, Default)]
pub struct UpdateCaseRequest {
    pub external_ref: Option<String>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub status: Option<CaseStatus>,
    pub category: Option<String>,
    pub keywords: Option<Vec<String>>,
    pub assignee_id: Option<Uuid>,
}

/// Filter for listing cases.
#[derive(Debug, Clone, Default)]
pub struct CaseFilter {
    pub status: Option<CaseStatus>,
    pub assignee_id: Option<Uuid>,
    /// Only cases opened within the last N days.
    pub opened_within_days: Option<i64>,
}

/// Store for case records.
#[async_trait]
pub trait CaseStore: Send + Sync {
    /// Insert a new case and return the stored record.
    async fn insert(&self, req: CreateCaseRequest) -> Result<Case>;

    /// Fetch a case by id. `Error::CaseNotFound` if absent.
    async fn fetch(&self, id: Uuid) -> Result<Case>;

    /// List cases matching the filter, newest first.
    async fn list(&self, filter: CaseFilter) -> Result<Vec<Case>>;

    /// Materialize the full case collection (analytics reads).
    async fn list_all(&self) -> Result<Vec<Case>>;

    /// Apply a partial update and return the updated record.
    /// Transitioning into a terminal status stamps `closed_at`;
    /// transitioning out of one clears it.
    async fn update(&self, id: Uuid, req: UpdateCaseRequest) -> Result<Case>;

    /// Delete a case. `Error::CaseNotFound` if absent.
    async fn delete(&self, id: Uuid) -> Result<()>;

    /// Check whether a case exists.
    async fn exists(&self, id: Uuid) -> Result<bool>;
}

// =============================================================================
// COMMENT STORE
// =============================================================================

/// Request for creating a comment.
#[derive(Debug, Clone)]
pub struct CreateCommentRequest {
    pub case_id: Uuid,
    pub author_id: Uuid,
    pub author_role: Role,
    pub content: String,
    pub is_internal: bool,
}

/// Store for case comments.
#[async_trait]
pub trait CommentStore: Send + Sync {
    /// Insert a new comment and return the stored record.
    async fn insert(&self, req: CreateCommentRequest) -> Result<Comment>;

    /// List comments for a case, oldest first. When `viewer_role` is
    /// `Requester`, internal comments are excluded in the query itself so no
    /// internal content ever crosses the boundary.
    async fn list_for_case(&self, case_id: Uuid, viewer_role: Role) -> Result<Vec<Comment>>;
}

// =============================================================================
// NOTIFICATION STORE
// =============================================================================

/// Request for persisting a notification.
#[derive(Debug, Clone)]
pub struct CreateNotificationRequest {
    pub user_id: Uuid,
    pub case_id: Uuid,
    pub case_title: String,
    pub message: String,
    pub kind: NotificationKind,
}

/// Store for per-user notification records.
#[async_trait]
pub trait NotificationStore: Send + Sync {
    /// Insert a new unread notification and return the stored record.
    async fn insert(&self, req: CreateNotificationRequest) -> Result<Notification>;

    /// List a user's notifications, newest first.
    async fn list_for_user(&self, user_id: Uuid, unread_only: bool) -> Result<Vec<Notification>>;

    /// Mark one notification read. `Error::NotificationNotFound` if absent.
    /// Marking an already-read notification is a no-op.
    async fn mark_read(&self, id: Uuid) -> Result<()>;

    /// Mark all of a user's notifications read; returns how many changed.
    async fn mark_all_read(&self, user_id: Uuid) -> Result<u64>;

    /// Count a user's unread notifications.
    async fn unread_count(&self, user_id: Uuid) -> Result<i64>;
}

// =============================================================================
// USER STORE
// =============================================================================

/// Read-only store for user records.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Fetch a user by id. `Error::UserNotFound` if absent.
    async fn fetch(&self, id: Uuid) -> Result<User>;

    /// List approved users with an elevated role (support, admin).
    async fn list_elevated(&self) -> Result<Vec<User>>;
}
