//! In-memory store implementations.
//!
//! Used as test fixtures across the workspace and for running the service
//! without a database. Always compiled so integration tests in other crates
//! can use them.
//!
//! All stores keep records in insertion order behind a `std::sync::Mutex`;
//! locks are released before any await point.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::models::*;
use crate::traits::*;

/// In-memory [`CaseStore`].
#[derive(Default)]
pub struct MemoryCaseStore {
    cases: Mutex<Vec<Case>>,
}

impl MemoryCaseStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the store with pre-built cases (test setup).
    pub fn with_cases(cases: Vec<Case>) -> Self {
        Self {
            cases: Mutex::new(cases),
        }
    }
}

#[async_trait]
impl CaseStore for MemoryCaseStore {
    async fn insert(&self, req: CreateCaseRequest) -> Result<Case> {
        let now = Utc::now();
        let case = Case {
            id: Uuid::new_v4(),
            external_ref: req.external_ref,
            title: req.title,
            description: req.description,
            status: req.status,
            category: req.category,
            keywords: req.keywords,
            creator_id: req.creator_id,
            assignee_id: req.assignee_id,
            opened_at: req.opened_at.unwrap_or(now),
            closed_at: if req.status.is_terminal() {
                Some(now)
            } else {
                None
            },
            created_at: now,
        };
        self.cases.lock().unwrap().push(case.clone());
        Ok(case)
    }

    async fn fetch(&self, id: Uuid) -> Result<Case> {
        self.cases
            .lock()
            .unwrap()
            .iter()
            .find(|c| c.id == id)
            .cloned()
            .ok_or(Error::CaseNotFound(id))
    }

    async fn list(&self, filter: CaseFilter) -> Result<Vec<Case>> {
        let cutoff = filter
            .opened_within_days
            .map(|days| Utc::now() - chrono::Duration::days(days));
        let mut cases: Vec<Case> = self
            .cases
            .lock()
            .unwrap()
            .iter()
            .filter(|c| filter.status.is_none_or(|s| c.status == s))
            .filter(|c| filter.assignee_id.is_none_or(|a| c.assignee_id == Some(a)))
            .filter(|c| cutoff.is_none_or(|t| c.opened_at >= t))
            .cloned()
            .collect();
        cases.sort_by(|a, b| b.opened_at.cmp(&a.opened_at));
        Ok(cases)
    }

    async fn list_all(&self) -> Result<Vec<Case>> {
        Ok(self.cases.lock().unwrap().clone())
    }

    async fn update(&self, id: Uuid, req: UpdateCaseRequest) -> Result<Case> {
        let mut cases = self.cases.lock().unwrap();
        let case = cases
            .iter_mut()
            .find(|c| c.id == id)
            .ok_or(Error::CaseNotFound(id))?;

        if let Some(v) = req.external_ref {
            case.external_ref = Some(v);
        }
        if let Some(v) = req.title {
            case.title = v;
        }
        if let Some(v) = req.description {
            case.description = v;
        }
        if let Some(v) = req.category {
            case.category = Some(v);
        }
        if let Some(v) = req.keywords {
            case.keywords = v;
        }
        if let Some(v) = req.assignee_id {
            case.assignee_id = Some(v);
        }
        if let Some(status) = req.status {
            case.status = status;
            case.closed_at = if status.is_terminal() {
                Some(Utc::now())
            } else {
                None
            };
        }
        Ok(case.clone())
    }

    async fn delete(&self, id: Uuid) -> Result<()> {
        let mut cases = self.cases.lock().unwrap();
        let before = cases.len();
        cases.retain(|c| c.id != id);
        if cases.len() == before {
            return Err(Error::CaseNotFound(id));
        }
        Ok(())
    }

    async fn exists(&self, id: Uuid) -> Result<bool> {
        Ok(self.cases.lock().unwrap().iter().any(|c| c.id == id))
    }
}

/// In-memory [`CommentStore`].
#[derive(Default)]
pub struct MemoryCommentStore {
    comments: Mutex<Vec<Comment>>,
}

impl MemoryCommentStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CommentStore for MemoryCommentStore {
    async fn insert(&self, req: CreateCommentRequest) -> Result<Comment> {
        let comment = Comment {
            id: Uuid::new_v4(),
            case_id: req.case_id,
            author_id: req.author_id,
            author_role: req.author_role,
            content: req.content,
            is_internal: req.is_internal,
            created_at: Utc::now(),
        };
        self.comments.lock().unwrap().push(comment.clone());
        Ok(comment)
    }

    async fn list_for_case(&self, case_id: Uuid, viewer_role: Role) -> Result<Vec<Comment>> {
        // Internal comments are filtered here, never client-side.
        let mut comments: Vec<Comment> = self
            .comments
            .lock()
            .unwrap()
            .iter()
            .filter(|c| c.case_id == case_id)
            .filter(|c| viewer_role.is_elevated() || !c.is_internal)
            .cloned()
            .collect();
        comments.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(comments)
    }
}

/// In-memory [`NotificationStore`].
#[derive(Default)]
pub struct MemoryNotificationStore {
    notifications: Mutex<Vec<Notification>>,
}

impl MemoryNotificationStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// All stored notifications, insertion order (test assertions).
    pub fn all(&self) -> Vec<Notification> {
        self.notifications.lock().unwrap().clone()
    }
}

#[async_trait]
impl NotificationStore for MemoryNotificationStore {
    async fn insert(&self, req: CreateNotificationRequest) -> Result<Notification> {
        let notification = Notification {
            id: Uuid::new_v4(),
            user_id: req.user_id,
            case_id: req.case_id,
            case_title: req.case_title,
            message: req.message,
            kind: req.kind,
            read: false,
            created_at: Utc::now(),
        };
        self.notifications
            .lock()
            .unwrap()
            .push(notification.clone());
        Ok(notification)
    }

    async fn list_for_user(&self, user_id: Uuid, unread_only: bool) -> Result<Vec<Notification>> {
        let mut list: Vec<Notification> = self
            .notifications
            .lock()
            .unwrap()
            .iter()
            .filter(|n| n.user_id == user_id)
            .filter(|n| !unread_only || !n.read)
            .cloned()
            .collect();
        list.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(list)
    }

    async fn mark_read(&self, id: Uuid) -> Result<()> {
        let mut notifications = self.notifications.lock().unwrap();
        let notification = notifications
            .iter_mut()
            .find(|n| n.id == id)
            .ok_or(Error::NotificationNotFound(id))?;
        notification.read = true;
        Ok(())
    }

    async fn mark_all_read(&self, user_id: Uuid) -> Result<u64> {
        let mut notifications = self.notifications.lock().unwrap();
        let mut changed = 0;
        for n in notifications
            .iter_mut()
            .filter(|n| n.user_id == user_id && !n.read)
        {
            n.read = true;
            changed += 1;
        }
        Ok(changed)
    }

    async fn unread_count(&self, user_id: Uuid) -> Result<i64> {
        Ok(self
            .notifications
            .lock()
            .unwrap()
            .iter()
            .filter(|n| n.user_id == user_id && !n.read)
            .count() as i64)
    }
}

/// In-memory [`UserStore`].
#[derive(Default)]
pub struct MemoryUserStore {
    users: Mutex<HashMap<Uuid, User>>,
}

impl MemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a user and return its id (test setup).
    pub fn add(&self, name: &str, role: Role, approved: bool) -> Uuid {
        let user = User {
            id: Uuid::new_v4(),
            name: name.to_string(),
            email: format!("{}@example.com", name.to_lowercase()),
            role,
            approved,
            created_at: Utc::now(),
        };
        let id = user.id;
        self.users.lock().unwrap().insert(id, user);
        id
    }
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn fetch(&self, id: Uuid) -> Result<User> {
        self.users
            .lock()
            .unwrap()
            .get(&id)
            .cloned()
            .ok_or(Error::UserNotFound(id))
    }

    async fn list_elevated(&self) -> Result<Vec<User>> {
        let mut users: Vec<User> = self
            .users
            .lock()
            .unwrap()
            .values()
            .filter(|u| u.approved && u.role.is_elevated())
            .cloned()
            .collect();
        users.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(users)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_case_req(status: CaseStatus) -> CreateCaseRequest {
        CreateCaseRequest {
            external_ref: None,
            title: "t".to_string(),
            description: String::new(),
            status,
            category: None,
            keywords: vec![],
            creator_id: None,
            assignee_id: None,
            opened_at: None,
        }
    }

    #[tokio::test]
    async fn test_case_store_fetch_missing() {
        let store = MemoryCaseStore::new();
        let err = store.fetch(Uuid::new_v4()).await.unwrap_err();
        assert!(matches!(err, Error::CaseNotFound(_)));
    }

    #[tokio::test]
    async fn test_closed_at_follows_terminal_status() {
        let store = MemoryCaseStore::new();
        let case = store.insert(new_case_req(CaseStatus::Pending)).await.unwrap();
        assert!(case.closed_at.is_none());

        let updated = store
            .update(
                case.id,
                UpdateCaseRequest {
                    status: Some(CaseStatus::Completed),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert!(updated.closed_at.is_some());

        // Re-opening clears the close timestamp
        let reopened = store
            .update(
                case.id,
                UpdateCaseRequest {
                    status: Some(CaseStatus::Pending),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert!(reopened.closed_at.is_none());
    }

    #[tokio::test]
    async fn test_comment_visibility_excludes_internal_for_requester() {
        let store = MemoryCommentStore::new();
        let case_id = Uuid::new_v4();
        let author = Uuid::new_v4();

        for (content, internal) in [("public one", false), ("staff only", true), ("public two", false)] {
            store
                .insert(CreateCommentRequest {
                    case_id,
                    author_id: author,
                    author_role: Role::Support,
                    content: content.to_string(),
                    is_internal: internal,
                })
                .await
                .unwrap();
        }

        let visible = store.list_for_case(case_id, Role::Requester).await.unwrap();
        assert_eq!(visible.len(), 2);
        assert!(visible.iter().all(|c| !c.is_internal));

        let all = store.list_for_case(case_id, Role::Admin).await.unwrap();
        assert_eq!(all.len(), 3);
        // Oldest first
        assert_eq!(all[0].content, "public one");
    }

    #[tokio::test]
    async fn test_notification_read_is_monotonic() {
        let store = MemoryNotificationStore::new();
        let user = Uuid::new_v4();
        let n = store
            .insert(CreateNotificationRequest {
                user_id: user,
                case_id: Uuid::new_v4(),
                case_title: "t".to_string(),
                message: "m".to_string(),
                kind: NotificationKind::NewComment,
            })
            .await
            .unwrap();
        assert!(!n.read);

        store.mark_read(n.id).await.unwrap();
        // Marking twice is a no-op, not an error
        store.mark_read(n.id).await.unwrap();

        assert_eq!(store.unread_count(user).await.unwrap(), 0);
        let list = store.list_for_user(user, false).await.unwrap();
        assert!(list[0].read);
    }

    #[tokio::test]
    async fn test_mark_all_read_counts_changes() {
        let store = MemoryNotificationStore::new();
        let user = Uuid::new_v4();
        for _ in 0..3 {
            store
                .insert(CreateNotificationRequest {
                    user_id: user,
                    case_id: Uuid::new_v4(),
                    case_title: "t".to_string(),
                    message: "m".to_string(),
                    kind: NotificationKind::StatusChange,
                })
                .await
                .unwrap();
        }
        assert_eq!(store.mark_all_read(user).await.unwrap(), 3);
        assert_eq!(store.mark_all_read(user).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_user_store_lists_only_approved_staff() {
        let store = MemoryUserStore::new();
        store.add("alice", Role::Support, true);
        store.add("bob", Role::Admin, true);
        store.add("carol", Role::Support, false); // pending approval
        store.add("dave", Role::Requester, true);

        let elevated = store.list_elevated().await.unwrap();
        assert_eq!(elevated.len(), 2);
        assert!(elevated.iter().all(|u| u.role.is_elevated() && u.approved));
    }
}
