//! Notification generation from domain actions.
//!
//! The notifier turns comment and case mutations into persisted
//! [`Notification`] records plus live events over the broadcast fan-out.
//! Everything here is a side effect of an already-committed domain action:
//! a persistence or delivery failure is logged and never propagated back to
//! the triggering request. The durable record is authoritative; the push is
//! not, so the system stays correct if every broadcast is dropped.
//!
//! Push policy is uniform: every persisted notification is followed by a
//! `new-notification` event to that recipient's channels.

use std::sync::Arc;

use uuid::Uuid;

use caseflow_core::{
    Case, CaseStatus, CaseStore, Comment, CreateNotificationRequest, Error, LiveEvent,
    NotificationKind, NotificationStore, Result, Role, UserStore,
};

use crate::fanout::Broadcaster;

/// Validated inbound payload for comment creation.
///
/// The surrounding CRUD layer supplies `author_id`/`author_role` already
/// authenticated; this type only guards the payload shape.
#[derive(Debug, Clone)]
pub struct CommentCreated {
    pub case_id: Uuid,
    pub author_id: Uuid,
    pub author_role: Role,
    pub content: String,
    pub is_internal: bool,
}

impl CommentCreated {
    /// Reject malformed payloads before any state change.
    pub fn validate(&self) -> Result<()> {
        if self.content.trim().is_empty() {
            return Err(Error::InvalidInput(
                "comment content must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

/// Derives notification records and live events from domain actions.
#[derive(Clone)]
pub struct Notifier {
    cases: Arc<dyn CaseStore>,
    users: Arc<dyn UserStore>,
    notifications: Arc<dyn NotificationStore>,
    broadcaster: Broadcaster,
}

impl Notifier {
    pub fn new(
        cases: Arc<dyn CaseStore>,
        users: Arc<dyn UserStore>,
        notifications: Arc<dyn NotificationStore>,
        broadcaster: Broadcaster,
    ) -> Self {
        Self {
            cases,
            users,
            notifications,
            broadcaster,
        }
    }

    /// React to a freshly created comment.
    ///
    /// Internal comments notify nobody. An external comment from a requester
    /// notifies every approved elevated user; an external comment from staff
    /// notifies the case's recorded creator, if any (and not the author
    /// themselves).
    pub async fn comment_created(&self, comment: &Comment) {
        if comment.is_internal {
            tracing::debug!(case_id = %comment.case_id, "internal comment, no notifications");
            return;
        }

        let case = match self.cases.fetch(comment.case_id).await {
            Ok(case) => case,
            Err(e) => {
                tracing::warn!(case_id = %comment.case_id, error = %e, "comment notification skipped, case lookup failed");
                return;
            }
        };

        if comment.author_role.is_elevated() {
            // Staff → requester direction: one notification to the creator.
            let Some(creator_id) = case.creator_id else {
                tracing::debug!(case_id = %case.id, "case has no creator on record, nothing to notify");
                return;
            };
            if creator_id == comment.author_id {
                return;
            }
            let message = format!("New reply on case {}", case.display_ref());
            self.persist_and_push(creator_id, &case, message, NotificationKind::NewComment)
                .await;
        } else {
            // Requester → staff direction: fan out to every elevated user.
            let staff = match self.users.list_elevated().await {
                Ok(staff) => staff,
                Err(e) => {
                    tracing::warn!(case_id = %case.id, error = %e, "staff lookup failed, notifications skipped");
                    return;
                }
            };
            let message = format!("New comment on case {}", case.display_ref());
            for user in staff {
                self.persist_and_push(user.id, &case, message.clone(), NotificationKind::NewComment)
                    .await;
            }
        }
    }

    /// React to a case deletion: informational broadcast only, nothing is
    /// persisted.
    pub fn case_deleted(&self, case_id: Uuid) {
        self.broadcaster
            .broadcast(&LiveEvent::CaseDeleted { case_id });
    }

    /// React to a newly created case: informational broadcast only.
    pub fn case_created(&self, case: &Case) {
        self.broadcaster.broadcast(&LiveEvent::NewCase {
            case: case.summary(),
        });
    }

    /// React to a case mutation. Always broadcasts `case-updated`; a status
    /// transition additionally notifies the creator, and a new assignee gets
    /// a `case_assigned` notification.
    pub async fn case_updated(
        &self,
        case: &Case,
        previous_status: CaseStatus,
        previous_assignee: Option<Uuid>,
    ) {
        self.broadcaster.broadcast(&LiveEvent::CaseUpdated {
            case_id: case.id,
            title: case.title.clone(),
            status: case.status,
        });

        if case.status != previous_status {
            if let Some(creator_id) = case.creator_id {
                let message = format!(
                    "Case {} status changed to {}",
                    case.display_ref(),
                    case.status.as_str()
                );
                self.persist_and_push(creator_id, case, message, NotificationKind::StatusChange)
                    .await;
            }
        }

        if let Some(assignee_id) = case.assignee_id {
            if previous_assignee != Some(assignee_id) {
                let message = format!("You were assigned case {}", case.display_ref());
                self.persist_and_push(assignee_id, case, message, NotificationKind::CaseAssigned)
                    .await;
            }
        }
    }

    /// Persist one notification and push it to the recipient's live
    /// channels. Failures are logged; one recipient's failure never affects
    /// the others.
    async fn persist_and_push(
        &self,
        user_id: Uuid,
        case: &Case,
        message: String,
        kind: NotificationKind,
    ) {
        let req = CreateNotificationRequest {
            user_id,
            case_id: case.id,
            case_title: case.title.clone(),
            message: message.clone(),
            kind,
        };
        match self.notifications.insert(req).await {
            Ok(notification) => {
                tracing::debug!(
                    notification_id = %notification.id,
                    user_id = %user_id,
                    case_id = %case.id,
                    kind = kind.as_str(),
                    "notification persisted"
                );
                self.broadcaster.broadcast_to_user(
                    user_id,
                    &LiveEvent::NewNotification {
                        user_id,
                        case_id: case.id,
                        message,
                    },
                );
            }
            Err(e) => {
                tracing::warn!(
                    user_id = %user_id,
                    case_id = %case.id,
                    error = %e,
                    "notification persistence failed"
                );
            }
        }
    }
}
