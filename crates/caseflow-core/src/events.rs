//! Live push event types.
//!
//! Outbound events are a closed tagged enum so every consumer match is
//! checked for exhaustiveness at compile time. Events are serialized as JSON
//! with a `type` tag field, e.g.:
//! `{"type":"case-deleted","case_id":"..."}`
//!
//! Delivery is best-effort and at-most-once: the persisted
//! [`Notification`](crate::models::Notification) record is the system of
//! record, the live event is purely a latency optimization for sessions that
//! are already open.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::CaseSummary;

/// A live event pushed to connected client channels.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum LiveEvent {
    /// A notification was persisted for `user_id`. Delivered only to that
    /// user's channels.
    #[serde(rename = "new-notification")]
    NewNotification {
        user_id: Uuid,
        case_id: Uuid,
        message: String,
    },
    /// A case was deleted. Informational, no persisted counterpart.
    #[serde(rename = "case-deleted")]
    CaseDeleted { case_id: Uuid },
    /// A case's fields changed.
    #[serde(rename = "case-updated")]
    CaseUpdated {
        case_id: Uuid,
        title: String,
        status: crate::models::CaseStatus,
    },
    /// A new case was created.
    #[serde(rename = "new-case")]
    NewCase { case: CaseSummary },
}

impl LiveEvent {
    /// The wire tag for this event kind.
    pub fn event_type(&self) -> &'static str {
        match self {
            LiveEvent::NewNotification { .. } => "new-notification",
            LiveEvent::CaseDeleted { .. } => "case-deleted",
            LiveEvent::CaseUpdated { .. } => "case-updated",
            LiveEvent::NewCase { .. } => "new-case",
        }
    }

    /// The case this event relates to.
    pub fn case_id(&self) -> Uuid {
        match self {
            LiveEvent::NewNotification { case_id, .. }
            | LiveEvent::CaseDeleted { case_id }
            | LiveEvent::CaseUpdated { case_id, .. } => *case_id,
            LiveEvent::NewCase { case } => case.id,
        }
    }

    /// The single intended recipient, when the event targets one user.
    /// `None` means the event fans out to every connected channel.
    pub fn recipient(&self) -> Option<Uuid> {
        match self {
            LiveEvent::NewNotification { user_id, .. } => Some(*user_id),
            LiveEvent::CaseDeleted { .. }
            | LiveEvent::CaseUpdated { .. }
            | LiveEvent::NewCase { .. } => None,
        }
    }
}
