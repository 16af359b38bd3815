//! Core data models for caseflow.
//!
//! These types are shared across all caseflow crates and represent the
//! domain entities of the ticket-tracking service.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{Error, Result};

// =============================================================================
// USERS & ROLES
// =============================================================================

/// Role of a user within the service.
///
/// `Requester` is the unprivileged external role; `Support` and `Admin` are
/// elevated staff roles with access to internal comments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Requester,
    Support,
    Admin,
}

impl Role {
    /// True for staff roles (Support, Admin).
    pub fn is_elevated(&self) -> bool {
        matches!(self, Role::Support | Role::Admin)
    }

    /// Stable wire string for this role.
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Requester => "requester",
            Role::Support => "support",
            Role::Admin => "admin",
        }
    }

    /// Parse a wire string back into a role.
    pub fn parse(s: &str) -> Result<Self> {
        match s {
            "requester" => Ok(Role::Requester),
            "support" => Ok(Role::Support),
            "admin" => Ok(Role::Admin),
            other => Err(Error::InvalidInput(format!("unknown role: {}", other))),
        }
    }
}

/// A registered user account.
///
/// Account management (registration, the admin approval gate, credentials)
/// lives in the surrounding system; this crate only reads users to resolve
/// notification recipients.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub role: Role,
    /// False until an administrator approves the account.
    pub approved: bool,
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// CASES
// =============================================================================

/// Lifecycle status of a case.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CaseStatus {
    Pending,
    Completed,
    AwaitingClient,
}

impl CaseStatus {
    /// Stable wire string for this status.
    pub fn as_str(&self) -> &'static str {
        match self {
            CaseStatus::Pending => "pending",
            CaseStatus::Completed => "completed",
            CaseStatus::AwaitingClient => "awaiting_client",
        }
    }

    /// Parse a wire string back into a status.
    pub fn parse(s: &str) -> Result<Self> {
        match s {
            "pending" => Ok(CaseStatus::Pending),
            "completed" => Ok(CaseStatus::Completed),
            "awaiting_client" => Ok(CaseStatus::AwaitingClient),
            other => Err(Error::InvalidInput(format!("unknown status: {}", other))),
        }
    }

    /// True when the status ends the case lifecycle. `closed_at` is stamped
    /// only on entry into a terminal status.
    pub fn is_terminal(&self) -> bool {
        matches!(self, CaseStatus::Completed)
    }
}

/// A tracked support ticket.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Case {
    pub id: Uuid,
    /// Reference id in the external issue system (e.g. "SUP-142"), if linked.
    pub external_ref: Option<String>,
    pub title: String,
    pub description: String,
    pub status: CaseStatus,
    /// Advisory classification, not validated against a fixed taxonomy.
    pub category: Option<String>,
    /// Keywords for similarity scoring; insertion order is irrelevant.
    pub keywords: Vec<String>,
    pub creator_id: Option<Uuid>,
    pub assignee_id: Option<Uuid>,
    pub opened_at: DateTime<Utc>,
    pub closed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl Case {
    /// Human-readable reference for notification messages: the external
    /// reference id when present, otherwise a short prefix of the case id.
    pub fn display_ref(&self) -> String {
        match &self.external_ref {
            Some(r) if !r.is_empty() => r.clone(),
            _ => {
                let id = self.id.simple().to_string();
                format!("#{}", &id[..8])
            }
        }
    }

    /// Condensed view for live events and analytics samples.
    pub fn summary(&self) -> CaseSummary {
        CaseSummary {
            id: self.id,
            external_ref: self.external_ref.clone(),
            title: self.title.clone(),
            status: self.status,
            category: self.category.clone(),
        }
    }
}

/// Summary view of a case for live events and recurrence samples.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaseSummary {
    pub id: Uuid,
    pub external_ref: Option<String>,
    pub title: String,
    pub status: CaseStatus,
    pub category: Option<String>,
}

// =============================================================================
// COMMENTS
// =============================================================================

/// A comment on a case. Immutable once created.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Comment {
    pub id: Uuid,
    pub case_id: Uuid,
    pub author_id: Uuid,
    pub author_role: Role,
    pub content: String,
    /// Internal comments are visible to elevated roles only and are excluded
    /// at query time for requester-role readers.
    pub is_internal: bool,
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// NOTIFICATIONS
// =============================================================================

/// Category of a persisted notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    NewComment,
    StatusChange,
    CaseAssigned,
}

impl NotificationKind {
    /// Stable wire string for this kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationKind::NewComment => "new_comment",
            NotificationKind::StatusChange => "status_change",
            NotificationKind::CaseAssigned => "case_assigned",
        }
    }

    /// Parse a wire string back into a kind.
    pub fn parse(s: &str) -> Result<Self> {
        match s {
            "new_comment" => Ok(NotificationKind::NewComment),
            "status_change" => Ok(NotificationKind::StatusChange),
            "case_assigned" => Ok(NotificationKind::CaseAssigned),
            other => Err(Error::InvalidInput(format!(
                "unknown notification kind: {}",
                other
            ))),
        }
    }
}

/// A persisted, per-user record of an event requiring attention.
///
/// Created only by the notification generator; the `read` flag is the only
/// mutable field and moves monotonically false→true.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notification {
    pub id: Uuid,
    pub user_id: Uuid,
    pub case_id: Uuid,
    pub case_title: String,
    pub message: String,
    pub kind: NotificationKind,
    pub read: bool,
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// ANALYTICS RESULTS (ephemeral, not persisted)
// =============================================================================

/// A candidate case paired with its similarity score against a query case.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimilarCase {
    pub case: CaseSummary,
    /// `0.7 * keyword_overlap + 0.3 * category_match`, in `(0.0, 1.0]`.
    pub score: f64,
    pub matching_keywords: Vec<String>,
}

/// Automation-suggestion tier for a recurrent category, derived from fixed
/// count thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecurrenceTier {
    /// 5+ cases: automation urgently recommended.
    Critical,
    /// 3-4 cases: consider automation.
    Attention,
    /// Fewer than 3 cases: keep watching.
    Monitor,
}

/// One category bucket from the recurrence analysis.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryRecurrence {
    pub category: String,
    pub count: usize,
    /// `count / total_cases * 100`.
    pub percentage: f64,
    pub tier: RecurrenceTier,
    /// Up to five representative cases from the bucket.
    pub sample_cases: Vec<CaseSummary>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn case_with(external_ref: Option<&str>) -> Case {
        Case {
            id: Uuid::parse_str("01234567-89ab-cdef-0123-456789abcdef").unwrap(),
            external_ref: external_ref.map(String::from),
            title: "Billing error".to_string(),
            description: String::new(),
            status: CaseStatus::Pending,
            category: None,
            keywords: vec![],
            creator_id: None,
            assignee_id: None,
            opened_at: Utc::now(),
            closed_at: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_role_elevated() {
        assert!(!Role::Requester.is_elevated());
        assert!(Role::Support.is_elevated());
        assert!(Role::Admin.is_elevated());
    }

    #[test]
    fn test_role_round_trip() {
        for role in [Role::Requester, Role::Support, Role::Admin] {
            assert_eq!(Role::parse(role.as_str()).unwrap(), role);
        }
        assert!(Role::parse("superuser").is_err());
    }

    #[test]
    fn test_status_round_trip() {
        for status in [
            CaseStatus::Pending,
            CaseStatus::Completed,
            CaseStatus::AwaitingClient,
        ] {
            assert_eq!(CaseStatus::parse(status.as_str()).unwrap(), status);
        }
        assert!(CaseStatus::parse("resolved").is_err());
    }

    #[test]
    fn test_status_terminal() {
        assert!(CaseStatus::Completed.is_terminal());
        assert!(!CaseStatus::Pending.is_terminal());
        assert!(!CaseStatus::AwaitingClient.is_terminal());
    }

    #[test]
    fn test_notification_kind_round_trip() {
        for kind in [
            NotificationKind::NewComment,
            NotificationKind::StatusChange,
            NotificationKind::CaseAssigned,
        ] {
            assert_eq!(NotificationKind::parse(kind.as_str()).unwrap(), kind);
        }
        assert!(NotificationKind::parse("mention").is_err());
    }

    #[test]
    fn test_display_ref_prefers_external() {
        let case = case_with(Some("SUP-142"));
        assert_eq!(case.display_ref(), "SUP-142");
    }

    #[test]
    fn test_display_ref_falls_back_to_short_id() {
        let case = case_with(None);
        assert_eq!(case.display_ref(), "#01234567");

        // Empty external ref also falls back
        let case = case_with(Some(""));
        assert_eq!(case.display_ref(), "#01234567");
    }

    #[test]
    fn test_case_summary_carries_identity() {
        let case = case_with(Some("SUP-7"));
        let summary = case.summary();
        assert_eq!(summary.id, case.id);
        assert_eq!(summary.external_ref.as_deref(), Some("SUP-7"));
        assert_eq!(summary.status, CaseStatus::Pending);
    }

    #[test]
    fn test_role_serde_snake_case() {
        let json = serde_json::to_string(&Role::Requester).unwrap();
        assert_eq!(json, r#""requester""#);
        let back: Role = serde_json::from_str(&json).unwrap();
        assert_eq!(back, Role::Requester);
    }

    #[test]
    fn test_status_serde_snake_case() {
        let json = serde_json::to_string(&CaseStatus::AwaitingClient).unwrap();
        assert_eq!(json, r#""awaiting_client""#);
    }
}
