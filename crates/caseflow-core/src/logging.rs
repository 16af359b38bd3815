//! Structured logging field name constants for caseflow.
//!
//! All crates use these constants for consistent structured logging fields,
//! so log aggregation tools can query by standardized names across every
//! subsystem.
//!
//! ## Log Level Contract
//!
//! | Level | Usage |
//! |-------|-------|
//! | ERROR | Degraded service, requires operator attention |
//! | WARN  | Recoverable issue, automatic fallback applied |
//! | INFO  | Lifecycle events (startup, shutdown), operation completions |
//! | DEBUG | Decision points, intermediate values, config choices |
//! | TRACE | Per-item iteration, high-volume data (fan-out sends) |

// ─── Identity fields ───────────────────────────────────────────────────────

/// Correlation ID propagated across a request and its side effects.
/// Format: UUIDv7 (time-ordered).
pub const REQUEST_ID: &str = "request_id";

/// Subsystem originating the log event.
/// Values: "api", "db", "realtime", "analytics"
pub const SUBSYSTEM: &str = "subsystem";

/// Component within a subsystem.
/// Examples: "registry", "fanout", "notifier", "similarity"
pub const COMPONENT: &str = "component";

/// Logical operation name.
/// Examples: "broadcast", "comment_created", "similar_cases"
pub const OPERATION: &str = "op";

// ─── Entity fields ─────────────────────────────────────────────────────────

/// Case UUID being operated on.
pub const CASE_ID: &str = "case_id";

/// User UUID a notification or channel belongs to.
pub const USER_ID: &str = "user_id";

/// Notification UUID.
pub const NOTIFICATION_ID: &str = "notification_id";

/// Registry channel handle.
pub const CHANNEL_ID: &str = "channel_id";

/// Live event wire tag ("new-notification", "case-deleted", ...).
pub const EVENT_TYPE: &str = "event_type";

// ─── Measurement fields ────────────────────────────────────────────────────

/// Wall-clock duration in milliseconds.
pub const DURATION_MS: &str = "duration_ms";

/// Number of results returned by a query.
pub const RESULT_COUNT: &str = "result_count";

/// Number of channels a broadcast reached.
pub const DELIVERED: &str = "delivered";

/// Number of channels pruned after failed sends.
pub const PRUNED: &str = "pruned";

// ─── Outcome fields ────────────────────────────────────────────────────────

/// Boolean success/failure indicator.
pub const SUCCESS: &str = "success";

/// Error message when an operation fails.
pub const ERROR_MSG: &str = "error";
