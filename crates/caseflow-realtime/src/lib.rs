//! # caseflow-realtime
//!
//! The live collaboration subsystem: a registry of connected client push
//! channels, a best-effort broadcast fan-out over it, and the notification
//! generator that turns domain actions into persisted notifications and live
//! events.
//!
//! The transport layer (WebSocket handling in `caseflow-api`) hands the
//! registry a send capability per connection; nothing in this crate initiates
//! a connection or blocks on one.

pub mod fanout;
pub mod notify;
pub mod registry;

pub use fanout::Broadcaster;
pub use notify::{CommentCreated, Notifier};
pub use registry::{ChannelId, ConnectionRegistry, EVENT_CHANNEL_CAPACITY};
