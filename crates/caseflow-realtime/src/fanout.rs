//! Best-effort broadcast fan-out over the connection registry.
//!
//! Delivery is at-most-once with no acknowledgment and no retry: the
//! persisted notification record is the system of record, the push is a
//! latency optimization for sessions that are already open. A failed send on
//! one channel only prunes that channel; the rest of the fan-out continues
//! and the caller never sees an error.

use std::sync::Arc;

use tokio::sync::mpsc::error::TrySendError;
use uuid::Uuid;

use caseflow_core::LiveEvent;

use crate::registry::{ConnectionRegistry, RegisteredChannel};

/// Fan-out sender over an owned registry handle.
#[derive(Clone)]
pub struct Broadcaster {
    registry: Arc<ConnectionRegistry>,
}

impl Broadcaster {
    pub fn new(registry: Arc<ConnectionRegistry>) -> Self {
        Self { registry }
    }

    /// The registry this broadcaster fans out over.
    pub fn registry(&self) -> &Arc<ConnectionRegistry> {
        &self.registry
    }

    /// Send an event to every registered channel. Returns how many channels
    /// accepted the event. Zero channels is a no-op.
    pub fn broadcast(&self, event: &LiveEvent) -> usize {
        self.deliver(self.registry.snapshot(), event)
    }

    /// Send an event to the channels of a single user only.
    pub fn broadcast_to_user(&self, user_id: Uuid, event: &LiveEvent) -> usize {
        self.deliver(self.registry.snapshot_for_user(user_id), event)
    }

    fn deliver(&self, targets: Vec<RegisteredChannel>, event: &LiveEvent) -> usize {
        let mut delivered = 0;
        let mut pruned = 0;
        // try_send never blocks; a full buffer means a stalled client and is
        // treated the same as a closed one.
        for target in targets {
            match target.sender.try_send(event.clone()) {
                Ok(()) => delivered += 1,
                Err(TrySendError::Closed(_)) | Err(TrySendError::Full(_)) => {
                    self.registry.unregister(target.id);
                    pruned += 1;
                }
            }
        }
        if delivered > 0 || pruned > 0 {
            tracing::debug!(
                event_type = event.event_type(),
                case_id = %event.case_id(),
                delivered,
                pruned,
                "broadcast"
            );
        }
        delivered
    }
}
