//! Registry of live client push channels.
//!
//! Each connected session registers a bounded `mpsc` sender keyed by the
//! session's user. Broadcast iteration always runs over a point-in-time
//! snapshot, never the live map, so concurrent connect/disconnect can never
//! corrupt an in-flight fan-out. The mutex is released before any await
//! point.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use tokio::sync::mpsc;
use uuid::Uuid;

use caseflow_core::LiveEvent;

/// Capacity of each per-connection event channel. A client that falls this
/// far behind is treated as dead and pruned on the next send failure.
pub const EVENT_CHANNEL_CAPACITY: usize = 64;

/// Opaque handle to one registered channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ChannelId(u64);

impl std::fmt::Display for ChannelId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ch-{}", self.0)
    }
}

/// One registered connection: the owning user and its send capability.
#[derive(Clone)]
pub struct RegisteredChannel {
    pub id: ChannelId,
    pub user_id: Uuid,
    pub sender: mpsc::Sender<LiveEvent>,
}

/// Tracks live push channels for connected clients.
///
/// Owned by the service for its lifetime and shared by handle; there is no
/// process-global connection set.
#[derive(Default)]
pub struct ConnectionRegistry {
    channels: Mutex<HashMap<ChannelId, RegisteredChannel>>,
    next_id: AtomicU64,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a connection's send capability. Always succeeds.
    pub fn register(&self, user_id: Uuid, sender: mpsc::Sender<LiveEvent>) -> ChannelId {
        let id = ChannelId(self.next_id.fetch_add(1, Ordering::Relaxed));
        let mut channels = self.channels.lock().unwrap();
        channels.insert(
            id,
            RegisteredChannel {
                id,
                user_id,
                sender,
            },
        );
        tracing::info!(
            channel_id = %id,
            user_id = %user_id,
            total = channels.len(),
            "channel registered"
        );
        id
    }

    /// Remove a channel. Unknown handles are a no-op (idempotent), so the
    /// fan-out and the transport disconnect path may both call this.
    pub fn unregister(&self, id: ChannelId) {
        let mut channels = self.channels.lock().unwrap();
        if channels.remove(&id).is_some() {
            tracing::info!(channel_id = %id, total = channels.len(), "channel unregistered");
        }
    }

    /// Point-in-time copy of every live channel, in no promised order.
    pub fn snapshot(&self) -> Vec<RegisteredChannel> {
        self.channels.lock().unwrap().values().cloned().collect()
    }

    /// Point-in-time copy of the channels belonging to one user.
    pub fn snapshot_for_user(&self, user_id: Uuid) -> Vec<RegisteredChannel> {
        self.channels
            .lock()
            .unwrap()
            .values()
            .filter(|c| c.user_id == user_id)
            .cloned()
            .collect()
    }

    /// Number of live channels.
    pub fn connection_count(&self) -> usize {
        self.channels.lock().unwrap().len()
    }

    /// Number of live channels for one user.
    pub fn user_connection_count(&self, user_id: Uuid) -> usize {
        self.channels
            .lock()
            .unwrap()
            .values()
            .filter(|c| c.user_id == user_id)
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn channel() -> (mpsc::Sender<LiveEvent>, mpsc::Receiver<LiveEvent>) {
        mpsc::channel(EVENT_CHANNEL_CAPACITY)
    }

    #[tokio::test]
    async fn test_register_and_count() {
        let registry = ConnectionRegistry::new();
        assert_eq!(registry.connection_count(), 0);

        let user = Uuid::new_v4();
        let (tx, _rx) = channel();
        registry.register(user, tx);
        assert_eq!(registry.connection_count(), 1);
        assert_eq!(registry.user_connection_count(user), 1);
        assert_eq!(registry.user_connection_count(Uuid::new_v4()), 0);
    }

    #[tokio::test]
    async fn test_unregister_unknown_is_noop() {
        let registry = ConnectionRegistry::new();
        let (tx, _rx) = channel();
        let id = registry.register(Uuid::new_v4(), tx);

        registry.unregister(id);
        assert_eq!(registry.connection_count(), 0);
        // Second unregister of the same handle is harmless
        registry.unregister(id);
        assert_eq!(registry.connection_count(), 0);
    }

    #[tokio::test]
    async fn test_snapshot_is_point_in_time() {
        let registry = ConnectionRegistry::new();
        let (tx1, _rx1) = channel();
        let (tx2, _rx2) = channel();
        let id1 = registry.register(Uuid::new_v4(), tx1);
        registry.register(Uuid::new_v4(), tx2);

        let snapshot = registry.snapshot();
        assert_eq!(snapshot.len(), 2);

        // Mutating the registry does not change the snapshot already taken
        registry.unregister(id1);
        assert_eq!(snapshot.len(), 2);
        assert_eq!(registry.connection_count(), 1);
    }

    #[tokio::test]
    async fn test_snapshot_for_user_filters() {
        let registry = ConnectionRegistry::new();
        let alice = Uuid::new_v4();
        let bob = Uuid::new_v4();

        let (tx1, _rx1) = channel();
        let (tx2, _rx2) = channel();
        let (tx3, _rx3) = channel();
        registry.register(alice, tx1);
        registry.register(alice, tx2);
        registry.register(bob, tx3);

        let for_alice = registry.snapshot_for_user(alice);
        assert_eq!(for_alice.len(), 2);
        assert!(for_alice.iter().all(|c| c.user_id == alice));
    }

    #[tokio::test]
    async fn test_channel_ids_are_unique() {
        let registry = ConnectionRegistry::new();
        let user = Uuid::new_v4();
        let mut seen = std::collections::HashSet::new();
        for _ in 0..100 {
            let (tx, _rx) = channel();
            assert!(seen.insert(registry.register(user, tx)));
        }
    }
}
