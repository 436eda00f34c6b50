//! In-memory stranger matchmaking.
//!
//! All pairing state (registered connections, the waiting pool and the partner table) sits in a
//! single [`Matchmaker`] behind one mutex, so every inbound event is applied atomically.
//! A lock-free presence map counts live connections per display name for the stats endpoint.

mod handle;
mod matchmaker;
mod pool;
mod registry;
mod router;

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use dashmap::DashMap;
use serde::Serialize;

pub use handle::{ConnectionId, Handle, Outbox};
pub use matchmaker::{HandleState, Joined, MAX_USERNAME_CHARS, MatchOutcome, Matchmaker};
pub use pool::{Waiter, WaitingPool};
pub use registry::{Pairing, SessionId, SessionRegistry};

/// Snapshot of matchmaking activity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatStats {
    pub connections: usize,
    pub waiting: usize,
    pub active_sessions: usize,
    pub online_users: usize,
}

/// Shared handle to the matchmaking state. Cheap to clone.
#[derive(Debug, Clone, Default)]
pub struct ChatManager {
    matchmaker: Arc<Mutex<Matchmaker>>,
    /// display name → number of live joined connections
    presence: Arc<DashMap<String, usize>>,
}

impl ChatManager {
    /// Create an empty chat manager.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new connection whose events will be pushed onto `outbox`.
    pub fn register(&self, outbox: Outbox) -> ConnectionId {
        let id = ConnectionId::new();
        self.lock().register(id, outbox);
        tracing::debug!(connection_id = %id, "Connection registered");
        id
    }

    /// The connection's transport closed: end its session, drop it from the pool and forget it.
    pub fn release(&self, id: ConnectionId) {
        let released = self.lock().release(id);
        if let Some(username) = released.as_ref().and_then(Handle::username) {
            self.presence_remove(username);
        }
        tracing::debug!(connection_id = %id, "Connection released");
    }

    #[must_use]
    pub fn state_of(&self, id: ConnectionId) -> Option<HandleState> {
        self.lock().state_of(id)
    }

    #[must_use]
    pub fn partner_of(&self, id: ConnectionId) -> Option<ConnectionId> {
        self.lock().partner_of(id)
    }

    /// Number of live connections that joined as `username`.
    #[must_use]
    pub fn connections_for(&self, username: &str) -> usize {
        self.presence.get(username).map_or(0, |count| *count)
    }

    #[must_use]
    pub fn stats(&self) -> ChatStats {
        let matchmaker = self.lock();
        ChatStats {
            connections: matchmaker.connection_count(),
            waiting: matchmaker.waiting_count(),
            active_sessions: matchmaker.session_count(),
            online_users: self.presence.len(),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Matchmaker> {
        self.matchmaker
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn presence_add(&self, username: &str) {
        *self.presence.entry(username.to_string()).or_insert(0) += 1;
    }

    fn presence_remove(&self, username: &str) {
        self.presence
            .remove_if_mut(username, |_, count| {
                *count = count.saturating_sub(1);
                *count == 0
            });
    }
}
