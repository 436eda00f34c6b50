use std::collections::HashMap;
use std::fmt;

use chrono::Utc;

use super::handle::ConnectionId;

/// Informational tag for one pairing: creation time in milliseconds plus a sequence number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SessionId {
    started_at_ms: i64,
    seq: u64,
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.started_at_ms, self.seq)
    }
}

/// One side's view of an active session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pairing {
    pub partner: ConnectionId,
    pub session_id: SessionId,
}

/// Symmetric partner table. Both directions are inserted and removed together.
#[derive(Debug, Default)]
pub struct SessionRegistry {
    pairings: HashMap<ConnectionId, Pairing>,
    next_seq: u64,
}

impl SessionRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a session between `a` and `b` and return its identifier.
    ///
    /// Callers must have torn down any existing session for either side first.
    pub fn pair(&mut self, a: ConnectionId, b: ConnectionId) -> SessionId {
        debug_assert!(a != b, "a connection cannot be paired with itself");
        debug_assert!(!self.pairings.contains_key(&a) && !self.pairings.contains_key(&b));

        self.next_seq += 1;
        let session_id = SessionId {
            started_at_ms: Utc::now().timestamp_millis(),
            seq: self.next_seq,
        };
        self.pairings.insert(
            a,
            Pairing {
                partner: b,
                session_id,
            },
        );
        self.pairings.insert(
            b,
            Pairing {
                partner: a,
                session_id,
            },
        );
        session_id
    }

    #[must_use]
    pub fn pairing(&self, id: ConnectionId) -> Option<Pairing> {
        self.pairings.get(&id).copied()
    }

    #[must_use]
    pub fn partner_of(&self, id: ConnectionId) -> Option<ConnectionId> {
        self.pairings.get(&id).map(|pairing| pairing.partner)
    }

    #[must_use]
    pub fn is_paired(&self, id: ConnectionId) -> bool {
        self.pairings.contains_key(&id)
    }

    /// End the session `id` belongs to, clearing both sides. Returns the former pairing.
    pub fn unpair(&mut self, id: ConnectionId) -> Option<Pairing> {
        let pairing = self.pairings.remove(&id)?;
        if self
            .pairings
            .get(&pairing.partner)
            .is_some_and(|back| back.partner == id)
        {
            self.pairings.remove(&pairing.partner);
        }
        Some(pairing)
    }

    /// Number of active sessions.
    #[must_use]
    pub fn session_count(&self) -> usize {
        self.pairings.len() / 2
    }
}
