use std::fmt;

use tokio::sync::mpsc;
use uuid::Uuid;

use crate::protocol::ServerEvent;

/// Outbound channel drained by a connection's socket writer task.
pub type Outbox = mpsc::UnboundedSender<ServerEvent>;

/// Identifies one live connection, independent of the display name it joins with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(Uuid);

impl ConnectionId {
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ConnectionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// A registered connection: its outbox plus the display name it joined with, if any.
///
/// Partner state lives in the session registry, not here.
#[derive(Debug)]
pub struct Handle {
    id: ConnectionId,
    username: Option<String>,
    outbox: Outbox,
}

impl Handle {
    #[must_use]
    pub const fn new(id: ConnectionId, outbox: Outbox) -> Self {
        Self {
            id,
            username: None,
            outbox,
        }
    }

    #[must_use]
    pub const fn id(&self) -> ConnectionId {
        self.id
    }

    #[must_use]
    pub fn username(&self) -> Option<&str> {
        self.username.as_deref()
    }

    pub fn set_username(&mut self, username: String) {
        self.username = Some(username);
    }

    /// Whether the socket writer is still draining this outbox.
    #[must_use]
    pub fn is_open(&self) -> bool {
        !self.outbox.is_closed()
    }

    /// Push an event to the client. Returns `false` if the transport is gone; callers treat
    /// that as a no-op.
    pub fn send(&self, event: ServerEvent) -> bool {
        self.outbox.send(event).is_ok()
    }
}
