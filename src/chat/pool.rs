use std::collections::VecDeque;

use super::handle::ConnectionId;

/// A connection waiting for a partner, with the name it joined under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Waiter {
    pub id: ConnectionId,
    pub username: String,
}

/// FIFO queue of connections looking for a partner.
#[derive(Debug, Default)]
pub struct WaitingPool {
    queue: VecDeque<Waiter>,
}

impl WaitingPool {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append to the tail. A connection already queued keeps its position.
    pub fn enqueue(&mut self, id: ConnectionId, username: impl Into<String>) {
        if self.contains(id) {
            return;
        }
        self.queue.push_back(Waiter {
            id,
            username: username.into(),
        });
    }

    /// Pop the first waiter whose name differs from `excluding`.
    ///
    /// Waiters sharing the excluded name are dropped from the queue as they are scanned and
    /// are not put back.
    pub fn dequeue_next(&mut self, excluding: &str) -> Option<Waiter> {
        while let Some(waiter) = self.queue.pop_front() {
            if waiter.username != excluding {
                return Some(waiter);
            }
            tracing::debug!(
                connection_id = %waiter.id,
                username = %waiter.username,
                "Discarded same-name waiter from pool"
            );
        }
        None
    }

    /// Remove a specific connection. Returns whether it was queued.
    pub fn remove(&mut self, id: ConnectionId) -> bool {
        self.queue
            .iter()
            .position(|waiter| waiter.id == id)
            .and_then(|index| self.queue.remove(index))
            .is_some()
    }

    #[must_use]
    pub fn contains(&self, id: ConnectionId) -> bool {
        self.queue.iter().any(|waiter| waiter.id == id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.queue.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Waiter> {
        self.queue.iter()
    }
}
