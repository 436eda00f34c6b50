use std::collections::HashMap;

use crate::error::ChatError;
use crate::protocol::ServerEvent;

use super::handle::{ConnectionId, Handle, Outbox};
use super::pool::WaitingPool;
use super::registry::{SessionId, SessionRegistry};

/// Maximum accepted display name length, in characters.
pub const MAX_USERNAME_CHARS: usize = 100;

/// Where a connection stands in the matchmaking flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandleState {
    /// Registered but neither queued nor chatting
    Idle,
    Waiting,
    Paired,
}

/// Result of running the matchmaker for one connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchOutcome {
    Waiting,
    Paired {
        partner: ConnectionId,
        session_id: SessionId,
    },
}

/// Result of a successful `join`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Joined {
    pub outcome: MatchOutcome,
    /// Name the connection used before this join, if it had joined before
    pub previous_username: Option<String>,
}

/// Owns every registered connection, the waiting pool and the partner table.
///
/// Not synchronized; [`super::ChatManager`] serializes access.
#[derive(Debug, Default)]
pub struct Matchmaker {
    handles: HashMap<ConnectionId, Handle>,
    pool: WaitingPool,
    sessions: SessionRegistry,
}

impl Matchmaker {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a freshly established connection in the `Idle` state.
    pub fn register(&mut self, id: ConnectionId, outbox: Outbox) {
        self.handles.insert(id, Handle::new(id, outbox));
    }

    /// Set the connection's display name and look for a partner.
    ///
    /// # Errors
    ///
    /// [`ChatError::InvalidUsername`] for blank or oversized names, [`ChatError::AlreadyJoined`]
    /// if the connection is waiting or chatting, [`ChatError::UnknownConnection`] if it was
    /// released.
    pub fn join(&mut self, id: ConnectionId, username: &str) -> Result<Joined, ChatError> {
        let username = normalize_username(username)?;
        if self.state_of(id).ok_or(ChatError::UnknownConnection)? != HandleState::Idle {
            return Err(ChatError::AlreadyJoined);
        }

        let handle = self
            .handles
            .get_mut(&id)
            .ok_or(ChatError::UnknownConnection)?;
        let previous_username = handle.username().map(str::to_string);
        handle.set_username(username);

        let outcome = self.find_partner(id)?;
        Ok(Joined {
            outcome,
            previous_username,
        })
    }

    /// Relay `text` to the connection's partner. Returns whether it was handed to an open
    /// transport; an unpaired sender or a closed partner is a silent no-op.
    ///
    /// # Errors
    ///
    /// [`ChatError::UnknownConnection`] if the sender was released.
    pub fn relay(&self, id: ConnectionId, text: String) -> Result<bool, ChatError> {
        if !self.handles.contains_key(&id) {
            return Err(ChatError::UnknownConnection);
        }
        let Some(partner) = self
            .sessions
            .partner_of(id)
            .and_then(|partner| self.handles.get(&partner))
        else {
            return Ok(false);
        };
        if !partner.is_open() {
            return Ok(false);
        }
        Ok(partner.send(ServerEvent::relay(text)))
    }

    /// End any current session and search again.
    ///
    /// # Errors
    ///
    /// [`ChatError::NotJoined`] if the connection never sent `join`,
    /// [`ChatError::UnknownConnection`] if it was released.
    pub fn new_chat(&mut self, id: ConnectionId) -> Result<MatchOutcome, ChatError> {
        let handle = self.handles.get(&id).ok_or(ChatError::UnknownConnection)?;
        if handle.username().is_none() {
            return Err(ChatError::NotJoined);
        }

        self.end_session(id);
        self.pool.remove(id);
        self.find_partner(id)
    }

    /// Client-requested leave: end the session and drop out of the pool. The connection stays
    /// registered and may `join` again. Returns whether a session was ended.
    ///
    /// # Errors
    ///
    /// [`ChatError::UnknownConnection`] if the connection was released.
    pub fn leave(&mut self, id: ConnectionId) -> Result<bool, ChatError> {
        if !self.handles.contains_key(&id) {
            return Err(ChatError::UnknownConnection);
        }
        self.pool.remove(id);
        Ok(self.end_session(id).is_some())
    }

    /// Transport closed: tear down like [`Self::leave`], then forget the connection.
    pub fn release(&mut self, id: ConnectionId) -> Option<Handle> {
        self.pool.remove(id);
        self.end_session(id);
        self.handles.remove(&id)
    }

    #[must_use]
    pub fn state_of(&self, id: ConnectionId) -> Option<HandleState> {
        if !self.handles.contains_key(&id) {
            return None;
        }
        Some(if self.sessions.is_paired(id) {
            HandleState::Paired
        } else if self.pool.contains(id) {
            HandleState::Waiting
        } else {
            HandleState::Idle
        })
    }

    #[must_use]
    pub fn partner_of(&self, id: ConnectionId) -> Option<ConnectionId> {
        self.sessions.partner_of(id)
    }

    #[must_use]
    pub fn username_of(&self, id: ConnectionId) -> Option<&str> {
        self.handles.get(&id).and_then(Handle::username)
    }

    #[must_use]
    pub fn connection_count(&self) -> usize {
        self.handles.len()
    }

    #[must_use]
    pub fn waiting_count(&self) -> usize {
        self.pool.len()
    }

    #[must_use]
    pub fn session_count(&self) -> usize {
        self.sessions.session_count()
    }

    /// Pair `id` with the earliest eligible waiter, or queue it.
    fn find_partner(&mut self, id: ConnectionId) -> Result<MatchOutcome, ChatError> {
        let username = self
            .handles
            .get(&id)
            .ok_or(ChatError::UnknownConnection)?
            .username()
            .ok_or(ChatError::NotJoined)?
            .to_string();

        while let Some(waiter) = self.pool.dequeue_next(&username) {
            // Released connections are removed from the pool, so this only guards stale entries
            let Some(partner) = self.handles.get(&waiter.id) else {
                continue;
            };
            let session_id = self.sessions.pair(id, waiter.id);
            partner.send(ServerEvent::matched());
            if let Some(handle) = self.handles.get(&id) {
                handle.send(ServerEvent::matched());
            }
            tracing::info!(
                %session_id,
                connection_id = %id,
                partner_id = %waiter.id,
                "Chat session started"
            );
            return Ok(MatchOutcome::Paired {
                partner: waiter.id,
                session_id,
            });
        }

        self.pool.enqueue(id, username);
        if let Some(handle) = self.handles.get(&id) {
            handle.send(ServerEvent::waiting());
        }
        tracing::debug!(connection_id = %id, waiting = self.pool.len(), "Queued for a partner");
        Ok(MatchOutcome::Waiting)
    }

    /// Clear both sides of `id`'s session and tell the partner, if still connected.
    fn end_session(&mut self, id: ConnectionId) -> Option<ConnectionId> {
        let pairing = self.sessions.unpair(id)?;
        if let Some(partner) = self.handles.get(&pairing.partner)
            && partner.is_open()
        {
            partner.send(ServerEvent::stranger_disconnected());
        }
        tracing::info!(
            session_id = %pairing.session_id,
            connection_id = %id,
            partner_id = %pairing.partner,
            "Chat session ended"
        );
        Some(pairing.partner)
    }
}

/// Trim and validate a display name.
fn normalize_username(raw: &str) -> Result<String, ChatError> {
    let username = raw.trim();
    if username.is_empty() {
        return Err(ChatError::InvalidUsername("username is empty".to_string()));
    }
    if username.chars().count() > MAX_USERNAME_CHARS {
        return Err(ChatError::InvalidUsername(format!(
            "username exceeds {MAX_USERNAME_CHARS} characters"
        )));
    }
    Ok(username.to_string())
}

#[cfg(test)]
mod tests {
    use tokio::sync::mpsc;

    use super::*;

    fn connect(mm: &mut Matchmaker) -> (ConnectionId, mpsc::UnboundedReceiver<ServerEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let id = ConnectionId::new();
        mm.register(id, tx);
        (id, rx)
    }

    fn drain(rx: &mut mpsc::UnboundedReceiver<ServerEvent>) -> Vec<ServerEvent> {
        let mut events = Vec::new();
        while let Ok(event) = rx.try_recv() {
            events.push(event);
        }
        events
    }

    #[test]
    fn first_joiner_waits_second_is_matched() {
        let mut mm = Matchmaker::new();
        let (alice, mut alice_rx) = connect(&mut mm);
        let (bob, mut bob_rx) = connect(&mut mm);

        let joined = mm.join(alice, "alice");
        assert_eq!(joined.map(|j| j.outcome), Ok(MatchOutcome::Waiting));
        assert_eq!(drain(&mut alice_rx), vec![ServerEvent::waiting()]);

        let joined = mm.join(bob, "bob");
        assert!(matches!(
            joined.map(|j| j.outcome),
            Ok(MatchOutcome::Paired { partner, .. }) if partner == alice
        ));
        assert_eq!(drain(&mut alice_rx), vec![ServerEvent::matched()]);
        assert_eq!(drain(&mut bob_rx), vec![ServerEvent::matched()]);
        assert_eq!(mm.partner_of(alice), Some(bob));
        assert_eq!(mm.partner_of(bob), Some(alice));
        assert_eq!(mm.waiting_count(), 0);
    }

    #[test]
    fn same_name_connections_never_match() {
        let mut mm = Matchmaker::new();
        let (first, mut first_rx) = connect(&mut mm);
        let (second, mut second_rx) = connect(&mut mm);

        assert!(mm.join(first, "x").is_ok());
        assert!(mm.join(second, "x").is_ok());

        assert_eq!(drain(&mut first_rx), vec![ServerEvent::waiting()]);
        assert_eq!(drain(&mut second_rx), vec![ServerEvent::waiting()]);
        // The first entry was discarded by the second scan
        assert_eq!(mm.state_of(first), Some(HandleState::Idle));
        assert_eq!(mm.state_of(second), Some(HandleState::Waiting));
    }

    #[test]
    fn join_rejects_bad_names_and_double_join() {
        let mut mm = Matchmaker::new();
        let (id, _rx) = connect(&mut mm);

        assert!(matches!(
            mm.join(id, "   "),
            Err(ChatError::InvalidUsername(_))
        ));
        assert!(matches!(
            mm.join(id, &"a".repeat(MAX_USERNAME_CHARS + 1)),
            Err(ChatError::InvalidUsername(_))
        ));
        assert!(mm.join(id, "  alice  ").is_ok());
        assert_eq!(mm.username_of(id), Some("alice"));
        assert_eq!(mm.join(id, "alice"), Err(ChatError::AlreadyJoined));
        assert_eq!(mm.waiting_count(), 1);
    }

    #[test]
    fn relay_reaches_partner_only() {
        let mut mm = Matchmaker::new();
        let (alice, mut alice_rx) = connect(&mut mm);
        let (bob, mut bob_rx) = connect(&mut mm);
        assert_eq!(mm.relay(alice, "nobody".to_string()), Ok(false));

        assert!(mm.join(alice, "alice").is_ok());
        assert!(mm.join(bob, "bob").is_ok());
        drain(&mut alice_rx);
        drain(&mut bob_rx);

        assert_eq!(mm.relay(bob, "hi".to_string()), Ok(true));
        assert_eq!(
            drain(&mut alice_rx),
            vec![ServerEvent::relay("hi".to_string())]
        );
        assert!(drain(&mut bob_rx).is_empty());
    }

    #[test]
    fn relay_to_closed_partner_is_dropped() {
        let mut mm = Matchmaker::new();
        let (alice, alice_rx) = connect(&mut mm);
        let (bob, _bob_rx) = connect(&mut mm);
        assert!(mm.join(alice, "alice").is_ok());
        assert!(mm.join(bob, "bob").is_ok());

        drop(alice_rx);
        assert_eq!(mm.relay(bob, "hello?".to_string()), Ok(false));
    }

    #[test]
    fn leave_is_idempotent() {
        let mut mm = Matchmaker::new();
        let (alice, mut alice_rx) = connect(&mut mm);
        let (bob, _bob_rx) = connect(&mut mm);
        assert!(mm.join(alice, "alice").is_ok());
        assert!(mm.join(bob, "bob").is_ok());
        drain(&mut alice_rx);

        assert_eq!(mm.leave(bob), Ok(true));
        assert_eq!(mm.leave(bob), Ok(false));
        assert_eq!(
            drain(&mut alice_rx),
            vec![ServerEvent::stranger_disconnected()]
        );
        assert_eq!(mm.state_of(alice), Some(HandleState::Idle));
        assert_eq!(mm.state_of(bob), Some(HandleState::Idle));
    }

    #[test]
    fn new_chat_requires_join() {
        let mut mm = Matchmaker::new();
        let (id, _rx) = connect(&mut mm);
        assert_eq!(mm.new_chat(id), Err(ChatError::NotJoined));
    }

    #[test]
    fn new_chat_while_waiting_keeps_single_pool_entry() {
        let mut mm = Matchmaker::new();
        let (alice, _rx) = connect(&mut mm);
        assert!(mm.join(alice, "alice").is_ok());
        assert_eq!(mm.new_chat(alice), Ok(MatchOutcome::Waiting));
        assert_eq!(mm.waiting_count(), 1);
    }

    #[test]
    fn release_forgets_the_connection() {
        let mut mm = Matchmaker::new();
        let (alice, _alice_rx) = connect(&mut mm);
        assert!(mm.join(alice, "alice").is_ok());

        let released = mm.release(alice);
        assert_eq!(released.map(|h| h.id()), Some(alice));
        assert_eq!(mm.state_of(alice), None);
        assert_eq!(mm.waiting_count(), 0);
        assert_eq!(mm.relay(alice, "x".to_string()), Err(ChatError::UnknownConnection));
        assert_eq!(mm.leave(alice), Err(ChatError::UnknownConnection));
    }
}
