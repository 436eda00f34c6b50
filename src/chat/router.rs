//! Per-connection event dispatch.

use crate::error::ChatError;
use crate::protocol::ClientEvent;

use super::{ChatManager, ConnectionId};

impl ChatManager {
    /// Parse a raw text frame and apply it.
    ///
    /// # Errors
    ///
    /// Returns the [`ChatError`] that caused the event to be dropped. The connection stays
    /// usable either way.
    pub fn handle_text(&self, id: ConnectionId, text: &str) -> Result<(), ChatError> {
        let event = ClientEvent::parse(text)?;
        self.dispatch(id, event)
    }

    /// Apply one client event under the matchmaking lock.
    ///
    /// # Errors
    ///
    /// Returns an error for events that are invalid in the connection's current state.
    pub fn dispatch(&self, id: ConnectionId, event: ClientEvent) -> Result<(), ChatError> {
        tracing::trace!(connection_id = %id, event = event.kind(), "Dispatching event");

        match event {
            ClientEvent::Join { username } => {
                let (joined, username) = {
                    let mut matchmaker = self.lock();
                    let joined = matchmaker.join(id, &username)?;
                    let username = matchmaker.username_of(id).unwrap_or_default().to_string();
                    (joined, username)
                };
                if let Some(previous) = &joined.previous_username {
                    self.presence_remove(previous);
                }
                self.presence_add(&username);
                tracing::info!(connection_id = %id, %username, "User joined");
            }
            ClientEvent::Message { text } => {
                if !self.lock().relay(id, text)? {
                    tracing::trace!(connection_id = %id, "Message dropped, no open partner");
                }
            }
            ClientEvent::NewChat => {
                self.lock().new_chat(id)?;
            }
            ClientEvent::Disconnect => {
                self.lock().leave(id)?;
            }
        }
        Ok(())
    }
}
