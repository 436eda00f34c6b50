//! JSON events exchanged with chat clients over the `WebSocket`.
//!
//! Every frame is an object tagged by its `type` field.

use serde::{Deserialize, Serialize};

use crate::error::ChatError;

pub const WAITING_MESSAGE: &str = "Looking for someone to chat with...";
pub const MATCHED_MESSAGE: &str = "You are now connected with a stranger!";
pub const STRANGER_DISCONNECTED_MESSAGE: &str = "Stranger has disconnected.";

/// Events sent from the client to the server.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum ClientEvent {
    Join { username: String },
    Message { text: String },
    NewChat,
    Disconnect,
}

impl ClientEvent {
    /// Parse a text frame into an event.
    ///
    /// # Errors
    ///
    /// Returns [`ChatError::MalformedEvent`] for invalid JSON, unknown types or missing fields.
    pub fn parse(text: &str) -> Result<Self, ChatError> {
        Ok(serde_json::from_str(text)?)
    }

    /// Short name used in logs.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Join { .. } => "join",
            Self::Message { .. } => "message",
            Self::NewChat => "new-chat",
            Self::Disconnect => "disconnect",
        }
    }
}

/// Who authored a relayed message, from the recipient's point of view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    Stranger,
}

/// Events pushed from the server to a client.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum ServerEvent {
    Waiting { message: String },
    Matched { message: String },
    Message { text: String, sender: Sender },
    StrangerDisconnected { message: String },
}

impl ServerEvent {
    #[must_use]
    pub fn waiting() -> Self {
        Self::Waiting {
            message: WAITING_MESSAGE.to_string(),
        }
    }

    #[must_use]
    pub fn matched() -> Self {
        Self::Matched {
            message: MATCHED_MESSAGE.to_string(),
        }
    }

    #[must_use]
    pub const fn relay(text: String) -> Self {
        Self::Message {
            text,
            sender: Sender::Stranger,
        }
    }

    #[must_use]
    pub fn stranger_disconnected() -> Self {
        Self::StrangerDisconnected {
            message: STRANGER_DISCONNECTED_MESSAGE.to_string(),
        }
    }

    /// Serialize to the JSON text sent on the wire.
    ///
    /// # Errors
    ///
    /// Returns an error only if serialization fails, which these plain variants never do.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}
