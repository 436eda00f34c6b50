use std::fmt;

/// Errors raised while handling a single inbound chat event.
///
/// None of these are fatal: the connection that caused them stays open and the
/// offending event is dropped after being logged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatError {
    /// Payload was not valid JSON or did not match any known event shape
    MalformedEvent(String),
    /// `join` carried an empty or oversized username
    InvalidUsername(String),
    /// Event requires a prior `join`
    NotJoined,
    /// `join` sent while already waiting or chatting
    AlreadyJoined,
    /// Connection id is not registered (already released)
    UnknownConnection,
}

impl fmt::Display for ChatError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MalformedEvent(msg) => write!(f, "Malformed event: {msg}"),
            Self::InvalidUsername(msg) => write!(f, "Invalid username: {msg}"),
            Self::NotJoined => write!(f, "Connection has not joined yet"),
            Self::AlreadyJoined => write!(f, "Connection is already waiting or chatting"),
            Self::UnknownConnection => write!(f, "Unknown connection"),
        }
    }
}

impl std::error::Error for ChatError {}

impl From<serde_json::Error> for ChatError {
    fn from(err: serde_json::Error) -> Self {
        Self::MalformedEvent(err.to_string())
    }
}
