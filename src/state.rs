use crate::chat::ChatManager;
use crate::config::Config;

/// Shared application state available to all request handlers via Axum's `State` extractor.
#[derive(Debug, Clone)]
pub struct AppState {
    pub config: Config,
    pub chat: ChatManager,
}

impl AppState {
    #[must_use]
    pub fn new(config: Config) -> Self {
        Self {
            config,
            chat: ChatManager::new(),
        }
    }
}
