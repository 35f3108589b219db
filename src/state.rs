//! Shared application state.

use std::sync::Arc;

use crate::config::ServerConfig;
use crate::core::extract::TranscriptExtractor;
use crate::core::session::SessionRegistry;
use crate::core::webhook::{Dispatch, HttpDispatcher, LogDispatcher};

/// State shared by every handler. One per process, behind `Arc`.
pub struct AppState {
    /// Server configuration
    pub config: ServerConfig,
    /// Active call sessions
    pub sessions: SessionRegistry,
    /// Post-call extraction client
    pub extractor: Arc<TranscriptExtractor>,
    /// Extraction record destination
    pub dispatcher: Arc<dyn Dispatch>,
}

impl AppState {
    pub fn new(config: ServerConfig) -> Arc<Self> {
        let extractor = Arc::new(TranscriptExtractor::new(
            config.openai_api_key.clone(),
            config.openai_completions_url.clone(),
            config.extraction_model.clone(),
        ));

        let dispatcher: Arc<dyn Dispatch> = match config.webhook_url.clone() {
            Some(url) => Arc::new(HttpDispatcher::new(url)),
            None => Arc::new(LogDispatcher),
        };

        Arc::new(Self {
            config,
            sessions: SessionRegistry::new(),
            extractor,
            dispatcher,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_starts_with_no_sessions() {
        let config = ServerConfig {
            openai_api_key: "test_key".to_string(),
            ..Default::default()
        };
        let state = AppState::new(config);
        assert!(state.sessions.is_empty());
    }
}
