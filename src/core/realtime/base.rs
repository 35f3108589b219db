//! Base types for the realtime provider link.
//!
//! Defines the link's connection state machine, its error taxonomy, the
//! session configuration, and the async callback aliases through which link
//! events reach the per-call orchestrator.

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use thiserror::Error;

use crate::core::session::Speaker;

// =============================================================================
// Error Types
// =============================================================================

/// Errors that can occur on the provider link. Link errors never terminate
/// the telephony side; the orchestrator logs them and the call continues
/// degraded.
#[derive(Debug, Error)]
pub enum LinkError {
    /// Connection to the provider failed
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// Authentication failed
    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    /// WebSocket transport error
    #[error("WebSocket error: {0}")]
    WebSocket(String),

    /// Error event reported by the provider
    #[error("Provider error: {0}")]
    Provider(String),

    /// The link has been closed
    #[error("Link closed")]
    Closed,
}

/// Result type for link operations.
pub type LinkResult<T> = Result<T, LinkError>;

// =============================================================================
// Connection State
// =============================================================================

/// Connection lifecycle of the provider link.
///
/// `Closed` is reachable from every state on error or peer close. Audio may
/// only be appended in `Configured`/`Streaming`; appends issued earlier are
/// queued and flushed once the session configuration has been handed to the
/// socket writer, so nothing is sent early and nothing is silently dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LinkState {
    /// Not yet connected
    #[default]
    Connecting,
    /// Transport established, configuration not yet sent
    Open,
    /// Session configuration sent; audio appends accepted
    Configured,
    /// At least one audio frame has been appended
    Streaming,
    /// Link closed (locally or by the peer)
    Closed,
}

impl fmt::Display for LinkState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LinkState::Connecting => write!(f, "Connecting"),
            LinkState::Open => write!(f, "Open"),
            LinkState::Configured => write!(f, "Configured"),
            LinkState::Streaming => write!(f, "Streaming"),
            LinkState::Closed => write!(f, "Closed"),
        }
    }
}

impl LinkState {
    /// Whether audio appends may be forwarded to the provider in this state.
    pub fn accepts_audio(&self) -> bool {
        matches!(self, LinkState::Configured | LinkState::Streaming)
    }
}

// =============================================================================
// Configuration
// =============================================================================

/// Configuration for the provider link and its realtime session.
#[derive(Debug, Clone)]
pub struct RealtimeConfig {
    /// API key for bearer authentication
    pub api_key: String,
    /// WebSocket endpoint, model included in the query string
    pub realtime_url: String,
    /// Voice for audio output
    pub voice: String,
    /// System instructions for the agent
    pub instructions: String,
    /// Input audio format; matches the telephony codec so payloads pass
    /// through untranscoded
    pub input_audio_format: String,
    /// Output audio format
    pub output_audio_format: String,
    /// Model used for input audio transcription
    pub transcription_model: String,
    /// Temperature for response generation
    pub temperature: f32,
}

impl Default for RealtimeConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            realtime_url: super::openai::OPENAI_REALTIME_URL.to_string(),
            voice: "shimmer".to_string(),
            instructions: String::new(),
            input_audio_format: "g711_ulaw".to_string(),
            output_audio_format: "g711_ulaw".to_string(),
            transcription_model: "whisper-1".to_string(),
            temperature: 0.8,
        }
    }
}

// =============================================================================
// Callback Types
// =============================================================================

/// One transcript fragment surfaced by the link: a completed user utterance
/// or a completed agent response.
#[derive(Debug, Clone)]
pub struct TranscriptFragment {
    pub speaker: Speaker,
    pub text: String,
}

/// Callback type for transcript fragments.
pub type TranscriptCallback =
    Arc<dyn Fn(TranscriptFragment) -> Pin<Box<dyn Future<Output = ()> + Send>> + Send + Sync>;

/// Callback type for audio deltas. The argument is the provider's base64
/// payload, forwarded opaquely.
pub type AudioDeltaCallback =
    Arc<dyn Fn(String) -> Pin<Box<dyn Future<Output = ()> + Send>> + Send + Sync>;

/// Callback type for link errors.
pub type LinkErrorCallback =
    Arc<dyn Fn(LinkError) -> Pin<Box<dyn Future<Output = ()> + Send>> + Send + Sync>;

/// Callback type for link closure (peer close or transport failure).
pub type ClosedCallback =
    Arc<dyn Fn() -> Pin<Box<dyn Future<Output = ()> + Send>> + Send + Sync>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_audio_gating() {
        assert!(!LinkState::Connecting.accepts_audio());
        assert!(!LinkState::Open.accepts_audio());
        assert!(LinkState::Configured.accepts_audio());
        assert!(LinkState::Streaming.accepts_audio());
        assert!(!LinkState::Closed.accepts_audio());
    }

    #[test]
    fn test_state_display() {
        assert_eq!(LinkState::Configured.to_string(), "Configured");
        assert_eq!(LinkState::default(), LinkState::Connecting);
    }

    #[test]
    fn test_default_config_matches_session_contract() {
        let config = RealtimeConfig::default();
        assert_eq!(config.input_audio_format, "g711_ulaw");
        assert_eq!(config.output_audio_format, "g711_ulaw");
        assert_eq!(config.transcription_model, "whisper-1");
        assert_eq!(config.temperature, 0.8);
    }
}
