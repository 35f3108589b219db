//! OpenAI Realtime API WebSocket message types.
//!
//! All events are JSON-encoded and sent over WebSocket, tagged by a `type`
//! field.
//!
//! Client events (sent to server):
//! - session.update - Send session configuration
//! - input_audio_buffer.append - Append audio to the input buffer
//!
//! Server events (received from server):
//! - session.created / session.updated
//! - conversation.item.input_audio_transcription.completed - user transcript
//! - response.audio.delta - audio data chunk (base64, forwarded opaquely)
//! - response.done - response complete; carries the agent transcript
//! - error
//!
//! Every other server event type deserializes to `Unknown` and is ignored
//! without error.

use serde::{Deserialize, Serialize};

/// Sentinel agent transcript when a `response.done` event carries no content
/// block with a transcript field.
pub const AGENT_TRANSCRIPT_NOT_FOUND: &str = "Agent message not found";

// =============================================================================
// Session Configuration
// =============================================================================

/// Session configuration sent in the one `session.update` after open.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Response modalities (text, audio)
    pub modalities: Vec<String>,

    /// System instructions for the agent
    pub instructions: String,

    /// Voice for audio output
    pub voice: String,

    /// Input audio format
    pub input_audio_format: String,

    /// Output audio format
    pub output_audio_format: String,

    /// Input audio transcription configuration
    pub input_audio_transcription: InputAudioTranscription,

    /// Turn detection configuration
    pub turn_detection: TurnDetection,

    /// Temperature for response generation
    pub temperature: f32,
}

/// Input audio transcription configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InputAudioTranscription {
    /// Transcription model (e.g., "whisper-1")
    pub model: String,
}

/// Turn detection configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum TurnDetection {
    /// Server-side VAD
    #[serde(rename = "server_vad")]
    ServerVad {},
}

// =============================================================================
// Client Events (sent to server)
// =============================================================================

/// Client events sent to the OpenAI Realtime API.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type")]
pub enum ClientEvent {
    /// Send session configuration
    #[serde(rename = "session.update")]
    SessionUpdate {
        /// Session configuration
        session: SessionConfig,
    },

    /// Append audio to the input buffer. The payload is already base64 and
    /// is never re-encoded here.
    #[serde(rename = "input_audio_buffer.append")]
    InputAudioBufferAppend {
        /// Base64-encoded audio data
        audio: String,
    },
}

// =============================================================================
// Server Events (received from server)
// =============================================================================

/// Server events received from the OpenAI Realtime API.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type")]
pub enum ServerEvent {
    /// Error occurred
    #[serde(rename = "error")]
    Error {
        /// Error details
        error: ApiError,
    },

    /// Session created
    #[serde(rename = "session.created")]
    SessionCreated {
        /// Session information
        session: SessionInfo,
    },

    /// Session configuration acknowledged
    #[serde(rename = "session.updated")]
    SessionUpdated {
        /// Session information
        session: SessionInfo,
    },

    /// Input audio transcription completed (user utterance)
    #[serde(rename = "conversation.item.input_audio_transcription.completed")]
    TranscriptionCompleted {
        /// Transcript text
        transcript: String,
        /// Item ID
        #[serde(default)]
        item_id: Option<String>,
    },

    /// Audio delta (base64 audio chunk, forwarded opaquely)
    #[serde(rename = "response.audio.delta")]
    AudioDelta {
        /// Base64-encoded audio delta
        delta: String,
        /// Item ID
        #[serde(default)]
        item_id: Option<String>,
    },

    /// Response done; carries the agent transcript
    #[serde(rename = "response.done")]
    ResponseDone {
        /// Response information
        response: Response,
    },

    /// Any server event type this relay does not handle
    #[serde(other)]
    Unknown,
}

// =============================================================================
// Supporting Types
// =============================================================================

/// API error information.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiError {
    /// Error type
    #[serde(rename = "type", default)]
    pub error_type: String,
    /// Error message
    #[serde(default)]
    pub message: String,
}

/// Session information carried by session.created/session.updated.
#[derive(Debug, Clone, Deserialize)]
pub struct SessionInfo {
    /// Session ID
    #[serde(default)]
    pub id: String,
}

/// Response information carried by response.done.
#[derive(Debug, Clone, Deserialize)]
pub struct Response {
    /// Output items
    #[serde(default)]
    pub output: Vec<OutputItem>,
}

/// One output item of a completed response.
#[derive(Debug, Clone, Deserialize)]
pub struct OutputItem {
    /// Content parts
    #[serde(default)]
    pub content: Option<Vec<ContentPart>>,
}

/// Content part within an output item.
#[derive(Debug, Clone, Deserialize)]
pub struct ContentPart {
    /// Transcript of audio content
    #[serde(default)]
    pub transcript: Option<String>,
}

impl Response {
    /// Extract the agent transcript: the first content block of the first
    /// output item exposing a transcript field. Absence yields the sentinel
    /// string rather than an error.
    pub fn agent_transcript(&self) -> String {
        self.output
            .first()
            .and_then(|item| item.content.as_ref())
            .and_then(|parts| parts.iter().find_map(|p| p.transcript.clone()))
            .unwrap_or_else(|| AGENT_TRANSCRIPT_NOT_FOUND.to_string())
    }
}
