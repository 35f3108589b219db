//! Telephony media-stream message types.
//!
//! Inbound events (received from the telephony platform):
//! - start - stream opened; carries the stream SID
//! - media - one audio frame; base64 payload
//! - stop - stream closing
//!
//! Anything else (`connected`, `mark`, future event types) is ignored.
//!
//! Outbound events (sent back to the platform):
//! - media - generated audio framed with the stream SID

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors on the telephony link.
#[derive(Debug, Error)]
pub enum TelephonyError {
    /// Inbound frame is not decodable; logged and dropped, never fatal to the
    /// connection
    #[error("undecodable telephony frame: {0}")]
    Decode(#[from] serde_json::Error),
}

/// Stream metadata carried by the `start` event.
#[derive(Debug, Clone, Deserialize)]
pub struct StreamStart {
    /// Stream identifier used to frame outbound audio
    #[serde(rename = "streamSid")]
    pub stream_sid: String,
    /// Call identifier, when the platform includes it
    #[serde(rename = "callSid", default)]
    pub call_sid: Option<String>,
}

/// Audio payload envelope. The payload is base64 audio and is always passed
/// through opaquely.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MediaPayload {
    pub payload: String,
}

/// Events received from the telephony platform.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "event", rename_all = "lowercase")]
pub enum TelephonyInEvent {
    /// Stream opened
    Start { start: StreamStart },
    /// One inbound audio frame
    Media { media: MediaPayload },
    /// Stream closing
    Stop,
    /// Any event type this relay does not handle
    #[serde(other)]
    Unknown,
}

impl TelephonyInEvent {
    /// Decode an inbound text frame.
    pub fn decode(text: &str) -> Result<Self, TelephonyError> {
        Ok(serde_json::from_str(text)?)
    }
}

/// Events sent to the telephony platform.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event", rename_all = "lowercase")]
pub enum TelephonyOutEvent {
    /// Generated audio framed for the platform
    Media {
        #[serde(rename = "streamSid")]
        stream_sid: String,
        media: MediaPayload,
    },
}
