//! Realtime AI-provider link.
//!
//! The outbound duplex connection to the conversational endpoint: connect,
//! authenticate, send session configuration, stream audio in, receive
//! audio/transcript events out.

pub mod base;
pub mod openai;

pub use base::{
    AudioDeltaCallback, ClosedCallback, LinkError, LinkErrorCallback, LinkResult, LinkState,
    RealtimeConfig, TranscriptCallback, TranscriptFragment,
};
pub use openai::OpenAIRealtime;
