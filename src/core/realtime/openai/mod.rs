//! OpenAI Realtime API link implementation.

pub mod client;
pub mod messages;

pub use client::OpenAIRealtime;

/// Default OpenAI Realtime WebSocket endpoint, model baked into the query.
pub const OPENAI_REALTIME_URL: &str =
    "wss://api.openai.com/v1/realtime?model=gpt-4o-realtime-preview";
