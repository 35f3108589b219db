//! Plain HTTP endpoints: health check and the telephony call webhook.

use std::sync::Arc;

use axum::extract::State;
use axum::http::{HeaderMap, header};
use axum::response::IntoResponse;
use axum::Json;
use serde_json::json;

use crate::state::AppState;

/// GET / health check.
pub async fn health_check() -> impl IntoResponse {
    Json(json!({
        "message": "Callbridge media stream server is running"
    }))
}

/// Telephony call webhook. Answers every incoming call with TwiML that
/// connects the call's media stream to this server over WebSocket.
///
/// The stream URL is built from the Host header so the response points back
/// at whatever hostname the telephony provider dialed.
pub async fn incoming_call(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> impl IntoResponse {
    let host = headers
        .get(header::HOST)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
        .unwrap_or_else(|| state.config.address());

    tracing::info!(host, "Incoming call");

    // The empty <Say> gives the media stream a beat to attach before the
    // agent greets the caller.
    let twiml = format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<Response>
    <Say> </Say>
    <Connect>
        <Stream url="wss://{host}/media-stream" />
    </Connect>
</Response>"#
    );

    ([(header::CONTENT_TYPE, "text/xml")], twiml)
}
