//! Per-call orchestrator.
//!
//! One task per telephony WebSocket. It registers the call session, opens
//! the provider link, and relays frames both ways until either side hangs
//! up. Provider-side failures degrade the call (audio stops, telephony side
//! stays up); only telephony close or stop tears the call down.
//!
//! Teardown is gated on removing the session from the registry. The remove
//! succeeds exactly once, so extraction and webhook dispatch run exactly
//! once per call no matter how the call ended.

use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::http::HeaderMap;
use axum::response::Response;
use futures_util::stream::SplitSink;
use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;

use crate::core::realtime::{
    LinkError, OpenAIRealtime, RealtimeConfig, TranscriptFragment,
};
use crate::core::session::CallSession;
use crate::core::telephony::{to_provider_frame, to_telephony_frame, TelephonyInEvent};
use crate::state::AppState;

/// Capacity of the per-call mailbox carrying provider events into the
/// orchestrator loop.
const MAILBOX_CAPACITY: usize = 1024;

/// Provider events routed into the orchestrator loop.
enum SessionRoute {
    /// Audio delta to forward to the telephony side (base64)
    Audio(String),
    /// Completed transcript fragment to record
    Transcript(TranscriptFragment),
    /// Link error; the call continues degraded
    LinkError(LinkError),
    /// The link closed (peer close or transport failure)
    LinkClosed,
}

/// GET /media-stream WebSocket upgrade.
///
/// The call id comes from the `x-twilio-call-sid` header when the telephony
/// provider forwards it, otherwise a generated session id is used.
pub async fn media_stream_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Response {
    let call_id = headers
        .get("x-twilio-call-sid")
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
        .unwrap_or_else(|| format!("session-{}", uuid::Uuid::new_v4()));

    tracing::info!(call_id, "Telephony client connected");

    ws.on_upgrade(move |socket| handle_media_socket(socket, state, call_id))
}

async fn handle_media_socket(socket: WebSocket, state: Arc<AppState>, call_id: String) {
    let session = state.sessions.insert(&call_id);

    let (mut ws_sender, mut ws_receiver) = socket.split();
    let (mailbox_tx, mut mailbox_rx) = mpsc::channel::<SessionRoute>(MAILBOX_CAPACITY);

    let mut link = connect_provider_link(&state, &call_id, &mailbox_tx).await;
    drop(mailbox_tx);

    loop {
        tokio::select! {
            msg = ws_receiver.next() => {
                match msg {
                    Some(Ok(Message::Text(text))) => {
                        match TelephonyInEvent::decode(&text) {
                            Ok(event) => {
                                if process_telephony_event(event, &session, &call_id, link.as_ref())
                                    .await
                                {
                                    break;
                                }
                            }
                            Err(e) => {
                                tracing::warn!(call_id, "Dropping malformed telephony frame: {}", e);
                            }
                        }
                    }
                    Some(Ok(Message::Close(_))) | None => {
                        tracing::info!(call_id, "Telephony client disconnected");
                        break;
                    }
                    Some(Err(e)) => {
                        tracing::warn!(call_id, "Telephony WebSocket error: {}", e);
                        break;
                    }
                    _ => {}
                }
            }

            Some(route) = mailbox_rx.recv() => {
                match route {
                    SessionRoute::Audio(delta) => {
                        process_audio_delta(delta, &session, &call_id, &mut ws_sender).await;
                    }
                    SessionRoute::Transcript(fragment) => {
                        session.append_transcript(fragment.speaker, fragment.text);
                    }
                    SessionRoute::LinkError(e) => {
                        tracing::warn!(call_id, "Provider link error, call continues: {}", e);
                    }
                    SessionRoute::LinkClosed => {
                        tracing::warn!(call_id, "Provider link closed, call continues without audio");
                    }
                }
            }
        }
    }

    if let Some(mut link) = link.take() {
        link.close();
    }

    // The remove yields the session at most once, so the post-call pipeline
    // cannot run twice for the same call.
    if let Some(session) = state.sessions.remove(&call_id) {
        finalize_call(state, call_id, session);
    }
}

/// Open the provider link with callbacks routed into the mailbox. A link
/// that cannot be created or connected leaves the call degraded rather than
/// dropping it.
async fn connect_provider_link(
    state: &Arc<AppState>,
    call_id: &str,
    mailbox_tx: &mpsc::Sender<SessionRoute>,
) -> Option<OpenAIRealtime> {
    let config = RealtimeConfig {
        api_key: state.config.openai_api_key.clone(),
        realtime_url: state.config.openai_realtime_url.clone(),
        voice: state.config.voice.clone(),
        instructions: state.config.system_instructions.clone(),
        ..Default::default()
    };

    let mut link = match OpenAIRealtime::new(config) {
        Ok(link) => link,
        Err(e) => {
            tracing::error!(call_id, "Provider link unavailable, call continues: {}", e);
            return None;
        }
    };

    let tx = mailbox_tx.clone();
    link.on_audio(Arc::new(move |delta| {
        let tx = tx.clone();
        Box::pin(async move {
            if tx.send(SessionRoute::Audio(delta)).await.is_err() {
                tracing::warn!("Session mailbox closed, dropping audio delta");
            }
        })
    }));

    let tx = mailbox_tx.clone();
    link.on_transcript(Arc::new(move |fragment| {
        let tx = tx.clone();
        Box::pin(async move {
            let _ = tx.send(SessionRoute::Transcript(fragment)).await;
        })
    }));

    let tx = mailbox_tx.clone();
    link.on_error(Arc::new(move |error| {
        let tx = tx.clone();
        Box::pin(async move {
            let _ = tx.send(SessionRoute::LinkError(error)).await;
        })
    }));

    let tx = mailbox_tx.clone();
    link.on_closed(Arc::new(move || {
        let tx = tx.clone();
        Box::pin(async move {
            let _ = tx.send(SessionRoute::LinkClosed).await;
        })
    }));

    if let Err(e) = link.connect().await {
        tracing::error!(call_id, "Provider connect failed, call continues: {}", e);
        link.close();
    }

    Some(link)
}

/// Handle one decoded telephony event. Returns true when the call is over.
async fn process_telephony_event(
    event: TelephonyInEvent,
    session: &Arc<CallSession>,
    call_id: &str,
    link: Option<&OpenAIRealtime>,
) -> bool {
    match event {
        TelephonyInEvent::Start { start } => {
            tracing::info!(call_id, stream_sid = %start.stream_sid, "Media stream started");
            session.set_stream_id(start.stream_sid);
            false
        }
        TelephonyInEvent::Media { media } => {
            if let Some(link) = link {
                if let Err(e) = link.send_audio(to_provider_frame(&media.payload)).await {
                    tracing::warn!(call_id, "Dropping caller audio frame: {}", e);
                }
            }
            false
        }
        TelephonyInEvent::Stop => {
            tracing::info!(call_id, "Media stream stopped");
            true
        }
        TelephonyInEvent::Unknown => false,
    }
}

/// Forward one provider audio delta to the telephony side. Deltas arriving
/// before the stream start are dropped, there is no stream to address yet.
async fn process_audio_delta(
    delta: String,
    session: &Arc<CallSession>,
    call_id: &str,
    ws_sender: &mut SplitSink<WebSocket, Message>,
) {
    let Some(stream_sid) = session.stream_id() else {
        tracing::warn!(call_id, "Dropping agent audio, media stream not started");
        return;
    };

    let frame = to_telephony_frame(&delta, &stream_sid);
    match serde_json::to_string(&frame) {
        Ok(json) => {
            if ws_sender.send(Message::Text(json.into())).await.is_err() {
                tracing::warn!(call_id, "Failed to send agent audio to telephony side");
            }
        }
        Err(e) => {
            tracing::error!(call_id, "Failed to serialize telephony frame: {}", e);
        }
    }
}

/// Run the post-call pipeline off the call path: render the transcript,
/// extract the customer record, hand it to the dispatcher. Every failure is
/// logged and swallowed.
fn finalize_call(state: Arc<AppState>, call_id: String, session: Arc<CallSession>) {
    let transcript = session.render_transcript();
    tracing::info!(
        call_id,
        entries = session.transcript_len(),
        "Call ended, running extraction"
    );

    tokio::spawn(async move {
        match state.extractor.extract(&transcript).await {
            Ok(record) => {
                tracing::info!(call_id, ?record, "Extracted customer details");
                if let Err(e) = state.dispatcher.dispatch(&call_id, &record).await {
                    tracing::error!(call_id, "Webhook dispatch failed: {}", e);
                }
            }
            Err(e) => {
                tracing::error!(call_id, "Extraction failed: {}", e);
            }
        }
    });
}
