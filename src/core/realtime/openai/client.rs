//! OpenAI Realtime API client.
//!
//! Owns one WebSocket connection per call. The socket is split on connect:
//! outgoing events go through an mpsc channel into a spawned task that owns
//! the sink, incoming events are parsed in the same task and dispatched to
//! the registered callbacks.
//!
//! Audio appended before the session configuration has been handed to the
//! socket writer is queued, then flushed in arrival order right after the
//! `session.update`. The provider therefore never sees audio ahead of its
//! configuration.

use std::sync::Arc;

use futures_util::{SinkExt, StreamExt};
use parking_lot::{Mutex, RwLock};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;

use super::messages::{ClientEvent, InputAudioTranscription, ServerEvent, SessionConfig, TurnDetection};
use crate::core::realtime::base::{
    AudioDeltaCallback, ClosedCallback, LinkError, LinkErrorCallback, LinkResult, LinkState,
    RealtimeConfig, TranscriptCallback, TranscriptFragment,
};
use crate::core::session::Speaker;

/// Channel capacity for WebSocket message sending.
const WS_CHANNEL_CAPACITY: usize = 256;

/// Callbacks handed to the connection task. All optional; an unregistered
/// callback means the event is logged and dropped.
#[derive(Clone, Default)]
struct LinkCallbacks {
    transcript: Option<TranscriptCallback>,
    audio: Option<AudioDeltaCallback>,
    error: Option<LinkErrorCallback>,
    closed: Option<ClosedCallback>,
}

/// OpenAI Realtime API client.
///
/// One instance per telephony call. Register callbacks before `connect`;
/// they are cloned into the connection task at connect time.
pub struct OpenAIRealtime {
    /// Configuration
    config: RealtimeConfig,
    /// Connection state, shared with the connection task
    state: Arc<RwLock<LinkState>>,
    /// WebSocket sender channel, cleared when the connection task ends
    ws_sender: Arc<Mutex<Option<mpsc::Sender<ClientEvent>>>>,
    /// Audio frames accepted before the session configuration was sent
    pending_audio: Mutex<Vec<ClientEvent>>,
    /// Callbacks, registered before connect
    callbacks: LinkCallbacks,
    /// Connection task handle
    reader_handle: Option<JoinHandle<()>>,
}

impl OpenAIRealtime {
    /// Create a new client. The API key must be non-empty.
    pub fn new(config: RealtimeConfig) -> LinkResult<Self> {
        if config.api_key.is_empty() {
            return Err(LinkError::AuthenticationFailed(
                "API key is required".to_string(),
            ));
        }

        Ok(Self {
            config,
            state: Arc::new(RwLock::new(LinkState::Connecting)),
            ws_sender: Arc::new(Mutex::new(None)),
            pending_audio: Mutex::new(Vec::new()),
            callbacks: LinkCallbacks::default(),
            reader_handle: None,
        })
    }

    /// Current connection state.
    pub fn state(&self) -> LinkState {
        *self.state.read()
    }

    /// Register the transcript callback. Must be called before `connect`.
    pub fn on_transcript(&mut self, callback: TranscriptCallback) {
        self.callbacks.transcript = Some(callback);
    }

    /// Register the audio delta callback. Must be called before `connect`.
    pub fn on_audio(&mut self, callback: AudioDeltaCallback) {
        self.callbacks.audio = Some(callback);
    }

    /// Register the link error callback. Must be called before `connect`.
    pub fn on_error(&mut self, callback: LinkErrorCallback) {
        self.callbacks.error = Some(callback);
    }

    /// Register the closed callback. Must be called before `connect`.
    pub fn on_closed(&mut self, callback: ClosedCallback) {
        self.callbacks.closed = Some(callback);
    }

    /// Build the session configuration for the initial `session.update`.
    fn build_session_config(&self) -> SessionConfig {
        SessionConfig {
            modalities: vec!["text".to_string(), "audio".to_string()],
            instructions: self.config.instructions.clone(),
            voice: self.config.voice.clone(),
            input_audio_format: self.config.input_audio_format.clone(),
            output_audio_format: self.config.output_audio_format.clone(),
            input_audio_transcription: InputAudioTranscription {
                model: self.config.transcription_model.clone(),
            },
            turn_detection: TurnDetection::ServerVad {},
            temperature: self.config.temperature,
        }
    }

    /// Connect, authenticate, and send the session configuration.
    ///
    /// On return the link is `Configured` (or `Streaming`, if audio had been
    /// queued while connecting): the `session.update` has been handed to the
    /// socket writer ahead of any audio.
    pub async fn connect(&mut self) -> LinkResult<()> {
        if *self.state.read() == LinkState::Closed {
            return Err(LinkError::Closed);
        }

        let mut request = self
            .config
            .realtime_url
            .clone()
            .into_client_request()
            .map_err(|e| LinkError::ConnectionFailed(e.to_string()))?;
        request.headers_mut().insert(
            "Authorization",
            format!("Bearer {}", self.config.api_key)
                .parse()
                .map_err(|_| {
                    LinkError::AuthenticationFailed("API key is not a valid header value".to_string())
                })?,
        );
        request.headers_mut().insert(
            "OpenAI-Beta",
            "realtime=v1"
                .parse()
                .map_err(|_| LinkError::ConnectionFailed("invalid header value".to_string()))?,
        );

        let (ws_stream, _response) = tokio_tungstenite::connect_async(request)
            .await
            .map_err(|e| LinkError::ConnectionFailed(e.to_string()))?;

        tracing::info!("Connected to OpenAI Realtime API");
        *self.state.write() = LinkState::Open;

        let (mut ws_sink, mut ws_stream) = ws_stream.split();

        let (tx, mut rx) = mpsc::channel::<ClientEvent>(WS_CHANNEL_CAPACITY);
        *self.ws_sender.lock() = Some(tx.clone());

        let callbacks = self.callbacks.clone();
        let state = self.state.clone();
        let ws_sender = self.ws_sender.clone();

        let handle = tokio::spawn(async move {
            loop {
                tokio::select! {
                    event = rx.recv() => {
                        let Some(event) = event else {
                            // Every sender is gone: say goodbye to the peer
                            // instead of just dropping the socket.
                            if let Err(e) = ws_sink.send(Message::Close(None)).await {
                                tracing::debug!("Failed to send close frame: {}", e);
                            }
                            break;
                        };

                        let json = match serde_json::to_string(&event) {
                            Ok(j) => j,
                            Err(e) => {
                                tracing::error!("Failed to serialize event: {}", e);
                                continue;
                            }
                        };

                        if let Err(e) = ws_sink.send(Message::Text(json.into())).await {
                            tracing::error!("Failed to send WebSocket message: {}", e);
                            break;
                        }
                    }

                    msg = ws_stream.next() => {
                        let Some(msg) = msg else {
                            tracing::info!("WebSocket stream ended");
                            break;
                        };
                        match msg {
                            Ok(Message::Text(text)) => {
                                match serde_json::from_str::<ServerEvent>(&text) {
                                    Ok(event) => {
                                        Self::handle_server_event(event, &callbacks).await;
                                    }
                                    Err(e) => {
                                        tracing::warn!("Failed to parse server event: {} - {}", e, text);
                                    }
                                }
                            }
                            Ok(Message::Close(_)) => {
                                tracing::info!("WebSocket closed by server");
                                break;
                            }
                            Ok(Message::Ping(data)) => {
                                if let Err(e) = ws_sink.send(Message::Pong(data)).await {
                                    tracing::error!("Failed to send pong: {}", e);
                                }
                            }
                            Err(e) => {
                                tracing::error!("WebSocket error: {}", e);
                                if let Some(cb) = callbacks.error.as_ref() {
                                    cb(LinkError::WebSocket(e.to_string())).await;
                                }
                                break;
                            }
                            _ => {}
                        }
                    }
                }
            }

            *state.write() = LinkState::Closed;
            *ws_sender.lock() = None;
            if let Some(cb) = callbacks.closed.as_ref() {
                cb().await;
            }
            tracing::info!("OpenAI Realtime connection task ended");
        });
        self.reader_handle = Some(handle);

        // The configuration goes into the writer queue first; queued audio
        // only ever follows it.
        let session = self.build_session_config();
        tx.send(ClientEvent::SessionUpdate { session })
            .await
            .map_err(|_| LinkError::Closed)?;
        self.advance_state(LinkState::Open, LinkState::Configured);

        let pending = std::mem::take(&mut *self.pending_audio.lock());
        if !pending.is_empty() {
            tracing::debug!("Flushing {} queued audio frames", pending.len());
            for frame in pending {
                tx.send(frame).await.map_err(|_| LinkError::Closed)?;
            }
            self.advance_state(LinkState::Configured, LinkState::Streaming);
        }

        Ok(())
    }

    /// Advance the state only if it still matches `from`. A concurrent close
    /// wins over any forward transition.
    fn advance_state(&self, from: LinkState, to: LinkState) {
        let mut state = self.state.write();
        if *state == from {
            *state = to;
        }
    }

    /// Forward an audio append to the provider.
    ///
    /// Before the link is configured the frame is queued; once configured it
    /// goes straight into the writer queue. A closed link rejects the frame.
    pub async fn send_audio(&self, frame: ClientEvent) -> LinkResult<()> {
        let state = *self.state.read();
        match state {
            LinkState::Closed => Err(LinkError::Closed),
            LinkState::Connecting | LinkState::Open => {
                self.pending_audio.lock().push(frame);
                Ok(())
            }
            LinkState::Configured | LinkState::Streaming => {
                let sender = self.ws_sender.lock().clone();
                match sender {
                    Some(tx) => {
                        tx.send(frame).await.map_err(|_| LinkError::Closed)?;
                        self.advance_state(LinkState::Configured, LinkState::Streaming);
                        Ok(())
                    }
                    None => Err(LinkError::Closed),
                }
            }
        }
    }

    /// Close the link. Safe to call more than once.
    ///
    /// Dropping the writer channel makes the connection task send a Close
    /// frame and wind itself down; the task handle is only aborted as a
    /// last resort when the client is dropped.
    pub fn close(&mut self) {
        if *self.state.read() == LinkState::Closed {
            return;
        }

        *self.ws_sender.lock() = None;
        *self.state.write() = LinkState::Closed;

        tracing::info!("Disconnected from OpenAI Realtime API");
    }

    /// Dispatch one server event to the registered callbacks.
    ///
    /// Provider errors are surfaced through the error callback and never
    /// close the link from this side.
    async fn handle_server_event(event: ServerEvent, callbacks: &LinkCallbacks) {
        match event {
            ServerEvent::SessionCreated { session } => {
                tracing::info!("OpenAI Realtime session created: {}", session.id);
            }

            ServerEvent::SessionUpdated { session } => {
                tracing::debug!("OpenAI Realtime session updated: {}", session.id);
            }

            ServerEvent::Error { error } => {
                tracing::error!(
                    "OpenAI Realtime error: {} - {}",
                    error.error_type,
                    error.message
                );
                if let Some(cb) = callbacks.error.as_ref() {
                    cb(LinkError::Provider(format!(
                        "{}: {}",
                        error.error_type, error.message
                    )))
                    .await;
                }
            }

            ServerEvent::TranscriptionCompleted { transcript, .. } => {
                let text = transcript.trim().to_string();
                tracing::debug!("User transcript: {}", text);
                if let Some(cb) = callbacks.transcript.as_ref() {
                    cb(TranscriptFragment {
                        speaker: Speaker::User,
                        text,
                    })
                    .await;
                }
            }

            ServerEvent::AudioDelta { delta, .. } => {
                // Base64 payload forwarded untouched.
                if let Some(cb) = callbacks.audio.as_ref() {
                    cb(delta).await;
                }
            }

            ServerEvent::ResponseDone { response } => {
                let text = response.agent_transcript();
                tracing::debug!("Agent transcript: {}", text);
                if let Some(cb) = callbacks.transcript.as_ref() {
                    cb(TranscriptFragment {
                        speaker: Speaker::Agent,
                        text,
                    })
                    .await;
                }
            }

            ServerEvent::Unknown => {
                tracing::trace!("Unhandled server event");
            }
        }
    }
}

impl Drop for OpenAIRealtime {
    fn drop(&mut self) {
        // After close() the task is already winding down and will send the
        // Close frame on its own; aborting here would race it away. Only a
        // client dropped without close() gets its task torn down hard.
        let close_signaled = self.ws_sender.lock().is_none();
        if let Some(handle) = self.reader_handle.take() {
            if !close_signaled {
                handle.abort();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::telephony::to_provider_frame;

    fn test_config() -> RealtimeConfig {
        RealtimeConfig {
            api_key: "test_key".to_string(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_creation() {
        let client = OpenAIRealtime::new(test_config()).unwrap();
        assert_eq!(client.state(), LinkState::Connecting);
    }

    #[tokio::test]
    async fn test_api_key_required() {
        let config = RealtimeConfig {
            api_key: String::new(),
            ..Default::default()
        };
        match OpenAIRealtime::new(config) {
            Err(LinkError::AuthenticationFailed(_)) => {}
            _ => panic!("Expected AuthenticationFailed error"),
        }
    }

    #[tokio::test]
    async fn test_audio_before_configure_is_queued_not_sent() {
        let client = OpenAIRealtime::new(test_config()).unwrap();

        client.send_audio(to_provider_frame("dGVzdA==")).await.unwrap();
        client.send_audio(to_provider_frame("bW9yZQ==")).await.unwrap();

        assert_eq!(client.state(), LinkState::Connecting);
        assert_eq!(client.pending_audio.lock().len(), 2);
    }

    #[tokio::test]
    async fn test_closed_link_rejects_audio() {
        let mut client = OpenAIRealtime::new(test_config()).unwrap();
        client.close();
        assert_eq!(client.state(), LinkState::Closed);

        let result = client.send_audio(to_provider_frame("dGVzdA==")).await;
        match result {
            Err(LinkError::Closed) => {}
            _ => panic!("Expected Closed error"),
        }
    }

    #[tokio::test]
    async fn test_close_is_idempotent() {
        let mut client = OpenAIRealtime::new(test_config()).unwrap();
        client.close();
        client.close();
        assert_eq!(client.state(), LinkState::Closed);
    }

    #[tokio::test]
    async fn test_connect_after_close_is_rejected() {
        let mut client = OpenAIRealtime::new(test_config()).unwrap();
        client.close();
        match client.connect().await {
            Err(LinkError::Closed) => {}
            _ => panic!("Expected Closed error"),
        }
    }

    #[tokio::test]
    async fn test_close_sends_close_frame_to_peer() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let server = tokio::spawn(async move {
            let (stream, _) = listener.accept().await.unwrap();
            let mut ws = tokio_tungstenite::accept_async(stream).await.unwrap();
            loop {
                match ws.next().await {
                    Some(Ok(Message::Close(_))) => return true,
                    Some(Ok(_)) => continue,
                    _ => return false,
                }
            }
        });

        let config = RealtimeConfig {
            api_key: "test_key".to_string(),
            realtime_url: format!("ws://{addr}"),
            ..Default::default()
        };
        let mut client = OpenAIRealtime::new(config).unwrap();
        client.connect().await.unwrap();
        client.close();
        assert_eq!(client.state(), LinkState::Closed);

        let got_close = tokio::time::timeout(std::time::Duration::from_secs(5), server)
            .await
            .expect("peer never saw a close frame")
            .unwrap();
        assert!(got_close, "peer socket ended without a close frame");
    }

    #[tokio::test]
    async fn test_state_advance_never_overwrites_closed() {
        let client = OpenAIRealtime::new(test_config()).unwrap();
        *client.state.write() = LinkState::Closed;

        // A forward transition racing a close must lose
        client.advance_state(LinkState::Configured, LinkState::Streaming);
        assert_eq!(client.state(), LinkState::Closed);
    }
}
