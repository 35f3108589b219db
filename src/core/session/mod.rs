//! Per-call session state.
//!
//! A [`CallSession`] bundles everything the relay tracks for one phone call:
//! the external call identifier, the telephony stream identifier (unknown
//! until the platform's `start` event arrives), and the running transcript
//! accumulated from both links.
//!
//! Transcript appends happen only from the per-call orchestrator task, so the
//! session is a single-writer structure; the locks exist to make reads from
//! the teardown path safe without handing out `&mut` access.

use std::fmt;

use parking_lot::{Mutex, RwLock};

mod registry;

pub use registry::SessionRegistry;

/// Speaker label for a transcript entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Speaker {
    /// The human caller
    User,
    /// The AI agent
    Agent,
}

impl fmt::Display for Speaker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Speaker::User => write!(f, "User"),
            Speaker::Agent => write!(f, "Agent"),
        }
    }
}

/// One labeled utterance in a call transcript.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranscriptEntry {
    pub speaker: Speaker,
    pub text: String,
}

/// Append-only ordered transcript. Entries are never removed or mutated once
/// added; order is arrival order across both links.
#[derive(Debug, Default)]
pub struct Transcript {
    entries: Vec<TranscriptEntry>,
}

impl Transcript {
    pub fn append(&mut self, speaker: Speaker, text: impl Into<String>) {
        self.entries.push(TranscriptEntry {
            speaker,
            text: text.into(),
        });
    }

    pub fn entries(&self) -> &[TranscriptEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Render the transcript in the line-per-utterance form handed to the
    /// post-call extractor: `User: ...\nAgent: ...\n`.
    pub fn render(&self) -> String {
        let mut out = String::new();
        for entry in &self.entries {
            out.push_str(&format!("{}: {}\n", entry.speaker, entry.text));
        }
        out
    }
}

/// State for one active call.
pub struct CallSession {
    /// Stable external identifier: the telephony call SID, or a generated
    /// fallback when the upgrade request carried no header.
    call_id: String,
    /// Stream identifier assigned by the telephony platform; unknown until
    /// its `start` event. Required before any audio can be framed back.
    stream_id: RwLock<Option<String>>,
    /// Running transcript; single writer (the orchestrator task).
    transcript: Mutex<Transcript>,
}

impl CallSession {
    pub fn new(call_id: impl Into<String>) -> Self {
        Self {
            call_id: call_id.into(),
            stream_id: RwLock::new(None),
            transcript: Mutex::new(Transcript::default()),
        }
    }

    pub fn call_id(&self) -> &str {
        &self.call_id
    }

    pub fn stream_id(&self) -> Option<String> {
        self.stream_id.read().clone()
    }

    pub fn set_stream_id(&self, stream_id: impl Into<String>) {
        *self.stream_id.write() = Some(stream_id.into());
    }

    pub fn append_transcript(&self, speaker: Speaker, text: impl Into<String>) {
        self.transcript.lock().append(speaker, text);
    }

    pub fn transcript_len(&self) -> usize {
        self.transcript.lock().len()
    }

    pub fn render_transcript(&self) -> String {
        self.transcript.lock().render()
    }
}

impl fmt::Debug for CallSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CallSession")
            .field("call_id", &self.call_id)
            .field("stream_id", &self.stream_id.read())
            .field("transcript_len", &self.transcript.lock().len())
            .finish()
    }
}
