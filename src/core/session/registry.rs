//! Process-wide session registry.
//!
//! Maps call identifiers to live sessions. Insert-on-first-reference and
//! delete-on-teardown are the only mutations; there is no cross-session data
//! sharing. `remove` returning the session at most once is what makes
//! teardown (and therefore post-call extraction) exactly-once even when the
//! telephony connection closes twice in quick succession.

use std::sync::Arc;

use dashmap::DashMap;

use super::CallSession;

/// Concurrency-safe registry of active call sessions.
#[derive(Debug, Default)]
pub struct SessionRegistry {
    sessions: DashMap<String, Arc<CallSession>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the session for `call_id`, creating it on first reference.
    pub fn insert(&self, call_id: &str) -> Arc<CallSession> {
        self.sessions
            .entry(call_id.to_string())
            .or_insert_with(|| Arc::new(CallSession::new(call_id)))
            .clone()
    }

    /// Remove and return the session for `call_id`. Returns `None` if it was
    /// already removed, so concurrent teardowns race safely.
    pub fn remove(&self, call_id: &str) -> Option<Arc<CallSession>> {
        self.sessions.remove(call_id).map(|(_, session)| session)
    }

    pub fn contains(&self, call_id: &str) -> bool {
        self.sessions.contains_key(call_id)
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}
