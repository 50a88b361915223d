use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use registrar_core::dialogue::state::ConversationState;

/// Keyed storage for per-session conversation state, injected into front
/// ends. Callers must serialize access to a given session id: two
/// simultaneous turns against the same id will race on get/put.
#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn get(&self, session_id: &str) -> Option<ConversationState>;
    async fn put(&self, session_id: &str, state: ConversationState);
    /// Returns true iff the session existed.
    async fn remove(&self, session_id: &str) -> bool;
}

#[derive(Default)]
pub struct InMemorySessionStore {
    sessions: RwLock<HashMap<String, ConversationState>>,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn get(&self, session_id: &str) -> Option<ConversationState> {
        let sessions = self.sessions.read().await;
        sessions.get(session_id).cloned()
    }

    async fn put(&self, session_id: &str, state: ConversationState) {
        let mut sessions = self.sessions.write().await;
        sessions.insert(session_id.to_string(), state);
    }

    async fn remove(&self, session_id: &str) -> bool {
        let mut sessions = self.sessions.write().await;
        sessions.remove(session_id).is_some()
    }
}
