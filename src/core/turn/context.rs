//! Per-session conversation context and the in-process store holding it.

use dashmap::DashMap;
use tracing::debug;

use crate::core::assistant::{ConversationState, DialogResult, MicrophoneMode};

/// What one skill session carries from turn to turn.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConversationContext {
    pub conversation_state: ConversationState,
    pub microphone_mode: MicrophoneMode,
}

impl ConversationContext {
    pub fn is_microphone_open(&self) -> bool {
        self.microphone_mode.is_open()
    }

    /// Folds a backend result into the context. A result without a new
    /// state keeps the previous one; a result without a microphone mode
    /// closes the microphone.
    pub fn apply(&mut self, result: &DialogResult) {
        if let Some(state) = &result.conversation_state {
            if !state.is_empty() {
                self.conversation_state = state.clone();
            }
        }
        self.microphone_mode = result.microphone_mode.unwrap_or_default();
    }
}

/// Contexts keyed by skill session id.
#[derive(Debug, Default)]
pub struct SessionStore {
    sessions: DashMap<String, ConversationContext>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Context for `session_id`, empty if the session is new.
    pub fn get(&self, session_id: &str) -> ConversationContext {
        self.sessions
            .get(session_id)
            .map(|entry| entry.value().clone())
            .unwrap_or_default()
    }

    pub fn put(&self, session_id: &str, context: ConversationContext) {
        debug!(
            session_id = %session_id,
            state_len = context.conversation_state.len(),
            microphone_open = context.is_microphone_open(),
            "Storing conversation context"
        );
        self.sessions.insert(session_id.to_string(), context);
    }

    pub fn remove(&self, session_id: &str) -> Option<ConversationContext> {
        self.sessions.remove(session_id).map(|(_, context)| context)
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;

    #[test]
    fn test_apply_keeps_state_when_absent() {
        let mut ctx = ConversationContext {
            conversation_state: ConversationState::new(Bytes::from_static(b"one")),
            microphone_mode: MicrophoneMode::Open,
        };
        ctx.apply(&DialogResult::default());
        assert_eq!(ctx.conversation_state.as_bytes().as_ref(), b"one");
        assert_eq!(ctx.microphone_mode, MicrophoneMode::Closed);

        ctx.apply(&DialogResult {
            conversation_state: Some(ConversationState::new(Bytes::from_static(b"two"))),
            microphone_mode: Some(MicrophoneMode::Open),
            ..Default::default()
        });
        assert_eq!(ctx.conversation_state.as_bytes().as_ref(), b"two");
        assert!(ctx.is_microphone_open());
    }

    #[test]
    fn test_store_isolates_sessions() {
        let store = SessionStore::new();
        assert_eq!(store.get("a"), ConversationContext::default());

        store.put(
            "a",
            ConversationContext {
                microphone_mode: MicrophoneMode::Open,
                ..Default::default()
            },
        );
        assert!(store.get("a").is_microphone_open());
        assert!(!store.get("b").is_microphone_open());
        assert_eq!(store.len(), 1);

        assert!(store.remove("a").is_some());
        assert!(store.is_empty());
    }
}
