//! In-memory, bounded conversation histories keyed by session id

use std::collections::VecDeque;
use std::num::NonZeroUsize;
use std::sync::Mutex;

use lru::LruCache;

use crate::openai::{Message, Role};

/// Maximum number of messages retained per session. Once the limit is
/// reached the oldest message is evicted first.
pub const HISTORY_LIMIT: usize = 10;

/// Keyed store of per-session conversation histories. The store
/// itself is capped to a maximum number of sessions and evicts the
/// least recently used session when full, so memory stays bounded no
/// matter how many distinct session ids callers send.
///
/// Individual operations are serialized by a mutex but two concurrent
/// requests for the same session id can still interleave their
/// appends. Each session is expected to be driven by one logical
/// client at a time.
pub struct SessionStore {
    sessions: Mutex<LruCache<String, VecDeque<Message>>>,
}

impl SessionStore {
    pub fn new(max_sessions: usize) -> Self {
        let cap = NonZeroUsize::new(max_sessions).expect("max_sessions must be non-zero");
        Self {
            sessions: Mutex::new(LruCache::new(cap)),
        }
    }

    /// Get the history for a session, creating an empty one if the
    /// session hasn't been seen before.
    pub fn history(&self, session_id: &str) -> Vec<Message> {
        let mut sessions = self.sessions.lock().expect("Session store lock poisoned");
        let history = sessions.get_or_insert_mut(session_id.to_string(), VecDeque::new);
        history.iter().cloned().collect()
    }

    /// Append a message to a session's history, evicting from the
    /// front until the history is back under the limit.
    pub fn append(&self, session_id: &str, role: Role, content: &str) {
        let mut sessions = self.sessions.lock().expect("Session store lock poisoned");
        let history = sessions.get_or_insert_mut(session_id.to_string(), VecDeque::new);
        history.push_back(Message::new(role, content));
        while history.len() > HISTORY_LIMIT {
            history.pop_front();
        }
    }

    /// Get the history for a session without creating it. Used by the
    /// transcript endpoint so a lookup doesn't materialize sessions.
    pub fn transcript(&self, session_id: &str) -> Option<Vec<Message>> {
        let mut sessions = self.sessions.lock().expect("Session store lock poisoned");
        sessions
            .get(session_id)
            .map(|history| history.iter().cloned().collect())
    }

    /// Session ids currently resident in the store, most recently
    /// used first.
    pub fn session_ids(&self) -> Vec<String> {
        let sessions = self.sessions.lock().expect("Session store lock poisoned");
        sessions.iter().map(|(id, _)| id.clone()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_history_creates_empty_session() {
        let store = SessionStore::new(16);
        assert!(store.history("fresh").is_empty());
    }

    #[test]
    fn test_append_and_get_in_order() {
        let store = SessionStore::new(16);
        store.append("s1", Role::User, "first");
        store.append("s1", Role::User, "second");

        let history = store.history("s1");
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].content, "first");
        assert_eq!(history[1].content, "second");
    }

    #[test]
    fn test_history_truncates_to_most_recent_ten() {
        let store = SessionStore::new(16);
        for i in 0..11 {
            store.append("s1", Role::User, &format!("msg {}", i));
        }

        let history = store.history("s1");
        assert_eq!(history.len(), HISTORY_LIMIT);
        // Oldest entry was evicted, the rest are oldest-first
        assert_eq!(history[0].content, "msg 1");
        assert_eq!(history[9].content, "msg 10");
    }

    #[test]
    fn test_sessions_are_isolated() {
        let store = SessionStore::new(16);
        store.append("s1", Role::User, "for s1");
        store.append("s2", Role::User, "for s2");

        assert_eq!(store.history("s1").len(), 1);
        assert_eq!(store.history("s2").len(), 1);
        assert_eq!(store.history("s1")[0].content, "for s1");
    }

    #[test]
    fn test_least_recently_used_session_is_evicted() {
        let store = SessionStore::new(2);
        store.append("s1", Role::User, "a");
        store.append("s2", Role::User, "b");
        // Touch s1 so s2 becomes the eviction candidate
        store.history("s1");
        store.append("s3", Role::User, "c");

        assert!(store.transcript("s2").is_none());
        assert!(store.transcript("s1").is_some());
        assert!(store.transcript("s3").is_some());
    }

    #[test]
    fn test_transcript_does_not_create_sessions() {
        let store = SessionStore::new(16);
        assert!(store.transcript("never-seen").is_none());
        assert!(store.session_ids().is_empty());
    }
}
