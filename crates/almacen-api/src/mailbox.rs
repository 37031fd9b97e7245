//! Bounded per-session chat mailbox.
//!
//! Queued bot replies are held per session until the client polls for them.
//! The queue is an explicit service owned by the application state — never
//! ambient process state — bounded per session with a drop-oldest policy.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

use tracing::debug;

use almacen_core::{defaults, ChatMessage};

/// Per-session bounded message queues.
#[derive(Clone)]
pub struct Mailbox {
    inner: Arc<Mutex<HashMap<String, VecDeque<ChatMessage>>>>,
    capacity: usize,
}

impl Default for Mailbox {
    fn default() -> Self {
        Self::new()
    }
}

impl Mailbox {
    pub fn new() -> Self {
        Self::with_capacity(defaults::MAILBOX_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            inner: Arc::new(Mutex::new(HashMap::new())),
            capacity,
        }
    }

    /// Queue messages for a session. Returns the number stored. Past the
    /// per-session capacity the oldest messages are dropped.
    pub fn push(&self, session_id: &str, messages: Vec<ChatMessage>) -> usize {
        if session_id.is_empty() || messages.is_empty() {
            return 0;
        }

        let mut inner = self.inner.lock().expect("mailbox lock poisoned");
        let queue = inner.entry(session_id.to_string()).or_default();
        let stored = messages.len();
        for message in messages {
            queue.push_back(message);
            while queue.len() > self.capacity {
                queue.pop_front();
            }
        }

        debug!(
            subsystem = "mailbox",
            op = "push",
            session_id,
            stored,
            queued = queue.len(),
            "Chat messages queued"
        );
        stored
    }

    /// Drain and return all queued messages for a session. The session's
    /// queue is removed; an unknown session yields an empty list.
    pub fn pull(&self, session_id: &str) -> Vec<ChatMessage> {
        if session_id.is_empty() {
            return Vec::new();
        }
        let mut inner = self.inner.lock().expect("mailbox lock poisoned");
        inner
            .remove(session_id)
            .map(|queue| queue.into_iter().collect())
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn msg(content: &str) -> ChatMessage {
        ChatMessage {
            role: "bot".to_string(),
            content: content.to_string(),
            attachments: Vec::new(),
            timestamp: "2026-08-07T00:00:00Z".to_string(),
        }
    }

    #[test]
    fn test_push_then_pull_drains_in_order() {
        let mailbox = Mailbox::new();
        assert_eq!(mailbox.push("s1", vec![msg("a"), msg("b")]), 2);

        let pulled = mailbox.pull("s1");
        assert_eq!(pulled.len(), 2);
        assert_eq!(pulled[0].content, "a");
        assert_eq!(pulled[1].content, "b");

        // Drained: a second pull is empty.
        assert!(mailbox.pull("s1").is_empty());
    }

    #[test]
    fn test_unknown_session_is_empty() {
        let mailbox = Mailbox::new();
        assert!(mailbox.pull("nope").is_empty());
    }

    #[test]
    fn test_sessions_are_independent() {
        let mailbox = Mailbox::new();
        mailbox.push("s1", vec![msg("for s1")]);
        mailbox.push("s2", vec![msg("for s2")]);

        let s2 = mailbox.pull("s2");
        assert_eq!(s2.len(), 1);
        assert_eq!(s2[0].content, "for s2");
        assert_eq!(mailbox.pull("s1").len(), 1);
    }

    #[test]
    fn test_capacity_drops_oldest() {
        let mailbox = Mailbox::with_capacity(3);
        mailbox.push("s1", (0..5).map(|i| msg(&i.to_string())).collect());

        let pulled = mailbox.pull("s1");
        let contents: Vec<&str> = pulled.iter().map(|m| m.content.as_str()).collect();
        assert_eq!(contents, ["2", "3", "4"]);
    }

    #[test]
    fn test_blank_session_and_empty_batch_store_nothing() {
        let mailbox = Mailbox::new();
        assert_eq!(mailbox.push("", vec![msg("x")]), 0);
        assert_eq!(mailbox.push("s1", vec![]), 0);
        assert!(mailbox.pull("s1").is_empty());
    }
}
