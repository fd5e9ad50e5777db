//! Per-session conversation state.
//!
//! Each user session owns one of these; no conversation state is shared
//! across sessions. History is bounded so prompt context stays a fixed
//! size regardless of conversation length.

use crate::ai::ChatTurn;
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct ChatSession {
    pub id: Uuid,
    pub connection_id: String,
    history: Vec<ChatTurn>,
    max_turns: usize,
}

impl ChatSession {
    /// Create a session bound to a connection.
    pub fn new(connection_id: impl Into<String>, max_turns: usize) -> Self {
        Self {
            id: Uuid::new_v4(),
            connection_id: connection_id.into(),
            history: Vec::new(),
            max_turns,
        }
    }

    /// Record a completed exchange, evicting the oldest beyond the bound.
    pub fn push_turn(&mut self, user: impl Into<String>, assistant: impl Into<String>) {
        self.history.push(ChatTurn {
            user: user.into(),
            assistant: assistant.into(),
        });
        if self.history.len() > self.max_turns {
            let excess = self.history.len() - self.max_turns;
            self.history.drain(..excess);
        }
    }

    /// Prior turns, oldest first.
    pub fn history(&self) -> &[ChatTurn] {
        &self.history
    }

    /// Drop all conversation history.
    pub fn clear(&mut self) {
        self.history.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_history_is_bounded() {
        let mut session = ChatSession::new("db", 3);
        for i in 0..5 {
            session.push_turn(format!("q{}", i), format!("a{}", i));
        }
        assert_eq!(session.history().len(), 3);
        // Oldest evicted first
        assert_eq!(session.history()[0].user, "q2");
        assert_eq!(session.history()[2].user, "q4");
    }

    #[test]
    fn test_clear() {
        let mut session = ChatSession::new("db", 10);
        session.push_turn("q", "a");
        session.clear();
        assert!(session.history().is_empty());
    }

    #[test]
    fn test_sessions_have_distinct_ids() {
        let a = ChatSession::new("db", 10);
        let b = ChatSession::new("db", 10);
        assert_ne!(a.id, b.id);
    }
}
