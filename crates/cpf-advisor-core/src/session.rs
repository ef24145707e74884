//! Per-session conversation history.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

const PREVIEW_CHARS: usize = 100;

/// One answered question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConversationEntry {
    pub question: String,
    pub answer: String,
    pub asked_at: DateTime<Utc>,
}

impl ConversationEntry {
    /// First 100 characters of the question followed by `"..."`.
    pub fn preview(&self) -> String {
        let head: String = self.question.chars().take(PREVIEW_CHARS).collect();
        format!("{head}...")
    }
}

/// Append-only history owned by one interactive session.
#[derive(Debug, Clone, Serialize)]
pub struct Session {
    pub id: Uuid,
    pub started_at: DateTime<Utc>,
    history: Vec<ConversationEntry>,
}

/// A session shared between tasks.
pub type SharedSession = Arc<tokio::sync::Mutex<Session>>;

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl Session {
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            started_at: Utc::now(),
            history: Vec::new(),
        }
    }

    pub fn shared(self) -> SharedSession {
        Arc::new(tokio::sync::Mutex::new(self))
    }

    pub fn record(&mut self, question: impl Into<String>, answer: impl Into<String>) -> &ConversationEntry {
        self.history.push(ConversationEntry {
            question: question.into(),
            answer: answer.into(),
            asked_at: Utc::now(),
        });
        &self.history[self.history.len() - 1]
    }

    /// Entries in the order they were asked.
    pub fn entries(&self) -> &[ConversationEntry] {
        &self.history
    }

    pub fn newest_first(&self) -> impl Iterator<Item = &ConversationEntry> {
        self.history.iter().rev()
    }

    pub fn len(&self) -> usize {
        self.history.len()
    }

    pub fn is_empty(&self) -> bool {
        self.history.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_appends_in_order() {
        let mut session = Session::new();
        session.record("q1", "a1");
        session.record("q2", "a2");

        let questions: Vec<&str> = session.entries().iter().map(|e| e.question.as_str()).collect();
        assert_eq!(questions, vec!["q1", "q2"]);
        let newest: Vec<&str> = session.newest_first().map(|e| e.question.as_str()).collect();
        assert_eq!(newest, vec!["q2", "q1"]);
        assert_eq!(session.len(), 2);
    }

    #[test]
    fn test_preview_truncates_to_100_chars() {
        let mut session = Session::new();
        let long = "h".repeat(150);
        let entry = session.record(long, "a");
        assert_eq!(entry.preview(), format!("{}...", "h".repeat(100)));
    }

    #[test]
    fn test_short_preview_still_gets_marker() {
        let mut session = Session::new();
        assert_eq!(session.record("cpf?", "a").preview(), "cpf?...");
    }

    #[test]
    fn test_sessions_have_distinct_ids() {
        assert_ne!(Session::new().id, Session::new().id);
    }

    #[tokio::test]
    async fn test_shared_session_serializes_appends() {
        let shared = Session::new().shared();
        let mut handles = Vec::new();
        for i in 0..8 {
            let shared = Arc::clone(&shared);
            handles.push(tokio::spawn(async move {
                shared.lock().await.record(format!("q{i}"), "a");
            }));
        }
        for h in handles {
            h.await.unwrap();
        }
        assert_eq!(shared.lock().await.len(), 8);
    }
}
