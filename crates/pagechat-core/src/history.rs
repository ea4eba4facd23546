//! Chat history for the current page

use serde::Serialize;
use std::time::{SystemTime, UNIX_EPOCH};

/// A single question and the reply it got
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChatTurn {
    pub question: String,
    pub answer: String,
    pub timestamp: u64,
}

/// Append-only list of chat turns. Lives in memory only and is cleared
/// whenever a new page replaces the current one.
#[derive(Debug, Default, Clone)]
pub struct ChatHistory {
    turns: Vec<ChatTurn>,
}

impl ChatHistory {
    /// Create a new empty history
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a question and its answer
    pub fn push(&mut self, question: &str, answer: &str) {
        self.turns.push(ChatTurn {
            question: question.to_string(),
            answer: answer.to_string(),
            timestamp: SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .map(|d| d.as_secs())
                .unwrap_or(0),
        });
    }

    /// All turns, oldest first
    pub fn turns(&self) -> &[ChatTurn] {
        &self.turns
    }

    /// The most recent turns, newest first
    pub fn recent(&self, count: usize) -> Vec<&ChatTurn> {
        self.turns.iter().rev().take(count).collect()
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    /// Turns whose question or answer mentions `query`, case-insensitive
    pub fn search(&self, query: &str) -> Vec<&ChatTurn> {
        let query_lower = query.to_lowercase();
        self.turns
            .iter()
            .filter(|t| {
                t.question.to_lowercase().contains(&query_lower)
                    || t.answer.to_lowercase().contains(&query_lower)
            })
            .collect()
    }

    /// Render the conversation as markdown
    pub fn transcript(&self) -> String {
        self.turns
            .iter()
            .map(|t| format!("**You:** {}\n\n**Assistant:** {}\n\n---", t.question, t.answer))
            .collect::<Vec<_>>()
            .join("\n\n")
    }

    /// Forget every turn
    pub fn clear(&mut self) {
        self.turns.clear();
    }
}
