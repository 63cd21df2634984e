//! Session state for the chat loop
//!
//! Holds the ordered list of chat turns and the chunks behind the most
//! recent answer. Everything here lives in memory and is dropped when the
//! session ends.

use std::time::{Duration, Instant};

use crate::rag::{Answer, AnswerOutcome, RetrievedChunk};
use crate::types::{ChatRole, ChatTurn};

/// Session manager maintaining chat state
pub struct SessionManager {
    /// Chat turns in the order they happened
    turns: Vec<ChatTurn>,

    /// Chunks retrieved for the last question
    last_sources: Vec<RetrievedChunk>,

    last_outcome: Option<AnswerOutcome>,

    session_start: Instant,
}

impl SessionManager {
    /// Create new session manager
    pub fn new() -> Self {
        SessionManager {
            turns: Vec::new(),
            last_sources: Vec::new(),
            last_outcome: None,
            session_start: Instant::now(),
        }
    }

    /// Append the question and the answer as two turns
    pub fn record_answer(&mut self, answer: &Answer) {
        self.turns.push(ChatTurn::user(answer.question.clone()));
        self.turns.push(ChatTurn::assistant(answer.text.clone()));
        self.last_sources = answer.sources.clone();
        self.last_outcome = Some(answer.outcome);
    }

    /// Append a question the pipeline could not answer at all
    pub fn record_unanswered(&mut self, question: &str) {
        self.turns.push(ChatTurn::user(question.trim().to_string()));
        self.last_sources.clear();
        self.last_outcome = None;
    }

    /// Most recent `limit` turns, oldest first
    pub fn history(&self, limit: usize) -> &[ChatTurn] {
        let start = self.turns.len().saturating_sub(limit);
        &self.turns[start..]
    }

    pub fn turns(&self) -> &[ChatTurn] {
        &self.turns
    }

    pub fn last_sources(&self) -> &[RetrievedChunk] {
        &self.last_sources
    }

    pub fn last_outcome(&self) -> Option<AnswerOutcome> {
        self.last_outcome
    }

    /// Questions asked so far
    pub fn question_count(&self) -> usize {
        self.turns
            .iter()
            .filter(|turn| turn.role == ChatRole::User)
            .count()
    }

    /// Drop all turns and sources
    pub fn reset(&mut self) {
        self.turns.clear();
        self.last_sources.clear();
        self.last_outcome = None;
        self.session_start = Instant::now();
    }

    pub fn session_duration(&self) -> Duration {
        self.session_start.elapsed()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }
}

impl Default for SessionManager {
    fn default() -> Self {
        Self::new()
    }
}
