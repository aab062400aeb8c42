//! Per-user conversation state between two turns.
//!
//! A session is either idle, waiting for yes/no feedback on an answer it
//! just gave, or waiting for the user to pick one of several candidates.
//! State changes only through the transition methods on [`PendingExchange`].

use crate::store::Candidate;
use std::collections::HashMap;
use std::fmt;

/// Identifies one conversation (a chat, a console, a user).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SessionId(String);

impl SessionId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SessionId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for SessionId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl From<i64> for SessionId {
    fn from(id: i64) -> Self {
        Self(id.to_string())
    }
}

/// What a session is waiting for.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum PendingExchange {
    /// Nothing pending; the next message is a new question.
    #[default]
    Idle,
    /// An answer was sent and the user should confirm or reject it.
    AwaitingFeedback {
        question: String,
        current_answer: String,
    },
    /// A numbered menu of candidates was sent.
    AwaitingClarification {
        question: String,
        candidates: Vec<Candidate>,
    },
}

impl PendingExchange {
    /// Wait for feedback on `answer`.
    pub fn await_feedback(question: impl Into<String>, answer: impl Into<String>) -> Self {
        PendingExchange::AwaitingFeedback {
            question: question.into(),
            current_answer: answer.into(),
        }
    }

    /// Wait for the user to pick among `candidates`.
    pub fn await_clarification(question: impl Into<String>, candidates: Vec<Candidate>) -> Self {
        PendingExchange::AwaitingClarification {
            question: question.into(),
            candidates,
        }
    }

    /// Replace the answer under feedback, keeping the question.
    /// Has no effect unless feedback is awaited.
    pub fn advance(&mut self, next_answer: impl Into<String>) {
        if let PendingExchange::AwaitingFeedback { current_answer, .. } = self {
            *current_answer = next_answer.into();
        }
    }

    /// Pick a clarification option (1-based) and move to awaiting feedback.
    /// Returns the chosen answer, or `None` if the option is invalid or no
    /// menu is open, in which case the state is left as it was.
    pub fn choose(&mut self, option: usize) -> Option<&str> {
        let PendingExchange::AwaitingClarification {
            question,
            candidates,
        } = self
        else {
            return None;
        };

        let chosen = option.checked_sub(1).and_then(|i| candidates.get(i))?;
        *self = PendingExchange::await_feedback(std::mem::take(question), chosen.answer.clone());

        match self {
            PendingExchange::AwaitingFeedback { current_answer, .. } => Some(current_answer),
            _ => None,
        }
    }

    /// Drop whatever was pending.
    pub fn clear(&mut self) {
        *self = PendingExchange::Idle;
    }

    pub fn is_idle(&self) -> bool {
        matches!(self, PendingExchange::Idle)
    }

    pub fn is_awaiting_feedback(&self) -> bool {
        matches!(self, PendingExchange::AwaitingFeedback { .. })
    }

    pub fn is_awaiting_clarification(&self) -> bool {
        matches!(self, PendingExchange::AwaitingClarification { .. })
    }

    /// The question this exchange is about.
    pub fn question(&self) -> Option<&str> {
        match self {
            PendingExchange::Idle => None,
            PendingExchange::AwaitingFeedback { question, .. }
            | PendingExchange::AwaitingClarification { question, .. } => Some(question),
        }
    }

    /// The answer awaiting feedback.
    pub fn current_answer(&self) -> Option<&str> {
        match self {
            PendingExchange::AwaitingFeedback { current_answer, .. } => Some(current_answer),
            _ => None,
        }
    }
}

/// Pending exchanges keyed by session.
#[derive(Debug, Clone, Default)]
pub struct SessionStore {
    sessions: HashMap<SessionId, PendingExchange>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current state; unknown sessions are idle.
    pub fn get(&self, id: &SessionId) -> &PendingExchange {
        const IDLE: &PendingExchange = &PendingExchange::Idle;
        self.sessions.get(id).unwrap_or(IDLE)
    }

    /// Remove and return the session's state, leaving it idle.
    pub fn take(&mut self, id: &SessionId) -> PendingExchange {
        self.sessions.remove(id).unwrap_or_default()
    }

    /// Store a state. Idle states are not kept.
    pub fn set(&mut self, id: SessionId, exchange: PendingExchange) {
        if exchange.is_idle() {
            self.sessions.remove(&id);
        } else {
            self.sessions.insert(id, exchange);
        }
    }

    pub fn clear(&mut self, id: &SessionId) {
        self.sessions.remove(id);
    }

    /// Number of sessions with something pending.
    pub fn active_count(&self) -> usize {
        self.sessions.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn menu() -> PendingExchange {
        PendingExchange::await_clarification(
            "сколько стоит",
            vec![
                Candidate::new("Стоимость 100р", None),
                Candidate::new("Доставка 200р", Some("доставка".into())),
            ],
        )
    }

    #[test]
    fn test_default_is_idle() {
        let store = SessionStore::new();
        assert!(store.get(&SessionId::from("u1")).is_idle());
    }

    #[test]
    fn test_choose_moves_to_feedback() {
        let mut exchange = menu();
        assert_eq!(exchange.choose(2), Some("Доставка 200р"));
        assert_eq!(
            exchange,
            PendingExchange::await_feedback("сколько стоит", "Доставка 200р")
        );
    }

    #[test]
    fn test_choose_invalid_keeps_menu() {
        let mut exchange = menu();
        assert_eq!(exchange.choose(0), None);
        assert_eq!(exchange.choose(3), None);
        assert!(exchange.is_awaiting_clarification());

        let mut idle = PendingExchange::Idle;
        assert_eq!(idle.choose(1), None);
    }

    #[test]
    fn test_advance_only_in_feedback() {
        let mut exchange = PendingExchange::await_feedback("q", "a");
        exchange.advance("b");
        assert_eq!(exchange.current_answer(), Some("b"));
        assert_eq!(exchange.question(), Some("q"));

        let mut idle = PendingExchange::Idle;
        idle.advance("b");
        assert!(idle.is_idle());
    }

    #[test]
    fn test_sessions_are_independent() {
        let mut store = SessionStore::new();
        let alice = SessionId::from("alice");
        let bob = SessionId::from(42_i64);

        store.set(alice.clone(), PendingExchange::await_feedback("q", "a"));
        assert!(store.get(&alice).is_awaiting_feedback());
        assert!(store.get(&bob).is_idle());

        store.set(alice.clone(), PendingExchange::Idle);
        assert_eq!(store.active_count(), 0);

        store.set(bob.clone(), menu());
        let taken = store.take(&bob);
        assert!(taken.is_awaiting_clarification());
        assert!(store.get(&bob).is_idle());
    }
}
