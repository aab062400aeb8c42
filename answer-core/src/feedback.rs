//! Yes/no feedback on a delivered answer.
//!
//! Accepting memorizes the answer for the question. Rejecting records the
//! answer as rejected and moves on to the next stored answer that has not
//! been rejected yet, until none are left.

use crate::memory::AnswerMemory;
use crate::resolver::{NextCandidate, Resolver};
use crate::session::PendingExchange;

/// A parsed feedback message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedbackSignal {
    Accept,
    Reject,
    Unrecognized,
}

/// Words that count as accepting or rejecting an answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedbackVocabulary {
    accept: Vec<String>,
    reject: Vec<String>,
}

impl FeedbackVocabulary {
    pub fn new<A, R, S>(accept: A, reject: R) -> Self
    where
        A: IntoIterator<Item = S>,
        R: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            accept: accept.into_iter().map(|w| w.as_ref().to_lowercase()).collect(),
            reject: reject.into_iter().map(|w| w.as_ref().to_lowercase()).collect(),
        }
    }

    /// Classify a message, ignoring case and surrounding whitespace.
    pub fn parse(&self, text: &str) -> FeedbackSignal {
        let text = text.trim().to_lowercase();
        if self.accept.contains(&text) {
            FeedbackSignal::Accept
        } else if self.reject.contains(&text) {
            FeedbackSignal::Reject
        } else {
            FeedbackSignal::Unrecognized
        }
    }
}

impl Default for FeedbackVocabulary {
    fn default() -> Self {
        Self::new(["да"], ["нет"])
    }
}

/// What happened to a pending exchange after a feedback message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeedbackOutcome {
    /// The answer was memorized for the question.
    Accepted { answer: String },
    /// The pending answer was the "no answer found" text, which is never
    /// memorized. Nothing was written.
    SentinelRefused,
    /// The answer was rejected; here is the next one to try.
    NextCandidate { answer: String },
    /// The answer was rejected and nothing else is left.
    Exhausted,
    /// The message was neither yes nor no; ask again.
    Reprompt,
}

impl FeedbackOutcome {
    /// Whether the exchange is over.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            FeedbackOutcome::Accepted { .. }
                | FeedbackOutcome::SentinelRefused
                | FeedbackOutcome::Exhausted
        )
    }
}

/// Applies feedback messages to pending exchanges.
#[derive(Debug, Clone)]
pub struct FeedbackProcessor {
    vocabulary: FeedbackVocabulary,
    sentinel: String,
}

impl FeedbackProcessor {
    /// `sentinel` is the user-facing "no answer found" text.
    pub fn new(vocabulary: FeedbackVocabulary, sentinel: impl Into<String>) -> Self {
        Self {
            vocabulary,
            sentinel: sentinel.into(),
        }
    }

    pub fn vocabulary(&self) -> &FeedbackVocabulary {
        &self.vocabulary
    }

    /// Process one feedback message and transition the exchange.
    ///
    /// Returns `None` if the exchange is not awaiting feedback. Persistence
    /// failures are logged; the in-memory answer memory is still updated.
    pub fn process(
        &self,
        exchange: &mut PendingExchange,
        input: &str,
        resolver: &Resolver,
        memory: &mut AnswerMemory,
    ) -> Option<FeedbackOutcome> {
        let (question, current_answer) = match exchange {
            PendingExchange::AwaitingFeedback {
                question,
                current_answer,
            } => (question.clone(), current_answer.clone()),
            _ => return None,
        };

        // Checked before the signal: the sentinel never enters memory.
        if current_answer == self.sentinel {
            tracing::info!(%question, "refusing feedback on the no-answer message");
            exchange.clear();
            return Some(FeedbackOutcome::SentinelRefused);
        }

        let key = resolver.normalizer().normalize(&question);

        let outcome = match self.vocabulary.parse(input) {
            FeedbackSignal::Accept => {
                if let Err(e) = memory.accept(key, current_answer.as_str()) {
                    tracing::warn!(%question, error = %e, "failed to persist accepted answer");
                }
                FeedbackOutcome::Accepted {
                    answer: current_answer,
                }
            }
            FeedbackSignal::Reject => {
                if let Err(e) = memory.reject(key, current_answer.as_str()) {
                    tracing::warn!(%question, error = %e, "failed to persist rejected answer");
                }
                match resolver.next_candidate(&question, memory) {
                    NextCandidate::Candidate(answer) => FeedbackOutcome::NextCandidate { answer },
                    NextCandidate::Exhausted => FeedbackOutcome::Exhausted,
                }
            }
            FeedbackSignal::Unrecognized => FeedbackOutcome::Reprompt,
        };

        match &outcome {
            FeedbackOutcome::NextCandidate { answer } => exchange.advance(answer.as_str()),
            FeedbackOutcome::Reprompt => {}
            _ => exchange.clear(),
        }

        tracing::debug!(%question, ?outcome, "feedback processed");
        Some(outcome)
    }
}
