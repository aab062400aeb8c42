//! Testing utilities for conversation scenarios.
//!
//! [`TestHarness`] drives a [`Responder`] through a single session with an
//! in-memory keyword store, an answer memory that is never persisted unless
//! asked for, and a diagnostic sink that can be inspected afterwards.

use crate::diagnostics::{DiagnosticEntry, MemorySink};
use crate::normalize::{DictionaryLemmatizer, Normalizer};
use crate::responder::{Reply, Responder, ResponderBuilder};
use crate::session::{PendingExchange, SessionId};
use crate::store::{KeywordRecord, MemoryKeywordStore};
use crate::synonyms::SynonymTable;

pub const PRICE_ANSWER: &str = "Стоимость 100р";
pub const DELIVERY_ANSWER: &str = "Доставка 200р";
pub const HOURS_ANSWER: &str = "С 9 до 18";

/// A small Russian lexicon covering the fixture questions.
pub fn fixture_normalizer() -> Normalizer {
    Normalizer::new(DictionaryLemmatizer::from_pairs([
        ("стоит", "стоить"),
        ("стоят", "стоить"),
        ("доставки", "доставка"),
        ("доставку", "доставка"),
        ("работаете", "работать"),
        ("цены", "цена"),
    ]))
}

pub fn fixture_synonyms() -> SynonymTable {
    SynonymTable::new()
        .with_entry("цена", ["стоимость", "сколько стоит"])
        .with_entry("график", ["часы работы", "когда работаете"])
        .with_entry("адрес", ["где вы"])
}

/// Two answers under "цена" (one narrowed by "доставка") and one under "график".
pub fn fixture_records() -> Vec<KeywordRecord> {
    vec![
        KeywordRecord::new("цена", PRICE_ANSWER),
        KeywordRecord::new("цена", DELIVERY_ANSWER).with_secondary("доставка"),
        KeywordRecord::new("график", HOURS_ANSWER),
    ]
}

/// Builder preloaded with the fixture lexicon, synonyms and records.
pub fn fixture_builder() -> ResponderBuilder {
    fixture_builder_with_records(fixture_records())
}

pub fn fixture_builder_with_records(
    records: impl IntoIterator<Item = KeywordRecord>,
) -> ResponderBuilder {
    let store = MemoryKeywordStore::from_records(records).expect("fixture records must be valid");
    Responder::builder()
        .normalizer(fixture_normalizer())
        .synonyms(fixture_synonyms())
        .store(store)
}

/// Test harness for running conversation scenarios.
pub struct TestHarness {
    /// The responder under test.
    pub responder: Responder,
    /// The session every message is sent on.
    pub session: SessionId,
    sink: MemorySink,
    transcript: Vec<Reply>,
}

impl TestHarness {
    /// Harness over the fixture data.
    pub fn new() -> Self {
        Self::from_builder(fixture_builder())
    }

    /// Harness over the fixture lexicon and synonyms with custom records.
    pub fn with_records(records: impl IntoIterator<Item = KeywordRecord>) -> Self {
        Self::from_builder(fixture_builder_with_records(records))
    }

    /// Fixture harness that offers a menu instead of guessing.
    pub fn clarifying() -> Self {
        Self::from_builder(fixture_builder().clarify_ambiguous(true))
    }

    /// Harness over any builder. Diagnostics are always captured.
    pub fn from_builder(builder: ResponderBuilder) -> Self {
        let sink = MemorySink::new();
        let responder = builder.diagnostics(sink.clone()).build();

        Self {
            responder,
            session: SessionId::from("test"),
            sink,
            transcript: Vec::new(),
        }
    }

    /// Send a message and get the reply.
    pub fn say(&mut self, text: &str) -> Reply {
        let reply = self.responder.handle_message(&self.session, text);
        self.transcript.push(reply.clone());
        reply
    }

    /// Last message the bot sent.
    pub fn last_message(&self) -> Option<&str> {
        self.transcript.iter().rev().find_map(|reply| reply.last())
    }

    /// Every reply so far.
    pub fn transcript(&self) -> &[Reply] {
        &self.transcript
    }

    pub fn state(&self) -> &PendingExchange {
        self.responder.session(&self.session)
    }

    /// Diagnostic entries recorded so far.
    pub fn diagnostics(&self) -> Vec<DiagnosticEntry> {
        self.sink.entries()
    }

    /// Accepted answer for a question as the user would type it.
    pub fn accepted(&self, question: &str) -> Option<&str> {
        let key = self.responder.resolver().normalizer().normalize(question);
        self.responder.memory().accepted_answer(&key)
    }

    /// Rejected answers for a question as the user would type it.
    pub fn rejected(&self, question: &str) -> Vec<String> {
        let key = self.responder.resolver().normalizer().normalize(question);
        self.responder.memory().rejected_answers(&key).to_vec()
    }
}

impl Default for TestHarness {
    fn default() -> Self {
        Self::new()
    }
}

/// Assert the session waits for feedback on `answer`.
pub fn assert_awaiting_feedback(harness: &TestHarness, answer: &str) {
    assert_eq!(
        harness.state().current_answer(),
        Some(answer),
        "expected to await feedback on {answer:?}, state is {:?}",
        harness.state()
    );
}

/// Assert nothing is pending.
pub fn assert_idle(harness: &TestHarness) {
    assert!(
        harness.state().is_idle(),
        "expected idle session, state is {:?}",
        harness.state()
    );
}
