//! QA tests for question resolution through the responder.
//!
//! These tests verify how a question turns into a reply:
//! - Secondary keyword disambiguation and the first-record fallback
//! - Accepted answers short-circuiting the keyword store
//! - Synonym fallback after extraction fails
//! - Diagnostics for questions nobody can answer
//!
//! Run with: `cargo test -p answer-core --test qa_resolution`

use answer_core::diagnostics::DiagnosticFlag;
use answer_core::keywords::{KeywordIndex, KeywordMatcher};
use answer_core::store::{Candidate, InsertOutcome, KeywordRecord, KeywordStore, StoreError};
use answer_core::testing::{
    assert_awaiting_feedback, assert_idle, fixture_builder, fixture_normalizer, fixture_synonyms,
    TestHarness, DELIVERY_ANSWER, HOURS_ANSWER, PRICE_ANSWER,
};
use answer_core::{AnswerMemory, Responder, SessionId};

const PROMPT: &str = "Ответил ли я на ваш вопрос? (Да/Нет)";
const NOT_FOUND: &str = "Извините, я не могу найти ответ на ваш вопрос.";

// =============================================================================
// PRIMARY LOOKUP
// =============================================================================

#[test]
fn test_secondary_keyword_wins() {
    let mut harness = TestHarness::new();

    let reply = harness.say("Сколько стоит доставка?");

    assert_eq!(reply.messages, vec![DELIVERY_ANSWER, PROMPT]);
    assert_awaiting_feedback(&harness, DELIVERY_ANSWER);
}

#[test]
fn test_inflected_secondary_keyword() {
    let mut harness = TestHarness::new();

    let reply = harness.say("Какая стоимость доставки?");

    assert_eq!(reply.messages[0], DELIVERY_ANSWER);
}

#[test]
fn test_first_record_without_secondary_keyword() {
    let mut harness = TestHarness::new();

    let reply = harness.say("сколько стоит");

    assert_eq!(reply.messages, vec![PRICE_ANSWER, PROMPT]);
    assert_awaiting_feedback(&harness, PRICE_ANSWER);
}

#[test]
fn test_single_record() {
    let mut harness = TestHarness::new();

    let reply = harness.say("Когда работаете?");

    assert_eq!(reply.messages[0], HOURS_ANSWER);
}

#[test]
fn test_record_order_decides_fallback() {
    let mut harness = TestHarness::with_records([
        KeywordRecord::new("цена", DELIVERY_ANSWER).with_secondary("доставка"),
        KeywordRecord::new("цена", PRICE_ANSWER),
    ]);

    let reply = harness.say("сколько стоит");

    assert_eq!(reply.messages[0], DELIVERY_ANSWER);
}

// =============================================================================
// ACCEPTED ANSWERS
// =============================================================================

/// Store that fails the test if it is ever queried.
struct UntouchableStore;

impl KeywordStore for UntouchableStore {
    fn query(&self, primary_keyword: &str) -> Result<Vec<Candidate>, StoreError> {
        panic!("keyword store queried for {primary_keyword:?}");
    }

    fn insert(&mut self, _record: &KeywordRecord) -> Result<InsertOutcome, StoreError> {
        Ok(InsertOutcome::Inserted)
    }

    fn record_count(&self) -> Result<usize, StoreError> {
        Ok(0)
    }
}

#[test]
fn test_accepted_answer_skips_store() {
    let normalizer = fixture_normalizer();
    let mut memory = AnswerMemory::in_memory();
    memory
        .accept(normalizer.normalize("Сколько стоит?"), "Запомненный ответ")
        .unwrap();

    let mut responder = Responder::builder()
        .normalizer(normalizer)
        .synonyms(fixture_synonyms())
        .store(UntouchableStore)
        .memory(memory)
        .build();
    let session = SessionId::from("s");

    let reply = responder.handle_message(&session, "сколько  СТОИТ");

    assert_eq!(reply.messages, vec!["Запомненный ответ"]);
    assert!(responder.session(&session).is_idle());
}

#[test]
fn test_accepted_answer_is_remembered_between_questions() {
    let mut harness = TestHarness::new();

    harness.say("Сколько стоит?");
    harness.say("да");
    let reply = harness.say("сколько стоит");

    assert_eq!(reply.messages, vec![PRICE_ANSWER]);
    assert_idle(&harness);
}

// =============================================================================
// NOT FOUND AND SYNONYM FALLBACK
// =============================================================================

#[test]
fn test_unanswerable_question_is_logged() {
    let mut harness = TestHarness::new();

    let reply = harness.say("Привет, как дела?");

    assert_eq!(reply.messages, vec![NOT_FOUND]);
    assert_idle(&harness);

    let entries = harness.diagnostics();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].question, "Привет, как дела?");
    assert!(entries[0].flags.contains(&DiagnosticFlag::NoKeywordsFound));
}

#[test]
fn test_keyword_without_answers_is_logged() {
    let mut harness = TestHarness::new();

    harness.say("где вы находитесь");

    let entries = harness.diagnostics();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].flags, vec![DiagnosticFlag::NoRecordsMatched]);
}

#[test]
fn test_answered_questions_are_not_logged() {
    let mut harness = TestHarness::new();

    harness.say("сколько стоит");

    assert!(harness.diagnostics().is_empty());
}

/// Matches a primary keyword only when it is a whole word of the question.
struct WholeWordMatcher;

impl KeywordMatcher for WholeWordMatcher {
    fn extract_keywords(&self, index: &KeywordIndex, normalized_question: &str) -> Vec<String> {
        index
            .entries()
            .iter()
            .filter(|entry| {
                entry
                    .normalized_keyword
                    .as_deref()
                    .is_some_and(|k| normalized_question.split(' ').any(|w| w == k))
            })
            .map(|entry| entry.keyword.clone())
            .collect()
    }
}

#[test]
fn test_synonym_fallback_answers_exact_phrase() {
    let sink = answer_core::diagnostics::MemorySink::new();
    let mut responder = fixture_builder()
        .matcher(WholeWordMatcher)
        .diagnostics(sink.clone())
        .build();
    let session = SessionId::from("s");

    // Extraction finds no whole-word keyword, the synonym table matches exactly.
    let reply = responder.handle_message(&session, "Когда работаете?");
    assert_eq!(reply.messages, vec![HOURS_ANSWER, PROMPT]);
    assert!(sink.entries().is_empty());

    responder.reset(&session);

    // Not an exact synonym: nothing to fall back to.
    let reply = responder.handle_message(&session, "когда вы работаете");
    assert_eq!(reply.messages, vec![NOT_FOUND]);
    assert_eq!(sink.entries().len(), 1);
}

// =============================================================================
// MISSING STORE
// =============================================================================

#[test]
fn test_missing_store_is_polite() {
    let mut harness = TestHarness::from_builder(
        Responder::builder()
            .normalizer(fixture_normalizer())
            .synonyms(fixture_synonyms()),
    );

    let reply = harness.say("сколько стоит");

    assert_eq!(reply.messages, vec![NOT_FOUND]);
    let entries = harness.diagnostics();
    assert!(matches!(
        entries[0].flags[..],
        [DiagnosticFlag::StoreUnavailable(_)]
    ));
}
