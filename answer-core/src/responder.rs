//! Responder - the conversation-level API.
//!
//! Ties the resolver, answer memory, feedback processor and diagnostics
//! into one message-in, replies-out interface. Each session's pending
//! exchange decides how the next message is read: as a new question, as
//! yes/no feedback, or as a clarification choice.

use crate::config::{Messages, ResponderConfig};
use crate::diagnostics::{DiagnosticEntry, DiagnosticFlag, DiagnosticSink, FileDiagnosticSink};
use crate::feedback::{FeedbackOutcome, FeedbackProcessor, FeedbackVocabulary};
use crate::keywords::KeywordMatcher;
use crate::memory::{AnswerMemory, JsonFileStore};
use crate::normalize::{DictionaryLemmatizer, LexiconError, Normalizer};
use crate::resolver::{ResolutionResult, Resolver, ResolverConfig};
use crate::session::{PendingExchange, SessionId, SessionStore};
use crate::store::{Candidate, KeywordStore, SqliteKeywordStore};
use crate::synonyms::{SynonymError, SynonymTable};
use thiserror::Error;

/// Errors from opening a responder.
#[derive(Debug, Error)]
pub enum ResponderError {
    #[error("Lexicon error: {0}")]
    Lexicon(#[from] LexiconError),

    #[error("Synonym table error: {0}")]
    Synonyms(#[from] SynonymError),
}

/// Messages to send back, in order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Reply {
    pub messages: Vec<String>,
}

impl Reply {
    fn new<I, S>(messages: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            messages: messages.into_iter().map(Into::into).collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn last(&self) -> Option<&str> {
        self.messages.last().map(String::as_str)
    }

    /// All messages joined with newlines.
    pub fn text(&self) -> String {
        self.messages.join("\n")
    }
}

/// Answers questions and learns from feedback, one session at a time.
pub struct Responder {
    resolver: Resolver,
    memory: AnswerMemory,
    sessions: SessionStore,
    feedback: FeedbackProcessor,
    diagnostics: Box<dyn DiagnosticSink>,
    messages: Messages,
}

impl Responder {
    pub fn builder() -> ResponderBuilder {
        ResponderBuilder::new()
    }

    /// Open a responder backed by the files named in `config`.
    ///
    /// A missing or unreadable keyword database is not fatal: every question
    /// then resolves to "not found" with a store-unavailable flag.
    pub fn open(config: &ResponderConfig) -> Result<Self, ResponderError> {
        let normalizer = match &config.lexicon_path {
            Some(path) => {
                let lexicon = DictionaryLemmatizer::load(path)?;
                tracing::info!(path = %path.display(), entries = lexicon.len(), "lexicon loaded");
                Normalizer::new(lexicon)
            }
            None => Normalizer::identity(),
        };

        let synonyms = SynonymTable::load_json(&config.synonyms_path)?;
        tracing::info!(entries = synonyms.len(), "synonym table loaded");

        let memory = AnswerMemory::load(JsonFileStore::new(
            &config.accepted_path,
            &config.rejected_path,
        ));

        let mut builder = Responder::builder()
            .normalizer(normalizer)
            .synonyms(synonyms)
            .memory(memory)
            .diagnostics(FileDiagnosticSink::new(&config.diagnostic_log_path))
            .clarify_ambiguous(config.clarify_ambiguous)
            .vocabulary(config.vocabulary.clone())
            .messages(config.messages.clone());

        match SqliteKeywordStore::open_existing(&config.keyword_db_path) {
            Ok(store) => builder = builder.store(store),
            Err(e) => {
                tracing::warn!(
                    path = %config.keyword_db_path.display(),
                    error = %e,
                    "keyword store unavailable, questions will not be answered"
                );
            }
        }

        Ok(builder.build())
    }

    /// Reply to the start command.
    pub fn greeting(&self) -> Reply {
        Reply::new([self.messages.greeting.as_str()])
    }

    /// Handle one incoming message for a session.
    pub fn handle_message(&mut self, session: &SessionId, text: &str) -> Reply {
        if text.trim().is_empty() {
            return Reply::default();
        }

        let exchange = self.sessions.take(session);
        let (reply, next) = match exchange {
            PendingExchange::Idle => self.on_question(text),
            PendingExchange::AwaitingFeedback { .. } => self.on_feedback(exchange, text),
            PendingExchange::AwaitingClarification { .. } => self.on_clarification(exchange, text),
        };

        tracing::debug!(%session, state = ?next, "message handled");
        self.sessions.set(session.clone(), next);
        reply
    }

    /// Drop whatever the session was waiting for.
    pub fn reset(&mut self, session: &SessionId) {
        self.sessions.clear(session);
    }

    pub fn session(&self, session: &SessionId) -> &PendingExchange {
        self.sessions.get(session)
    }

    pub fn active_sessions(&self) -> usize {
        self.sessions.active_count()
    }

    pub fn memory(&self) -> &AnswerMemory {
        &self.memory
    }

    pub fn resolver(&self) -> &Resolver {
        &self.resolver
    }

    pub fn messages(&self) -> &Messages {
        &self.messages
    }

    fn on_question(&mut self, question: &str) -> (Reply, PendingExchange) {
        let normalized = self.resolver.normalizer().normalize(question);
        if let Some(answer) = self.memory.accepted_answer(&normalized) {
            tracing::info!(%question, "answered from memory");
            return (Reply::new([answer]), PendingExchange::Idle);
        }

        match self.resolver.resolve(question) {
            ResolutionResult::Answered(answer) => self.offer(question, answer),
            ResolutionResult::NeedsClarification(candidates) => {
                let menu = self.menu(&candidates);
                (
                    Reply::new([menu]),
                    PendingExchange::await_clarification(question, candidates),
                )
            }
            ResolutionResult::NotFound(flags) => match self.resolver.synonym_fallback(question) {
                Some(answer) => self.offer(question, answer),
                None => {
                    self.record_failure(question, flags);
                    (
                        Reply::new([self.messages.not_found.as_str()]),
                        PendingExchange::Idle,
                    )
                }
            },
        }
    }

    fn on_feedback(
        &mut self,
        mut exchange: PendingExchange,
        input: &str,
    ) -> (Reply, PendingExchange) {
        let processed =
            self.feedback
                .process(&mut exchange, input, &self.resolver, &mut self.memory);
        let Some(outcome) = processed else {
            return self.on_question(input);
        };

        let reply = match outcome {
            FeedbackOutcome::Accepted { .. } => Reply::new([self.messages.thanks.as_str()]),
            FeedbackOutcome::SentinelRefused => {
                Reply::new([self.messages.sentinel_refused.as_str()])
            }
            FeedbackOutcome::NextCandidate { answer } => {
                Reply::new([answer, self.messages.feedback_prompt.clone()])
            }
            FeedbackOutcome::Exhausted => Reply::new([self.messages.exhausted.as_str()]),
            FeedbackOutcome::Reprompt => Reply::new([
                self.messages.invalid_feedback.as_str(),
                self.messages.feedback_prompt.as_str(),
            ]),
        };

        (reply, exchange)
    }

    fn on_clarification(
        &mut self,
        mut exchange: PendingExchange,
        input: &str,
    ) -> (Reply, PendingExchange) {
        let chosen = input
            .trim()
            .parse::<usize>()
            .ok()
            .and_then(|option| exchange.choose(option))
            .map(str::to_owned);

        match chosen {
            Some(answer) => (
                Reply::new([answer, self.messages.feedback_prompt.clone()]),
                exchange,
            ),
            None => {
                tracing::debug!(%input, "clarification abandoned, treating as a new question");
                self.on_question(input)
            }
        }
    }

    /// Send an answer and wait for feedback on it.
    fn offer(&self, question: &str, answer: String) -> (Reply, PendingExchange) {
        let reply = Reply::new([answer.as_str(), self.messages.feedback_prompt.as_str()]);
        (reply, PendingExchange::await_feedback(question, answer))
    }

    fn menu(&self, candidates: &[Candidate]) -> String {
        let mut menu = self.messages.clarify_header.clone();
        for (i, candidate) in candidates.iter().enumerate() {
            menu.push_str(&format!("\n{}. {}", i + 1, candidate.label()));
        }
        menu
    }

    fn record_failure(&self, question: &str, flags: Vec<DiagnosticFlag>) {
        tracing::info!(%question, ?flags, "no answer found");
        let entry = DiagnosticEntry::new(question, flags);
        if let Err(e) = self.diagnostics.record(&entry) {
            tracing::warn!(error = %e, "failed to write diagnostic entry");
        }
    }
}

impl std::fmt::Debug for Responder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Responder")
            .field("resolver", &self.resolver)
            .field("memory", &self.memory)
            .field("sessions", &self.sessions)
            .finish_non_exhaustive()
    }
}

/// Assembles a [`Responder`] from parts.
///
/// Anything not set falls back to an in-memory or empty default: identity
/// normalization, an empty synonym table, no keyword store, a memory that
/// is never persisted and diagnostics that go nowhere.
pub struct ResponderBuilder {
    normalizer: Normalizer,
    synonyms: SynonymTable,
    store: Option<Box<dyn KeywordStore>>,
    matcher: Option<Box<dyn KeywordMatcher>>,
    memory: Option<AnswerMemory>,
    diagnostics: Option<Box<dyn DiagnosticSink>>,
    resolver_config: ResolverConfig,
    vocabulary: FeedbackVocabulary,
    messages: Messages,
}

impl ResponderBuilder {
    pub fn new() -> Self {
        Self {
            normalizer: Normalizer::identity(),
            synonyms: SynonymTable::new(),
            store: None,
            matcher: None,
            memory: None,
            diagnostics: None,
            resolver_config: ResolverConfig::default(),
            vocabulary: FeedbackVocabulary::default(),
            messages: Messages::default(),
        }
    }

    pub fn normalizer(mut self, normalizer: Normalizer) -> Self {
        self.normalizer = normalizer;
        self
    }

    pub fn synonyms(mut self, synonyms: SynonymTable) -> Self {
        self.synonyms = synonyms;
        self
    }

    pub fn store(mut self, store: impl KeywordStore + 'static) -> Self {
        self.store = Some(Box::new(store));
        self
    }

    /// Replace substring keyword extraction.
    pub fn matcher(mut self, matcher: impl KeywordMatcher + 'static) -> Self {
        self.matcher = Some(Box::new(matcher));
        self
    }

    pub fn memory(mut self, memory: AnswerMemory) -> Self {
        self.memory = Some(memory);
        self
    }

    pub fn diagnostics(mut self, sink: impl DiagnosticSink + 'static) -> Self {
        self.diagnostics = Some(Box::new(sink));
        self
    }

    pub fn clarify_ambiguous(mut self, clarify: bool) -> Self {
        self.resolver_config.clarify_ambiguous = clarify;
        self
    }

    pub fn vocabulary(mut self, vocabulary: FeedbackVocabulary) -> Self {
        self.vocabulary = vocabulary;
        self
    }

    pub fn messages(mut self, messages: Messages) -> Self {
        self.messages = messages;
        self
    }

    pub fn build(self) -> Responder {
        let mut resolver = Resolver::new(self.normalizer, &self.synonyms, self.store)
            .with_config(self.resolver_config);
        if let Some(matcher) = self.matcher {
            resolver = resolver.with_matcher(matcher);
        }
        let feedback = FeedbackProcessor::new(self.vocabulary, self.messages.not_found.clone());

        Responder {
            resolver,
            memory: self.memory.unwrap_or_else(AnswerMemory::in_memory),
            sessions: SessionStore::new(),
            feedback,
            diagnostics: self
                .diagnostics
                .unwrap_or_else(|| Box::new(crate::diagnostics::MemorySink::new())),
            messages: self.messages,
        }
    }
}

impl Default for ResponderBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{KeywordRecord, MemoryKeywordStore};
    use tempfile::TempDir;

    fn responder() -> Responder {
        let store = MemoryKeywordStore::from_records([
            KeywordRecord::new("цена", "Стоимость 100р"),
            KeywordRecord::new("цена", "Доставка 200р").with_secondary("доставка"),
        ])
        .unwrap();

        Responder::builder()
            .synonyms(SynonymTable::new().with_entry("цена", ["стоимость"]))
            .store(store)
            .build()
    }

    #[test]
    fn test_reply_text() {
        let reply = Reply::new(["a", "b"]);
        assert_eq!(reply.text(), "a\nb");
        assert_eq!(reply.last(), Some("b"));
        assert!(Reply::default().is_empty());
    }

    #[test]
    fn test_blank_message_ignored() {
        let mut responder = responder();
        let session = SessionId::from("s");
        assert!(responder.handle_message(&session, "   ").is_empty());
        assert!(responder.session(&session).is_idle());
    }

    #[test]
    fn test_answer_then_prompt() {
        let mut responder = responder();
        let session = SessionId::from("s");

        let reply = responder.handle_message(&session, "цена?");
        assert_eq!(
            reply.messages,
            vec!["Стоимость 100р", "Ответил ли я на ваш вопрос? (Да/Нет)"]
        );
        assert!(responder.session(&session).is_awaiting_feedback());
    }

    #[test]
    fn test_clarification_menu() {
        let store = MemoryKeywordStore::from_records([
            KeywordRecord::new("цена", "Стоимость 100р"),
            KeywordRecord::new("цена", "Доставка 200р").with_secondary("доставка"),
        ])
        .unwrap();
        let mut responder = Responder::builder()
            .synonyms(SynonymTable::new().with_entry("цена", ["стоимость"]))
            .store(store)
            .clarify_ambiguous(true)
            .build();
        let session = SessionId::from("s");

        let reply = responder.handle_message(&session, "стоимость");
        assert_eq!(
            reply.text(),
            "Уточните, пожалуйста:\n1. Стоимость 100р\n2. доставка"
        );

        let reply = responder.handle_message(&session, " 2 ");
        assert_eq!(reply.messages[0], "Доставка 200р");
        assert_eq!(
            responder.session(&session).current_answer(),
            Some("Доставка 200р")
        );
    }

    #[test]
    fn test_open_without_database() {
        let dir = TempDir::new().expect("Failed to create temp dir");
        std::fs::write(dir.path().join("synonyms.json"), r#"{"цена": ["стоимость"]}"#).unwrap();

        let config = ResponderConfig::new(dir.path());
        let mut responder = Responder::open(&config).expect("open should succeed");
        let session = SessionId::from("console");

        let reply = responder.handle_message(&session, "цена");
        assert_eq!(reply.last(), Some("Извините, я не могу найти ответ на ваш вопрос."));

        let log = std::fs::read_to_string(dir.path().join("log.txt")).unwrap();
        assert!(log.contains("keyword store unavailable"));
    }

    #[test]
    fn test_open_missing_synonyms_fails() {
        let dir = TempDir::new().expect("Failed to create temp dir");
        let config = ResponderConfig::new(dir.path());
        assert!(matches!(
            Responder::open(&config),
            Err(ResponderError::Synonyms(_))
        ));
    }
}
