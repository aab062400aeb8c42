//! Keyword-driven question answering that learns from feedback.
//!
//! This crate provides:
//! - Lemma-based text normalization with pluggable lexicons
//! - Keyword extraction over a synonym table
//! - Answer resolution against a keyword store (in-memory or SQLite)
//! - Answer memory of accepted and rejected answers, persisted as JSON
//! - A session-aware [`Responder`] driving question, feedback and
//!   clarification turns
//!
//! # Quick Start
//!
//! ```ignore
//! use answer_core::{Responder, ResponderConfig, SessionId};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ResponderConfig::new("Data").with_clarify_ambiguous(true);
//!     let mut responder = Responder::open(&config)?;
//!
//!     let session = SessionId::from("console");
//!     let reply = responder.handle_message(&session, "Сколько стоит доставка?");
//!     for message in &reply.messages {
//!         println!("{message}");
//!     }
//!
//!     responder.handle_message(&session, "да");
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod diagnostics;
pub mod feedback;
pub mod ingest;
pub mod keywords;
pub mod memory;
pub mod normalize;
pub mod resolver;
pub mod responder;
pub mod session;
pub mod store;
pub mod synonyms;
pub mod testing;

// Primary public API
pub use config::{Messages, ResponderConfig};
pub use diagnostics::{DiagnosticEntry, DiagnosticFlag, DiagnosticSink};
pub use feedback::{FeedbackOutcome, FeedbackVocabulary};
pub use ingest::{ingest, parse_corpus, IngestReport};
pub use memory::{AnswerMemory, JsonFileStore, PersistError};
pub use normalize::{DictionaryLemmatizer, Normalizer};
pub use resolver::{NextCandidate, ResolutionResult, Resolver};
pub use responder::{Reply, Responder, ResponderBuilder, ResponderError};
pub use session::{PendingExchange, SessionId};
pub use store::{Candidate, KeywordRecord, KeywordStore, SqliteKeywordStore, StoreError};
pub use synonyms::SynonymTable;
pub use testing::TestHarness;
