//! Answer memory learned from user feedback.
//!
//! Two mappings keyed by normalized question text:
//! - accepted answers: one answer per question, last write wins
//! - rejected answers: append-only list per question
//!
//! The in-memory maps mirror a durable store and the full snapshot is
//! persisted after every mutation.

use indexmap::IndexMap;
use serde::Serialize;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors from answer memory persistence.
#[derive(Debug, Error)]
pub enum PersistError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Malformed answer memory document {path}: {reason}")]
    Malformed { path: PathBuf, reason: String },
}

/// Normalized question -> accepted answer.
pub type AcceptedAnswers = IndexMap<String, String>;

/// Normalized question -> rejected answers, in rejection order.
pub type RejectedAnswers = IndexMap<String, Vec<String>>;

/// Complete contents of the answer memory.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AnswerSnapshot {
    pub accepted: AcceptedAnswers,
    pub rejected: RejectedAnswers,
}

/// Durable backing for the answer memory.
pub trait AnswerMemoryStore: Send {
    /// Read the stored snapshot.
    fn load(&self) -> Result<AnswerSnapshot, PersistError>;

    /// Replace the stored snapshot.
    fn persist(&self, snapshot: &AnswerSnapshot) -> Result<(), PersistError>;
}

/// Store that keeps nothing; the memory lives only as long as the process.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullStore;

impl AnswerMemoryStore for NullStore {
    fn load(&self) -> Result<AnswerSnapshot, PersistError> {
        Ok(AnswerSnapshot::default())
    }

    fn persist(&self, _snapshot: &AnswerSnapshot) -> Result<(), PersistError> {
        Ok(())
    }
}

/// Two JSON documents on disk, one per mapping.
///
/// Documents are UTF-8 with non-ASCII text written as-is and four-space
/// indentation. A missing or blank document reads as an empty mapping. Each
/// document is loaded on its own, so one that cannot be read or parsed
/// starts empty without touching the other.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    accepted_path: PathBuf,
    rejected_path: PathBuf,
}

impl JsonFileStore {
    pub fn new(accepted_path: impl Into<PathBuf>, rejected_path: impl Into<PathBuf>) -> Self {
        Self {
            accepted_path: accepted_path.into(),
            rejected_path: rejected_path.into(),
        }
    }

    pub fn accepted_path(&self) -> &Path {
        &self.accepted_path
    }

    pub fn rejected_path(&self) -> &Path {
        &self.rejected_path
    }

    /// Load one document, recovering from any read failure as empty.
    fn load_or_recover<T>(path: &Path) -> T
    where
        T: serde::de::DeserializeOwned + Default,
    {
        match read_document(path) {
            Ok(value) => value,
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "unreadable answer memory document, starting empty");
                T::default()
            }
        }
    }
}

impl AnswerMemoryStore for JsonFileStore {
    fn load(&self) -> Result<AnswerSnapshot, PersistError> {
        Ok(AnswerSnapshot {
            accepted: Self::load_or_recover(&self.accepted_path),
            rejected: Self::load_or_recover(&self.rejected_path),
        })
    }

    fn persist(&self, snapshot: &AnswerSnapshot) -> Result<(), PersistError> {
        write_document(&self.accepted_path, &snapshot.accepted)?;
        write_document(&self.rejected_path, &snapshot.rejected)?;
        Ok(())
    }
}

fn read_document<T>(path: &Path) -> Result<T, PersistError>
where
    T: serde::de::DeserializeOwned + Default,
{
    let malformed = |reason: String| PersistError::Malformed {
        path: path.to_path_buf(),
        reason,
    };

    let bytes = match std::fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(T::default()),
        Err(e) => return Err(e.into()),
    };
    let content = String::from_utf8(bytes).map_err(|e| malformed(e.to_string()))?;

    if content.trim().is_empty() {
        return Ok(T::default());
    }

    serde_json::from_str(&content).map_err(|e| malformed(e.to_string()))
}

fn write_document<T: Serialize>(path: &Path, value: &T) -> Result<(), PersistError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }

    let mut buf = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut ser = serde_json::Serializer::with_formatter(&mut buf, formatter);
    value.serialize(&mut ser)?;

    std::fs::write(path, buf)?;
    Ok(())
}

/// Accepted and rejected answers, mirrored to a durable store.
pub struct AnswerMemory {
    snapshot: AnswerSnapshot,
    store: Box<dyn AnswerMemoryStore>,
}

impl AnswerMemory {
    /// Load the memory from a store. A store that cannot be read yields an
    /// empty memory; the failure is logged.
    pub fn load(store: impl AnswerMemoryStore + 'static) -> Self {
        let snapshot = match store.load() {
            Ok(snapshot) => snapshot,
            Err(e) => {
                tracing::warn!(error = %e, "could not load answer memory, starting empty");
                AnswerSnapshot::default()
            }
        };

        tracing::info!(
            accepted = snapshot.accepted.len(),
            rejected = snapshot.rejected.len(),
            "answer memory loaded"
        );

        Self {
            snapshot,
            store: Box::new(store),
        }
    }

    /// An empty memory that is never persisted.
    pub fn in_memory() -> Self {
        Self::load(NullStore)
    }

    /// The accepted answer for a normalized question.
    pub fn accepted_answer(&self, normalized_question: &str) -> Option<&str> {
        self.snapshot
            .accepted
            .get(normalized_question)
            .map(String::as_str)
    }

    /// Answers rejected for a normalized question, oldest first.
    pub fn rejected_answers(&self, normalized_question: &str) -> &[String] {
        self.snapshot
            .rejected
            .get(normalized_question)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Whether `answer` was ever rejected for the normalized question.
    pub fn is_rejected(&self, normalized_question: &str, answer: &str) -> bool {
        self.rejected_answers(normalized_question)
            .iter()
            .any(|a| a == answer)
    }

    /// Record an accepted answer, replacing any earlier one, and persist.
    ///
    /// The in-memory update stands even if persisting fails.
    pub fn accept(
        &mut self,
        normalized_question: impl Into<String>,
        answer: impl Into<String>,
    ) -> Result<(), PersistError> {
        self.snapshot
            .accepted
            .insert(normalized_question.into(), answer.into());
        self.persist()
    }

    /// Append a rejected answer and persist. Repeats are kept.
    pub fn reject(
        &mut self,
        normalized_question: impl Into<String>,
        answer: impl Into<String>,
    ) -> Result<(), PersistError> {
        self.snapshot
            .rejected
            .entry(normalized_question.into())
            .or_default()
            .push(answer.into());
        self.persist()
    }

    /// Current contents.
    pub fn snapshot(&self) -> &AnswerSnapshot {
        &self.snapshot
    }

    fn persist(&self) -> Result<(), PersistError> {
        self.store.persist(&self.snapshot)
    }
}

impl std::fmt::Debug for AnswerMemory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnswerMemory")
            .field("snapshot", &self.snapshot)
            .finish_non_exhaustive()
    }
}
