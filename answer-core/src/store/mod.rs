//! Keyword store: `(primary keyword, secondary keyword, answer)` records.
//!
//! The resolver only ever reads from a store. Writes happen during corpus
//! ingestion, where a duplicate `(primary, secondary)` pair is skipped and
//! the existing record kept.

mod memory;
mod sqlite;

pub use memory::MemoryKeywordStore;
pub use sqlite::SqliteKeywordStore;

use std::path::PathBuf;
use thiserror::Error;

/// Errors from keyword store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Keyword store not found at {0}")]
    Missing(PathBuf),

    #[error("Keyword store at {0} has no data table")]
    MissingTable(PathBuf),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Invalid record: {0}")]
    InvalidRecord(String),
}

/// A stored answer under a primary keyword, optionally narrowed by a
/// secondary keyword.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeywordRecord {
    pub primary_keyword: String,
    pub secondary_keyword: Option<String>,
    pub answer: String,
}

impl KeywordRecord {
    /// Create a record without a secondary keyword.
    pub fn new(primary_keyword: impl Into<String>, answer: impl Into<String>) -> Self {
        Self {
            primary_keyword: primary_keyword.into(),
            secondary_keyword: None,
            answer: answer.into(),
        }
    }

    /// Set the secondary keyword.
    pub fn with_secondary(mut self, secondary_keyword: impl Into<String>) -> Self {
        self.secondary_keyword = Some(secondary_keyword.into());
        self
    }

    /// Check the non-empty invariants on primary keyword and answer.
    pub fn validate(&self) -> Result<(), StoreError> {
        if self.primary_keyword.trim().is_empty() {
            return Err(StoreError::InvalidRecord(
                "primary keyword must not be empty".to_string(),
            ));
        }
        if self.answer.trim().is_empty() {
            return Err(StoreError::InvalidRecord(format!(
                "answer for '{}' must not be empty",
                self.primary_keyword
            )));
        }
        Ok(())
    }

    /// The uniqueness key. A missing secondary keyword is its own value.
    pub(crate) fn key(&self) -> (&str, Option<&str>) {
        (&self.primary_keyword, self.secondary_keyword.as_deref())
    }
}

/// A record as seen by the resolver: answer text plus its narrowing label.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub answer: String,
    pub secondary_keyword: Option<String>,
}

impl Candidate {
    pub fn new(answer: impl Into<String>, secondary_keyword: Option<String>) -> Self {
        Self {
            answer: answer.into(),
            secondary_keyword,
        }
    }

    /// Label for a clarification menu: the secondary keyword, or the answer
    /// itself when there is none or it is blank.
    pub fn label(&self) -> &str {
        self.secondary_keyword
            .as_deref()
            .filter(|s| !s.trim().is_empty())
            .unwrap_or(&self.answer)
    }
}

impl From<&KeywordRecord> for Candidate {
    fn from(record: &KeywordRecord) -> Self {
        Self {
            answer: record.answer.clone(),
            secondary_keyword: record.secondary_keyword.clone(),
        }
    }
}

/// Result of inserting a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    Inserted,
    /// A record with the same `(primary, secondary)` pair already exists.
    Duplicate,
}

/// Queryable repository of keyword records.
pub trait KeywordStore: Send {
    /// All candidates filed under `primary_keyword`, in insertion order.
    fn query(&self, primary_keyword: &str) -> Result<Vec<Candidate>, StoreError>;

    /// Insert a record, keeping any existing record with the same key.
    fn insert(&mut self, record: &KeywordRecord) -> Result<InsertOutcome, StoreError>;

    /// Total number of stored records.
    fn record_count(&self) -> Result<usize, StoreError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_validation() {
        assert!(KeywordRecord::new("цена", "100р").validate().is_ok());
        assert!(KeywordRecord::new("  ", "100р").validate().is_err());
        assert!(KeywordRecord::new("цена", "").validate().is_err());
    }

    #[test]
    fn test_candidate_label() {
        let plain = Candidate::new("Стоимость 100р", None);
        let narrowed = Candidate::new("Доставка 200р", Some("доставка".to_string()));
        assert_eq!(plain.label(), "Стоимость 100р");
        assert_eq!(narrowed.label(), "доставка");

        let blank = Candidate::new("Стоимость 150р", Some(String::new()));
        assert_eq!(blank.label(), "Стоимость 150р");
    }
}
