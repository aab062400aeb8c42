//! Static synonym table defining keyword equivalence classes.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// Errors from loading a synonym table.
#[derive(Debug, Error)]
pub enum SynonymError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// A primary keyword and the literal phrases that stand for it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SynonymEntry {
    /// Canonical topic label, as stored in the keyword store.
    pub keyword: String,
    /// Synonym phrases, in declaration order.
    pub synonyms: Vec<String>,
}

impl SynonymEntry {
    pub fn new<I, S>(keyword: impl Into<String>, synonyms: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            keyword: keyword.into(),
            synonyms: synonyms.into_iter().map(Into::into).collect(),
        }
    }
}

/// Ordered collection of synonym entries.
///
/// Order matters: keyword extraction and synonym fallback both scan entries
/// in table order, and the first match wins where a single winner is needed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SynonymTable {
    entries: Vec<SynonymEntry>,
}

impl SynonymTable {
    /// Create an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an entry (builder style).
    pub fn with_entry<I, S>(mut self, keyword: impl Into<String>, synonyms: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.entries.push(SynonymEntry::new(keyword, synonyms));
        self
    }

    /// Append an entry.
    pub fn push(&mut self, entry: SynonymEntry) {
        self.entries.push(entry);
    }

    /// Load a table from a JSON object mapping keywords to synonym lists.
    pub fn load_json(path: impl AsRef<Path>) -> Result<Self, SynonymError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json_str(&content)
    }

    /// Parse a table from a JSON object, preserving key order.
    pub fn from_json_str(content: &str) -> Result<Self, SynonymError> {
        let raw: IndexMap<String, Vec<String>> = serde_json::from_str(content)?;
        Ok(raw.into_iter().collect())
    }

    /// Entries in table order.
    pub fn entries(&self) -> &[SynonymEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl FromIterator<(String, Vec<String>)> for SynonymTable {
    fn from_iter<T: IntoIterator<Item = (String, Vec<String>)>>(iter: T) -> Self {
        Self {
            entries: iter
                .into_iter()
                .map(|(keyword, synonyms)| SynonymEntry { keyword, synonyms })
                .collect(),
        }
    }
}
