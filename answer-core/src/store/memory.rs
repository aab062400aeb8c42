//! In-memory keyword store.

use super::{Candidate, InsertOutcome, KeywordRecord, KeywordStore, StoreError};

/// Keyword store held entirely in memory, in insertion order.
#[derive(Debug, Clone, Default)]
pub struct MemoryKeywordStore {
    records: Vec<KeywordRecord>,
}

impl MemoryKeywordStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a store from records; duplicates after the first are dropped.
    pub fn from_records(records: impl IntoIterator<Item = KeywordRecord>) -> Result<Self, StoreError> {
        let mut store = Self::new();
        for record in records {
            store.insert(&record)?;
        }
        Ok(store)
    }

    /// All records in insertion order.
    pub fn records(&self) -> &[KeywordRecord] {
        &self.records
    }
}

impl KeywordStore for MemoryKeywordStore {
    fn query(&self, primary_keyword: &str) -> Result<Vec<Candidate>, StoreError> {
        Ok(self
            .records
            .iter()
            .filter(|r| r.primary_keyword == primary_keyword)
            .map(Candidate::from)
            .collect())
    }

    fn insert(&mut self, record: &KeywordRecord) -> Result<InsertOutcome, StoreError> {
        record.validate()?;

        if self.records.iter().any(|r| r.key() == record.key()) {
            return Ok(InsertOutcome::Duplicate);
        }

        self.records.push(record.clone());
        Ok(InsertOutcome::Inserted)
    }

    fn record_count(&self) -> Result<usize, StoreError> {
        Ok(self.records.len())
    }
}
