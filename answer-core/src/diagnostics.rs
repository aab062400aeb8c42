//! Diagnostic flags and the failure log.
//!
//! Flags explain how a resolution went. When a question gets no answer at
//! all, the question and its flags are appended to a diagnostic sink so the
//! missing knowledge can be curated later. Nothing here is shown to users.

use chrono::{DateTime, Utc};
use std::fmt;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

/// Observability note attached to a resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiagnosticFlag {
    /// The keyword store could not be reached.
    StoreUnavailable(String),
    /// No primary keyword occurs in the question.
    NoKeywordsFound,
    /// The store returned records for this keyword.
    KeywordMatched(String),
    /// Keywords were found but the store has no records for any of them.
    NoRecordsMatched,
    /// Exactly one record matched.
    SingleMatch,
    /// Several records matched and this secondary keyword picked one.
    SecondaryKeywordMatched(String),
    /// Several records matched and no secondary keyword occurs in the question.
    SecondaryKeywordNotFound,
}

impl fmt::Display for DiagnosticFlag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DiagnosticFlag::StoreUnavailable(reason) => {
                write!(f, "keyword store unavailable: {reason}")
            }
            DiagnosticFlag::NoKeywordsFound => write!(f, "no keywords found in question"),
            DiagnosticFlag::KeywordMatched(keyword) => {
                write!(f, "answers found for keyword: {keyword}")
            }
            DiagnosticFlag::NoRecordsMatched => {
                write!(f, "no answers found for primary keywords or synonyms")
            }
            DiagnosticFlag::SingleMatch => write!(f, "single match found"),
            DiagnosticFlag::SecondaryKeywordMatched(keyword) => {
                write!(f, "secondary keyword found: {keyword}")
            }
            DiagnosticFlag::SecondaryKeywordNotFound => {
                write!(f, "secondary keyword not found, using first answer")
            }
        }
    }
}

/// One failed question.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiagnosticEntry {
    /// The question as the user typed it.
    pub question: String,
    pub flags: Vec<DiagnosticFlag>,
    pub recorded_at: DateTime<Utc>,
}

impl DiagnosticEntry {
    pub fn new(question: impl Into<String>, flags: Vec<DiagnosticFlag>) -> Self {
        Self {
            question: question.into(),
            flags,
            recorded_at: Utc::now(),
        }
    }
}

/// Append-only destination for diagnostic entries.
pub trait DiagnosticSink: Send {
    fn record(&self, entry: &DiagnosticEntry) -> std::io::Result<()>;
}

/// Appends entries to a plain-text log file.
///
/// Each entry is a block: timestamp, question, flags, then a 40-dash
/// separator line.
#[derive(Debug, Clone)]
pub struct FileDiagnosticSink {
    path: PathBuf,
}

impl FileDiagnosticSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl DiagnosticSink for FileDiagnosticSink {
    fn record(&self, entry: &DiagnosticEntry) -> std::io::Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        let flags: Vec<String> = entry.flags.iter().map(ToString::to_string).collect();
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;

        writeln!(file, "Time: {}", entry.recorded_at.to_rfc3339())?;
        writeln!(file, "Question: {}", entry.question)?;
        writeln!(file, "Flags: {flags:?}")?;
        writeln!(file, "{}", "-".repeat(40))?;
        Ok(())
    }
}

/// Keeps entries in memory. Clones share the same buffer.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    entries: Arc<Mutex<Vec<DiagnosticEntry>>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Entries recorded so far.
    pub fn entries(&self) -> Vec<DiagnosticEntry> {
        self.entries
            .lock()
            .map(|entries| entries.clone())
            .unwrap_or_default()
    }
}

impl DiagnosticSink for MemorySink {
    fn record(&self, entry: &DiagnosticEntry) -> std::io::Result<()> {
        if let Ok(mut entries) = self.entries.lock() {
            entries.push(entry.clone());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_flag_display() {
        assert_eq!(
            DiagnosticFlag::NoKeywordsFound.to_string(),
            "no keywords found in question"
        );
        assert_eq!(
            DiagnosticFlag::KeywordMatched("цена".into()).to_string(),
            "answers found for keyword: цена"
        );
    }

    #[test]
    fn test_file_sink_appends_blocks() {
        let dir = TempDir::new().expect("Failed to create temp dir");
        let path = dir.path().join("logs/log.txt");
        let sink = FileDiagnosticSink::new(&path);

        sink.record(&DiagnosticEntry::new("привет", vec![DiagnosticFlag::NoKeywordsFound]))
            .unwrap();
        sink.record(&DiagnosticEntry::new(
            "где вы",
            vec![DiagnosticFlag::NoRecordsMatched],
        ))
        .unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.contains("Question: привет\n"));
        assert!(content.contains("Flags: [\"no keywords found in question\"]\n"));
        assert!(content.contains("Question: где вы\n"));
        assert_eq!(content.matches(&"-".repeat(40)).count(), 2);
    }

    #[test]
    fn test_memory_sink_shares_buffer() {
        let sink = MemorySink::new();
        let handle = sink.clone();
        sink.record(&DiagnosticEntry::new("q", vec![])).unwrap();
        assert_eq!(handle.entries().len(), 1);
    }
}
