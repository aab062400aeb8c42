//! Bulk loading of a flat text corpus into a keyword store.
//!
//! Corpus format, one record per line:
//!
//! ```text
//! primary keyword, secondary keyword, answer text, which may itself contain commas
//! ```
//!
//! The line is split on the first two commas only. An empty secondary field
//! means the record has no secondary keyword.

use crate::store::{InsertOutcome, KeywordRecord, KeywordStore, StoreError};

/// A corpus line that could not be turned into a record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MalformedLine {
    /// 1-based line number.
    pub line: usize,
    pub content: String,
}

/// Result of parsing a corpus.
#[derive(Debug, Clone, Default)]
pub struct ParsedCorpus {
    pub records: Vec<KeywordRecord>,
    pub malformed: Vec<MalformedLine>,
}

/// Counts from loading records into a store.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IngestReport {
    pub inserted: usize,
    pub duplicates: usize,
}

/// Parse corpus text into records. Blank lines are skipped silently.
pub fn parse_corpus(text: &str) -> ParsedCorpus {
    let mut parsed = ParsedCorpus::default();

    for (index, raw) in text.lines().enumerate() {
        if raw.trim().is_empty() {
            continue;
        }

        match parse_line(raw) {
            Some(record) => parsed.records.push(record),
            None => {
                tracing::warn!(line = index + 1, content = %raw, "malformed corpus line");
                parsed.malformed.push(MalformedLine {
                    line: index + 1,
                    content: raw.to_string(),
                });
            }
        }
    }

    parsed
}

fn parse_line(line: &str) -> Option<KeywordRecord> {
    let mut parts = line.splitn(3, ',');
    let primary = parts.next()?.trim();
    let secondary = parts.next()?.trim();
    let answer = parts.next()?.trim();

    if primary.is_empty() || answer.is_empty() {
        return None;
    }

    let record = KeywordRecord::new(primary, answer);
    Some(if secondary.is_empty() {
        record
    } else {
        record.with_secondary(secondary)
    })
}

/// Insert records into a store. Duplicates are logged and the existing
/// record is kept.
pub fn ingest<S: KeywordStore + ?Sized>(
    store: &mut S,
    records: &[KeywordRecord],
) -> Result<IngestReport, StoreError> {
    let mut report = IngestReport::default();

    for record in records {
        match store.insert(record)? {
            InsertOutcome::Inserted => {
                tracing::debug!(
                    primary = %record.primary_keyword,
                    secondary = ?record.secondary_keyword,
                    "record added"
                );
                report.inserted += 1;
            }
            InsertOutcome::Duplicate => {
                tracing::info!(
                    primary = %record.primary_keyword,
                    secondary = ?record.secondary_keyword,
                    "record already exists, keeping existing"
                );
                report.duplicates += 1;
            }
        }
    }

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryKeywordStore;

    const CORPUS: &str = "\
цена, , Стоимость 100р
цена, доставка, Доставка 200р, оплата при получении

адрес без запятых
, пусто, ответ
график, выходные,
цена, , Другой ответ
";

    #[test]
    fn test_parse_corpus() {
        let parsed = parse_corpus(CORPUS);

        assert_eq!(parsed.records.len(), 3);
        assert_eq!(parsed.records[0], KeywordRecord::new("цена", "Стоимость 100р"));
        assert_eq!(
            parsed.records[1],
            KeywordRecord::new("цена", "Доставка 200р, оплата при получении")
                .with_secondary("доставка")
        );

        let bad: Vec<_> = parsed.malformed.iter().map(|m| m.line).collect();
        assert_eq!(bad, vec![4, 5, 6]);
    }

    #[test]
    fn test_ingest_counts_duplicates() {
        let parsed = parse_corpus(CORPUS);
        let mut store = MemoryKeywordStore::new();

        let report = ingest(&mut store, &parsed.records).unwrap();

        assert_eq!(report, IngestReport { inserted: 2, duplicates: 1 });
        assert_eq!(store.query("цена").unwrap()[0].answer, "Стоимость 100р");
    }
}
