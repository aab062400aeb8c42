//! Keyword extraction over the synonym table.
//!
//! The synonym table is compiled once into a [`KeywordIndex`] holding the
//! normalized form of every keyword and synonym. Extraction itself sits
//! behind [`KeywordMatcher`] so the containment rule can be replaced without
//! touching the resolver.

use crate::normalize::Normalizer;
use crate::synonyms::SynonymTable;

/// One synonym entry with its phrases already normalized.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexedEntry {
    /// Primary keyword exactly as written in the table.
    pub keyword: String,
    /// Normalized primary keyword, `None` if it normalizes to nothing.
    pub normalized_keyword: Option<String>,
    /// Normalized synonyms in table order, empty forms dropped.
    pub normalized_synonyms: Vec<String>,
}

/// Normalized view of a [`SynonymTable`].
#[derive(Debug, Clone, Default)]
pub struct KeywordIndex {
    entries: Vec<IndexedEntry>,
}

impl KeywordIndex {
    /// Normalize every phrase of the table.
    ///
    /// Phrases that normalize to the empty string would be a substring of
    /// every question, so they are left out.
    pub fn build(table: &SynonymTable, normalizer: &Normalizer) -> Self {
        let entries = table
            .entries()
            .iter()
            .map(|entry| {
                let normalized_keyword = Some(normalizer.normalize(&entry.keyword))
                    .filter(|k| !k.is_empty());
                if normalized_keyword.is_none() {
                    tracing::warn!(keyword = %entry.keyword, "keyword normalizes to nothing");
                }

                let normalized_synonyms = entry
                    .synonyms
                    .iter()
                    .filter_map(|synonym| {
                        let normalized = normalizer.normalize(synonym);
                        if normalized.is_empty() {
                            tracing::warn!(keyword = %entry.keyword, %synonym, "synonym normalizes to nothing");
                            None
                        } else {
                            Some(normalized)
                        }
                    })
                    .collect();

                IndexedEntry {
                    keyword: entry.keyword.clone(),
                    normalized_keyword,
                    normalized_synonyms,
                }
            })
            .collect();

        Self { entries }
    }

    /// Indexed entries in table order.
    pub fn entries(&self) -> &[IndexedEntry] {
        &self.entries
    }

    /// Keywords having a synonym exactly equal to the normalized question.
    ///
    /// Stricter than extraction on purpose: this only runs after
    /// containment-based extraction already came up empty.
    pub fn exact_synonym_matches<'a>(
        &'a self,
        normalized_question: &'a str,
    ) -> impl Iterator<Item = &'a str> + 'a {
        self.entries
            .iter()
            .filter(move |entry| {
                entry
                    .normalized_synonyms
                    .iter()
                    .any(|synonym| synonym == normalized_question)
            })
            .map(|entry| entry.keyword.as_str())
    }
}

/// Strategy for finding primary keywords in a normalized question.
pub trait KeywordMatcher: Send + Sync {
    /// Return the matched primary keywords, first match first, without duplicates.
    fn extract_keywords(&self, index: &KeywordIndex, normalized_question: &str) -> Vec<String>;
}

impl<M: KeywordMatcher + ?Sized> KeywordMatcher for Box<M> {
    fn extract_keywords(&self, index: &KeywordIndex, normalized_question: &str) -> Vec<String> {
        (**self).extract_keywords(index, normalized_question)
    }
}

/// Substring containment matcher.
///
/// An entry matches when its normalized keyword, or any of its normalized
/// synonyms, occurs anywhere in the normalized question. Short phrases can
/// over-match ("кот" inside "котировка"); that is accepted behavior.
#[derive(Debug, Clone, Copy, Default)]
pub struct SubstringMatcher;

impl KeywordMatcher for SubstringMatcher {
    fn extract_keywords(&self, index: &KeywordIndex, normalized_question: &str) -> Vec<String> {
        let mut keywords: Vec<String> = Vec::new();

        for entry in index.entries() {
            let keyword_hit = entry
                .normalized_keyword
                .as_deref()
                .is_some_and(|k| normalized_question.contains(k));

            // Synonym scan stops at the first hit for this entry.
            let synonym_hit = || {
                entry
                    .normalized_synonyms
                    .iter()
                    .any(|s| normalized_question.contains(s.as_str()))
            };

            if (keyword_hit || synonym_hit()) && !keywords.contains(&entry.keyword) {
                keywords.push(entry.keyword.clone());
            }
        }

        keywords
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalize::DictionaryLemmatizer;

    fn normalizer() -> Normalizer {
        Normalizer::new(DictionaryLemmatizer::from_pairs([
            ("стоит", "стоить"),
            ("доставки", "доставка"),
            ("находитесь", "находиться"),
        ]))
    }

    fn index() -> KeywordIndex {
        let table = SynonymTable::new()
            .with_entry("цена", ["стоимость", "сколько стоит"])
            .with_entry("адрес", ["где находитесь"])
            .with_entry("доставка", Vec::<String>::new())
            .with_entry("!!!", ["..."]);
        KeywordIndex::build(&table, &normalizer())
    }

    #[test]
    fn test_index_drops_empty_phrases() {
        let index = index();
        let broken = &index.entries()[3];
        assert_eq!(broken.normalized_keyword, None);
        assert!(broken.normalized_synonyms.is_empty());
        assert_eq!(index.entries()[0].normalized_synonyms[1], "сколько стоить");
    }

    #[test]
    fn test_extract_by_synonym() {
        let index = index();
        let q = normalizer().normalize("Сколько стоит доставка?");
        let found = SubstringMatcher.extract_keywords(&index, &q);
        assert_eq!(found, vec!["цена", "доставка"]);
    }

    #[test]
    fn test_extract_by_primary_keyword() {
        let index = index();
        let found = SubstringMatcher.extract_keywords(&index, "какая цена");
        assert_eq!(found, vec!["цена"]);
    }

    #[test]
    fn test_extract_no_duplicates_when_keyword_and_synonym_hit() {
        let index = index();
        let found = SubstringMatcher.extract_keywords(&index, "цена и стоимость");
        assert_eq!(found, vec!["цена"]);
    }

    #[test]
    fn test_extract_substring_over_match() {
        let index = index();
        // "ценаа" is not a word we know, but containment still matches.
        let found = SubstringMatcher.extract_keywords(&index, "ценааа");
        assert_eq!(found, vec!["цена"]);
    }

    #[test]
    fn test_extract_nothing() {
        let index = index();
        assert!(SubstringMatcher.extract_keywords(&index, "привет").is_empty());
        assert!(SubstringMatcher.extract_keywords(&index, "").is_empty());
    }

    #[test]
    fn test_exact_synonym_matches() {
        let index = index();
        let q = normalizer().normalize("где находитесь");
        let hits: Vec<_> = index.exact_synonym_matches(&q).collect();
        assert_eq!(hits, vec!["адрес"]);

        let q = normalizer().normalize("где вы находитесь");
        assert_eq!(index.exact_synonym_matches(&q).count(), 0);
    }
}
