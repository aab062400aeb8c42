//! Text normalization into lemma sequences.
//!
//! Every comparison in the engine happens on the canonical form produced
//! here: lower-cased word tokens, each reduced to its dictionary base form,
//! joined by single spaces in original order. The canonical form is a
//! comparison key only and is never shown to users.

use regex::Regex;
use std::collections::HashMap;
use std::fmt;
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;

lazy_static::lazy_static! {
    /// Unicode word characters; punctuation and whitespace separate tokens.
    static ref WORD: Regex = Regex::new(r"\w+").unwrap();
}

/// Errors from loading a lexicon.
#[derive(Debug, Error)]
pub enum LexiconError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Malformed lexicon line {line}: {content}")]
    MalformedLine { line: usize, content: String },
}

/// Morphological capability: maps a single token to its base form.
pub trait Lemmatizer: Send + Sync {
    /// Return the dictionary base form of a lower-cased word token.
    fn base_form(&self, token: &str) -> String;
}

/// Lemmatizer that leaves tokens untouched.
#[derive(Debug, Clone, Copy, Default)]
pub struct IdentityLemmatizer;

impl Lemmatizer for IdentityLemmatizer {
    fn base_form(&self, token: &str) -> String {
        token.to_string()
    }
}

/// Dictionary-backed lemmatizer.
///
/// Holds a `form -> lemma` table. Chains (`a -> b`, `b -> c`) are followed
/// to their terminal lemma on lookup, and entries that would close a cycle
/// are refused, so the base form of a base form is always itself.
#[derive(Debug, Clone, Default)]
pub struct DictionaryLemmatizer {
    lemmas: HashMap<String, String>,
}

impl DictionaryLemmatizer {
    /// Create an empty dictionary.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a dictionary from `(form, lemma)` pairs.
    pub fn from_pairs<I, F, L>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (F, L)>,
        F: AsRef<str>,
        L: AsRef<str>,
    {
        let mut dict = Self::new();
        for (form, lemma) in pairs {
            dict.insert(form.as_ref(), lemma.as_ref());
        }
        dict
    }

    /// Load a dictionary from a TSV file (`form<TAB>lemma` per line).
    pub fn load(path: impl AsRef<Path>) -> Result<Self, LexiconError> {
        let content = std::fs::read_to_string(path)?;
        Self::parse(&content)
    }

    /// Parse TSV lexicon text. `#` starts a comment line; blank lines are ignored.
    pub fn parse(content: &str) -> Result<Self, LexiconError> {
        let mut dict = Self::new();

        for (index, raw) in content.lines().enumerate() {
            let line = raw.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            let mut parts = line.split('\t');
            match (parts.next(), parts.next(), parts.next()) {
                (Some(form), Some(lemma), None) if !form.trim().is_empty() => {
                    dict.insert(form.trim(), lemma.trim());
                }
                _ => {
                    return Err(LexiconError::MalformedLine {
                        line: index + 1,
                        content: raw.to_string(),
                    })
                }
            }
        }

        Ok(dict)
    }

    /// Add a `form -> lemma` entry. Returns false if the entry was refused.
    pub fn insert(&mut self, form: &str, lemma: &str) -> bool {
        let form = form.to_lowercase();
        let lemma = lemma.to_lowercase();

        if !is_single_token(&form) || !is_single_token(&lemma) {
            tracing::warn!(%form, %lemma, "lexicon entry is not a single word, skipping");
            return false;
        }

        if form == lemma {
            return false;
        }

        // Refuse edges that would make `form` reachable from itself.
        let mut cursor = lemma.as_str();
        for _ in 0..=self.lemmas.len() {
            if cursor == form {
                tracing::warn!(%form, %lemma, "lexicon entry would create a cycle, skipping");
                return false;
            }
            match self.lemmas.get(cursor) {
                Some(next) => cursor = next,
                None => break,
            }
        }

        self.lemmas.insert(form, lemma);
        true
    }

    /// Number of dictionary entries.
    pub fn len(&self) -> usize {
        self.lemmas.len()
    }

    /// Whether the dictionary has no entries.
    pub fn is_empty(&self) -> bool {
        self.lemmas.is_empty()
    }
}

impl Lemmatizer for DictionaryLemmatizer {
    fn base_form(&self, token: &str) -> String {
        let mut cursor = token;
        // Bounded by entry count; insert() keeps the graph acyclic.
        for _ in 0..=self.lemmas.len() {
            match self.lemmas.get(cursor) {
                Some(next) => cursor = next,
                None => break,
            }
        }
        cursor.to_string()
    }
}

fn is_single_token(text: &str) -> bool {
    WORD.find(text)
        .map(|m| m.start() == 0 && m.end() == text.len())
        .unwrap_or(false)
}

/// Maps arbitrary text to its canonical lemma sequence.
#[derive(Clone)]
pub struct Normalizer {
    lemmatizer: Arc<dyn Lemmatizer>,
}

impl Normalizer {
    /// Create a normalizer backed by the given lemmatizer.
    pub fn new(lemmatizer: impl Lemmatizer + 'static) -> Self {
        Self {
            lemmatizer: Arc::new(lemmatizer),
        }
    }

    /// Create a normalizer that only lower-cases and tokenizes.
    pub fn identity() -> Self {
        Self::new(IdentityLemmatizer)
    }

    /// Normalize text: tokenize on word characters, lower-case, lemmatize,
    /// and rejoin with single spaces.
    pub fn normalize(&self, text: &str) -> String {
        self.lemmas(text).join(" ")
    }

    /// The lemma sequence of `text`, in original order.
    pub fn lemmas(&self, text: &str) -> Vec<String> {
        let lowered = text.to_lowercase();
        WORD.find_iter(&lowered)
            .map(|m| {
                let lemma = self.lemmatizer.base_form(m.as_str());
                // A misbehaving lemmatizer must not break the comparison key.
                if is_single_token(&lemma) {
                    lemma.to_lowercase()
                } else {
                    m.as_str().to_string()
                }
            })
            .collect()
    }
}

impl Default for Normalizer {
    fn default() -> Self {
        Self::identity()
    }
}

impl fmt::Debug for Normalizer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Normalizer").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn russian() -> Normalizer {
        Normalizer::new(DictionaryLemmatizer::from_pairs([
            ("стоит", "стоить"),
            ("доставки", "доставка"),
            ("доставку", "доставка"),
            ("цены", "цена"),
        ]))
    }

    #[test]
    fn test_normalize_strips_punctuation_and_case() {
        let n = Normalizer::identity();
        assert_eq!(n.normalize("Hello,   World!!"), "hello world");
    }

    #[test]
    fn test_normalize_empty() {
        let n = russian();
        assert_eq!(n.normalize(""), "");
        assert_eq!(n.normalize("?!. ,"), "");
    }

    #[test]
    fn test_normalize_lemmatizes_in_order() {
        let n = russian();
        assert_eq!(
            n.normalize("Сколько СТОИТ доставка?"),
            "сколько стоить доставка"
        );
        assert_eq!(n.normalize("цены доставки"), "цена доставка");
    }

    #[test]
    fn test_dictionary_follows_chains() {
        let dict = DictionaryLemmatizer::from_pairs([("a", "b"), ("b", "c")]);
        assert_eq!(dict.base_form("a"), "c");
        assert_eq!(dict.base_form("c"), "c");
    }

    #[test]
    fn test_dictionary_refuses_cycles() {
        let mut dict = DictionaryLemmatizer::from_pairs([("a", "b"), ("b", "c")]);
        assert!(!dict.insert("c", "a"));
        assert_eq!(dict.base_form("c"), "c");
    }

    #[test]
    fn test_dictionary_refuses_multiword_lemma() {
        let mut dict = DictionaryLemmatizer::new();
        assert!(!dict.insert("из-за", "из за"));
        assert!(dict.is_empty());
    }

    #[test]
    fn test_parse_tsv() {
        let dict = DictionaryLemmatizer::parse("# comment\nстоит\tстоить\n\nЦены\tцена\n")
            .expect("valid lexicon");
        assert_eq!(dict.len(), 2);
        assert_eq!(dict.base_form("цены"), "цена");
    }

    #[test]
    fn test_parse_tsv_malformed() {
        let err = DictionaryLemmatizer::parse("стоит стоить\n").unwrap_err();
        assert!(matches!(err, LexiconError::MalformedLine { line: 1, .. }));
    }

    proptest! {
        #[test]
        fn normalize_is_idempotent(text in "[a-zA-Zа-яА-ЯёЁ0-9 ,.!?-]{0,48}") {
            let n = russian();
            let once = n.normalize(&text);
            prop_assert_eq!(n.normalize(&once), once);
        }
    }
}
