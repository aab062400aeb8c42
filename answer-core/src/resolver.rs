//! Answer resolution: question text in, answer decision out.
//!
//! Pipeline: normalize the question, extract primary keywords, collect every
//! store record filed under those keywords, then narrow the candidates with
//! secondary keywords. Accepted answers are consulted by the caller before
//! resolution starts; rejected answers only matter for [`Resolver::next_candidate`].

use crate::diagnostics::DiagnosticFlag;
use crate::keywords::{KeywordIndex, KeywordMatcher, SubstringMatcher};
use crate::memory::AnswerMemory;
use crate::normalize::Normalizer;
use crate::store::{Candidate, KeywordStore};
use crate::synonyms::SynonymTable;

/// Outcome of resolving a question.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolutionResult {
    /// Exactly one answer was selected.
    Answered(String),
    /// Several candidates remain and the user should pick one.
    NeedsClarification(Vec<Candidate>),
    /// Nothing matched; the flags say why.
    NotFound(Vec<DiagnosticFlag>),
}

impl ResolutionResult {
    /// The selected answer, if any.
    pub fn answer(&self) -> Option<&str> {
        match self {
            ResolutionResult::Answered(answer) => Some(answer),
            _ => None,
        }
    }
}

/// Outcome of asking for another answer after a rejection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NextCandidate {
    /// First stored answer not yet rejected for the question.
    Candidate(String),
    /// Every matching answer has been rejected.
    Exhausted,
}

/// Resolver behavior switches.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResolverConfig {
    /// When several candidates remain and no secondary keyword matches,
    /// return [`ResolutionResult::NeedsClarification`] instead of silently
    /// answering with the first candidate.
    pub clarify_ambiguous: bool,
}

/// Candidates gathered for a normalized question plus the trail of flags.
#[derive(Debug, Default)]
struct Lookup {
    candidates: Vec<Candidate>,
    flags: Vec<DiagnosticFlag>,
}

/// Turns questions into answers using the synonym index and keyword store.
pub struct Resolver {
    normalizer: Normalizer,
    index: KeywordIndex,
    matcher: Box<dyn KeywordMatcher>,
    store: Option<Box<dyn KeywordStore>>,
    config: ResolverConfig,
}

impl Resolver {
    /// Create a resolver. A `None` store resolves every question to
    /// [`ResolutionResult::NotFound`] with a store-unavailable flag.
    pub fn new(
        normalizer: Normalizer,
        synonyms: &SynonymTable,
        store: Option<Box<dyn KeywordStore>>,
    ) -> Self {
        let index = KeywordIndex::build(synonyms, &normalizer);
        Self {
            normalizer,
            index,
            matcher: Box::new(SubstringMatcher),
            store,
            config: ResolverConfig::default(),
        }
    }

    /// Replace the keyword extraction strategy.
    pub fn with_matcher(mut self, matcher: impl KeywordMatcher + 'static) -> Self {
        self.matcher = Box::new(matcher);
        self
    }

    pub fn with_config(mut self, config: ResolverConfig) -> Self {
        self.config = config;
        self
    }

    pub fn normalizer(&self) -> &Normalizer {
        &self.normalizer
    }

    pub fn index(&self) -> &KeywordIndex {
        &self.index
    }

    pub fn config(&self) -> ResolverConfig {
        self.config
    }

    /// Primary keywords found in the question.
    pub fn extract_keywords(&self, question: &str) -> Vec<String> {
        let normalized = self.normalizer.normalize(question);
        self.matcher.extract_keywords(&self.index, &normalized)
    }

    /// Every candidate for the question in collection order: keywords in
    /// match order, records in store order within each keyword.
    pub fn candidates(&self, question: &str) -> Vec<Candidate> {
        let normalized = self.normalizer.normalize(question);
        self.lookup(&normalized).candidates
    }

    /// Resolve a question against the keyword store.
    pub fn resolve(&self, question: &str) -> ResolutionResult {
        let normalized = self.normalizer.normalize(question);
        let Lookup {
            candidates,
            mut flags,
        } = self.lookup(&normalized);

        let result = match candidates.len() {
            0 => return ResolutionResult::NotFound(flags),
            1 => {
                flags.push(DiagnosticFlag::SingleMatch);
                ResolutionResult::Answered(candidates[0].answer.clone())
            }
            _ => self.disambiguate(&normalized, candidates, &mut flags),
        };

        tracing::debug!(%question, ?flags, "question resolved");
        result
    }

    /// Narrow several candidates using their secondary keywords.
    fn disambiguate(
        &self,
        normalized_question: &str,
        candidates: Vec<Candidate>,
        flags: &mut Vec<DiagnosticFlag>,
    ) -> ResolutionResult {
        for candidate in &candidates {
            let Some(secondary) = candidate.secondary_keyword.as_deref() else {
                continue;
            };
            let normalized_secondary = self.normalizer.normalize(secondary);
            if !normalized_secondary.is_empty()
                && normalized_question.contains(normalized_secondary.as_str())
            {
                flags.push(DiagnosticFlag::SecondaryKeywordMatched(secondary.to_string()));
                return ResolutionResult::Answered(candidate.answer.clone());
            }
        }

        flags.push(DiagnosticFlag::SecondaryKeywordNotFound);
        if self.config.clarify_ambiguous {
            ResolutionResult::NeedsClarification(candidates)
        } else {
            ResolutionResult::Answered(candidates[0].answer.clone())
        }
    }

    /// Fallback for questions that resolved to nothing.
    ///
    /// Walks the synonym table in order and, for each entry having a synonym
    /// equal to the whole normalized question, resolves the entry's primary
    /// keyword as if it were the question. The first entry that yields an
    /// answer wins.
    pub fn synonym_fallback(&self, question: &str) -> Option<String> {
        let normalized = self.normalizer.normalize(question);
        if normalized.is_empty() {
            return None;
        }

        let keywords: Vec<&str> = self.index.exact_synonym_matches(&normalized).collect();
        for keyword in keywords {
            match self.resolve(keyword) {
                ResolutionResult::Answered(answer) => {
                    tracing::debug!(%question, %keyword, "answered through synonym fallback");
                    return Some(answer);
                }
                ResolutionResult::NeedsClarification(candidates) => {
                    if let Some(first) = candidates.into_iter().next() {
                        return Some(first.answer);
                    }
                }
                ResolutionResult::NotFound(_) => {}
            }
        }

        None
    }

    /// First candidate whose answer has not been rejected for this question.
    ///
    /// The candidate list is recomputed from the store on every call.
    pub fn next_candidate(&self, question: &str, memory: &AnswerMemory) -> NextCandidate {
        let normalized = self.normalizer.normalize(question);

        self.lookup(&normalized)
            .candidates
            .into_iter()
            .find(|candidate| !memory.is_rejected(&normalized, &candidate.answer))
            .map(|candidate| NextCandidate::Candidate(candidate.answer))
            .unwrap_or(NextCandidate::Exhausted)
    }

    fn lookup(&self, normalized_question: &str) -> Lookup {
        let mut lookup = Lookup::default();

        let Some(store) = self.store.as_deref() else {
            lookup
                .flags
                .push(DiagnosticFlag::StoreUnavailable("no keyword store configured".into()));
            return lookup;
        };

        let keywords = self.matcher.extract_keywords(&self.index, normalized_question);
        if keywords.is_empty() {
            lookup.flags.push(DiagnosticFlag::NoKeywordsFound);
            return lookup;
        }

        for keyword in keywords {
            match store.query(&keyword) {
                Ok(found) if !found.is_empty() => {
                    lookup.flags.push(DiagnosticFlag::KeywordMatched(keyword));
                    lookup.candidates.extend(found);
                }
                Ok(_) => {}
                Err(e) => {
                    tracing::warn!(%keyword, error = %e, "keyword store query failed");
                    lookup.candidates.clear();
                    lookup.flags.push(DiagnosticFlag::StoreUnavailable(e.to_string()));
                    return lookup;
                }
            }
        }

        if lookup.candidates.is_empty() {
            lookup.flags.push(DiagnosticFlag::NoRecordsMatched);
        }

        lookup
    }
}

impl std::fmt::Debug for Resolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Resolver")
            .field("index", &self.index)
            .field("has_store", &self.store.is_some())
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
