//! Responder configuration: file locations, behavior switches and the texts
//! shown to users.

use crate::feedback::FeedbackVocabulary;
use std::env;
use std::path::{Path, PathBuf};

/// User-facing message texts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Messages {
    /// Reply to the start command.
    pub greeting: String,
    /// Sent after every answer that can be confirmed.
    pub feedback_prompt: String,
    /// Reply when nothing matched. Never memorized as an accepted answer.
    pub not_found: String,
    /// Reply when every candidate has been rejected.
    pub exhausted: String,
    /// Reply to feedback on the `not_found` text.
    pub sentinel_refused: String,
    /// Reply when feedback is neither yes nor no.
    pub invalid_feedback: String,
    /// Reply after an accepted answer.
    pub thanks: String,
    /// First line of a clarification menu.
    pub clarify_header: String,
}

impl Default for Messages {
    fn default() -> Self {
        Self {
            greeting: "Привет! Я бот для ответов на вопросы. Задайте мне вопрос, и я постараюсь помочь."
                .to_string(),
            feedback_prompt: "Ответил ли я на ваш вопрос? (Да/Нет)".to_string(),
            not_found: "Извините, я не могу найти ответ на ваш вопрос.".to_string(),
            exhausted: "Извините, я не смог найти подходящий ответ. Пожалуйста, обратитесь к администратору."
                .to_string(),
            sentinel_refused: "Этот ответ не может быть сохранён как успешный.".to_string(),
            invalid_feedback: "Пожалуйста, ответьте 'Да' или 'Нет'.".to_string(),
            thanks: "Спасибо за обратную связь! Рад, что смог помочь.".to_string(),
            clarify_header: "Уточните, пожалуйста:".to_string(),
        }
    }
}

/// Configuration for opening a [`crate::Responder`].
#[derive(Debug, Clone)]
pub struct ResponderConfig {
    /// Directory the default file names are resolved against.
    pub data_dir: PathBuf,

    /// SQLite keyword database.
    pub keyword_db_path: PathBuf,

    /// Accepted answers document.
    pub accepted_path: PathBuf,

    /// Rejected answers document.
    pub rejected_path: PathBuf,

    /// Synonym table (JSON object).
    pub synonyms_path: PathBuf,

    /// Optional form-to-lemma dictionary. Without one, tokens are only
    /// lower-cased.
    pub lexicon_path: Option<PathBuf>,

    /// Failure log.
    pub diagnostic_log_path: PathBuf,

    /// Ask the user to pick when several answers remain.
    pub clarify_ambiguous: bool,

    /// Accept and reject words.
    pub vocabulary: FeedbackVocabulary,

    pub messages: Messages,
}

impl ResponderConfig {
    pub const DEFAULT_DATA_DIR: &'static str = "Data";

    /// Config with every file under `data_dir` using the default names.
    /// The lexicon is used only if `lexicon.tsv` exists there.
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        let data_dir = data_dir.into();
        let lexicon = data_dir.join("lexicon.tsv");

        Self {
            keyword_db_path: data_dir.join("data.db"),
            accepted_path: data_dir.join("successful_answers.json"),
            rejected_path: data_dir.join("unsuccessful_answers.json"),
            synonyms_path: data_dir.join("synonyms.json"),
            lexicon_path: lexicon.exists().then_some(lexicon),
            diagnostic_log_path: data_dir.join("log.txt"),
            clarify_ambiguous: false,
            vocabulary: FeedbackVocabulary::default(),
            messages: Messages::default(),
            data_dir,
        }
    }

    /// Read overrides from `ANSWERBOT_*` environment variables.
    pub fn from_env() -> Self {
        let data_dir = env::var_os("ANSWERBOT_DATA_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(Self::DEFAULT_DATA_DIR));

        let mut config = Self::new(data_dir);
        if let Some(db) = env::var_os("ANSWERBOT_DB") {
            config = config.with_keyword_db(db);
        }
        if let Some(synonyms) = env::var_os("ANSWERBOT_SYNONYMS") {
            config = config.with_synonyms(synonyms);
        }
        if let Some(lexicon) = env::var_os("ANSWERBOT_LEXICON") {
            config = config.with_lexicon(lexicon);
        }
        if let Ok(clarify) = env::var("ANSWERBOT_CLARIFY") {
            config = config.with_clarify_ambiguous(parse_flag(&clarify));
        }
        config
    }

    pub fn with_keyword_db(mut self, path: impl Into<PathBuf>) -> Self {
        self.keyword_db_path = path.into();
        self
    }

    pub fn with_answer_memory(
        mut self,
        accepted: impl Into<PathBuf>,
        rejected: impl Into<PathBuf>,
    ) -> Self {
        self.accepted_path = accepted.into();
        self.rejected_path = rejected.into();
        self
    }

    pub fn with_synonyms(mut self, path: impl Into<PathBuf>) -> Self {
        self.synonyms_path = path.into();
        self
    }

    pub fn with_lexicon(mut self, path: impl Into<PathBuf>) -> Self {
        self.lexicon_path = Some(path.into());
        self
    }

    pub fn with_diagnostic_log(mut self, path: impl Into<PathBuf>) -> Self {
        self.diagnostic_log_path = path.into();
        self
    }

    pub fn with_clarify_ambiguous(mut self, clarify: bool) -> Self {
        self.clarify_ambiguous = clarify;
        self
    }

    pub fn with_vocabulary(mut self, vocabulary: FeedbackVocabulary) -> Self {
        self.vocabulary = vocabulary;
        self
    }

    pub fn with_messages(mut self, messages: Messages) -> Self {
        self.messages = messages;
        self
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }
}

impl Default for ResponderConfig {
    fn default() -> Self {
        Self::new(Self::DEFAULT_DATA_DIR)
    }
}

fn parse_flag(value: &str) -> bool {
    matches!(
        value.trim().to_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_layout() {
        let config = ResponderConfig::new("/srv/bot");
        assert_eq!(config.keyword_db_path, PathBuf::from("/srv/bot/data.db"));
        assert_eq!(
            config.accepted_path,
            PathBuf::from("/srv/bot/successful_answers.json")
        );
        assert_eq!(
            config.rejected_path,
            PathBuf::from("/srv/bot/unsuccessful_answers.json")
        );
        assert_eq!(config.diagnostic_log_path, PathBuf::from("/srv/bot/log.txt"));
        assert!(!config.clarify_ambiguous);
    }

    #[test]
    fn test_lexicon_picked_up_when_present() {
        let dir = TempDir::new().expect("Failed to create temp dir");
        assert_eq!(ResponderConfig::new(dir.path()).lexicon_path, None);

        std::fs::write(dir.path().join("lexicon.tsv"), "стоит\tстоить\n").unwrap();
        assert_eq!(
            ResponderConfig::new(dir.path()).lexicon_path,
            Some(dir.path().join("lexicon.tsv"))
        );
    }

    #[test]
    fn test_builder_overrides() {
        let config = ResponderConfig::new("data")
            .with_keyword_db("other.db")
            .with_clarify_ambiguous(true)
            .with_vocabulary(FeedbackVocabulary::new(["yes"], ["no"]));

        assert_eq!(config.keyword_db_path, PathBuf::from("other.db"));
        assert!(config.clarify_ambiguous);
        assert_eq!(config.data_dir(), Path::new("data"));
    }

    #[test]
    fn test_parse_flag() {
        assert!(parse_flag("TRUE"));
        assert!(parse_flag(" 1 "));
        assert!(!parse_flag("0"));
        assert!(!parse_flag("nope"));
    }
}
