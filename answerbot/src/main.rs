//! Answer bot console application.
//!
//! Answers questions from a keyword database and learns from yes/no
//! feedback.
//!
//! ```bash
//! cargo run -p answerbot -- ingest corpus.txt
//! cargo run -p answerbot -- --clarify chat
//! cargo run -p answerbot -- ask "Сколько стоит доставка?"
//! ```

mod console;
mod logging;

use answer_core::store::KeywordStore;
use answer_core::{
    ingest, parse_corpus, ResolutionResult, Responder, ResponderConfig, SqliteKeywordStore,
};
use anyhow::Context;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};

#[derive(Parser, Debug)]
#[command(name = "answerbot", version, about = "Keyword-driven question answering bot")]
struct Cli {
    /// Data directory holding the database, synonyms and answer memory.
    /// Overrides ANSWERBOT_DATA_DIR and the per-file environment settings.
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Keyword database path.
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    /// Synonym table path (JSON).
    #[arg(long, global = true)]
    synonyms: Option<PathBuf>,

    /// Lexicon path (TSV of form and lemma).
    #[arg(long, global = true)]
    lexicon: Option<PathBuf>,

    /// Offer a numbered menu when several answers fit.
    #[arg(long, global = true)]
    clarify: bool,

    /// Log as JSON lines.
    #[arg(long, global = true, env = "ANSWERBOT_LOG_JSON")]
    log_json: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Chat on stdin/stdout (default).
    Chat,
    /// Load a corpus file into the keyword database.
    Ingest {
        /// One record per line: primary, secondary, answer.
        corpus: PathBuf,
    },
    /// Resolve one question and print how it was answered.
    Ask {
        #[arg(required = true)]
        question: Vec<String>,
    },
}

impl Cli {
    fn config(&self) -> ResponderConfig {
        let mut config = match &self.data_dir {
            Some(dir) => ResponderConfig::new(dir),
            None => ResponderConfig::from_env(),
        };

        if let Some(db) = &self.db {
            config = config.with_keyword_db(db);
        }
        if let Some(synonyms) = &self.synonyms {
            config = config.with_synonyms(synonyms);
        }
        if let Some(lexicon) = &self.lexicon {
            config = config.with_lexicon(lexicon);
        }
        if self.clarify {
            config = config.with_clarify_ambiguous(true);
        }
        config
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    logging::init_tracing(cli.log_json);

    let config = cli.config();
    tracing::debug!(?config, "configuration resolved");

    match cli.command.unwrap_or(Command::Chat) {
        Command::Chat => {
            let responder = Responder::open(&config).context("failed to open responder")?;
            console::run_console(responder).await
        }
        Command::Ingest { corpus } => run_ingest(&config, &corpus).await,
        Command::Ask { question } => run_ask(&config, &question.join(" ")),
    }
}

async fn run_ingest(config: &ResponderConfig, corpus: &Path) -> anyhow::Result<()> {
    let text = tokio::fs::read_to_string(corpus)
        .await
        .with_context(|| format!("failed to read corpus {}", corpus.display()))?;

    let parsed = parse_corpus(&text);
    for bad in &parsed.malformed {
        println!("[SKIPPED] line {}: {}", bad.line, bad.content);
    }

    if let Some(parent) = config
        .keyword_db_path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
    {
        tokio::fs::create_dir_all(parent).await?;
    }

    let mut store = SqliteKeywordStore::open(&config.keyword_db_path).with_context(|| {
        format!(
            "failed to open keyword database {}",
            config.keyword_db_path.display()
        )
    })?;
    let report = ingest(&mut store, &parsed.records)?;

    println!(
        "[INGESTED] {} added, {} duplicates kept, {} malformed lines skipped",
        report.inserted,
        report.duplicates,
        parsed.malformed.len()
    );
    println!(
        "[STORE] {} records in {}",
        store.record_count()?,
        config.keyword_db_path.display()
    );
    Ok(())
}

fn run_ask(config: &ResponderConfig, question: &str) -> anyhow::Result<()> {
    let responder = Responder::open(config).context("failed to open responder")?;
    let resolver = responder.resolver();

    let normalized = resolver.normalizer().normalize(question);
    println!("[NORMALIZED] {normalized}");
    println!("[KEYWORDS] {}", resolver.extract_keywords(question).join(", "));

    if let Some(answer) = responder.memory().accepted_answer(&normalized) {
        println!("[MEMORY] {answer}");
        return Ok(());
    }

    match resolver.resolve(question) {
        ResolutionResult::Answered(answer) => println!("[ANSWER] {answer}"),
        ResolutionResult::NeedsClarification(candidates) => {
            println!("[AMBIGUOUS]");
            for (i, candidate) in candidates.iter().enumerate() {
                println!("  {}. {}", i + 1, candidate.label());
            }
        }
        ResolutionResult::NotFound(flags) => {
            for flag in &flags {
                println!("[FLAG] {flag}");
            }
            match resolver.synonym_fallback(question) {
                Some(answer) => println!("[SYNONYM] {answer}"),
                None => println!("[NOT FOUND] {}", responder.messages().not_found),
            }
        }
    }

    Ok(())
}
