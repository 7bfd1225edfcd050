use clap::{Parser, Subcommand};
use log::{info, warn};
use std::path::{Path, PathBuf};

use crate::config::Config;
use crate::error::{AppError, AppResult};
use crate::services::{
    HintSession, PedagogicalResponseParser, SymbolTable, Tutor, normalize_ocr_text,
};

#[derive(Parser)]
#[command(name = "mathtutor")]
#[command(author, version, about = "OCR cleanup and guided solutions for school math problems", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the web server
    Serve,

    /// Clean OCR text and print its display form
    Normalize {
        /// Raw OCR text
        text: String,
    },

    /// Parse a saved model response into a step-by-step analysis
    Parse {
        /// File holding the raw model output
        file: PathBuf,
        /// Problem the response belongs to
        #[arg(long, default_value = "")]
        problem: String,
    },

    /// Ask the configured model for a step-by-step analysis
    Analyze {
        /// Problem statement
        problem: String,
    },

    /// Reveal hints one at a time until none are left
    Hints {
        /// Problem statement
        problem: String,
        /// Maximum number of hints (defaults to MAX_HINTS)
        #[arg(long)]
        max: Option<usize>,
    },
}

pub fn handle_normalize(text: &str) {
    let table = SymbolTable::romanian_math();
    let expr = normalize_ocr_text(&table, text);
    println!("cleaned: {}", expr.cleaned_text);
    println!("latex:   {}", expr.latex);
}

pub fn handle_parse(file: &Path, problem: &str) -> AppResult<()> {
    let raw = std::fs::read_to_string(file)?;
    let outcome = PedagogicalResponseParser::new().parse_outcome(&raw, problem);
    if !outcome.is_valid() {
        warn!("Response in {} is not valid JSON; showing the best-effort reading", file.display());
    }
    print_json(outcome.analysis())
}

pub async fn handle_analyze(config: &Config, problem: &str) -> AppResult<()> {
    let tutor = Tutor::from_config(config)?;
    let analysis = tutor.analyze(problem).await?;
    print_json(&analysis)
}

pub async fn handle_hints(config: &Config, problem: &str, max: Option<usize>) -> AppResult<()> {
    let tutor = Tutor::from_config(config)?;
    let mut session = HintSession::new(problem, max.unwrap_or(config.max_hints), tutor.hint_provider());
    info!("Hint session {} started", session.id());

    while !session.is_exhausted() {
        match session.request_next().await {
            Ok(record) => println!("💡 {}. {}", record.step_index + 1, record.content),
            Err(AppError::HintsExhausted) => break,
            Err(e) => return Err(e),
        }
    }

    println!("--- {} hint(s) revealed ---", session.current_hints().len());
    Ok(())
}

fn print_json<T: serde::Serialize>(value: &T) -> AppResult<()> {
    let json = serde_json::to_string_pretty(value).map_err(|e| AppError::Io(e.into()))?;
    println!("{}", json);
    Ok(())
}
