use std::path::PathBuf;

use clap::error::ErrorKind as ClapErrorKind;
use clap::{Parser, Subcommand};

use crate::config::RuleTable;
use crate::pronunciation::{PronunciationError, Result};

#[derive(Parser, Debug)]
#[command(
    name = "phonoscore",
    version,
    about = "Score English pronunciation from a recording and report JSON"
)]
pub struct Cli {
    /// JSON file overriding any subset of the scoring rules.
    #[arg(long, global = true, value_name = "PATH")]
    pub rules: Option<PathBuf>,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Command {
    /// Assess one recording against the text it should contain.
    Assess {
        /// Audio file (WAV, MP3, FLAC, OGG, ...).
        #[arg(value_name = "AUDIO")]
        audio: PathBuf,
        /// Text the speaker was asked to read; echoed in the report.
        #[arg(value_name = "TEXT")]
        text: String,
    },
    /// Compare a recording against a reference recording with DTW.
    Compare {
        #[arg(value_name = "CANDIDATE")]
        candidate: PathBuf,
        #[arg(value_name = "REFERENCE")]
        reference: PathBuf,
    },
}

impl Cli {
    /// Default rules, or the validated `--rules` override.
    pub fn rule_table(&self) -> Result<RuleTable> {
        RuleTable::from_override(self.rules.as_deref())
            .map_err(|err| PronunciationError::config(format!("{err:#}")))
    }
}

/// One-line description of a rejected invocation, without the usage block.
pub fn usage_error_message(err: &clap::Error) -> String {
    if err.kind() == ClapErrorKind::DisplayHelpOnMissingArgumentOrSubcommand {
        return "missing subcommand: expected `assess <AUDIO> <TEXT>` or `compare <CANDIDATE> <REFERENCE>`"
            .to_string();
    }
    let rendered = err.to_string();
    let message = rendered
        .lines()
        .take_while(|line| !line.starts_with("Usage:"))
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join(" ");
    match message.strip_prefix("error: ") {
        Some(stripped) => stripped.to_string(),
        None if message.is_empty() => "invalid arguments".to_string(),
        None => message,
    }
}
