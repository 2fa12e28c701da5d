use std::path::Path;
use std::process::ExitCode;

use clap::error::ErrorKind as ClapErrorKind;
use clap::Parser;
use serde::Serialize;
use tracing::error;
use tracing_subscriber::EnvFilter;

use phonoscore::config::RuleTable;
use phonoscore::pronunciation::cli::{usage_error_message, Cli, Command};
use phonoscore::pronunciation::report::{failure_json, success_json};
use phonoscore::pronunciation::{AlignmentResult, Assessor, ReferenceAligner, Result, Waveform};

fn main() -> ExitCode {
    init_tracing();

    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => match err.kind() {
            ClapErrorKind::DisplayHelp | ClapErrorKind::DisplayVersion => err.exit(),
            _ => {
                println!("{}", failure_json(&usage_error_message(&err)));
                return ExitCode::FAILURE;
            }
        },
    };

    let rules = match cli.rule_table() {
        Ok(rules) => rules,
        Err(err) => {
            error!(error = %err, "failed to load rule table");
            println!("{}", failure_json(err.message()));
            return ExitCode::FAILURE;
        }
    };

    match cli.command {
        Command::Assess { audio, text } => report(Assessor::new(rules).assess_file(&audio, &text)),
        Command::Compare {
            candidate,
            reference,
        } => report(compare(rules, &candidate, &reference)),
    }
}

fn compare(rules: RuleTable, candidate: &Path, reference: &Path) -> Result<AlignmentResult> {
    let candidate = Waveform::load(candidate)?;
    let reference = Waveform::load(reference)?;
    ReferenceAligner::new(rules.alignment).align(&candidate, &reference)
}

/// Print the outcome as JSON. Load and alignment failures are reported, not
/// signalled through the exit status.
fn report<T: Serialize>(outcome: Result<T>) -> ExitCode {
    match outcome {
        Ok(body) => println!("{}", success_json(&body)),
        Err(err) => {
            error!(kind = ?err.kind(), error = %err, "request failed");
            println!("{}", failure_json(err.message()));
        }
    }
    ExitCode::SUCCESS
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
