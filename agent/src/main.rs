//! # PAWS Audit Agent
//!
//! Read-only security-posture audit of an account's identity and
//! key-management configuration.
//!
//! ## Usage
//!
//! ```bash
//! # Audit with the default credential chain, report to stdout
//! paws_audit
//!
//! # Named profile and region, report to a file
//! paws_audit --profile security-audit --region eu-west-1 -o report.json
//!
//! # Settings from a file, with progress logging
//! paws_audit --config paws.toml -v
//! ```
//!
//! The report is a single JSON document with an `audit` root holding the
//! `iam` and `kms` subtrees. Any error aborts the run with exit status 2
//! and no report.

mod backend;
mod cli;
mod config;
mod output;
mod scanner;

use clap::Parser;
use env_logger::{Env, Target};

use cli::Cli;

fn main() {
    let cli = Cli::parse();

    if let Err(e) = env_logger::Builder::from_env(Env::default().default_filter_or(cli.log_level()))
        .target(Target::Stderr)
        .try_init()
    {
        eprintln!("Failed to initialize logging: {}", e);
        std::process::exit(2);
    }

    let exit_code = match run(cli) {
        Ok(()) => 0,
        Err(e) => {
            eprintln!("Error: {}", error_chain(e.as_ref()));
            2
        }
    };

    std::process::exit(exit_code);
}

fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let config = cli.into_run_config()?;
    scanner::run_scan(&config)?;
    Ok(())
}

/// Join an error and its sources into one line
fn error_chain(err: &dyn std::error::Error) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        let cause_text = cause.to_string();
        if !message.contains(&cause_text) {
            message.push_str(": ");
            message.push_str(&cause_text);
        }
        source = cause.source();
    }
    message
}
