//! Command-line interface parsing
//!
//! Flags override values from the optional `--config` file.

use std::path::PathBuf;

use clap::{ArgAction, Parser};

use crate::config::{AuditConfig, ConfigError, RunConfig};

/// Read-only IAM and KMS security-posture audit
#[derive(Debug, Parser)]
#[command(name = "paws_audit", version, about, long_about = None)]
#[command(after_help = "EXIT CODES:\n    0    Report written\n    2    Execution error (no report is written)")]
pub struct Cli {
    /// TOML configuration file
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Region to audit key-management resources in
    #[arg(short, long)]
    pub region: Option<String>,

    /// Named credentials profile
    #[arg(short, long)]
    pub profile: Option<String>,

    /// Worker threads for per-entity lookups
    #[arg(short, long)]
    pub workers: Option<usize>,

    /// Per-call timeout in seconds
    #[arg(short, long, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Write the report to a file instead of standard output
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,
}

impl Cli {
    /// Log filter implied by `--verbose`
    pub fn log_level(&self) -> &'static str {
        match self.verbose {
            0 => "warn",
            1 => "info",
            _ => "debug",
        }
    }

    /// Merge the config file (if any) with command-line overrides
    pub fn into_run_config(self) -> Result<RunConfig, ConfigError> {
        let mut audit = match &self.config {
            Some(path) => AuditConfig::load(path)?,
            None => AuditConfig::default(),
        };

        if let Some(region) = self.region {
            audit.region = region;
        }
        if self.profile.is_some() {
            audit.profile = self.profile;
        }
        if let Some(workers) = self.workers {
            audit.workers = workers;
        }
        if let Some(timeout) = self.timeout {
            audit.timeout_secs = timeout;
        }
        audit.validate()?;

        Ok(RunConfig {
            audit,
            output_file: self.output,
        })
    }
}

#[allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::indexing_slicing,
    clippy::panic
)]
