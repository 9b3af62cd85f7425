//! Configuration types for the audit agent
//!
//! Settings come from an optional TOML file and are overridden by
//! command-line flags:
//!
//! ```toml
//! region = "eu-west-1"
//! profile = "security-audit"
//! workers = 8
//! timeout_secs = 30
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

/// Region audited when none is configured
pub const DEFAULT_REGION: &str = "us-east-1";

/// Per-call timeout when none is configured
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Provider and execution settings for one audit
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AuditConfig {
    /// Region for key-management calls (identity is global)
    pub region: String,

    /// Named credentials profile; default provider chain when absent
    pub profile: Option<String>,

    /// Worker threads for per-user and per-key lookups
    pub workers: usize,

    /// Timeout applied to each provider call
    pub timeout_secs: u64,
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            region: DEFAULT_REGION.to_string(),
            profile: None,
            workers: num_cpus::get(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

impl AuditConfig {
    /// Parse configuration from TOML text
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text).map_err(ConfigError::Parse)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a TOML file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    /// Check value ranges
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.region.trim().is_empty() {
            return Err(ConfigError::Invalid("region must not be empty".to_string()));
        }
        if self.workers == 0 {
            return Err(ConfigError::Invalid("workers must be at least 1".to_string()));
        }
        if self.timeout_secs == 0 {
            return Err(ConfigError::Invalid(
                "timeout_secs must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Configuration for an agent run
#[derive(Debug, Clone)]
pub struct RunConfig {
    /// Provider and execution settings
    pub audit: AuditConfig,

    /// Report destination (None means standard output)
    pub output_file: Option<PathBuf>,
}

/// Errors that can occur while building the configuration
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file: {0}")]
    Parse(#[source] toml::de::Error),

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

#[allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::indexing_slicing,
    clippy::panic
)]
