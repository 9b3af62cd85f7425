//! Report rendering
//!
//! The report is rendered in full before anything is written, so a failed
//! run never leaves partial output behind.

use std::io::Write;
use std::path::{Path, PathBuf};

use audit_kit::tree::AuditTree;

/// Render the audit tree as pretty-printed JSON (2-space indent, trailing newline)
pub fn render_report(tree: &AuditTree) -> Result<String, OutputError> {
    let mut json = serde_json::to_string_pretty(tree).map_err(OutputError::Serialization)?;
    json.push('\n');
    Ok(json)
}

/// Write a rendered report to `path`, or to standard output when `None`
pub fn write_report(json: &str, path: Option<&Path>) -> Result<(), OutputError> {
    match path {
        Some(path) => std::fs::write(path, json).map_err(|source| OutputError::WriteFile {
            path: path.to_path_buf(),
            source,
        }),
        None => {
            let mut stdout = std::io::stdout().lock();
            stdout
                .write_all(json.as_bytes())
                .and_then(|()| stdout.flush())
                .map_err(OutputError::Stdout)
        }
    }
}

/// Errors that can occur while producing the report
#[derive(Debug, thiserror::Error)]
pub enum OutputError {
    #[error("failed to serialize report: {0}")]
    Serialization(#[source] serde_json::Error),

    #[error("failed to write {}: {source}", path.display())]
    WriteFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write report to stdout: {0}")]
    Stdout(#[source] std::io::Error),
}

#[allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::indexing_slicing,
    clippy::panic
)]
