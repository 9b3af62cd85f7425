//! Core scanning logic
//!
//! Establishes the provider session, runs the audit, and emits the report.

use std::time::Instant;

use audit_kit::execution_api::{run_audit, AuditError};
use audit_kit::tree::AuditTree;

use crate::backend::{self, BackendError};
use crate::config::RunConfig;
use crate::output::{self, OutputError};

/// Run one audit with the given configuration
pub fn run_scan(config: &RunConfig) -> Result<(), ScanError> {
    let start = Instant::now();

    log::info!(
        "Starting audit (region {}, {} workers, {}s call timeout)",
        config.audit.region,
        config.audit.workers,
        config.audit.timeout_secs
    );

    let session = backend::create_session(&config.audit).map_err(|e| {
        log::error!("Session setup failed: {}", e);
        ScanError::Setup(e)
    })?;

    let tree = run_audit(&session)?;

    let json = output::render_report(&tree)?;
    output::write_report(&json, config.output_file.as_deref())?;

    log_summary(&tree);
    if let Some(path) = &config.output_file {
        log::info!("Report saved to {}", path.display());
    }
    log::info!("Scan finished in {:.2}s", start.elapsed().as_secs_f64());

    Ok(())
}

fn log_summary(tree: &AuditTree) {
    if let Some(iam) = &tree.audit.iam {
        let keys: usize = iam.users.iter().map(|u| u.keys.len()).sum();
        log::info!("Identity: {} users, {} access keys", iam.users.len(), keys);
    }
    if let Some(kms) = &tree.audit.kms {
        log::info!(
            "Key management: {} keys, {} referencing policies",
            kms.keys.len(),
            kms.iam_policy_references.len()
        );
    }
}

/// Errors that can occur during a scan
#[derive(Debug, thiserror::Error)]
pub enum ScanError {
    #[error("setup failed: {0}")]
    Setup(#[from] BackendError),

    #[error(transparent)]
    Audit(#[from] AuditError),

    #[error(transparent)]
    Output(#[from] OutputError),
}
