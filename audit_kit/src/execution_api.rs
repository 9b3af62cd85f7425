//! # Audit Execution API
//!
//! Runs an ordered list of collectors against one session and assembles
//! their subtrees into a single [`AuditTree`].
//!
//! Collectors run strictly one after another, in registration order. The
//! first failure aborts the run: no tree is returned, so a partial report can
//! never be serialized.
//!
//! ## Example
//!
//! ```ignore
//! use audit_kit::execution_api::run_audit;
//!
//! let session = AuditSession::new(region, identity, key_management, pool);
//! let tree = run_audit(&session)?;
//! println!("{}", serde_json::to_string_pretty(&tree)?);
//! ```

use std::time::Instant;

use crate::collectors::{
    AuditCollector, CollectionError, IdentityCollector, KeyCollector, PolicyCrossReferencer,
    SubtreeUpdate,
};
use crate::session::AuditSession;
use crate::tree::AuditTree;

// ============================================================================
// Error Type
// ============================================================================

/// Error type for audit runs
#[derive(Debug, thiserror::Error)]
pub enum AuditError {
    /// A collector failed; the run was aborted
    #[error("{collector} collection failed: {source}")]
    Collector {
        collector: String,
        #[source]
        source: CollectionError,
    },

    /// A collector's update targets a subtree that has not been written yet
    #[error("{collector} requires the {subtree} subtree, which no earlier collector produced")]
    MissingSubtree {
        collector: String,
        subtree: &'static str,
    },
}

// ============================================================================
// Orchestrator
// ============================================================================

/// Ordered collector list
#[derive(Default)]
pub struct Orchestrator {
    collectors: Vec<Box<dyn AuditCollector>>,
}

impl Orchestrator {
    /// Create an orchestrator with no collectors
    pub fn new() -> Self {
        Self::default()
    }

    /// Identity, then key management, then the identity-to-key-management
    /// policy cross-reference
    pub fn with_default_collectors() -> Self {
        let mut orchestrator = Self::new();
        orchestrator.register(Box::new(IdentityCollector::new()));
        orchestrator.register(Box::new(KeyCollector::new()));
        orchestrator.register(Box::new(PolicyCrossReferencer::new()));
        orchestrator
    }

    /// Append a collector to the run order
    pub fn register(&mut self, collector: Box<dyn AuditCollector>) {
        self.collectors.push(collector);
    }

    /// Collector names in run order
    pub fn collector_names(&self) -> Vec<&str> {
        self.collectors.iter().map(|c| c.name()).collect()
    }

    /// Run every collector in order and return the assembled tree
    pub fn run(&self, session: &AuditSession) -> Result<AuditTree, AuditError> {
        let started = Instant::now();
        let mut tree = AuditTree::new();

        log::info!(
            "Starting audit in {} with {} collector(s)",
            session.region(),
            self.collectors.len()
        );

        for collector in &self.collectors {
            let name = collector.name();
            let collector_started = Instant::now();
            log::info!("Running {} collector", name);

            let update = collector.populate(session, &tree).map_err(|source| {
                log::error!("{} collector failed: {}", name, source);
                AuditError::Collector {
                    collector: name.to_string(),
                    source,
                }
            })?;

            apply_update(&mut tree, name, update)?;

            log::info!(
                "{} collector finished in {:.2}s",
                name,
                collector_started.elapsed().as_secs_f64()
            );
        }

        log::info!(
            "Audit completed in {:.2}s",
            started.elapsed().as_secs_f64()
        );

        Ok(tree)
    }
}

impl std::fmt::Debug for Orchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Orchestrator")
            .field("collectors", &self.collector_names())
            .finish()
    }
}

/// Assign a collector's subtree into the aggregate
fn apply_update(
    tree: &mut AuditTree,
    collector: &str,
    update: SubtreeUpdate,
) -> Result<(), AuditError> {
    match update {
        SubtreeUpdate::Identity(data) => tree.audit.iam = Some(data),
        SubtreeUpdate::KeyManagement(data) => tree.audit.kms = Some(data),
        SubtreeUpdate::KeyPolicyReferences(matches) => {
            let kms = tree
                .audit
                .kms
                .as_mut()
                .ok_or_else(|| AuditError::MissingSubtree {
                    collector: collector.to_string(),
                    subtree: "kms",
                })?;
            kms.iam_policy_references = matches;
        }
    }
    Ok(())
}

// ============================================================================
// Public API Functions
// ============================================================================

/// Run the default collector set against a session
pub fn run_audit(session: &AuditSession) -> Result<AuditTree, AuditError> {
    Orchestrator::with_default_collectors().run(session)
}

// ============================================================================
// Tests
// ============================================================================

#[allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::indexing_slicing,
    clippy::panic
)]
