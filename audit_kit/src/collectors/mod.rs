//! # Data Collectors Module
//!
//! One collector per audited service. Each collector reads from the shared
//! session, may read subtrees written by earlier collectors, and returns the
//! single subtree it owns as a [`SubtreeUpdate`]. Only the orchestrator writes
//! into the tree.

pub mod cross_reference;
pub mod identity;
pub mod key_management;

pub use cross_reference::PolicyCrossReferencer;
pub use identity::IdentityCollector;
pub use key_management::KeyCollector;

use crate::api::{ApiError, ApiResult};
use crate::policy::ExtractionError;
use crate::session::AuditSession;
use crate::tree::{AuditTree, IdentityData, KeyManagementData, PolicyCrossReferenceMatch};

/// A per-service collector run by the orchestrator
pub trait AuditCollector: Send + Sync {
    /// Short service name used in logs and errors (e.g. `IAM`)
    fn name(&self) -> &str;

    /// Collect this service's subtree
    ///
    /// `tree` holds everything written by collectors that ran earlier.
    fn populate(
        &self,
        session: &AuditSession,
        tree: &AuditTree,
    ) -> Result<SubtreeUpdate, CollectionError>;
}

/// The subtree a collector hands back for assignment
#[derive(Debug, Clone, PartialEq)]
pub enum SubtreeUpdate {
    /// Replaces `audit.iam`
    Identity(IdentityData),
    /// Replaces `audit.kms`
    KeyManagement(KeyManagementData),
    /// Attached to the existing `audit.kms` subtree
    KeyPolicyReferences(Vec<PolicyCrossReferenceMatch>),
}

/// Errors raised while collecting a subtree
#[derive(Debug, thiserror::Error)]
pub enum CollectionError {
    /// A provider call failed
    #[error("{source} (while processing {entity})")]
    Api {
        entity: String,
        #[source]
        source: ApiError,
    },

    /// A policy document could not be parsed
    #[error("malformed policy '{policy}' on {entity}: {source}")]
    MalformedPolicy {
        entity: String,
        policy: String,
        #[source]
        source: ExtractionError,
    },

    /// The provider answered with something the audit cannot represent
    #[error("unexpected response for {entity}: {reason}")]
    UnexpectedResponse { entity: String, reason: String },
}

impl CollectionError {
    /// Provider operation that failed, if the error came from a provider call
    pub fn operation(&self) -> Option<&'static str> {
        match self {
            CollectionError::Api { source, .. } => Some(source.operation),
            _ => None,
        }
    }
}

/// Attach the entity being processed to a provider error
pub(crate) trait ApiResultExt<T> {
    fn for_entity(self, entity: &str) -> Result<T, CollectionError>;
}

impl<T> ApiResultExt<T> for ApiResult<T> {
    fn for_entity(self, entity: &str) -> Result<T, CollectionError> {
        self.map_err(|source| CollectionError::Api {
            entity: entity.to_string(),
            source,
        })
    }
}
