//! Shared read-only session handed to every collector

use std::sync::Arc;

use crate::api::{IdentityApi, KeyManagementApi};
use crate::pool::WorkerPool;

/// Authenticated handles to the audited services plus the run's worker pool
///
/// Built once per run by the caller; collectors only borrow it.
pub struct AuditSession {
    region: String,
    identity: Arc<dyn IdentityApi>,
    key_management: Arc<dyn KeyManagementApi>,
    pool: WorkerPool,
}

impl AuditSession {
    pub fn new(
        region: impl Into<String>,
        identity: Arc<dyn IdentityApi>,
        key_management: Arc<dyn KeyManagementApi>,
        pool: WorkerPool,
    ) -> Self {
        Self {
            region: region.into(),
            identity,
            key_management,
            pool,
        }
    }

    /// Region the key-management calls are scoped to
    pub fn region(&self) -> &str {
        &self.region
    }

    pub fn identity(&self) -> &dyn IdentityApi {
        self.identity.as_ref()
    }

    pub fn key_management(&self) -> &dyn KeyManagementApi {
        self.key_management.as_ref()
    }

    pub fn pool(&self) -> &WorkerPool {
        &self.pool
    }
}

impl std::fmt::Debug for AuditSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuditSession")
            .field("region", &self.region)
            .field("pool", &self.pool)
            .finish_non_exhaustive()
    }
}
