//! # PAWS Audit Kit
//!
//! Read-only security-posture audit of a cloud account's identity (IAM) and
//! key-management (KMS) services. Provides collectors, policy extraction,
//! the report tree, and a high-level API for running an audit.
//!
//! ## Modules
//!
//! - `api` - Provider API traits the collectors consume
//! - `collectors` - Per-service subtree collectors
//! - `policy` - Policy statement extraction and action watch-list
//! - `tree` - Report data model
//! - `session` - Shared session handed to collectors
//! - `pool` - Bounded worker pool for per-entity lookups
//! - `execution_api` - Orchestrator and `run_audit()`
//!
//! ## Usage
//!
//! To run an audit, a binary:
//! 1. Implements `IdentityApi` and `KeyManagementApi` over a provider SDK
//! 2. Builds an `AuditSession`
//! 3. Calls `run_audit()` and serializes the returned tree
//!
//! ```rust,ignore
//! use audit_kit::execution_api::run_audit;
//! use audit_kit::pool::WorkerPool;
//! use audit_kit::session::AuditSession;
//!
//! let session = AuditSession::new("us-east-1", identity, key_management, WorkerPool::new(8)?);
//! let tree = run_audit(&session)?;
//! ```

pub mod api;
pub mod collectors;
pub mod execution_api;
pub mod policy;
pub mod pool;
pub mod session;
pub mod tree;

#[cfg(test)]
mod testing;
