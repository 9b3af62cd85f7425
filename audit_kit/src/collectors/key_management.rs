//! Key-management (KMS) collector
//!
//! Enumerates managed keys with lifecycle state, rotation status and the
//! statements of the attached key policy.

use std::collections::HashSet;

use crate::api::{KeyListEntry, KeyManagementApi};
use crate::policy::extract_statements;
use crate::session::AuditSession;
use crate::tree::{AuditTree, KeyManagementData, KeyPolicy, ManagedKey};

use super::{ApiResultExt, AuditCollector, CollectionError, SubtreeUpdate};

/// Collector for the `audit.kms` subtree
#[derive(Debug, Clone, Default)]
pub struct KeyCollector;

impl KeyCollector {
    pub fn new() -> Self {
        Self
    }
}

impl AuditCollector for KeyCollector {
    fn name(&self) -> &str {
        "KMS"
    }

    fn populate(
        &self,
        session: &AuditSession,
        _tree: &AuditTree,
    ) -> Result<SubtreeUpdate, CollectionError> {
        let api = session.key_management();

        let entries = api
            .list_keys()
            .for_entity(&format!("keys in {}", session.region()))?;
        log::info!(
            "Found {} KMS key(s) in {}",
            entries.len(),
            session.region()
        );

        ensure_unique_ids(&entries)?;

        let keys = session
            .pool()
            .map_ordered(&entries, |entry| build_key(api, entry))?;

        Ok(SubtreeUpdate::KeyManagement(KeyManagementData {
            keys,
            iam_policy_references: Vec::new(),
        }))
    }
}

fn ensure_unique_ids(entries: &[KeyListEntry]) -> Result<(), CollectionError> {
    let mut seen = HashSet::with_capacity(entries.len());
    for entry in entries {
        if !seen.insert(entry.key_id.as_str()) {
            return Err(CollectionError::UnexpectedResponse {
                entity: format!("key {}", entry.key_id),
                reason: "key listed more than once".to_string(),
            });
        }
    }
    Ok(())
}

fn build_key(api: &dyn KeyManagementApi, entry: &KeyListEntry) -> Result<ManagedKey, CollectionError> {
    let entity = format!("key {}", entry.key_id);
    log::debug!("Collecting {}", entity);

    let description = api.describe_key(&entry.key_id).for_entity(&entity)?;
    log::debug!("{} is {}", entity, description.state);
    let rotation_enabled = api
        .get_key_rotation_status(&entry.key_id)
        .for_entity(&entity)?;

    // A key carries exactly one policy; the API still models a list
    let policy_names = api.list_key_policies(&entry.key_id).for_entity(&entity)?;
    let policy_name = policy_names
        .into_iter()
        .next()
        .ok_or_else(|| CollectionError::UnexpectedResponse {
            entity: entity.clone(),
            reason: "no key policy attached".to_string(),
        })?;

    let document = api
        .get_key_policy(&entry.key_id, &policy_name)
        .for_entity(&entity)?;
    let statements =
        extract_statements(&document).map_err(|source| CollectionError::MalformedPolicy {
            entity: entity.clone(),
            policy: policy_name.clone(),
            source,
        })?;

    Ok(ManagedKey {
        arn: entry.key_arn.clone(),
        id: entry.key_id.clone(),
        enabled: description.enabled,
        state: description.state,
        rotation_enabled,
        policy: KeyPolicy {
            name: policy_name,
            statements,
        },
    })
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
