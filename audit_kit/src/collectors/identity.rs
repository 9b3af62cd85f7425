//! Identity (IAM) collector
//!
//! Enumerates users with their MFA binding, console password metadata and
//! access keys. The identity API offers no bulk lookup for any of those, so
//! every user costs a handful of calls; they are spread over the session's
//! worker pool and reassembled in listing order.

use std::collections::HashSet;

use crate::api::{IdentityApi, UserRecord};
use crate::session::AuditSession;
use crate::tree::{
    AuditTree, IdentityData, IdentityKey, IdentityUser, KeyLastUsed, MfaType, PasswordMetadata,
};

use super::{ApiResultExt, AuditCollector, CollectionError, SubtreeUpdate};

/// Collector for the `audit.iam` subtree
#[derive(Debug, Clone, Default)]
pub struct IdentityCollector;

impl IdentityCollector {
    pub fn new() -> Self {
        Self
    }
}

impl AuditCollector for IdentityCollector {
    fn name(&self) -> &str {
        "IAM"
    }

    fn populate(
        &self,
        session: &AuditSession,
        _tree: &AuditTree,
    ) -> Result<SubtreeUpdate, CollectionError> {
        let api = session.identity();

        let users = api.list_users().for_entity("account users")?;
        log::info!("Found {} IAM user(s)", users.len());

        ensure_unique_arns(&users)?;

        let users = session
            .pool()
            .map_ordered(&users, |user| build_user(api, user))?;

        ensure_unique_key_ids(&users)?;

        Ok(SubtreeUpdate::Identity(IdentityData { users }))
    }
}

fn ensure_unique_arns(users: &[UserRecord]) -> Result<(), CollectionError> {
    let mut seen = HashSet::with_capacity(users.len());
    for user in users {
        if !seen.insert(user.arn.as_str()) {
            return Err(CollectionError::UnexpectedResponse {
                entity: format!("user {}", user.user_name),
                reason: format!("ARN {} listed more than once", user.arn),
            });
        }
    }
    Ok(())
}

/// Each access key belongs to exactly one user, and appears once for it
fn ensure_unique_key_ids(users: &[IdentityUser]) -> Result<(), CollectionError> {
    let mut seen = HashSet::new();
    for user in users {
        for key in &user.keys {
            if !seen.insert(key.id.as_str()) {
                return Err(CollectionError::UnexpectedResponse {
                    entity: format!("user {} access key {}", user.name, key.id),
                    reason: "access key listed more than once".to_string(),
                });
            }
        }
    }
    Ok(())
}

/// Build the full record for one user
fn build_user(api: &dyn IdentityApi, user: &UserRecord) -> Result<IdentityUser, CollectionError> {
    let entity = format!("user {}", user.user_name);
    log::debug!("Collecting {}", entity);

    let devices = api.list_mfa_devices(&user.user_name).for_entity(&entity)?;
    let mfa_type = MfaType::from_serial(devices.first().map(|d| d.serial_number.as_str()));

    // No login profile means an API-only user. The user record can still
    // carry a sign-in time from a password that has since been deleted.
    let password = match api.get_login_profile(&user.user_name).for_entity(&entity)? {
        Some(profile) => PasswordMetadata {
            created_at: Some(profile.created_at),
            last_used: user.password_last_used,
        },
        None => PasswordMetadata::default(),
    };

    let keys = build_keys(api, user, &entity)?;

    Ok(IdentityUser {
        arn: user.arn.clone(),
        id: user.user_id.clone(),
        name: user.user_name.clone(),
        path: user.path.clone(),
        created_at: user.created_at,
        mfa_type,
        password,
        keys,
    })
}

fn build_keys(
    api: &dyn IdentityApi,
    user: &UserRecord,
    entity: &str,
) -> Result<Vec<IdentityKey>, CollectionError> {
    let records = api.list_access_keys(&user.user_name).for_entity(entity)?;

    records
        .into_iter()
        .map(|record| {
            let last_used = api
                .get_access_key_last_used(&record.access_key_id)
                .for_entity(&format!("{} access key {}", entity, record.access_key_id))?
                .map(|usage| KeyLastUsed {
                    date: usage.date,
                    region: usage.region,
                    service_name: usage.service_name,
                });

            Ok(IdentityKey {
                id: record.access_key_id,
                created_at: record.created_at,
                status: record.status,
                last_used,
            })
        })
        .collect()
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
