//! In-memory provider fakes for collector and orchestrator tests

#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use chrono::{DateTime, TimeZone, Utc};

use crate::api::{
    AccessKeyRecord, AccessKeyUsage, ApiError, ApiResult, AttachedPolicyRecord, IdentityApi,
    KeyDescription, KeyListEntry, KeyManagementApi, LoginProfileRecord, MfaDeviceRecord,
    UserRecord,
};
use crate::pool::WorkerPool;
use crate::session::AuditSession;
use crate::tree::{AccessKeyStatus, KeyState};

pub const ACCOUNT: &str = "123456789012";

pub fn fixed_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2017, 6, 1, 9, 30, 0).unwrap()
}

pub fn session_with(identity: FakeIdentity, key_management: FakeKeyManagement) -> AuditSession {
    AuditSession::new(
        "us-east-1",
        Arc::new(identity),
        Arc::new(key_management),
        WorkerPool::new(2).unwrap(),
    )
}

/// Injected failures, keyed by operation and the entity argument (`*` for any)
#[derive(Debug, Default, Clone)]
struct Failures(Vec<(&'static str, String)>);

impl Failures {
    fn check(&self, operation: &'static str, entity: &str) -> ApiResult<()> {
        let hit = self
            .0
            .iter()
            .any(|(op, target)| *op == operation && (target == "*" || target == entity));
        if hit {
            Err(ApiError::new(operation, "simulated service failure"))
        } else {
            Ok(())
        }
    }
}

// ============================================================================
// Identity
// ============================================================================

#[derive(Debug, Default, Clone)]
pub struct FakeIdentity {
    users: Vec<UserRecord>,
    mfa: HashMap<String, Vec<String>>,
    profiles: HashSet<String>,
    keys: HashMap<String, Vec<AccessKeyRecord>>,
    usage: HashMap<String, AccessKeyUsage>,
    policies: Vec<(AttachedPolicyRecord, String)>,
    failures: Failures,
}

impl FakeIdentity {
    pub fn with_user(mut self, name: &str) -> Self {
        self.users.push(UserRecord {
            arn: format!("arn:aws:iam::{}:user/{}", ACCOUNT, name),
            user_id: format!("AIDA{}", name.to_uppercase()),
            user_name: name.to_string(),
            path: "/".to_string(),
            created_at: fixed_time(),
            password_last_used: None,
        });
        self
    }

    pub fn with_mfa(mut self, user: &str, serial: &str) -> Self {
        self.mfa
            .entry(user.to_string())
            .or_default()
            .push(serial.to_string());
        self
    }

    pub fn with_console_password(mut self, user: &str) -> Self {
        self.profiles.insert(user.to_string());
        if let Some(record) = self.users.iter_mut().find(|u| u.user_name == user) {
            record.password_last_used = Some(fixed_time());
        }
        self
    }

    /// Sign-in history left behind by a console password that was deleted
    pub fn with_past_password_use(mut self, user: &str) -> Self {
        if let Some(record) = self.users.iter_mut().find(|u| u.user_name == user) {
            record.password_last_used = Some(fixed_time());
        }
        self
    }

    pub fn with_access_key(
        mut self,
        user: &str,
        key_id: &str,
        status: AccessKeyStatus,
        used: bool,
    ) -> Self {
        self.keys
            .entry(user.to_string())
            .or_default()
            .push(AccessKeyRecord {
                access_key_id: key_id.to_string(),
                created_at: fixed_time(),
                status,
            });
        if used {
            self.usage.insert(
                key_id.to_string(),
                AccessKeyUsage {
                    date: fixed_time(),
                    region: "us-east-1".to_string(),
                    service_name: "s3".to_string(),
                },
            );
        }
        self
    }

    pub fn with_policy(mut self, name: &str, document: &str) -> Self {
        self.policies.push((
            AttachedPolicyRecord {
                policy_name: name.to_string(),
                arn: format!("arn:aws:iam::{}:policy/{}", ACCOUNT, name),
                default_version_id: "v1".to_string(),
            },
            document.to_string(),
        ));
        self
    }

    pub fn failing(mut self, operation: &'static str, entity: &str) -> Self {
        self.failures.0.push((operation, entity.to_string()));
        self
    }
}

impl IdentityApi for FakeIdentity {
    fn list_users(&self) -> ApiResult<Vec<UserRecord>> {
        self.failures.check("ListUsers", "*")?;
        Ok(self.users.clone())
    }

    fn list_mfa_devices(&self, user_name: &str) -> ApiResult<Vec<MfaDeviceRecord>> {
        self.failures.check("ListMFADevices", user_name)?;
        Ok(self
            .mfa
            .get(user_name)
            .map(|serials| {
                serials
                    .iter()
                    .map(|serial| MfaDeviceRecord {
                        serial_number: serial.clone(),
                    })
                    .collect()
            })
            .unwrap_or_default())
    }

    fn get_login_profile(&self, user_name: &str) -> ApiResult<Option<LoginProfileRecord>> {
        self.failures.check("GetLoginProfile", user_name)?;
        Ok(self
            .profiles
            .contains(user_name)
            .then(|| LoginProfileRecord {
                created_at: fixed_time(),
            }))
    }

    fn list_access_keys(&self, user_name: &str) -> ApiResult<Vec<AccessKeyRecord>> {
        self.failures.check("ListAccessKeys", user_name)?;
        Ok(self.keys.get(user_name).cloned().unwrap_or_default())
    }

    fn get_access_key_last_used(&self, access_key_id: &str) -> ApiResult<Option<AccessKeyUsage>> {
        self.failures.check("GetAccessKeyLastUsed", access_key_id)?;
        Ok(self.usage.get(access_key_id).cloned())
    }

    fn list_attached_local_policies(&self) -> ApiResult<Vec<AttachedPolicyRecord>> {
        self.failures.check("ListPolicies", "*")?;
        Ok(self.policies.iter().map(|(record, _)| record.clone()).collect())
    }

    fn get_policy_document(&self, policy_arn: &str, version_id: &str) -> ApiResult<String> {
        self.failures.check("GetPolicyVersion", policy_arn)?;
        self.policies
            .iter()
            .find(|(record, _)| record.arn == policy_arn && record.default_version_id == version_id)
            .map(|(_, document)| document.clone())
            .ok_or_else(|| ApiError::new("GetPolicyVersion", "NoSuchEntity"))
    }
}

// ============================================================================
// Key management
// ============================================================================

#[derive(Debug, Default, Clone)]
pub struct FakeKeyManagement {
    keys: Vec<KeyListEntry>,
    descriptions: HashMap<String, KeyDescription>,
    rotation: HashSet<String>,
    policies: HashMap<String, Vec<(String, String)>>,
    failures: Failures,
}

impl FakeKeyManagement {
    /// Add an enabled key with a single `default` policy
    pub fn with_key(self, key_id: &str, policy_document: &str) -> Self {
        self.with_key_policies(key_id, &[("default", policy_document)])
    }

    pub fn with_key_policies(mut self, key_id: &str, policies: &[(&str, &str)]) -> Self {
        self.keys.push(KeyListEntry {
            key_id: key_id.to_string(),
            key_arn: format!("arn:aws:kms:us-east-1:{}:key/{}", ACCOUNT, key_id),
        });
        self.descriptions.insert(
            key_id.to_string(),
            KeyDescription {
                enabled: true,
                state: KeyState::Enabled,
            },
        );
        self.policies.insert(
            key_id.to_string(),
            policies
                .iter()
                .map(|(name, doc)| (name.to_string(), doc.to_string()))
                .collect(),
        );
        self
    }

    pub fn with_state(mut self, key_id: &str, enabled: bool, state: KeyState) -> Self {
        self.descriptions
            .insert(key_id.to_string(), KeyDescription { enabled, state });
        self
    }

    pub fn with_rotation(mut self, key_id: &str) -> Self {
        self.rotation.insert(key_id.to_string());
        self
    }

    pub fn failing(mut self, operation: &'static str, entity: &str) -> Self {
        self.failures.0.push((operation, entity.to_string()));
        self
    }
}

impl KeyManagementApi for FakeKeyManagement {
    fn list_keys(&self) -> ApiResult<Vec<KeyListEntry>> {
        self.failures.check("ListKeys", "*")?;
        Ok(self.keys.clone())
    }

    fn describe_key(&self, key_id: &str) -> ApiResult<KeyDescription> {
        self.failures.check("DescribeKey", key_id)?;
        self.descriptions
            .get(key_id)
            .copied()
            .ok_or_else(|| ApiError::new("DescribeKey", "NotFoundException"))
    }

    fn get_key_rotation_status(&self, key_id: &str) -> ApiResult<bool> {
        self.failures.check("GetKeyRotationStatus", key_id)?;
        Ok(self.rotation.contains(key_id))
    }

    fn list_key_policies(&self, key_id: &str) -> ApiResult<Vec<String>> {
        self.failures.check("ListKeyPolicies", key_id)?;
        Ok(self
            .policies
            .get(key_id)
            .map(|policies| policies.iter().map(|(name, _)| name.clone()).collect())
            .unwrap_or_default())
    }

    fn get_key_policy(&self, key_id: &str, policy_name: &str) -> ApiResult<String> {
        self.failures.check("GetKeyPolicy", key_id)?;
        self.policies
            .get(key_id)
            .and_then(|policies| policies.iter().find(|(name, _)| name == policy_name))
            .map(|(_, document)| document.clone())
            .ok_or_else(|| ApiError::new("GetKeyPolicy", "NotFoundException"))
    }
}
