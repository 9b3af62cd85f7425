//! Audit report tree
//!
//! The aggregate snapshot produced by one scan. Serialized as
//!
//! ```text
//! { "audit": { "iam": { "users": [...] },
//!              "kms": { "keys": [...], "iamPolicyReferences": [...] } } }
//! ```
//!
//! Optional fields are omitted when absent, never written as zero values.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::Serialize;

/// Root of one scan's report
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AuditTree {
    pub audit: AuditData,
}

impl AuditTree {
    pub fn new() -> Self {
        Self::default()
    }
}

/// Per-service subtrees; a subtree is present only if its collector completed
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AuditData {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub iam: Option<IdentityData>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kms: Option<KeyManagementData>,
}

// ============================================================================
// Identity subtree
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct IdentityData {
    pub users: Vec<IdentityUser>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IdentityUser {
    pub arn: String,
    pub id: String,
    pub name: String,
    pub path: String,
    pub created_at: DateTime<Utc>,
    pub mfa_type: MfaType,
    pub password: PasswordMetadata,
    pub keys: Vec<IdentityKey>,
}

/// Kind of MFA device bound to a user
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MfaType {
    None,
    Virtual,
    Hardware,
}

impl MfaType {
    /// Classify a user's MFA binding from its device serial
    ///
    /// Virtual devices are identified by an ARN in the `mfa/` resource
    /// namespace. Anything else that is present (token serials, `u2f/` ARNs
    /// for security keys) is a physical device. A bare `arn:` prefix check
    /// would misfile security keys as virtual, so the resource type decides.
    pub fn from_serial(serial: Option<&str>) -> Self {
        match serial.map(str::trim) {
            None | Some("") => MfaType::None,
            Some(s) if is_virtual_device_arn(s) => MfaType::Virtual,
            Some(_) => MfaType::Hardware,
        }
    }
}

fn is_virtual_device_arn(serial: &str) -> bool {
    if !serial.starts_with("arn:") {
        return false;
    }
    // arn:partition:iam::account:mfa/name
    serial
        .splitn(6, ':')
        .nth(5)
        .is_some_and(|resource| resource.starts_with("mfa/"))
}

/// Console password metadata; both fields absent for API-only users
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PasswordMetadata {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_used: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IdentityKey {
    pub id: String,
    pub created_at: DateTime<Utc>,
    pub status: AccessKeyStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_used: Option<KeyLastUsed>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum AccessKeyStatus {
    Active,
    Inactive,
}

impl FromStr for AccessKeyStatus {
    type Err = UnrecognizedValue;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Active" => Ok(Self::Active),
            "Inactive" => Ok(Self::Inactive),
            other => Err(UnrecognizedValue::new("access key status", other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct KeyLastUsed {
    pub date: DateTime<Utc>,
    pub region: String,
    pub service_name: String,
}

// ============================================================================
// Key-management subtree
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct KeyManagementData {
    pub keys: Vec<ManagedKey>,
    /// Identity policies that mention key-management actions
    pub iam_policy_references: Vec<PolicyCrossReferenceMatch>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ManagedKey {
    pub arn: String,
    pub id: String,
    pub enabled: bool,
    pub state: KeyState,
    pub rotation_enabled: bool,
    pub policy: KeyPolicy,
}

/// Provider key lifecycle states
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum KeyState {
    Creating,
    Enabled,
    Disabled,
    PendingDeletion,
    PendingImport,
    PendingReplicaDeletion,
    Unavailable,
    Updating,
}

impl KeyState {
    pub fn as_str(&self) -> &'static str {
        match self {
            KeyState::Creating => "Creating",
            KeyState::Enabled => "Enabled",
            KeyState::Disabled => "Disabled",
            KeyState::PendingDeletion => "PendingDeletion",
            KeyState::PendingImport => "PendingImport",
            KeyState::PendingReplicaDeletion => "PendingReplicaDeletion",
            KeyState::Unavailable => "Unavailable",
            KeyState::Updating => "Updating",
        }
    }
}

impl fmt::Display for KeyState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for KeyState {
    type Err = UnrecognizedValue;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let state = match s {
            "Creating" => KeyState::Creating,
            "Enabled" => KeyState::Enabled,
            "Disabled" => KeyState::Disabled,
            "PendingDeletion" => KeyState::PendingDeletion,
            "PendingImport" => KeyState::PendingImport,
            "PendingReplicaDeletion" => KeyState::PendingReplicaDeletion,
            "Unavailable" => KeyState::Unavailable,
            "Updating" => KeyState::Updating,
            other => return Err(UnrecognizedValue::new("key state", other)),
        };
        Ok(state)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct KeyPolicy {
    pub name: String,
    /// Source document order
    pub statements: Vec<PolicyStatement>,
}

/// Reviewable facts extracted from one policy statement
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PolicyStatement {
    pub sid: String,
    pub actions: BTreeSet<String>,
    pub bypass_policy_lockout_safety_check: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub multi_factor_auth_age: Option<i64>,
}

/// Identity policy flagged for key-management relevance
///
/// A triage hint only: the match is textual, not a grant computation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PolicyCrossReferenceMatch {
    pub policy_name: String,
    pub policy_arn: String,
    pub matched_actions: Vec<String>,
    pub raw_statement_text: String,
}

/// A provider string that maps to none of the known variants
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unrecognized {kind} '{value}'")]
pub struct UnrecognizedValue {
    pub kind: &'static str,
    pub value: String,
}

impl UnrecognizedValue {
    fn new(kind: &'static str, value: &str) -> Self {
        Self {
            kind,
            value: value.to_string(),
        }
    }
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
