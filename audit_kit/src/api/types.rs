//! Records returned by the provider API traits

use chrono::{DateTime, Utc};

use crate::tree::{AccessKeyStatus, KeyState};

/// A user as listed by the identity service
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserRecord {
    pub arn: String,
    pub user_id: String,
    pub user_name: String,
    pub path: String,
    pub created_at: DateTime<Utc>,
    /// Last console sign-in, if the user ever signed in with a password
    pub password_last_used: Option<DateTime<Utc>>,
}

/// An MFA device binding
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MfaDeviceRecord {
    /// Device serial: an ARN for virtual and FIDO devices, a vendor serial
    /// for hardware tokens
    pub serial_number: String,
}

/// A user's console login profile
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginProfileRecord {
    pub created_at: DateTime<Utc>,
}

/// Access key metadata
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessKeyRecord {
    pub access_key_id: String,
    pub created_at: DateTime<Utc>,
    pub status: AccessKeyStatus,
}

/// Where and when an access key was last used
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessKeyUsage {
    pub date: DateTime<Utc>,
    pub region: String,
    pub service_name: String,
}

/// A customer-managed identity policy
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttachedPolicyRecord {
    pub policy_name: String,
    pub arn: String,
    /// Version currently in effect
    pub default_version_id: String,
}

/// A managed key as listed by the key-management service
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyListEntry {
    pub key_id: String,
    pub key_arn: String,
}

/// Lifecycle details of a managed key
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyDescription {
    pub enabled: bool,
    pub state: KeyState,
}
