//! Provider API seams
//!
//! The collectors never talk to a cloud SDK directly. They consume the two
//! traits below, which a backend implements on top of the real identity and
//! key-management services (see the `agent` crate) and which tests implement
//! in memory.
//!
//! Listing operations return fully drained results: pagination is the
//! backend's concern.

mod types;

pub use types::{
    AccessKeyRecord, AccessKeyUsage, AttachedPolicyRecord, KeyDescription, KeyListEntry,
    LoginProfileRecord, MfaDeviceRecord, UserRecord,
};

/// Error returned by a provider call
///
/// Every call failure is fatal for the run, so this carries only enough to
/// identify what failed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{operation} failed: {message}")]
pub struct ApiError {
    /// Provider operation name (e.g. `ListUsers`)
    pub operation: &'static str,
    /// Provider-supplied failure description
    pub message: String,
}

impl ApiError {
    pub fn new(operation: &'static str, message: impl Into<String>) -> Self {
        Self {
            operation,
            message: message.into(),
        }
    }
}

/// Result type for provider calls
pub type ApiResult<T> = Result<T, ApiError>;

/// Identity service operations consumed by the audit
///
/// Implementations must be thread-safe (`Send + Sync`): per-user lookups are
/// issued from a worker pool.
pub trait IdentityApi: Send + Sync {
    /// List every user in the account
    fn list_users(&self) -> ApiResult<Vec<UserRecord>>;

    /// List MFA devices bound to a user, in provider order
    fn list_mfa_devices(&self, user_name: &str) -> ApiResult<Vec<MfaDeviceRecord>>;

    /// Fetch a user's login profile
    ///
    /// Returns `Ok(None)` when the user has no console password. That is an
    /// expected state for API-only users, not a failure.
    fn get_login_profile(&self, user_name: &str) -> ApiResult<Option<LoginProfileRecord>>;

    /// List a user's access keys
    fn list_access_keys(&self, user_name: &str) -> ApiResult<Vec<AccessKeyRecord>>;

    /// Fetch last-used metadata for an access key
    ///
    /// Returns `Ok(None)` for a key that has never been used.
    fn get_access_key_last_used(&self, access_key_id: &str) -> ApiResult<Option<AccessKeyUsage>>;

    /// List customer-managed policies attached to at least one principal
    fn list_attached_local_policies(&self) -> ApiResult<Vec<AttachedPolicyRecord>>;

    /// Fetch the document text of one policy version
    fn get_policy_document(&self, policy_arn: &str, version_id: &str) -> ApiResult<String>;
}

/// Key-management service operations consumed by the audit
pub trait KeyManagementApi: Send + Sync {
    /// List every managed key in the region
    fn list_keys(&self) -> ApiResult<Vec<KeyListEntry>>;

    /// Describe a key's lifecycle state
    fn describe_key(&self, key_id: &str) -> ApiResult<KeyDescription>;

    /// Whether automatic rotation is enabled for a key
    fn get_key_rotation_status(&self, key_id: &str) -> ApiResult<bool>;

    /// Names of the policies attached to a key
    fn list_key_policies(&self, key_id: &str) -> ApiResult<Vec<String>>;

    /// Document text of a named key policy
    fn get_key_policy(&self, key_id: &str, policy_name: &str) -> ApiResult<String>;
}
