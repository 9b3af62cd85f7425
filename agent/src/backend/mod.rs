//! Provider backend
//!
//! Implements the audit kit's API traits on top of the AWS SDK. The SDK is
//! async; the audit is not, so the backend owns a tokio runtime and blocks on
//! each call. Worker-pool threads may block on it concurrently.
//!
//! ```text
//! AuditConfig ──► create_session()
//!                   ├── tokio runtime (shared)
//!                   ├── SdkConfig (region, profile, timeout, no retries)
//!                   ├── AwsIdentity        : IdentityApi
//!                   └── AwsKeyManagement   : KeyManagementApi
//! ```

mod iam;
mod kms;

pub use iam::AwsIdentity;
pub use kms::AwsKeyManagement;

use std::sync::Arc;

use audit_kit::api::ApiError;
use audit_kit::pool::WorkerPool;
use audit_kit::session::AuditSession;
use aws_config::retry::RetryConfig;
use aws_config::timeout::TimeoutConfig;
use aws_config::{BehaviorVersion, Region, SdkConfig};
use aws_credential_types::provider::ProvideCredentials;

use crate::config::AuditConfig;

/// Build an authenticated session for the configured account and region
///
/// Credentials are resolved up front so that a missing or invalid setup
/// fails before any collection starts.
pub fn create_session(config: &AuditConfig) -> Result<AuditSession, BackendError> {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .enable_all()
        .build()
        .map(Arc::new)
        .map_err(BackendError::Runtime)?;

    let sdk_config = runtime.block_on(load_sdk_config(config))?;

    log::info!(
        "Session established for region {}{}",
        config.region,
        config
            .profile
            .as_deref()
            .map(|p| format!(" (profile {})", p))
            .unwrap_or_default()
    );

    let identity = AwsIdentity::new(runtime.clone(), aws_sdk_iam::Client::new(&sdk_config));
    let key_management = AwsKeyManagement::new(runtime, aws_sdk_kms::Client::new(&sdk_config));
    let pool = WorkerPool::new(config.workers).map_err(|e| BackendError::Pool(e.to_string()))?;

    Ok(AuditSession::new(
        config.region.clone(),
        Arc::new(identity),
        Arc::new(key_management),
        pool,
    ))
}

async fn load_sdk_config(config: &AuditConfig) -> Result<SdkConfig, BackendError> {
    let mut loader = aws_config::defaults(BehaviorVersion::latest())
        .region(Region::new(config.region.clone()))
        .retry_config(RetryConfig::disabled())
        .timeout_config(
            TimeoutConfig::builder()
                .operation_timeout(config.timeout())
                .build(),
        );

    if let Some(profile) = &config.profile {
        loader = loader.profile_name(profile);
    }

    let sdk_config = loader.load().await;

    let provider = sdk_config
        .credentials_provider()
        .ok_or_else(|| BackendError::Credentials("no credentials provider available".to_string()))?;
    provider
        .provide_credentials()
        .await
        .map_err(|e| BackendError::Credentials(e.to_string()))?;

    Ok(sdk_config)
}

/// Format an SDK failure with its full error context
pub(crate) fn sdk_error<E>(operation: &'static str, err: E) -> ApiError
where
    E: std::error::Error + 'static,
{
    ApiError::new(
        operation,
        aws_sdk_iam::error::DisplayErrorContext(&err).to_string(),
    )
}

/// A required field missing from a provider response
pub(crate) fn missing_field(operation: &'static str, field: &str) -> ApiError {
    ApiError::new(operation, format!("response is missing {}", field))
}

/// Errors that prevent a session from being established
#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    #[error("failed to start async runtime: {0}")]
    Runtime(#[source] std::io::Error),

    #[error("no valid credentials: {0}")]
    Credentials(String),

    #[error("failed to start worker pool: {0}")]
    Pool(String),
}
