//! Identity service backend

use std::sync::Arc;

use audit_kit::api::{
    AccessKeyRecord, AccessKeyUsage, ApiError, ApiResult, AttachedPolicyRecord, IdentityApi,
    LoginProfileRecord, MfaDeviceRecord, UserRecord,
};
use audit_kit::tree::AccessKeyStatus;
use aws_sdk_iam::primitives::DateTime as SdkDateTime;
use aws_sdk_iam::types::PolicyScopeType;
use chrono::{DateTime, Utc};
use tokio::runtime::Runtime;

use super::{missing_field, sdk_error};

/// `IdentityApi` over the AWS IAM client
pub struct AwsIdentity {
    runtime: Arc<Runtime>,
    client: aws_sdk_iam::Client,
}

impl AwsIdentity {
    pub fn new(runtime: Arc<Runtime>, client: aws_sdk_iam::Client) -> Self {
        Self { runtime, client }
    }
}

fn to_utc(operation: &'static str, value: &SdkDateTime) -> ApiResult<DateTime<Utc>> {
    DateTime::from_timestamp(value.secs(), value.subsec_nanos())
        .ok_or_else(|| ApiError::new(operation, format!("timestamp out of range: {}", value)))
}

impl IdentityApi for AwsIdentity {
    fn list_users(&self) -> ApiResult<Vec<UserRecord>> {
        const OP: &str = "ListUsers";
        let users = self
            .runtime
            .block_on(
                self.client
                    .list_users()
                    .into_paginator()
                    .items()
                    .send()
                    .try_collect(),
            )
            .map_err(|e| sdk_error(OP, e))?;

        users
            .iter()
            .map(|user| {
                Ok(UserRecord {
                    arn: user.arn().to_string(),
                    user_id: user.user_id().to_string(),
                    user_name: user.user_name().to_string(),
                    path: user.path().to_string(),
                    created_at: to_utc(OP, user.create_date())?,
                    password_last_used: user
                        .password_last_used()
                        .map(|d| to_utc(OP, d))
                        .transpose()?,
                })
            })
            .collect()
    }

    fn list_mfa_devices(&self, user_name: &str) -> ApiResult<Vec<MfaDeviceRecord>> {
        let devices = self
            .runtime
            .block_on(
                self.client
                    .list_mfa_devices()
                    .user_name(user_name)
                    .into_paginator()
                    .items()
                    .send()
                    .try_collect(),
            )
            .map_err(|e| sdk_error("ListMFADevices", e))?;

        Ok(devices
            .iter()
            .map(|device| MfaDeviceRecord {
                serial_number: device.serial_number().to_string(),
            })
            .collect())
    }

    fn get_login_profile(&self, user_name: &str) -> ApiResult<Option<LoginProfileRecord>> {
        const OP: &str = "GetLoginProfile";
        let result = self
            .runtime
            .block_on(self.client.get_login_profile().user_name(user_name).send());

        match result {
            Ok(output) => output
                .login_profile()
                .map(|profile| {
                    to_utc(OP, profile.create_date())
                        .map(|created_at| LoginProfileRecord { created_at })
                })
                .transpose(),
            // Users without a console password have no login profile
            Err(err)
                if err
                    .as_service_error()
                    .is_some_and(|e| e.is_no_such_entity_exception()) =>
            {
                Ok(None)
            }
            Err(err) => Err(sdk_error(OP, err)),
        }
    }

    fn list_access_keys(&self, user_name: &str) -> ApiResult<Vec<AccessKeyRecord>> {
        const OP: &str = "ListAccessKeys";
        let keys = self
            .runtime
            .block_on(
                self.client
                    .list_access_keys()
                    .user_name(user_name)
                    .into_paginator()
                    .items()
                    .send()
                    .try_collect(),
            )
            .map_err(|e| sdk_error(OP, e))?;

        keys.iter()
            .map(|key| {
                let status = key
                    .status()
                    .ok_or_else(|| missing_field(OP, "Status"))?
                    .as_str()
                    .parse::<AccessKeyStatus>()
                    .map_err(|e| ApiError::new(OP, format!("{}", e)))?;
                Ok(AccessKeyRecord {
                    access_key_id: key
                        .access_key_id()
                        .ok_or_else(|| missing_field(OP, "AccessKeyId"))?
                        .to_string(),
                    created_at: to_utc(
                        OP,
                        key.create_date()
                            .ok_or_else(|| missing_field(OP, "CreateDate"))?,
                    )?,
                    status,
                })
            })
            .collect()
    }

    fn get_access_key_last_used(&self, access_key_id: &str) -> ApiResult<Option<AccessKeyUsage>> {
        const OP: &str = "GetAccessKeyLastUsed";
        let output = self
            .runtime
            .block_on(
                self.client
                    .get_access_key_last_used()
                    .access_key_id(access_key_id)
                    .send(),
            )
            .map_err(|e| sdk_error(OP, e))?;

        // A never-used key reports no date (and "N/A" for region and service)
        let Some(last_used) = output.access_key_last_used() else {
            return Ok(None);
        };
        let Some(date) = last_used.last_used_date() else {
            return Ok(None);
        };

        Ok(Some(AccessKeyUsage {
            date: to_utc(OP, date)?,
            region: last_used.region().to_string(),
            service_name: last_used.service_name().to_string(),
        }))
    }

    fn list_attached_local_policies(&self) -> ApiResult<Vec<AttachedPolicyRecord>> {
        const OP: &str = "ListPolicies";
        let policies = self
            .runtime
            .block_on(
                self.client
                    .list_policies()
                    .scope(PolicyScopeType::Local)
                    .only_attached(true)
                    .into_paginator()
                    .items()
                    .send()
                    .try_collect(),
            )
            .map_err(|e| sdk_error(OP, e))?;

        policies
            .iter()
            .map(|policy| {
                Ok(AttachedPolicyRecord {
                    policy_name: policy
                        .policy_name()
                        .ok_or_else(|| missing_field(OP, "PolicyName"))?
                        .to_string(),
                    arn: policy
                        .arn()
                        .ok_or_else(|| missing_field(OP, "Arn"))?
                        .to_string(),
                    default_version_id: policy
                        .default_version_id()
                        .ok_or_else(|| missing_field(OP, "DefaultVersionId"))?
                        .to_string(),
                })
            })
            .collect()
    }

    fn get_policy_document(&self, policy_arn: &str, version_id: &str) -> ApiResult<String> {
        const OP: &str = "GetPolicyVersion";
        let output = self
            .runtime
            .block_on(
                self.client
                    .get_policy_version()
                    .policy_arn(policy_arn)
                    .version_id(version_id)
                    .send(),
            )
            .map_err(|e| sdk_error(OP, e))?;

        let encoded = output
            .policy_version()
            .and_then(|version| version.document())
            .ok_or_else(|| missing_field(OP, "PolicyVersion.Document"))?;

        // IAM returns policy documents URL-encoded
        urlencoding::decode(encoded)
            .map(|document| document.into_owned())
            .map_err(|e| ApiError::new(OP, format!("document is not valid UTF-8: {}", e)))
    }
}
