//! Key-management service backend

use std::sync::Arc;

use audit_kit::api::{ApiError, ApiResult, KeyDescription, KeyListEntry, KeyManagementApi};
use audit_kit::tree::KeyState;
use tokio::runtime::Runtime;

use super::{missing_field, sdk_error};

/// `KeyManagementApi` over the AWS KMS client
pub struct AwsKeyManagement {
    runtime: Arc<Runtime>,
    client: aws_sdk_kms::Client,
}

impl AwsKeyManagement {
    pub fn new(runtime: Arc<Runtime>, client: aws_sdk_kms::Client) -> Self {
        Self { runtime, client }
    }
}

impl KeyManagementApi for AwsKeyManagement {
    fn list_keys(&self) -> ApiResult<Vec<KeyListEntry>> {
        const OP: &str = "ListKeys";
        let keys = self
            .runtime
            .block_on(self.client.list_keys().into_paginator().items().send().try_collect())
            .map_err(|e| sdk_error(OP, e))?;

        keys.iter()
            .map(|key| {
                Ok(KeyListEntry {
                    key_id: key
                        .key_id()
                        .ok_or_else(|| missing_field(OP, "KeyId"))?
                        .to_string(),
                    key_arn: key
                        .key_arn()
                        .ok_or_else(|| missing_field(OP, "KeyArn"))?
                        .to_string(),
                })
            })
            .collect()
    }

    fn describe_key(&self, key_id: &str) -> ApiResult<KeyDescription> {
        const OP: &str = "DescribeKey";
        let output = self
            .runtime
            .block_on(self.client.describe_key().key_id(key_id).send())
            .map_err(|e| sdk_error(OP, e))?;

        let metadata = output
            .key_metadata()
            .ok_or_else(|| missing_field(OP, "KeyMetadata"))?;
        let state = metadata
            .key_state()
            .ok_or_else(|| missing_field(OP, "KeyMetadata.KeyState"))?
            .as_str()
            .parse::<KeyState>()
            .map_err(|e| ApiError::new(OP, e.to_string()))?;

        Ok(KeyDescription {
            enabled: metadata.enabled(),
            state,
        })
    }

    fn get_key_rotation_status(&self, key_id: &str) -> ApiResult<bool> {
        self.runtime
            .block_on(self.client.get_key_rotation_status().key_id(key_id).send())
            .map(|output| output.key_rotation_enabled())
            .map_err(|e| sdk_error("GetKeyRotationStatus", e))
    }

    fn list_key_policies(&self, key_id: &str) -> ApiResult<Vec<String>> {
        self.runtime
            .block_on(
                self.client
                    .list_key_policies()
                    .key_id(key_id)
                    .into_paginator()
                    .items()
                    .send()
                    .try_collect(),
            )
            .map_err(|e| sdk_error("ListKeyPolicies", e))
    }

    fn get_key_policy(&self, key_id: &str, policy_name: &str) -> ApiResult<String> {
        const OP: &str = "GetKeyPolicy";
        let output = self
            .runtime
            .block_on(
                self.client
                    .get_key_policy()
                    .key_id(key_id)
                    .policy_name(policy_name)
                    .send(),
            )
            .map_err(|e| sdk_error(OP, e))?;

        output
            .policy()
            .map(str::to_string)
            .ok_or_else(|| missing_field(OP, "Policy"))
    }
}
