//! Identity policy cross-reference
//!
//! Screens customer-managed identity policies for key-management actions and
//! attaches the hits to the `audit.kms` subtree. The screen is textual (see
//! [`crate::policy::watchlist`]); it flags policies for review and must not
//! be read as a grant analysis.

use crate::api::{AttachedPolicyRecord, IdentityApi};
use crate::policy::matched_actions;
use crate::session::AuditSession;
use crate::tree::{AuditTree, PolicyCrossReferenceMatch};

use super::{ApiResultExt, AuditCollector, CollectionError, SubtreeUpdate};

/// Collector for `audit.kms.iamPolicyReferences`
///
/// Must run after the key-management collector.
#[derive(Debug, Clone, Default)]
pub struct PolicyCrossReferencer;

impl PolicyCrossReferencer {
    pub fn new() -> Self {
        Self
    }
}

impl AuditCollector for PolicyCrossReferencer {
    fn name(&self) -> &str {
        "IAM-KMS policy cross-reference"
    }

    fn populate(
        &self,
        session: &AuditSession,
        _tree: &AuditTree,
    ) -> Result<SubtreeUpdate, CollectionError> {
        let api = session.identity();

        let policies = api
            .list_attached_local_policies()
            .for_entity("customer-managed policies")?;
        log::info!("Screening {} attached customer-managed policies", policies.len());

        let screened = session
            .pool()
            .map_ordered(&policies, |policy| screen_policy(api, policy))?;

        let matches: Vec<PolicyCrossReferenceMatch> = screened.into_iter().flatten().collect();
        log::info!("{} policies reference key-management actions", matches.len());

        Ok(SubtreeUpdate::KeyPolicyReferences(matches))
    }
}

fn screen_policy(
    api: &dyn IdentityApi,
    policy: &AttachedPolicyRecord,
) -> Result<Option<PolicyCrossReferenceMatch>, CollectionError> {
    let document = api
        .get_policy_document(&policy.arn, &policy.default_version_id)
        .for_entity(&format!(
            "policy {} version {}",
            policy.policy_name, policy.default_version_id
        ))?;

    let actions = matched_actions(&document);
    if actions.is_empty() {
        return Ok(None);
    }

    log::debug!(
        "Policy {} matches {}",
        policy.policy_name,
        actions.join(", ")
    );

    Ok(Some(PolicyCrossReferenceMatch {
        policy_name: policy.policy_name.clone(),
        policy_arn: policy.arn.clone(),
        matched_actions: actions,
        raw_statement_text: document,
    }))
}

#[allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::indexing_slicing,
    clippy::panic
)]
