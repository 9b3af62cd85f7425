//! Policy statement extraction
//!
//! Parses a policy document into a generic JSON tree and projects each
//! statement onto the handful of fields the report cares about. The document
//! grammar tolerates several shapes for the same thing (a scalar or a list
//! for `Action`, a single object or an array for `Statement`, booleans and
//! numbers quoted or not); all of them are normalized here.

use std::collections::BTreeSet;

use serde_json::{Map, Value};

use crate::tree::PolicyStatement;

/// Condition key that disables the key-policy lockout safety check
pub const BYPASS_LOCKOUT_KEY: &str = "kms:BypassPolicyLockoutSafetyCheck";

/// Condition key carrying seconds since MFA authentication
pub const MFA_AGE_KEY: &str = "aws:MultiFactorAuthAge";

/// Why a policy document could not be projected
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ExtractionError {
    #[error("document is not valid JSON: {0}")]
    InvalidJson(String),

    #[error("document has no Statement element")]
    MissingStatement,

    #[error("statement {index}: {reason}")]
    InvalidStatement { index: usize, reason: String },
}

/// Extract statements from policy document text, preserving source order
pub fn extract_statements(document: &str) -> Result<Vec<PolicyStatement>, ExtractionError> {
    let root: Value =
        serde_json::from_str(document).map_err(|e| ExtractionError::InvalidJson(e.to_string()))?;
    extract_from_value(&root)
}

fn extract_from_value(root: &Value) -> Result<Vec<PolicyStatement>, ExtractionError> {
    let statements = root
        .get("Statement")
        .ok_or(ExtractionError::MissingStatement)?;

    match statements {
        Value::Array(items) => items
            .iter()
            .enumerate()
            .map(|(index, item)| extract_statement(index, item))
            .collect(),
        Value::Object(_) => Ok(vec![extract_statement(0, statements)?]),
        _ => Err(ExtractionError::InvalidStatement {
            index: 0,
            reason: "Statement must be an object or an array of objects".to_string(),
        }),
    }
}

fn extract_statement(index: usize, value: &Value) -> Result<PolicyStatement, ExtractionError> {
    let invalid = |reason: String| ExtractionError::InvalidStatement { index, reason };

    let statement = value
        .as_object()
        .ok_or_else(|| invalid("statement is not an object".to_string()))?;

    let sid = match statement.get("Sid") {
        None => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => return Err(invalid(format!("Sid must be a string, got {}", other))),
    };

    let actions = match statement.get("Action") {
        None => BTreeSet::new(),
        Some(action) => normalize_actions(action).map_err(invalid)?,
    };

    let (bypass, mfa_age) = match statement.get("Condition") {
        None => (false, None),
        Some(Value::Object(condition)) => (
            bypass_lockout_enabled(condition),
            multi_factor_auth_age(condition).map_err(invalid)?,
        ),
        Some(other) => {
            return Err(invalid(format!(
                "Condition must be an object, got {}",
                other
            )))
        }
    };

    Ok(PolicyStatement {
        sid,
        actions,
        bypass_policy_lockout_safety_check: bypass,
        multi_factor_auth_age: mfa_age,
    })
}

/// Normalize a scalar-or-list `Action` value into a set
fn normalize_actions(action: &Value) -> Result<BTreeSet<String>, String> {
    match action {
        Value::String(s) => Ok(BTreeSet::from([s.clone()])),
        Value::Array(items) => items
            .iter()
            .map(|item| {
                item.as_str()
                    .map(str::to_string)
                    .ok_or_else(|| format!("Action entries must be strings, got {}", item))
            })
            .collect(),
        other => Err(format!(
            "Action must be a string or an array, got {}",
            other
        )),
    }
}

/// Values bound to `key` under every operator accepted by `operator_matches`
///
/// Condition keys are case-insensitive in the policy grammar; operator names
/// are not.
fn condition_values<'a>(
    condition: &'a Map<String, Value>,
    key: &'a str,
    operator_matches: impl Fn(&str) -> bool + 'a,
) -> impl Iterator<Item = &'a Value> + 'a {
    condition
        .iter()
        .filter(move |(operator, _)| operator_matches(operator.as_str()))
        .filter_map(|(_, block)| block.as_object())
        .flat_map(move |block| {
            block
                .iter()
                .filter(move |(name, _)| name.eq_ignore_ascii_case(key))
                .map(|(_, value)| value)
        })
        .flat_map(|value| match value {
            Value::Array(items) => items.iter().collect::<Vec<_>>(),
            single => vec![single],
        })
}

fn bypass_lockout_enabled(condition: &Map<String, Value>) -> bool {
    condition_values(condition, BYPASS_LOCKOUT_KEY, |op| {
        op == "Bool" || op == "BoolIfExists"
    })
    .any(|value| match value {
        Value::Bool(b) => *b,
        Value::String(s) => s.eq_ignore_ascii_case("true"),
        _ => false,
    })
}

fn multi_factor_auth_age(condition: &Map<String, Value>) -> Result<Option<i64>, String> {
    let first = condition_values(condition, MFA_AGE_KEY, |op| op.starts_with("Numeric")).next();

    match first {
        None => Ok(None),
        Some(Value::Number(n)) => n
            .as_i64()
            .map(Some)
            .ok_or_else(|| format!("{} must be an integer, got {}", MFA_AGE_KEY, n)),
        Some(Value::String(s)) => s
            .trim()
            .parse::<i64>()
            .map(Some)
            .map_err(|_| format!("{} must be an integer, got '{}'", MFA_AGE_KEY, s)),
        Some(other) => Err(format!(
            "{} must be an integer, got {}",
            MFA_AGE_KEY, other
        )),
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
#[cfg(test)]
mod tests {
    use super::*;

    fn set(items: &[&str]) -> BTreeSet<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_root_and_bypass_statements() {
        let document = r#"{
            "Version": "2012-10-17",
            "Id": "key-default-1",
            "Statement": [
                {
                    "Sid": "AllowRoot",
                    "Effect": "Allow",
                    "Principal": {"AWS": "arn:aws:iam::123456789012:root"},
                    "Action": ["kms:*"],
                    "Resource": "*"
                },
                {
                    "Sid": "DenyBypass",
                    "Effect": "Deny",
                    "Principal": "*",
                    "Action": "kms:PutKeyPolicy",
                    "Resource": "*",
                    "Condition": {
                        "Bool": {"kms:BypassPolicyLockoutSafetyCheck": true}
                    }
                }
            ]
        }"#;

        let statements = extract_statements(document).unwrap();

        assert_eq!(statements.len(), 2);
        assert_eq!(statements[0].sid, "AllowRoot");
        assert_eq!(statements[0].actions, set(&["kms:*"]));
        assert!(!statements[0].bypass_policy_lockout_safety_check);
        assert_eq!(statements[1].sid, "DenyBypass");
        assert!(statements[1].bypass_policy_lockout_safety_check);
    }

    #[test]
    fn test_scalar_and_array_actions_normalize_equally() {
        let scalar = extract_statements(r#"{"Statement":[{"Action":"kms:Decrypt"}]}"#).unwrap();
        let array = extract_statements(r#"{"Statement":[{"Action":["kms:Decrypt"]}]}"#).unwrap();

        assert_eq!(scalar[0].actions, array[0].actions);
        assert_eq!(scalar[0].actions, set(&["kms:Decrypt"]));
    }

    #[test]
    fn test_duplicate_actions_collapse() {
        let statements = extract_statements(
            r#"{"Statement":[{"Action":["kms:Encrypt","kms:Decrypt","kms:Encrypt"]}]}"#,
        )
        .unwrap();

        assert_eq!(statements[0].actions, set(&["kms:Decrypt", "kms:Encrypt"]));
    }

    #[test]
    fn test_minified_document_keeps_order() {
        let document = r#"{"Statement":[{"Sid":"c","Action":"kms:A"},{"Sid":"a","Action":"kms:B"},{"Sid":"b","Action":"kms:C"}]}"#;

        let sids: Vec<String> = extract_statements(document)
            .unwrap()
            .into_iter()
            .map(|s| s.sid)
            .collect();

        assert_eq!(sids, vec!["c", "a", "b"]);
    }

    #[test]
    fn test_defaults_when_fields_absent() {
        let statements =
            extract_statements(r#"{"Statement":[{"Effect":"Allow","NotAction":"kms:*"}]}"#)
                .unwrap();

        assert_eq!(statements[0].sid, "");
        assert!(statements[0].actions.is_empty());
        assert!(!statements[0].bypass_policy_lockout_safety_check);
        assert_eq!(statements[0].multi_factor_auth_age, None);
    }

    #[test]
    fn test_single_statement_object() {
        let statements =
            extract_statements(r#"{"Statement":{"Sid":"Only","Action":"kms:Sign"}}"#).unwrap();

        assert_eq!(statements.len(), 1);
        assert_eq!(statements[0].sid, "Only");
    }

    #[test]
    fn test_bypass_value_shapes() {
        for condition in [
            r#"{"Bool":{"kms:BypassPolicyLockoutSafetyCheck":"true"}}"#,
            r#"{"Bool":{"kms:bypasspolicylockoutsafetycheck":true}}"#,
            r#"{"BoolIfExists":{"kms:BypassPolicyLockoutSafetyCheck":["true"]}}"#,
        ] {
            let document = format!(r#"{{"Statement":[{{"Condition":{}}}]}}"#, condition);
            let statements = extract_statements(&document).unwrap();
            assert!(
                statements[0].bypass_policy_lockout_safety_check,
                "expected bypass for {}",
                condition
            );
        }

        let document =
            r#"{"Statement":[{"Condition":{"Bool":{"kms:BypassPolicyLockoutSafetyCheck":false}}}]}"#;
        assert!(!extract_statements(document).unwrap()[0].bypass_policy_lockout_safety_check);

        let document = r#"{"Statement":[{"Condition":{"StringEquals":{"kms:BypassPolicyLockoutSafetyCheck":"true"}}}]}"#;
        assert!(!extract_statements(document).unwrap()[0].bypass_policy_lockout_safety_check);
    }

    #[test]
    fn test_mfa_age_parsed_from_numeric_condition() {
        let quoted = r#"{"Statement":[{"Condition":{"NumericLessThan":{"aws:MultiFactorAuthAge":"300"}}}]}"#;
        let bare = r#"{"Statement":[{"Condition":{"NumericLessThanEquals":{"aws:MultiFactorAuthAge":[3600]}}}]}"#;

        assert_eq!(
            extract_statements(quoted).unwrap()[0].multi_factor_auth_age,
            Some(300)
        );
        assert_eq!(
            extract_statements(bare).unwrap()[0].multi_factor_auth_age,
            Some(3600)
        );
    }

    #[test]
    fn test_mfa_null_check_is_not_an_age() {
        let document =
            r#"{"Statement":[{"Condition":{"Null":{"aws:MultiFactorAuthAge":"true"}}}]}"#;

        assert_eq!(
            extract_statements(document).unwrap()[0].multi_factor_auth_age,
            None
        );
    }

    #[test]
    fn test_malformed_documents_are_rejected() {
        assert!(matches!(
            extract_statements("{\"Statement\": ["),
            Err(ExtractionError::InvalidJson(_))
        ));
        assert_eq!(
            extract_statements(r#"{"Version":"2012-10-17"}"#),
            Err(ExtractionError::MissingStatement)
        );
        assert!(matches!(
            extract_statements(r#"{"Statement":[{"Action":"kms:A"},{"Action":7}]}"#),
            Err(ExtractionError::InvalidStatement { index: 1, .. })
        ));
        assert!(matches!(
            extract_statements(
                r#"{"Statement":[{"Condition":{"NumericLessThan":{"aws:MultiFactorAuthAge":"soon"}}}]}"#
            ),
            Err(ExtractionError::InvalidStatement { index: 0, .. })
        ));
        assert!(matches!(
            extract_statements(r#"{"Statement":"kms:*"}"#),
            Err(ExtractionError::InvalidStatement { .. })
        ));
    }
}
