//! Key-management action watch-list
//!
//! Identity policies are screened for key-management relevance by a plain
//! text search for well-known action prefixes. A hit means "a human should
//! look at this policy", nothing more.

/// Action prefixes that make an identity policy relevant to key management
pub const KEY_MANAGEMENT_WATCHLIST: &[&str] = &[
    "kms:*",
    "kms:Create",
    "kms:Describe",
    "kms:Enable",
    "kms:List",
    "kms:Put",
    "kms:Update",
    "kms:Revoke",
    "kms:Disable",
    "kms:Get",
    "kms:Delete",
    "kms:Tag",
    "kms:Untag",
    "kms:ScheduleKeyDeletion",
    "kms:CancelKeyDeletion",
    "kms:Encrypt",
    "kms:Decrypt",
    "kms:ReEncrypt",
    "kms:GenerateDataKey",
    "kms:Sign",
    "kms:Verify",
];

/// Watch-list entries found in a raw policy document, in watch-list order
///
/// Action names are case-insensitive, so the search is too.
pub fn matched_actions(document: &str) -> Vec<String> {
    let haystack = document.to_ascii_lowercase();
    KEY_MANAGEMENT_WATCHLIST
        .iter()
        .filter(|action| haystack.contains(&action.to_ascii_lowercase()))
        .map(|action| action.to_string())
        .collect()
}
