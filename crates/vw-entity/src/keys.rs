//! Entity key policy.
//!
//! Hash keys group records by owner: `ACCOUNT#{accountId}` for account-scoped
//! entities, `USER#{userId}` for user-scoped ones. Range keys are
//! `{TAG}#{localId}`; an empty local id yields the bare `{TAG}#` prefix used
//! for begins-with queries.

/// Separator between a key tag and its identifier.
pub const KEY_SEPARATOR: char = '#';

pub const ACCOUNT_TAG: &str = "ACCOUNT";
pub const USER_TAG: &str = "USER";

/// Hash key of every record owned by an account.
pub fn account_hash_key(account_id: &str) -> String {
    range_key(ACCOUNT_TAG, account_id)
}

/// Hash key of every record owned by a user.
pub fn user_hash_key(user_id: &str) -> String {
    range_key(USER_TAG, user_id)
}

/// `{tag}#{local_id}`, or the bare `{tag}#` prefix when `local_id` is empty.
pub fn range_key(tag: &str, local_id: &str) -> String {
    format!("{tag}{KEY_SEPARATOR}{local_id}")
}

/// Prefix matching every range key of the given tag.
pub fn range_prefix(tag: &str) -> String {
    range_key(tag, "")
}

/// Zero-pad an allocated sequence number into a local identifier.
///
/// Numbers wider than `width` are kept intact.
pub fn format_local_id(n: u64, width: usize) -> String {
    format!("{n:0width$}")
}
