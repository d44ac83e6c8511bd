//! Cache key names.
//!
//! Keys are unprefixed and shared with any other client of the same store.

use cairn_core::UserId;

/// Whole user collection, written by the collection policy.
pub const USERS: &str = "users";

/// User id list, written by the index policy.
pub const USER_IDS: &str = "user_ids";

/// Keys inspected by the footprint diagnostic, in report order.
pub const OBSERVED_KEYS: [&str; 2] = [USERS, USER_IDS];

/// Key of a single cached user.
#[must_use]
pub fn user(id: UserId) -> String {
    format!("user_{}", id)
}
