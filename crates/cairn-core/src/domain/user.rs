//! User entity and the write-side shapes that produce or mutate it.

use super::email::Email;
use crate::UserId;
use serde::{Deserialize, Serialize};

/// A user record as persisted by the backing store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Identifier assigned by the backing store.
    pub id: UserId,
    /// Display name, never blank.
    pub name: String,
    /// Normalized email address.
    pub email: Email,
}

impl User {
    /// Applies every field present in `patch`, leaving the rest untouched.
    pub fn apply(&mut self, patch: UserPatch) {
        if let Some(name) = patch.name {
            self.name = name;
        }
        if let Some(email) = patch.email {
            self.email = email;
        }
    }

    /// Returns a copy of this user with `patch` merged in.
    #[must_use]
    pub fn merged(mut self, patch: UserPatch) -> Self {
        self.apply(patch);
        self
    }
}

/// Fields for a user that has not been persisted yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewUser {
    pub name: String,
    pub email: Email,
}

impl NewUser {
    #[must_use]
    pub fn new(name: impl Into<String>, email: Email) -> Self {
        Self {
            name: name.into(),
            email,
        }
    }
}

/// A partial update; `None` means "keep the stored value".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserPatch {
    pub name: Option<String>,
    pub email: Option<Email>,
}

impl UserPatch {
    /// Returns true when the patch would change nothing.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.name.is_none() && self.email.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn john() -> User {
        User {
            id: UserId::new(1),
            name: "John Doe".to_string(),
            email: Email::new_unchecked("johndoe@example.com"),
        }
    }

    #[test]
    fn test_apply_partial_patch_keeps_other_fields() {
        let user = john().merged(UserPatch {
            name: Some("Johnny".to_string()),
            email: None,
        });

        assert_eq!(user.name, "Johnny");
        assert_eq!(user.email.as_str(), "johndoe@example.com");
        assert_eq!(user.id, UserId::new(1));
    }

    #[test]
    fn test_apply_full_patch() {
        let mut user = john();
        user.apply(UserPatch {
            name: Some("Jane".to_string()),
            email: Some(Email::new("jane@example.com").unwrap()),
        });

        assert_eq!(user.name, "Jane");
        assert_eq!(user.email.as_str(), "jane@example.com");
    }

    #[test]
    fn test_empty_patch() {
        assert!(UserPatch::default().is_empty());
        assert_eq!(john().merged(UserPatch::default()), john());
    }

    #[test]
    fn test_user_json_shape_is_plain_field_set() {
        let json = serde_json::to_value(john()).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"id": 1, "name": "John Doe", "email": "johndoe@example.com"})
        );
    }
}
