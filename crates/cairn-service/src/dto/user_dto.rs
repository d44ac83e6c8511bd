//! User-related DTOs.

use cairn_core::rules::not_blank;
use cairn_core::{CairnError, CairnResult, Email, NewUser, User, UserId, UserPatch};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::{Validate, ValidationError};

/// Request to create a new user.
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct CreateUserRequest {
    #[validate(
        custom(function = "not_blank", message = "Name must not be blank"),
        length(max = 255, message = "Name cannot exceed 255 characters")
    )]
    #[schema(example = "John Doe")]
    pub name: String,

    #[validate(
        email(message = "Invalid email address"),
        length(max = 255, message = "Email cannot exceed 255 characters")
    )]
    #[schema(example = "johndoe@example.com")]
    pub email: String,
}

impl CreateUserRequest {
    /// Converts the request into store-ready fields, normalizing the email.
    pub fn into_new_user(self) -> CairnResult<NewUser> {
        let email = Email::new(self.email).map_err(|e| CairnError::Validation(e.to_string()))?;
        Ok(NewUser::new(self.name.trim(), email))
    }
}

/// Partial update of a user. Absent fields keep their stored value.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate, ToSchema)]
#[validate(schema(function = "reject_empty_patch"))]
pub struct UpdateUserRequest {
    #[validate(
        custom(function = "not_blank", message = "Name must not be blank"),
        length(max = 255, message = "Name cannot exceed 255 characters")
    )]
    pub name: Option<String>,

    #[validate(
        email(message = "Invalid email address"),
        length(max = 255, message = "Email cannot exceed 255 characters")
    )]
    pub email: Option<String>,
}

impl UpdateUserRequest {
    /// Converts the request into a patch, normalizing the email if present.
    pub fn into_patch(self) -> CairnResult<UserPatch> {
        let email = self
            .email
            .map(Email::new)
            .transpose()
            .map_err(|e| CairnError::Validation(e.to_string()))?;

        Ok(UserPatch {
            name: self.name.map(|name| name.trim().to_string()),
            email,
        })
    }
}

fn reject_empty_patch(request: &UpdateUserRequest) -> Result<(), ValidationError> {
    if request.name.is_none() && request.email.is_none() {
        let mut error = ValidationError::new("empty_patch");
        error.message = Some("At least one of name or email must be provided".into());
        return Err(error);
    }
    Ok(())
}

/// User response DTO.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct UserResponse {
    pub id: UserId,
    pub name: String,
    pub email: String,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            name: user.name,
            email: user.email.into(),
        }
    }
}
