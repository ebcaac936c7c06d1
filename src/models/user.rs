use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::{Validate, ValidationError};

/// A registered identity as stored in the `users` table.
///
/// Deliberately not `Serialize`: the password hash must never reach a response body.
/// Use [`PublicUser`] for anything that leaves the process.
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    pub password_hash: String,
    /// Federated-login provider, e.g. `github`.
    pub provider: Option<String>,
    pub provider_id: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// The identity fields that may be shown to the identity itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublicUser {
    pub id: Uuid,
    pub name: String,
    pub email: String,
}

impl From<&User> for PublicUser {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            name: user.name.clone(),
            email: user.email.clone(),
        }
    }
}

/// A new identity ready for insertion. The secret is already hashed.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub name: String,
    pub password_hash: String,
}

impl User {
    pub fn new(input: NewUser) -> Self {
        Self {
            id: Uuid::new_v4(),
            email: input.email,
            name: input.name,
            password_hash: input.password_hash,
            provider: None,
            provider_id: None,
            created_at: Utc::now(),
        }
    }
}

/// Store-level profile changes; `None` leaves the column untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProfileChanges {
    pub email: Option<String>,
    pub name: Option<String>,
    pub password_hash: Option<String>,
}

impl ProfileChanges {
    pub fn is_empty(&self) -> bool {
        self.email.is_none() && self.name.is_none() && self.password_hash.is_none()
    }
}

/// Payload of `PATCH /me`.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
#[validate(schema(function = "validate_has_change", skip_on_field_errors = false))]
pub struct UpdateProfileRequest {
    #[validate(email)]
    pub new_email: Option<String>,
    #[validate(length(min = 1, max = 100))]
    pub new_name: Option<String>,
    pub new_password: Option<String>,
    pub current_password: Option<String>,
}

impl UpdateProfileRequest {
    /// Email and secret changes must be confirmed with the current secret.
    pub fn needs_current_password(&self) -> bool {
        self.new_email.is_some() || self.new_password.is_some()
    }
}

fn validate_has_change(request: &UpdateProfileRequest) -> Result<(), ValidationError> {
    if request.new_email.is_none() && request.new_name.is_none() && request.new_password.is_none()
    {
        let mut error = ValidationError::new("no_changes");
        error.message = Some("Provide at least one of newEmail, newName or newPassword".into());
        return Err(error);
    }
    Ok(())
}
