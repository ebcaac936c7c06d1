pub mod extractors;
pub mod gate;
pub mod middleware;
pub mod password;
pub mod revocation;
pub mod token;

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::models::PublicUser;

pub use gate::{AuthGate, AuthenticatedUser, Rejection};
pub use middleware::AuthMiddleware;
pub use password::{check_password_policy, PasswordHasher, PolicyError};
pub use revocation::{
    MemoryRevocationStore, RedisRevocationStore, RevocationPolicy, RevocationStore,
};
pub use token::{Claims, TokenService, VerificationError, VerifiedToken};

/// Represents the payload for a login request.
#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(length(min = 1, message = "Email is required"))]
    pub email: String,
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

/// Represents the payload for a registration request.
///
/// The password is only checked for presence here; the complexity policy is
/// applied by the handler so it can answer with the policy message.
#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(email(message = "A valid email is required"))]
    pub email: String,
    #[validate(length(min = 1, max = 100, message = "Name must be 1 to 100 characters"))]
    pub name: String,
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

/// Response to a successful login.
#[derive(Debug, Serialize, Deserialize)]
pub struct LoginResponse {
    pub token: String,
    pub user: PublicUser,
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}
