use crate::error::AppError;
use actix_web::web;
use bcrypt::{hash, verify};
use lazy_static::lazy_static;
use log::warn;
use regex::Regex;
use thiserror::Error;
use uuid::Uuid;

/// Symbols accepted by the complexity policy.
pub const PASSWORD_SYMBOLS: &str = "!@#$%^&*";
pub const MIN_PASSWORD_LEN: usize = 6;

lazy_static! {
    static ref HAS_DIGIT: Regex = Regex::new(r"[0-9]").unwrap();
    static ref HAS_SYMBOL: Regex = Regex::new(r"[!@#$%^&*]").unwrap();
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("Password needs to be at least 6 characters long, use one number and one special character.")]
pub struct PolicyError;

/// Checks the secret complexity policy: at least six characters, one digit and one
/// symbol from [`PASSWORD_SYMBOLS`]. Runs before any hashing.
pub fn check_password_policy(password: &str) -> Result<(), PolicyError> {
    if password.chars().count() >= MIN_PASSWORD_LEN
        && HAS_DIGIT.is_match(password)
        && HAS_SYMBOL.is_match(password)
    {
        Ok(())
    } else {
        Err(PolicyError)
    }
}

/// Salted bcrypt hashing with a configurable cost.
///
/// Holds a dummy hash of the same cost so that a login for an unknown email
/// can burn the same amount of CPU as a real verification.
#[derive(Debug, Clone)]
pub struct PasswordHasher {
    cost: u32,
    dummy_hash: String,
}

impl PasswordHasher {
    pub fn new(cost: u32) -> Result<Self, AppError> {
        let dummy_hash = hash(Uuid::new_v4().to_string(), cost)?;
        Ok(Self { cost, dummy_hash })
    }

    pub fn hash_password(&self, password: &str) -> Result<String, AppError> {
        hash(password, self.cost)
            .map_err(|e| AppError::InternalServerError(format!("Failed to hash password: {}", e)))
    }

    /// A malformed stored hash is reported as a mismatch, never as an error,
    /// so callers cannot tell it apart from a wrong password.
    pub fn verify_password(&self, password: &str, hashed_password: &str) -> bool {
        match verify(password, hashed_password) {
            Ok(matches) => matches,
            Err(e) => {
                warn!("Stored password hash could not be parsed: {}", e);
                false
            }
        }
    }

    /// Verifies against the dummy hash and always returns `false`.
    pub fn verify_dummy(&self, password: &str) -> bool {
        let _ = self.verify_password(password, &self.dummy_hash);
        false
    }

    /// [`hash_password`](Self::hash_password) on the blocking thread pool.
    pub async fn hash_offloaded(&self, password: String) -> Result<String, AppError> {
        let hasher = self.clone();
        web::block(move || hasher.hash_password(&password)).await?
    }

    /// Verifies on the blocking thread pool. `None` for the stored hash means the
    /// identity does not exist; the dummy hash is checked instead.
    pub async fn verify_offloaded(
        &self,
        password: String,
        hashed_password: Option<String>,
    ) -> Result<bool, AppError> {
        let hasher = self.clone();
        let matches = web::block(move || match hashed_password {
            Some(stored) => hasher.verify_password(&password, &stored),
            None => hasher.verify_dummy(&password),
        })
        .await?;
        Ok(matches)
    }
}
