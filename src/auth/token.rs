use crate::error::AppError;
use chrono::{DateTime, Utc};
use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;
use uuid::Uuid;

/// Represents the claims encoded within a JWT (JSON Web Token).
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Claims {
    /// Subject of the token: the identity's id. Its format is not checked here;
    /// identity lookup decides whether it names anyone.
    pub sub: String,
    /// Issued-at (seconds since epoch).
    pub iat: i64,
    /// Not-before (seconds since epoch).
    pub nbf: i64,
    /// Expiration (seconds since epoch).
    pub exp: i64,
    /// Unique id of this issuance.
    pub jti: Uuid,
}

impl Claims {
    /// Time left until `exp`, zero once expired.
    pub fn remaining(&self, now: DateTime<Utc>) -> Duration {
        Duration::from_secs((self.exp - now.timestamp()).max(0) as u64)
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum VerificationError {
    #[error("token signature does not match")]
    InvalidSignature,
    #[error("token has expired")]
    Expired,
    #[error("token is not valid yet")]
    NotYetValid,
    #[error("token is malformed")]
    Malformed,
}

/// A token that passed signature and time checks, with the raw string kept for
/// revocation lookups.
#[derive(Debug, Clone)]
pub struct VerifiedToken {
    pub claims: Claims,
    pub raw: String,
}

/// Issues and verifies HS256-signed tokens with a process-wide key.
#[derive(Clone)]
pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    lifetime: Duration,
    leeway: Duration,
}

impl TokenService {
    pub fn new(secret: &[u8], lifetime: Duration, leeway: Duration) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            lifetime,
            leeway,
        }
    }

    /// Claims for a token issued to `subject` at `now`.
    pub fn claims_for(&self, subject: Uuid, now: DateTime<Utc>) -> Claims {
        let issued = now.timestamp();
        Claims {
            sub: subject.to_string(),
            iat: issued,
            nbf: issued,
            exp: issued + self.lifetime.as_secs() as i64,
            jti: Uuid::new_v4(),
        }
    }

    pub fn sign(&self, claims: &Claims) -> Result<String, AppError> {
        encode(&Header::new(Algorithm::HS256), claims, &self.encoding_key)
            .map_err(|e| AppError::InternalServerError(format!("Failed to generate token: {}", e)))
    }

    /// Generates a token for `subject`, valid for the configured lifetime.
    pub fn issue(&self, subject: Uuid) -> Result<String, AppError> {
        self.sign(&self.claims_for(subject, Utc::now()))
    }

    pub fn verify(&self, token: &str) -> Result<VerifiedToken, VerificationError> {
        self.verify_at(token, Utc::now())
    }

    /// Checks the signature, then `nbf` (with the skew leeway) and `exp` (without).
    /// Audience, issuer and subject format are not checked.
    pub fn verify_at(&self, token: &str, now: DateTime<Utc>) -> Result<VerifiedToken, VerificationError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        validation.validate_nbf = false;
        validation.validate_aud = false;
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "nbf"]);

        let claims = decode::<Claims>(token, &self.decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                ErrorKind::InvalidSignature => VerificationError::InvalidSignature,
                ErrorKind::ExpiredSignature => VerificationError::Expired,
                ErrorKind::ImmatureSignature => VerificationError::NotYetValid,
                _ => VerificationError::Malformed,
            })?;

        let now = now.timestamp();
        if now < claims.nbf - self.leeway.as_secs() as i64 {
            return Err(VerificationError::NotYetValid);
        }
        if now > claims.exp {
            return Err(VerificationError::Expired);
        }

        Ok(VerifiedToken {
            claims,
            raw: token.to_string(),
        })
    }
}
