//! The request-time authentication decision.
//!
//! `AuthGate::authenticate` is a strict pipeline: extract the bearer token,
//! verify it, check the revocation store, resolve the identity. The first failing
//! step decides the outcome and nothing after it runs.

use log::{debug, error};
use std::sync::Arc;
use thiserror::Error;
use uuid::Uuid;

use crate::auth::revocation::RevocationStore;
use crate::auth::token::{TokenService, VerifiedToken};
use crate::store::UserStore;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum Rejection {
    #[error("Missing authentication")]
    MissingCredential,
    #[error("Invalid or expired token")]
    InvalidOrExpired,
    #[error("Token has been revoked")]
    Revoked,
    #[error("Authentication store unavailable: {0}")]
    StoreUnavailable(String),
    #[error("Unknown identity")]
    UnknownIdentity,
}

/// The resolved identity attached to an accepted request.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    pub id: Uuid,
    pub name: String,
    /// The credential the request was accepted with, needed for logout.
    pub token: VerifiedToken,
}

/// Returns the token of a `Bearer` authorization header value.
pub fn bearer_token(header: &str) -> Option<&str> {
    let (scheme, token) = header.trim().split_once(' ')?;
    let token = token.trim();
    (scheme.eq_ignore_ascii_case("bearer") && !token.is_empty()).then_some(token)
}

#[derive(Clone)]
pub struct AuthGate {
    tokens: Arc<TokenService>,
    revocations: Arc<dyn RevocationStore>,
    users: Arc<dyn UserStore>,
}

impl AuthGate {
    pub fn new(
        tokens: Arc<TokenService>,
        revocations: Arc<dyn RevocationStore>,
        users: Arc<dyn UserStore>,
    ) -> Self {
        Self {
            tokens,
            revocations,
            users,
        }
    }

    /// Evaluates one request given its `Authorization` header value.
    pub async fn authenticate(&self, authorization: Option<&str>) -> Result<AuthenticatedUser, Rejection> {
        let raw = authorization
            .and_then(bearer_token)
            .ok_or(Rejection::MissingCredential)?;

        let token = self.tokens.verify(raw).map_err(|e| {
            debug!("Rejected token: {}", e);
            Rejection::InvalidOrExpired
        })?;

        match self.revocations.is_blacklisted(&token.raw).await {
            Ok(false) => {}
            Ok(true) => return Err(Rejection::Revoked),
            Err(e) => {
                error!("Revocation check failed: {}", e);
                return Err(Rejection::StoreUnavailable(e.to_string()));
            }
        }

        let subject = Uuid::parse_str(&token.claims.sub).map_err(|_| {
            debug!("Token subject is not an identity id");
            Rejection::UnknownIdentity
        })?;
        let user = self
            .users
            .find_by_id(subject)
            .await
            .map_err(|e| {
                error!("Identity lookup failed: {}", e);
                Rejection::StoreUnavailable(e.to_string())
            })?
            .ok_or(Rejection::UnknownIdentity)?;

        Ok(AuthenticatedUser {
            id: user.id,
            name: user.name,
            token,
        })
    }
}
