//!
//! # Custom Error Handling
//!
//! This module defines the boundary error type `AppError` returned by every handler.
//! Business logic produces typed outcomes (`StoreError`, `Rejection`, `PolicyError`,
//! `PatchError`, ...) which are converted into `AppError` with `?`, and only here are
//! they mapped onto HTTP status codes.
//!
//! Every error response has the same JSON shape:
//!
//! ```json
//! { "statusCode": 401, "error": "Unauthorized", "message": "Invalid or expired token" }
//! ```
//!
//! Internal failures (database, revocation store, hashing) are logged with full detail
//! and answered with a generic message so nothing about the internals leaks to callers.

use actix_web::{error::ResponseError, http::StatusCode, HttpResponse};
use log::error;
use serde_json::json;
use std::fmt;
use validator::ValidationErrors;

use crate::auth::gate::Rejection;
use crate::auth::password::PolicyError;
use crate::auth::token::VerificationError;
use crate::models::task::PatchError;
use crate::store::StoreError;

/// Message returned to clients for every 500-class failure.
pub const INTERNAL_ERROR_MESSAGE: &str = "An internal server error occurred";

/// Represents all possible errors that can surface at the HTTP boundary.
///
/// Each variant corresponds to a specific type of error, carrying a message
/// detailing the issue. For the internal variants the message is only logged.
#[derive(Debug)]
pub enum AppError {
    /// Missing, invalid, expired or revoked credential (HTTP 401).
    Unauthorized(String),
    /// Malformed input, conflicting data or an illegal state transition (HTTP 400).
    BadRequest(String),
    /// Resource or identity not found, including records owned by someone else (HTTP 404).
    NotFound(String),
    /// Represents an unexpected server-side error (HTTP 500).
    InternalServerError(String),
    /// Represents an error originating from a store operation (HTTP 500).
    DatabaseError(String),
    /// Field-level input validation failure (HTTP 400).
    /// Wraps errors from the `validator` crate.
    ValidationError(String),
}

impl AppError {
    /// Short, machine-readable category placed in the `error` field of the body.
    pub fn category(&self) -> &'static str {
        match self {
            AppError::Unauthorized(_) => "Unauthorized",
            AppError::BadRequest(_) | AppError::ValidationError(_) => "Bad Request",
            AppError::NotFound(_) => "Not Found",
            AppError::InternalServerError(_) | AppError::DatabaseError(_) => {
                "Internal Server Error"
            }
        }
    }

    /// The message that is safe to show to the caller.
    fn public_message(&self) -> &str {
        match self {
            AppError::Unauthorized(msg)
            | AppError::BadRequest(msg)
            | AppError::NotFound(msg)
            | AppError::ValidationError(msg) => msg,
            AppError::InternalServerError(_) | AppError::DatabaseError(_) => {
                INTERNAL_ERROR_MESSAGE
            }
        }
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            AppError::Unauthorized(msg) => write!(f, "Unauthorized: {}", msg),
            AppError::BadRequest(msg) => write!(f, "Bad Request: {}", msg),
            AppError::NotFound(msg) => write!(f, "Not Found: {}", msg),
            AppError::InternalServerError(msg) => write!(f, "Internal Server Error: {}", msg),
            AppError::DatabaseError(msg) => write!(f, "Database Error: {}", msg),
            AppError::ValidationError(msg) => write!(f, "Validation Error: {}", msg),
        }
    }
}

/// Converts `AppError` variants into `HttpResponse` objects.
///
/// Actix Web calls this for every `Err(AppError)` returned by a handler or middleware.
impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::BadRequest(_) | AppError::ValidationError(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::InternalServerError(_) | AppError::DatabaseError(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn error_response(&self) -> HttpResponse {
        if let AppError::InternalServerError(detail) | AppError::DatabaseError(detail) = self {
            error!("{}: {}", self.category(), detail);
        }
        let status = self.status_code();
        HttpResponse::build(status).json(json!({
            "statusCode": status.as_u16(),
            "error": self.category(),
            "message": self.public_message(),
        }))
    }
}

/// Specific cases like `sqlx::Error::RowNotFound` are mapped to `AppError::NotFound`,
/// while other database errors become `AppError::DatabaseError`.
impl From<sqlx::Error> for AppError {
    fn from(error: sqlx::Error) -> AppError {
        match error {
            sqlx::Error::RowNotFound => AppError::NotFound("Record not found".into()),
            _ => AppError::DatabaseError(error.to_string()),
        }
    }
}

impl From<StoreError> for AppError {
    fn from(error: StoreError) -> AppError {
        match error {
            StoreError::Conflict(msg) => AppError::BadRequest(msg),
            StoreError::Unavailable(msg) => AppError::DatabaseError(msg),
            StoreError::Database(e) => AppError::from(e),
        }
    }
}

/// The detailed validation messages are preserved.
impl From<ValidationErrors> for AppError {
    fn from(error: ValidationErrors) -> AppError {
        AppError::ValidationError(error.to_string())
    }
}

impl From<VerificationError> for AppError {
    fn from(_: VerificationError) -> AppError {
        AppError::Unauthorized("Invalid or expired token".into())
    }
}

impl From<Rejection> for AppError {
    fn from(rejection: Rejection) -> AppError {
        match rejection {
            Rejection::StoreUnavailable(detail) => AppError::InternalServerError(detail),
            other => AppError::Unauthorized(other.to_string()),
        }
    }
}

impl From<PolicyError> for AppError {
    fn from(error: PolicyError) -> AppError {
        AppError::BadRequest(error.to_string())
    }
}

impl From<PatchError> for AppError {
    fn from(error: PatchError) -> AppError {
        AppError::BadRequest(error.to_string())
    }
}

/// Handles errors during password hashing or verification.
impl From<bcrypt::BcryptError> for AppError {
    fn from(error: bcrypt::BcryptError) -> AppError {
        AppError::InternalServerError(error.to_string())
    }
}

/// A `web::block` worker was cancelled or panicked.
impl From<actix_web::error::BlockingError> for AppError {
    fn from(error: actix_web::error::BlockingError) -> AppError {
        AppError::InternalServerError(format!("blocking task failed: {}", error))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::body::to_bytes;

    #[test]
    fn test_error_statuses() {
        assert_eq!(AppError::Unauthorized("x".into()).error_response().status(), 401);
        assert_eq!(AppError::BadRequest("x".into()).error_response().status(), 400);
        assert_eq!(AppError::ValidationError("x".into()).error_response().status(), 400);
        assert_eq!(AppError::NotFound("x".into()).error_response().status(), 404);
        assert_eq!(AppError::InternalServerError("x".into()).error_response().status(), 500);
        assert_eq!(AppError::DatabaseError("x".into()).error_response().status(), 500);
    }

    #[actix_rt::test]
    async fn test_error_body_is_structured() {
        let response = AppError::NotFound("Task not found".into()).error_response();
        let body = to_bytes(response.into_body()).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();

        assert_eq!(json["statusCode"], 404);
        assert_eq!(json["error"], "Not Found");
        assert_eq!(json["message"], "Task not found");
    }

    #[actix_rt::test]
    async fn test_internal_detail_is_not_exposed() {
        let response =
            AppError::DatabaseError("relation \"todos\" does not exist".into()).error_response();
        let body = to_bytes(response.into_body()).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();

        assert_eq!(json["statusCode"], 500);
        assert_eq!(json["message"], INTERNAL_ERROR_MESSAGE);
        assert!(!body.windows(6).any(|w| w == b"todos\""));
    }

    #[test]
    fn test_store_conflict_maps_to_bad_request() {
        let err: AppError = StoreError::Conflict("That email is already in use.".into()).into();
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
    }
}
