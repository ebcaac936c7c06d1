use actix_web::dev::Payload;
use actix_web::{Error as ActixError, FromRequest, HttpMessage, HttpRequest};
use std::future::{ready, Ready};

use crate::auth::gate::AuthenticatedUser;
use crate::error::AppError;

/// Extracts the identity that `AuthMiddleware` attached to the request.
///
/// Only meaningful on routes wrapped by the middleware. Anywhere else the
/// extension is missing and the request is rejected as unauthorized.
impl FromRequest for AuthenticatedUser {
    type Error = ActixError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        match req.extensions().get::<AuthenticatedUser>().cloned() {
            Some(user) => ready(Ok(user)),
            None => {
                let err = AppError::Unauthorized("Missing authentication".to_string());
                ready(Err(err.into()))
            }
        }
    }
}
