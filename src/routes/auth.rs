use crate::{
    auth::{AuthenticatedUser, LoginRequest, LoginResponse, MessageResponse},
    error::AppError,
    models::PublicUser,
    state::AppState,
};
use actix_web::{post, web, HttpResponse, Responder};
use chrono::Utc;
use log::{debug, info};
use validator::Validate;

/// The single answer for an unknown email and for a wrong password.
pub const INVALID_CREDENTIALS: &str = "Invalid email or password";

/// Login user
///
/// Authenticates an identity and returns a token with its public projection.
/// An unknown email is verified against a dummy hash so that both failure paths
/// cost the same and return the same body.
#[post("/login")]
pub async fn login(
    state: web::Data<AppState>,
    login_data: web::Json<LoginRequest>,
) -> Result<impl Responder, AppError> {
    login_data.validate()?;
    let LoginRequest { email, password } = login_data.into_inner();

    let user = state.users.find_by_email(&email).await?;
    let stored_hash = user.as_ref().map(|user| user.password_hash.clone());
    let matches = state.hasher.verify_offloaded(password, stored_hash).await?;

    let user = match user {
        Some(user) if matches => user,
        _ => {
            debug!("Rejected login attempt");
            return Err(AppError::Unauthorized(INVALID_CREDENTIALS.into()));
        }
    };

    let token = state.tokens.issue(user.id)?;
    Ok(HttpResponse::Ok().json(LoginResponse {
        token,
        user: PublicUser::from(&user),
    }))
}

/// Logout user
///
/// Blacklists the token the request was authenticated with. If the revocation
/// store cannot be written the request fails and the token stays valid.
#[post("/logout")]
pub async fn logout(
    state: web::Data<AppState>,
    auth: AuthenticatedUser,
) -> Result<impl Responder, AppError> {
    let ttl = state
        .revocation_policy
        .ttl_for(auth.token.claims.remaining(Utc::now()));
    state.revocations.blacklist(&auth.token.raw, ttl).await?;
    info!("User {} logged out", auth.id);

    Ok(HttpResponse::Ok().json(MessageResponse::new("Logged out successfully")))
}
