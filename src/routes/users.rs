use crate::{
    auth::{check_password_policy, AuthenticatedUser, MessageResponse, RegisterRequest},
    error::AppError,
    models::{NewUser, ProfileChanges, PublicUser, UpdateProfileRequest, User},
    state::AppState,
    store::EMAIL_IN_USE,
};
use actix_web::{get, patch, post, web, HttpResponse, Responder};
use log::info;
use serde_json::json;
use validator::Validate;

fn user_not_found() -> AppError {
    AppError::NotFound("User not found".into())
}

/// Register a new identity
///
/// A taken email is reported first; the complexity policy is checked next,
/// before the secret is hashed. Neither the
/// secret nor its hash is ever echoed back.
///
/// ## Responses:
/// - `201 Created`: `{"message": "User registered"}`.
/// - `400 Bad Request`: invalid email or name, weak password, or email already in use.
#[post("/users")]
pub async fn register(
    state: web::Data<AppState>,
    register_data: web::Json<RegisterRequest>,
) -> Result<impl Responder, AppError> {
    register_data.validate()?;
    let RegisterRequest {
        email,
        name,
        password,
    } = register_data.into_inner();

    if state.users.find_by_email(&email).await?.is_some() {
        return Err(AppError::BadRequest(EMAIL_IN_USE.into()));
    }

    check_password_policy(&password)?;

    let password_hash = state.hasher.hash_offloaded(password).await?;
    let user = state
        .users
        .insert(User::new(NewUser {
            email,
            name,
            password_hash,
        }))
        .await?;
    info!("Registered user {}", user.id);

    Ok(HttpResponse::Created().json(MessageResponse::new("User registered")))
}

/// Fetch the authenticated identity.
#[get("/me")]
pub async fn get_me(
    state: web::Data<AppState>,
    auth: AuthenticatedUser,
) -> Result<impl Responder, AppError> {
    let user = state
        .users
        .find_by_id(auth.id)
        .await?
        .ok_or_else(user_not_found)?;

    Ok(HttpResponse::Ok().json(json!({ "user": PublicUser::from(&user) })))
}

/// Update the authenticated identity's email, name and/or password.
///
/// Email and password changes must be confirmed with `currentPassword`.
///
/// ## Responses:
/// - `200 OK`: `{"message": "User update successful."}`.
/// - `400 Bad Request`: nothing to change, invalid email, weak password, missing
///   `currentPassword`, or email already in use.
/// - `401 Unauthorized`: `currentPassword` does not match.
/// - `404 Not Found`: the identity no longer exists.
#[patch("/me")]
pub async fn update_me(
    state: web::Data<AppState>,
    auth: AuthenticatedUser,
    update_data: web::Json<UpdateProfileRequest>,
) -> Result<impl Responder, AppError> {
    update_data.validate()?;
    let mut request = update_data.into_inner();

    if let Some(password) = &request.new_password {
        check_password_policy(password)?;
    }

    let user = state
        .users
        .find_by_id(auth.id)
        .await?
        .ok_or_else(user_not_found)?;

    if request.needs_current_password() {
        let current = request.current_password.take().ok_or_else(|| {
            AppError::BadRequest("currentPassword is required to change email or password".into())
        })?;
        let matches = state
            .hasher
            .verify_offloaded(current, Some(user.password_hash.clone()))
            .await?;
        if !matches {
            return Err(AppError::Unauthorized("Invalid password".into()));
        }
    }

    let mut changes = ProfileChanges {
        name: request.new_name,
        ..ProfileChanges::default()
    };

    if let Some(email) = request.new_email {
        if let Some(existing) = state.users.find_by_email(&email).await? {
            if existing.id != user.id {
                return Err(AppError::BadRequest(EMAIL_IN_USE.into()));
            }
        }
        changes.email = Some(email);
    }

    if let Some(password) = request.new_password {
        changes.password_hash = Some(state.hasher.hash_offloaded(password).await?);
    }

    state
        .users
        .update_profile(user.id, changes)
        .await?
        .ok_or_else(user_not_found)?;
    info!("Updated profile of user {}", user.id);

    Ok(HttpResponse::Ok().json(MessageResponse::new("User update successful.")))
}
