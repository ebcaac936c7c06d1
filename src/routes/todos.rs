use crate::{
    auth::AuthenticatedUser,
    error::AppError,
    models::{Task, TaskInput, TaskPatch, TaskQuery},
    state::AppState,
};
use actix_web::{delete, get, patch, post, web, HttpResponse, Responder};
use chrono::Utc;
use uuid::Uuid;
use validator::Validate;

fn task_not_found() -> AppError {
    AppError::NotFound("Task not found".into())
}

/// Retrieves the authenticated identity's tasks.
///
/// ## Query Parameters:
/// - `filter` (optional): `INCOMPLETE`, `COMPLETE` or `ALL` (default).
/// - `orderBy` (optional): `CREATED_AT` (default), `COMPLETED_AT` or `DESCRIPTION`,
///   ascending. Tasks without a completion time sort last.
///
/// ## Responses:
/// - `200 OK`: a JSON array of `Task` objects, possibly empty.
/// - `400 Bad Request`: unknown filter or ordering.
#[get("/todos")]
pub async fn list_todos(
    state: web::Data<AppState>,
    auth: AuthenticatedUser,
    query: web::Query<TaskQuery>,
) -> Result<impl Responder, AppError> {
    let TaskQuery { filter, order_by } = query.into_inner();
    let tasks = state
        .tasks
        .list(auth.id, filter.unwrap_or_default(), order_by.unwrap_or_default())
        .await?;

    Ok(HttpResponse::Ok().json(tasks))
}

/// Creates a new, incomplete task owned by the authenticated identity.
///
/// ## Responses:
/// - `201 Created`: the new `Task`.
/// - `400 Bad Request`: missing or over-long description.
#[post("/todos")]
pub async fn create_todo(
    state: web::Data<AppState>,
    auth: AuthenticatedUser,
    task_data: web::Json<TaskInput>,
) -> Result<impl Responder, AppError> {
    task_data.validate()?;

    let task = Task::new(task_data.into_inner(), auth.id);
    let task = state.tasks.insert(task).await?;

    Ok(HttpResponse::Created().json(task))
}

/// Retrieves one task. Tasks owned by someone else are reported as not found.
#[get("/todo/{id}")]
pub async fn get_todo(
    state: web::Data<AppState>,
    auth: AuthenticatedUser,
    task_id: web::Path<Uuid>,
) -> Result<impl Responder, AppError> {
    let task = state
        .tasks
        .find_owned(task_id.into_inner(), auth.id)
        .await?
        .ok_or_else(task_not_found)?;

    Ok(HttpResponse::Ok().json(task))
}

/// Updates a task's state and/or description.
///
/// Completing a task stamps `completedAt`, reopening it clears the stamp. The
/// description of a completed task cannot change; such a patch is rejected
/// before anything is written.
///
/// ## Responses:
/// - `202 Accepted`: the updated `Task`.
/// - `400 Bad Request`: empty patch, empty description, or description change on
///   a completed task.
/// - `404 Not Found`: no such task for this identity.
#[patch("/todo/{id}")]
pub async fn update_todo(
    state: web::Data<AppState>,
    auth: AuthenticatedUser,
    task_id: web::Path<Uuid>,
    patch_data: web::Json<TaskPatch>,
) -> Result<impl Responder, AppError> {
    patch_data.validate()?;
    let task_id = task_id.into_inner();

    let task = state
        .tasks
        .find_owned(task_id, auth.id)
        .await?
        .ok_or_else(task_not_found)?;
    let update = task.plan_update(&patch_data, Utc::now())?;

    let task = state
        .tasks
        .update_owned(task_id, auth.id, update)
        .await?
        .ok_or_else(task_not_found)?;

    Ok(HttpResponse::Accepted().json(task))
}

/// Deletes a task.
///
/// ## Responses:
/// - `204 No Content`: deleted.
/// - `404 Not Found`: no such task for this identity.
#[delete("/todo/{id}")]
pub async fn delete_todo(
    state: web::Data<AppState>,
    auth: AuthenticatedUser,
    task_id: web::Path<Uuid>,
) -> Result<impl Responder, AppError> {
    if !state.tasks.delete_owned(task_id.into_inner(), auth.id).await? {
        return Err(task_not_found());
    }

    Ok(HttpResponse::NoContent().finish())
}
