pub mod auth;
pub mod health;
pub mod todos;
pub mod users;

use actix_web::{web, Error};

use crate::auth::AuthMiddleware;
use crate::error::AppError;

fn bad_request(detail: impl ToString) -> Error {
    AppError::BadRequest(detail.to_string()).into()
}

/// Registers every route. `/health`, `POST /users` and `POST /login` are public;
/// everything else sits behind [`AuthMiddleware`]. Malformed bodies, query strings
/// and path segments are answered with the structured 400 body.
pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::JsonConfig::default().error_handler(|err, _req| bad_request(err)))
        .app_data(web::QueryConfig::default().error_handler(|err, _req| bad_request(err)))
        .app_data(web::PathConfig::default().error_handler(|err, _req| bad_request(err)))
        .service(health::health)
        .service(users::register)
        .service(auth::login)
        .service(
            web::scope("")
                .wrap(AuthMiddleware)
                .service(auth::logout)
                .service(users::get_me)
                .service(users::update_me)
                .service(todos::list_todos)
                .service(todos::create_todo)
                .service(todos::get_todo)
                .service(todos::update_todo)
                .service(todos::delete_todo),
        );
}
