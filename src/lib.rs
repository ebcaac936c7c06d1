#![doc = "The `todoforge` library crate."]
#![doc = ""]
#![doc = "Identities, token authentication with logout revocation, and owner-scoped"]
#![doc = "task lists served over actix-web. The binary (`main.rs`) wires configuration,"]
#![doc = "the Postgres and Redis stores and the HTTP server together."]

pub mod auth;
pub mod config;
pub mod error;
pub mod models;
pub mod routes;
pub mod state;
pub mod store;

pub use crate::error::AppError;
pub use crate::state::AppState;
