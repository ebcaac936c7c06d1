//! Persistence seams for identities and tasks.
//!
//! Handlers only see the [`UserStore`] and [`TaskStore`] traits. Every task lookup
//! takes the owner's id and includes it in the predicate, so a task owned by
//! someone else is indistinguishable from a task that does not exist.

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use crate::models::{ProfileChanges, Task, TaskFilter, TaskOrder, TaskUpdate, User};

pub use memory::MemoryStore;
pub use postgres::PgStore;

pub const EMAIL_IN_USE: &str = "That email is already in use.";

#[derive(Debug, Error)]
pub enum StoreError {
    /// A uniqueness constraint was violated.
    #[error("{0}")]
    Conflict(String),
    /// The store could not be reached in time.
    #[error("store unavailable: {0}")]
    Unavailable(String),
    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;

#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> StoreResult<Option<User>>;

    /// Exact, case-sensitive match.
    async fn find_by_email(&self, email: &str) -> StoreResult<Option<User>>;

    /// Fails with [`StoreError::Conflict`] when the email is taken.
    async fn insert(&self, user: User) -> StoreResult<User>;

    /// Returns `None` when the identity does not exist.
    async fn update_profile(&self, id: Uuid, changes: ProfileChanges) -> StoreResult<Option<User>>;
}

#[async_trait]
pub trait TaskStore: Send + Sync {
    async fn list(&self, owner: Uuid, filter: TaskFilter, order: TaskOrder) -> StoreResult<Vec<Task>>;

    async fn insert(&self, task: Task) -> StoreResult<Task>;

    async fn find_owned(&self, id: Uuid, owner: Uuid) -> StoreResult<Option<Task>>;

    async fn update_owned(&self, id: Uuid, owner: Uuid, update: TaskUpdate) -> StoreResult<Option<Task>>;

    /// Returns `false` when nothing matched.
    async fn delete_owned(&self, id: Uuid, owner: Uuid) -> StoreResult<bool>;
}
