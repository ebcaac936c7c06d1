use async_trait::async_trait;
use sqlx::postgres::{PgConnectOptions, PgPoolOptions};
use sqlx::PgPool;
use std::future::Future;
use std::str::FromStr;
use std::time::Duration;
use tokio::time::timeout;
use uuid::Uuid;

use super::{StoreError, StoreResult, TaskStore, UserStore, EMAIL_IN_USE};
use crate::models::{ProfileChanges, Task, TaskFilter, TaskOrder, TaskUpdate, User};

const USER_COLUMNS: &str = "id, email, name, password_hash, provider, provider_id, created_at";
const TASK_COLUMNS: &str = "id, description, state, created_at, completed_at, creator_id";

/// Postgres-backed implementation of both stores.
///
/// Every query runs under `op_timeout`; a stalled database surfaces as
/// `StoreError::Unavailable` instead of hanging the request.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
    op_timeout: Duration,
}

impl PgStore {
    pub fn new(pool: PgPool, op_timeout: Duration) -> Self {
        Self { pool, op_timeout }
    }

    /// Connects with the acquire timeout and the server-side `statement_timeout`
    /// both set to `op_timeout`.
    pub async fn connect(database_url: &str, op_timeout: Duration) -> StoreResult<Self> {
        let options = PgConnectOptions::from_str(database_url)
            .map_err(map_error)?
            .options([("statement_timeout", op_timeout.as_millis().to_string())]);
        let pool = PgPoolOptions::new()
            .max_connections(10)
            .acquire_timeout(op_timeout)
            .connect_with(options)
            .await
            .map_err(map_error)?;
        Ok(Self::new(pool, op_timeout))
    }

    async fn bounded<T, F>(&self, query: F) -> StoreResult<T>
    where
        F: Future<Output = Result<T, sqlx::Error>>,
    {
        bounded(self.op_timeout, query).await
    }

    /// Applies the embedded schema migrations.
    pub async fn migrate(&self) -> Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("./migrations").run(&self.pool).await
    }
}

async fn bounded<T, F>(limit: Duration, query: F) -> StoreResult<T>
where
    F: Future<Output = Result<T, sqlx::Error>>,
{
    timeout(limit, query)
        .await
        .map_err(|_| StoreError::Unavailable("timed out waiting for the database".into()))?
        .map_err(map_error)
}

fn map_error(error: sqlx::Error) -> StoreError {
    match error {
        sqlx::Error::Database(ref db) if db.code().as_deref() == Some("23505") => {
            StoreError::Conflict(EMAIL_IN_USE.into())
        }
        // query_canceled, raised when `statement_timeout` fires
        sqlx::Error::Database(ref db) if db.code().as_deref() == Some("57014") => {
            StoreError::Unavailable(error.to_string())
        }
        sqlx::Error::PoolTimedOut | sqlx::Error::Io(_) => StoreError::Unavailable(error.to_string()),
        other => StoreError::Database(other),
    }
}

#[async_trait]
impl UserStore for PgStore {
    async fn find_by_id(&self, id: Uuid) -> StoreResult<Option<User>> {
        let sql = format!("SELECT {} FROM users WHERE id = $1", USER_COLUMNS);
        self.bounded(sqlx::query_as::<_, User>(&sql).bind(id).fetch_optional(&self.pool))
            .await
    }

    async fn find_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        let sql = format!("SELECT {} FROM users WHERE email = $1", USER_COLUMNS);
        self.bounded(sqlx::query_as::<_, User>(&sql).bind(email).fetch_optional(&self.pool))
            .await
    }

    async fn insert(&self, user: User) -> StoreResult<User> {
        let sql = format!(
            "INSERT INTO users (id, email, name, password_hash, provider, provider_id, created_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7)
             RETURNING {}",
            USER_COLUMNS
        );
        self.bounded(
            sqlx::query_as::<_, User>(&sql)
                .bind(user.id)
                .bind(&user.email)
                .bind(&user.name)
                .bind(&user.password_hash)
                .bind(&user.provider)
                .bind(&user.provider_id)
                .bind(user.created_at)
                .fetch_one(&self.pool),
        )
        .await
    }

    async fn update_profile(&self, id: Uuid, changes: ProfileChanges) -> StoreResult<Option<User>> {
        if changes.is_empty() {
            return self.find_by_id(id).await;
        }
        let sql = format!(
            "UPDATE users
             SET email = COALESCE($2, email),
                 name = COALESCE($3, name),
                 password_hash = COALESCE($4, password_hash)
             WHERE id = $1
             RETURNING {}",
            USER_COLUMNS
        );
        self.bounded(
            sqlx::query_as::<_, User>(&sql)
                .bind(id)
                .bind(changes.email)
                .bind(changes.name)
                .bind(changes.password_hash)
                .fetch_optional(&self.pool),
        )
        .await
    }
}

#[async_trait]
impl TaskStore for PgStore {
    async fn list(&self, owner: Uuid, filter: TaskFilter, order: TaskOrder) -> StoreResult<Vec<Task>> {
        // `order.column()` is a fixed literal, never caller input.
        let sql = format!(
            "SELECT {} FROM todos
             WHERE creator_id = $1 AND ($2::task_state IS NULL OR state = $2)
             ORDER BY {} ASC NULLS LAST, created_at ASC",
            TASK_COLUMNS,
            order.column()
        );
        self.bounded(
            sqlx::query_as::<_, Task>(&sql)
                .bind(owner)
                .bind(filter.state())
                .fetch_all(&self.pool),
        )
        .await
    }

    async fn insert(&self, task: Task) -> StoreResult<Task> {
        let sql = format!(
            "INSERT INTO todos (id, description, state, created_at, completed_at, creator_id)
             VALUES ($1, $2, $3, $4, $5, $6)
             RETURNING {}",
            TASK_COLUMNS
        );
        self.bounded(
            sqlx::query_as::<_, Task>(&sql)
                .bind(task.id)
                .bind(&task.description)
                .bind(task.state)
                .bind(task.created_at)
                .bind(task.completed_at)
                .bind(task.creator_id)
                .fetch_one(&self.pool),
        )
        .await
    }

    async fn find_owned(&self, id: Uuid, owner: Uuid) -> StoreResult<Option<Task>> {
        let sql = format!(
            "SELECT {} FROM todos WHERE id = $1 AND creator_id = $2",
            TASK_COLUMNS
        );
        self.bounded(
            sqlx::query_as::<_, Task>(&sql)
                .bind(id)
                .bind(owner)
                .fetch_optional(&self.pool),
        )
        .await
    }

    async fn update_owned(&self, id: Uuid, owner: Uuid, update: TaskUpdate) -> StoreResult<Option<Task>> {
        let sql = format!(
            "UPDATE todos
             SET description = $3, state = $4, completed_at = $5
             WHERE id = $1 AND creator_id = $2
             RETURNING {}",
            TASK_COLUMNS
        );
        self.bounded(
            sqlx::query_as::<_, Task>(&sql)
                .bind(id)
                .bind(owner)
                .bind(update.description)
                .bind(update.state)
                .bind(update.completed_at)
                .fetch_optional(&self.pool),
        )
        .await
    }

    async fn delete_owned(&self, id: Uuid, owner: Uuid) -> StoreResult<bool> {
        let result = self
            .bounded(
                sqlx::query("DELETE FROM todos WHERE id = $1 AND creator_id = $2")
                    .bind(id)
                    .bind(owner)
                    .execute(&self.pool),
            )
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
