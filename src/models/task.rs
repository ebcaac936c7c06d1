use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use thiserror::Error;
use uuid::Uuid;
use validator::{Validate, ValidationError};

/// Lifecycle state of a task.
/// Corresponds to the `task_state` SQL enum.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, sqlx::Type)]
#[sqlx(type_name = "task_state", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskState {
    Incomplete,
    Complete,
}

/// Which tasks `GET /todos` returns.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskFilter {
    Incomplete,
    Complete,
    #[default]
    All,
}

impl TaskFilter {
    /// The state to match, or `None` for every task.
    pub fn state(self) -> Option<TaskState> {
        match self {
            TaskFilter::Incomplete => Some(TaskState::Incomplete),
            TaskFilter::Complete => Some(TaskState::Complete),
            TaskFilter::All => None,
        }
    }
}

/// Sort key for `GET /todos`. Always ascending.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskOrder {
    #[default]
    CreatedAt,
    CompletedAt,
    Description,
}

impl TaskOrder {
    /// Column used in the `ORDER BY` clause. Only ever one of these literals.
    pub fn column(self) -> &'static str {
        match self {
            TaskOrder::CreatedAt => "created_at",
            TaskOrder::CompletedAt => "completed_at",
            TaskOrder::Description => "description",
        }
    }
}

/// Represents a task entity as stored in the database and returned by the API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    /// Unique identifier for the task (UUID v4).
    pub id: Uuid,
    pub description: String,
    pub state: TaskState,
    pub created_at: DateTime<Utc>,
    /// Non-null iff `state` is `COMPLETE`.
    pub completed_at: Option<DateTime<Utc>>,
    /// Identity that owns the task.
    pub creator_id: Uuid,
}

/// Payload of `POST /todos`.
#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct TaskInput {
    /// Must be between 1 and 1000 characters.
    #[validate(length(min = 1, max = 1000))]
    pub description: String,
}

/// Query string of `GET /todos`.
#[derive(Debug, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct TaskQuery {
    pub filter: Option<TaskFilter>,
    pub order_by: Option<TaskOrder>,
}

/// Payload of `PATCH /todo/{id}`.
#[derive(Debug, Serialize, Deserialize, Validate, Default)]
#[validate(schema(function = "validate_patch_not_empty", skip_on_field_errors = false))]
pub struct TaskPatch {
    pub state: Option<TaskState>,
    #[validate(length(min = 1, max = 1000))]
    pub description: Option<String>,
}

fn validate_patch_not_empty(patch: &TaskPatch) -> Result<(), ValidationError> {
    if patch.state.is_none() && patch.description.is_none() {
        let mut error = ValidationError::new("empty_patch");
        error.message = Some("Provide at least one of state or description".into());
        return Err(error);
    }
    Ok(())
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PatchError {
    #[error("Cannot change the description of a completed task.")]
    DescriptionLocked,
}

/// The full set of mutable columns after a patch has been applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskUpdate {
    pub description: String,
    pub state: TaskState,
    pub completed_at: Option<DateTime<Utc>>,
}

impl Task {
    /// Creates a new, incomplete `Task` owned by `creator_id`.
    pub fn new(input: TaskInput, creator_id: Uuid) -> Self {
        Self {
            id: Uuid::new_v4(),
            description: input.description,
            state: TaskState::Incomplete,
            created_at: Utc::now(),
            completed_at: None,
            creator_id,
        }
    }

    /// Applies the state-transition rules to `patch` without touching storage.
    ///
    /// A completed task keeps its description; completing stamps `completed_at`
    /// with `now` (an already-complete task keeps its original stamp) and
    /// reopening clears it.
    pub fn plan_update(&self, patch: &TaskPatch, now: DateTime<Utc>) -> Result<TaskUpdate, PatchError> {
        if patch.description.is_some() && self.state == TaskState::Complete {
            return Err(PatchError::DescriptionLocked);
        }

        let state = patch.state.unwrap_or(self.state);
        let completed_at = match (self.state, state) {
            (_, TaskState::Incomplete) => None,
            (TaskState::Complete, TaskState::Complete) => self.completed_at.or(Some(now)),
            (TaskState::Incomplete, TaskState::Complete) => Some(now),
        };

        Ok(TaskUpdate {
            description: patch
                .description
                .clone()
                .unwrap_or_else(|| self.description.clone()),
            state,
            completed_at,
        })
    }

    pub fn apply(mut self, update: TaskUpdate) -> Self {
        self.description = update.description;
        self.state = update.state;
        self.completed_at = update.completed_at;
        self
    }
}
