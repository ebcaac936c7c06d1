use async_trait::async_trait;
use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{StoreError, StoreResult, TaskStore, UserStore, EMAIL_IN_USE};
use crate::models::{ProfileChanges, Task, TaskFilter, TaskOrder, TaskUpdate, User};

/// In-process implementation of both stores with the same contracts as
/// [`PgStore`](super::PgStore): unique emails, owner-scoped task predicates
/// and ascending order with null completion stamps last.
#[derive(Clone, Default)]
pub struct MemoryStore {
    users: Arc<RwLock<HashMap<Uuid, User>>>,
    tasks: Arc<RwLock<HashMap<Uuid, Task>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Removes an identity together with every task it owns.
    pub async fn remove_user(&self, id: Uuid) -> bool {
        let removed = self.users.write().await.remove(&id).is_some();
        if removed {
            self.tasks.write().await.retain(|_, task| task.creator_id != id);
        }
        removed
    }

    pub async fn task_count(&self) -> usize {
        self.tasks.read().await.len()
    }
}

fn compare(order: TaskOrder, a: &Task, b: &Task) -> Ordering {
    let primary = match order {
        TaskOrder::CreatedAt => a.created_at.cmp(&b.created_at),
        TaskOrder::Description => a.description.cmp(&b.description),
        TaskOrder::CompletedAt => match (a.completed_at, b.completed_at) {
            (Some(x), Some(y)) => x.cmp(&y),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        },
    };
    primary.then_with(|| a.created_at.cmp(&b.created_at))
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn find_by_id(&self, id: Uuid) -> StoreResult<Option<User>> {
        Ok(self.users.read().await.get(&id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        Ok(self
            .users
            .read()
            .await
            .values()
            .find(|user| user.email == email)
            .cloned())
    }

    async fn insert(&self, user: User) -> StoreResult<User> {
        let mut users = self.users.write().await;
        if users.values().any(|existing| existing.email == user.email) {
            return Err(StoreError::Conflict(EMAIL_IN_USE.into()));
        }
        users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn update_profile(&self, id: Uuid, changes: ProfileChanges) -> StoreResult<Option<User>> {
        let mut users = self.users.write().await;
        if let Some(email) = &changes.email {
            if users.values().any(|other| other.id != id && &other.email == email) {
                return Err(StoreError::Conflict(EMAIL_IN_USE.into()));
            }
        }
        let Some(user) = users.get_mut(&id) else {
            return Ok(None);
        };
        if let Some(email) = changes.email {
            user.email = email;
        }
        if let Some(name) = changes.name {
            user.name = name;
        }
        if let Some(password_hash) = changes.password_hash {
            user.password_hash = password_hash;
        }
        Ok(Some(user.clone()))
    }
}

#[async_trait]
impl TaskStore for MemoryStore {
    async fn list(&self, owner: Uuid, filter: TaskFilter, order: TaskOrder) -> StoreResult<Vec<Task>> {
        let wanted = filter.state();
        let mut tasks: Vec<Task> = self
            .tasks
            .read()
            .await
            .values()
            .filter(|task| task.creator_id == owner)
            .filter(|task| wanted.map_or(true, |state| task.state == state))
            .cloned()
            .collect();
        tasks.sort_by(|a, b| compare(order, a, b));
        Ok(tasks)
    }

    async fn insert(&self, task: Task) -> StoreResult<Task> {
        if !self.users.read().await.contains_key(&task.creator_id) {
            return Err(StoreError::Conflict("Task owner does not exist".into()));
        }
        self.tasks.write().await.insert(task.id, task.clone());
        Ok(task)
    }

    async fn find_owned(&self, id: Uuid, owner: Uuid) -> StoreResult<Option<Task>> {
        Ok(self
            .tasks
            .read()
            .await
            .get(&id)
            .filter(|task| task.creator_id == owner)
            .cloned())
    }

    async fn update_owned(&self, id: Uuid, owner: Uuid, update: TaskUpdate) -> StoreResult<Option<Task>> {
        let mut tasks = self.tasks.write().await;
        match tasks.get_mut(&id) {
            Some(task) if task.creator_id == owner => {
                let updated = task.clone().apply(update);
                *task = updated.clone();
                Ok(Some(updated))
            }
            _ => Ok(None),
        }
    }

    async fn delete_owned(&self, id: Uuid, owner: Uuid) -> StoreResult<bool> {
        let mut tasks = self.tasks.write().await;
        let owned = tasks.get(&id).map_or(false, |task| task.creator_id == owner);
        if owned {
            tasks.remove(&id);
        }
        Ok(owned)
    }
}
