/// In-memory store
///
/// Keeps users and tasks in insertion-ordered vectors behind a single
/// `tokio::sync::RwLock`. Tasks hold their subtasks inline, so deleting a task
/// removes its subtasks with it. Clones share the same state.
///
/// # Example
///
/// ```
/// use monotask_shared::models::task::CreateTask;
/// use monotask_shared::store::{MemoryStore, TaskStore};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let store = MemoryStore::new();
/// let task = store
///     .insert_task(
///         CreateTask { title: "Plan sprint".to_string(), ..Default::default() },
///         Vec::new(),
///     )
///     .await?;
///
/// assert!(store.find_task(task.id).await?.is_some());
/// # Ok(())
/// # }
/// ```

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{StoreError, StoreResult, TaskStore, UserStore};
use crate::models::subtask::{CreateSubtask, Subtask, UpdateSubtask};
use crate::models::task::{CreateTask, Task, TaskStatus, UpdateTask};
use crate::models::user::{CreateUser, User};

/// Name reported for the email uniqueness violation, matching the SQL schema
const USERS_EMAIL_KEY: &str = "users_email_key";

#[derive(Debug, Default)]
struct State {
    users: Vec<User>,
    /// Oldest first
    tasks: Vec<Task>,
}

impl State {
    fn task_mut(&mut self, id: Uuid) -> Option<&mut Task> {
        self.tasks.iter_mut().find(|t| t.id == id)
    }
}

#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    state: Arc<RwLock<State>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn insert_user(&self, data: CreateUser) -> StoreResult<User> {
        let mut state = self.state.write().await;

        if state.users.iter().any(|u| u.email == data.email) {
            return Err(StoreError::UniqueViolation(USERS_EMAIL_KEY.to_string()));
        }

        let now = Utc::now();
        let user = User {
            id: Uuid::new_v4(),
            email: data.email,
            name: data.name,
            password_hash: data.password_hash,
            avatar_url: data.avatar_url,
            created_at: now,
            updated_at: now,
        };
        state.users.push(user.clone());

        Ok(user)
    }

    async fn find_user_by_id(&self, id: Uuid) -> StoreResult<Option<User>> {
        let state = self.state.read().await;
        Ok(state.users.iter().find(|u| u.id == id).cloned())
    }

    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        let state = self.state.read().await;
        Ok(state.users.iter().find(|u| u.email == email).cloned())
    }

    async fn set_avatar_url(&self, id: Uuid, avatar_url: &str) -> StoreResult<Option<User>> {
        let mut state = self.state.write().await;

        Ok(state.users.iter_mut().find(|u| u.id == id).map(|user| {
            user.avatar_url = Some(avatar_url.to_string());
            user.updated_at = Utc::now();
            user.clone()
        }))
    }
}

#[async_trait]
impl TaskStore for MemoryStore {
    async fn ping(&self) -> StoreResult<()> {
        Ok(())
    }

    async fn insert_task(
        &self,
        data: CreateTask,
        subtasks: Vec<CreateSubtask>,
    ) -> StoreResult<Task> {
        let now = Utc::now();
        let id = Uuid::new_v4();
        let subtasks = subtasks
            .into_iter()
            .map(|subtask| Subtask {
                id: Uuid::new_v4(),
                task_id: id,
                title: subtask.title,
                completed: subtask.completed,
                created_at: now,
                updated_at: now,
            })
            .collect();

        // The whole aggregate is built before the single push
        let task = Task {
            id,
            owner_id: data.owner_id,
            title: data.title,
            description: data.description,
            status: data.status,
            priority: data.priority,
            created_at: now,
            updated_at: now,
            subtasks,
        };

        self.state.write().await.tasks.push(task.clone());
        Ok(task)
    }

    async fn find_task(&self, id: Uuid) -> StoreResult<Option<Task>> {
        let state = self.state.read().await;
        Ok(state.tasks.iter().find(|t| t.id == id).cloned())
    }

    async fn list_tasks(&self) -> StoreResult<Vec<Task>> {
        let state = self.state.read().await;
        Ok(state.tasks.iter().rev().cloned().collect())
    }

    async fn update_task(&self, id: Uuid, data: UpdateTask) -> StoreResult<bool> {
        let mut state = self.state.write().await;
        let Some(task) = state.task_mut(id) else {
            return Ok(false);
        };

        if let Some(title) = data.title {
            task.title = title;
        }
        if let Some(description) = data.description {
            task.description = Some(description);
        }
        if let Some(status) = data.status {
            task.status = status;
        }
        if let Some(priority) = data.priority {
            task.priority = priority;
        }
        task.updated_at = Utc::now();

        Ok(true)
    }

    async fn set_task_status(&self, id: Uuid, status: TaskStatus) -> StoreResult<bool> {
        let mut state = self.state.write().await;
        Ok(state
            .task_mut(id)
            .map(|task| {
                task.status = status;
                task.updated_at = Utc::now();
            })
            .is_some())
    }

    async fn delete_task(&self, id: Uuid) -> StoreResult<bool> {
        let mut state = self.state.write().await;
        let before = state.tasks.len();
        state.tasks.retain(|t| t.id != id);
        Ok(state.tasks.len() < before)
    }

    async fn insert_subtask(&self, task_id: Uuid, data: CreateSubtask) -> StoreResult<Subtask> {
        let mut state = self.state.write().await;
        // Mirrors the foreign key on subtasks.task_id
        let task = state.task_mut(task_id).ok_or_else(|| {
            StoreError::Database(format!("task {} does not exist", task_id))
        })?;

        let now = Utc::now();
        let subtask = Subtask {
            id: Uuid::new_v4(),
            task_id,
            title: data.title,
            completed: data.completed,
            created_at: now,
            updated_at: now,
        };
        task.subtasks.push(subtask.clone());

        Ok(subtask)
    }

    async fn update_subtask(
        &self,
        task_id: Uuid,
        id: Uuid,
        data: UpdateSubtask,
    ) -> StoreResult<Option<Subtask>> {
        let mut state = self.state.write().await;
        let Some(task) = state.task_mut(task_id) else {
            return Ok(None);
        };

        Ok(task.subtasks.iter_mut().find(|s| s.id == id).map(|subtask| {
            if let Some(title) = data.title {
                subtask.title = title;
            }
            if let Some(completed) = data.completed {
                subtask.completed = completed;
            }
            subtask.updated_at = Utc::now();
            subtask.clone()
        }))
    }

    async fn delete_subtask(&self, task_id: Uuid, id: Uuid) -> StoreResult<bool> {
        let mut state = self.state.write().await;
        let Some(task) = state.task_mut(task_id) else {
            return Ok(false);
        };

        let before = task.subtasks.len();
        task.subtasks.retain(|s| s.id != id);
        Ok(task.subtasks.len() < before)
    }
}
