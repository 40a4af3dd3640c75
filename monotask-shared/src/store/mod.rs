/// Persistence traits and backends
///
/// The services in this crate talk to storage only through [`UserStore`] and
/// [`TaskStore`]. Two backends implement them:
///
/// - [`postgres::PgStore`]: PostgreSQL via sqlx (production)
/// - [`memory::MemoryStore`]: in-process maps (tests and local runs)
///
/// Stores do no validation and no status derivation; they persist exactly
/// what they are given.

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use uuid::Uuid;

use crate::models::subtask::{CreateSubtask, Subtask, UpdateSubtask};
use crate::models::task::{CreateTask, Task, TaskStatus, UpdateTask};
use crate::models::user::{CreateUser, User};

pub use memory::MemoryStore;
pub use postgres::PgStore;

/// Error type for store operations
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// A unique constraint rejected the write (constraint name)
    #[error("Unique constraint violated: {0}")]
    UniqueViolation(String),

    #[error("Database error: {0}")]
    Database(String),
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db_err) = &err {
            if db_err.is_unique_violation() {
                let constraint = db_err.constraint().unwrap_or("unknown").to_string();
                return StoreError::UniqueViolation(constraint);
            }
        }
        StoreError::Database(err.to_string())
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Credential store
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Inserts a user; a taken email is `StoreError::UniqueViolation`
    async fn insert_user(&self, data: CreateUser) -> StoreResult<User>;

    async fn find_user_by_id(&self, id: Uuid) -> StoreResult<Option<User>>;

    /// Looks up a user by normalized email
    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>>;

    /// Stores an explicit avatar URL, returning None if the user is gone
    async fn set_avatar_url(&self, id: Uuid, avatar_url: &str) -> StoreResult<Option<User>>;
}

/// Task and subtask persistence
///
/// Every read returns the full aggregate: the task plus its subtasks in
/// creation order.
#[async_trait]
pub trait TaskStore: Send + Sync {
    /// Verifies the backend is reachable
    async fn ping(&self) -> StoreResult<()>;

    /// Inserts a task together with its initial subtasks
    ///
    /// All or nothing: on error neither the task nor any subtask is stored.
    async fn insert_task(
        &self,
        data: CreateTask,
        subtasks: Vec<CreateSubtask>,
    ) -> StoreResult<Task>;

    async fn find_task(&self, id: Uuid) -> StoreResult<Option<Task>>;

    /// All tasks, newest first
    async fn list_tasks(&self) -> StoreResult<Vec<Task>>;

    /// Applies a partial update; false if the task does not exist
    async fn update_task(&self, id: Uuid, data: UpdateTask) -> StoreResult<bool>;

    /// Writes a derived status; false if the task does not exist
    async fn set_task_status(&self, id: Uuid, status: TaskStatus) -> StoreResult<bool>;

    /// Deletes a task and all its subtasks; false if it did not exist
    async fn delete_task(&self, id: Uuid) -> StoreResult<bool>;

    async fn insert_subtask(&self, task_id: Uuid, data: CreateSubtask) -> StoreResult<Subtask>;

    /// Updates a subtask scoped under `task_id`
    async fn update_subtask(
        &self,
        task_id: Uuid,
        id: Uuid,
        data: UpdateSubtask,
    ) -> StoreResult<Option<Subtask>>;

    /// Deletes a subtask scoped under `task_id`
    async fn delete_subtask(&self, task_id: Uuid, id: Uuid) -> StoreResult<bool>;
}
