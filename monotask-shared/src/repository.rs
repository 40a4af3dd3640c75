/// Validated task and subtask operations
///
/// `TaskRepository` sits between the HTTP handlers and a [`TaskStore`]. It
/// validates client input, persists it, and recomputes the parent task's
/// status after every mutation that can change it. Subtask operations return
/// the re-fetched parent so callers always see the recomputed status.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use monotask_shared::models::subtask::SubtaskInput;
/// use monotask_shared::models::task::{TaskInput, TaskStatus};
/// use monotask_shared::repository::TaskRepository;
/// use monotask_shared::store::MemoryStore;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let tasks = TaskRepository::new(Arc::new(MemoryStore::new()));
///
/// let task = tasks
///     .create(TaskInput { title: Some("Launch".to_string()), ..Default::default() }, None)
///     .await?;
///
/// let input = SubtaskInput { title: Some("Announce".to_string()), completed: Some(true) };
/// let task = tasks.create_subtask(task.id, input).await?;
/// assert_eq!(task.status, TaskStatus::Done);
/// # Ok(())
/// # }
/// ```

use std::sync::Arc;

use tracing::{debug, info};
use uuid::Uuid;

use crate::models::subtask::SubtaskInput;
use crate::models::task::{Task, TaskInput};
use crate::status::{derive_status, Trigger};
use crate::store::{StoreError, TaskStore};
use crate::validation::FieldError;

/// Error type for task operations
#[derive(Debug, thiserror::Error)]
pub enum TaskError {
    /// The task or subtask does not exist (what was looked up)
    #[error("{0} not found")]
    NotFound(String),

    #[error("Validation failed: {} errors", .0.len())]
    Validation(Vec<FieldError>),

    #[error(transparent)]
    Store(#[from] StoreError),
}

pub type TaskResult<T> = Result<T, TaskError>;

#[derive(Clone)]
pub struct TaskRepository {
    store: Arc<dyn TaskStore>,
}

impl TaskRepository {
    pub fn new(store: Arc<dyn TaskStore>) -> Self {
        Self { store }
    }

    /// Backend reachability, for health checks
    pub async fn ping(&self) -> TaskResult<()> {
        Ok(self.store.ping().await?)
    }

    /// Creates a task with optional initial subtasks
    ///
    /// The status is derived once all initial subtasks exist.
    pub async fn create(&self, input: TaskInput, owner_id: Option<Uuid>) -> TaskResult<Task> {
        let (data, subtasks) = input
            .validate_create(owner_id)
            .map_err(TaskError::Validation)?;

        let task = self.store.insert_task(data, subtasks).await?;

        info!(task_id = %task.id, "Task created");

        self.recompute(task.id, Trigger::TaskSaved).await?;
        self.get(task.id).await
    }

    pub async fn get(&self, id: Uuid) -> TaskResult<Task> {
        self.store
            .find_task(id)
            .await?
            .ok_or_else(|| TaskError::NotFound("Task".to_string()))
    }

    /// All tasks, newest first
    pub async fn list(&self) -> TaskResult<Vec<Task>> {
        Ok(self.store.list_tasks().await?)
    }

    /// Applies a partial update, then re-derives the status from subtasks
    ///
    /// A manual status change on a task with subtasks is overridden when it
    /// contradicts them (e.g. TODO with every subtask completed).
    pub async fn update(&self, id: Uuid, input: TaskInput) -> TaskResult<Task> {
        let data = input.validate_update().map_err(TaskError::Validation)?;

        if !self.store.update_task(id, data).await? {
            return Err(TaskError::NotFound("Task".to_string()));
        }

        self.recompute(id, Trigger::TaskSaved).await?;
        self.get(id).await
    }

    /// Deletes a task together with its subtasks
    pub async fn delete(&self, id: Uuid) -> TaskResult<()> {
        if !self.store.delete_task(id).await? {
            return Err(TaskError::NotFound("Task".to_string()));
        }

        info!(task_id = %id, "Task deleted");
        Ok(())
    }

    pub async fn create_subtask(&self, task_id: Uuid, input: SubtaskInput) -> TaskResult<Task> {
        // Parent must exist before input errors are reported
        self.get(task_id).await?;
        let data = input.validate_create().map_err(TaskError::Validation)?;

        self.store.insert_subtask(task_id, data).await?;

        self.recompute(task_id, Trigger::SubtaskCreated).await?;
        self.get(task_id).await
    }

    pub async fn update_subtask(
        &self,
        task_id: Uuid,
        subtask_id: Uuid,
        input: SubtaskInput,
    ) -> TaskResult<Task> {
        self.get(task_id).await?;
        let data = input.validate_update().map_err(TaskError::Validation)?;

        if self
            .store
            .update_subtask(task_id, subtask_id, data)
            .await?
            .is_none()
        {
            return Err(TaskError::NotFound("Subtask".to_string()));
        }

        self.recompute(task_id, Trigger::SubtaskUpdated).await?;
        self.get(task_id).await
    }

    pub async fn destroy_subtask(&self, task_id: Uuid, subtask_id: Uuid) -> TaskResult<Task> {
        self.get(task_id).await?;

        if !self.store.delete_subtask(task_id, subtask_id).await? {
            return Err(TaskError::NotFound("Subtask".to_string()));
        }

        self.recompute(task_id, Trigger::SubtaskDestroyed).await?;
        self.get(task_id).await
    }

    /// Re-derives a task's status from its current subtasks
    ///
    /// Writes only when the status actually changes. A task that vanished in
    /// the meantime is skipped.
    async fn recompute(&self, task_id: Uuid, trigger: Trigger) -> TaskResult<()> {
        let Some(task) = self.store.find_task(task_id).await? else {
            debug!(task_id = %task_id, %trigger, "Task gone, skipping status derivation");
            return Ok(());
        };

        if let Some(status) = derive_status(task.status, trigger, task.completions()) {
            debug!(
                task_id = %task_id,
                %trigger,
                from = %task.status,
                to = %status,
                "Derived task status"
            );
            self.store.set_task_status(task_id, status).await?;
        }

        Ok(())
    }
}
