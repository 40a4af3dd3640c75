/// PostgreSQL store
///
/// Thin delegation to the query functions on the models.

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use super::{StoreResult, TaskStore, UserStore};
use crate::db::pool::health_check;
use crate::models::subtask::{CreateSubtask, Subtask, UpdateSubtask};
use crate::models::task::{CreateTask, Task, TaskStatus, UpdateTask};
use crate::models::user::{CreateUser, User};

#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl UserStore for PgStore {
    async fn insert_user(&self, data: CreateUser) -> StoreResult<User> {
        Ok(User::create(&self.pool, data).await?)
    }

    async fn find_user_by_id(&self, id: Uuid) -> StoreResult<Option<User>> {
        Ok(User::find_by_id(&self.pool, id).await?)
    }

    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        Ok(User::find_by_email(&self.pool, email).await?)
    }

    async fn set_avatar_url(&self, id: Uuid, avatar_url: &str) -> StoreResult<Option<User>> {
        Ok(User::update_avatar_url(&self.pool, id, avatar_url).await?)
    }
}

#[async_trait]
impl TaskStore for PgStore {
    async fn ping(&self) -> StoreResult<()> {
        Ok(health_check(&self.pool).await?)
    }

    async fn insert_task(
        &self,
        data: CreateTask,
        subtasks: Vec<CreateSubtask>,
    ) -> StoreResult<Task> {
        // Dropping the transaction on an early return rolls it back
        let mut tx = self.pool.begin().await?;

        let mut task = Task::create(&mut *tx, data).await?;
        for subtask in subtasks {
            let subtask = Subtask::create(&mut *tx, task.id, subtask).await?;
            task.subtasks.push(subtask);
        }

        tx.commit().await?;
        Ok(task)
    }

    async fn find_task(&self, id: Uuid) -> StoreResult<Option<Task>> {
        Ok(Task::find_by_id(&self.pool, id).await?)
    }

    async fn list_tasks(&self) -> StoreResult<Vec<Task>> {
        Ok(Task::list(&self.pool).await?)
    }

    async fn update_task(&self, id: Uuid, data: UpdateTask) -> StoreResult<bool> {
        Ok(Task::update(&self.pool, id, data).await?)
    }

    async fn set_task_status(&self, id: Uuid, status: TaskStatus) -> StoreResult<bool> {
        Ok(Task::set_status(&self.pool, id, status).await?)
    }

    async fn delete_task(&self, id: Uuid) -> StoreResult<bool> {
        Ok(Task::delete(&self.pool, id).await?)
    }

    async fn insert_subtask(&self, task_id: Uuid, data: CreateSubtask) -> StoreResult<Subtask> {
        Ok(Subtask::create(&self.pool, task_id, data).await?)
    }

    async fn update_subtask(
        &self,
        task_id: Uuid,
        id: Uuid,
        data: UpdateSubtask,
    ) -> StoreResult<Option<Subtask>> {
        Ok(Subtask::update(&self.pool, task_id, id, data).await?)
    }

    async fn delete_subtask(&self, task_id: Uuid, id: Uuid) -> StoreResult<bool> {
        Ok(Subtask::delete(&self.pool, task_id, id).await?)
    }
}
