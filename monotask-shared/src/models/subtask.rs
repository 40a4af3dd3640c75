/// Subtask model and database operations
///
/// Subtasks are checklist items owned by exactly one task and deleted with it.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE subtasks (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     task_id UUID NOT NULL REFERENCES tasks(id) ON DELETE CASCADE,
///     title VARCHAR(255) NOT NULL,
///     completed BOOLEAN NOT NULL DEFAULT FALSE,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT clock_timestamp(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{PgExecutor, PgPool};
use uuid::Uuid;

use crate::validation::{check_title, FieldError};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Subtask {
    pub id: Uuid,

    /// Owning task
    pub task_id: Uuid,

    pub title: String,

    pub completed: bool,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,
}

/// Validated input for creating a subtask
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateSubtask {
    pub title: String,
    pub completed: bool,
}

/// Validated partial update for a subtask
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UpdateSubtask {
    pub title: Option<String>,
    pub completed: Option<bool>,
}

/// Unvalidated subtask fields as they arrive from a client
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SubtaskInput {
    #[serde(default)]
    pub title: Option<String>,

    #[serde(default)]
    pub completed: Option<bool>,
}

impl SubtaskInput {
    /// Validates input for subtask creation (title required, completed defaults to false)
    pub fn validate_create(&self) -> Result<CreateSubtask, Vec<FieldError>> {
        if let Some(err) = check_title("title", self.title.as_deref(), true) {
            return Err(vec![err]);
        }

        Ok(CreateSubtask {
            title: self.title.clone().unwrap_or_default().trim().to_string(),
            completed: self.completed.unwrap_or(false),
        })
    }

    /// Validates a partial update; a present title must be a valid title
    pub fn validate_update(&self) -> Result<UpdateSubtask, Vec<FieldError>> {
        if let Some(err) = check_title("title", self.title.as_deref(), false) {
            return Err(vec![err]);
        }

        Ok(UpdateSubtask {
            title: self.title.as_deref().map(|t| t.trim().to_string()),
            completed: self.completed,
        })
    }
}

/// Outward representation of a subtask
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubtaskView {
    pub id: String,
    pub title: String,
    pub completed: bool,
}

impl From<&Subtask> for SubtaskView {
    fn from(subtask: &Subtask) -> Self {
        Self {
            id: subtask.id.to_string(),
            title: subtask.title.clone(),
            completed: subtask.completed,
        }
    }
}

impl Subtask {
    pub async fn create<'e, E>(
        executor: E,
        task_id: Uuid,
        data: CreateSubtask,
    ) -> Result<Self, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let subtask = sqlx::query_as::<_, Subtask>(
            r#"
            INSERT INTO subtasks (task_id, title, completed)
            VALUES ($1, $2, $3)
            RETURNING id, task_id, title, completed, created_at, updated_at
            "#,
        )
        .bind(task_id)
        .bind(data.title)
        .bind(data.completed)
        .fetch_one(executor)
        .await?;

        Ok(subtask)
    }

    /// Lists a task's subtasks in creation order
    pub async fn list_by_task(pool: &PgPool, task_id: Uuid) -> Result<Vec<Self>, sqlx::Error> {
        let subtasks = sqlx::query_as::<_, Subtask>(
            r#"
            SELECT id, task_id, title, completed, created_at, updated_at
            FROM subtasks
            WHERE task_id = $1
            ORDER BY created_at ASC, id ASC
            "#,
        )
        .bind(task_id)
        .fetch_all(pool)
        .await?;

        Ok(subtasks)
    }

    /// Lists the subtasks of several tasks in creation order
    pub async fn list_by_tasks(pool: &PgPool, task_ids: &[Uuid]) -> Result<Vec<Self>, sqlx::Error> {
        if task_ids.is_empty() {
            return Ok(Vec::new());
        }

        let subtasks = sqlx::query_as::<_, Subtask>(
            r#"
            SELECT id, task_id, title, completed, created_at, updated_at
            FROM subtasks
            WHERE task_id = ANY($1)
            ORDER BY created_at ASC, id ASC
            "#,
        )
        .bind(task_ids)
        .fetch_all(pool)
        .await?;

        Ok(subtasks)
    }

    /// Applies a partial update to a subtask of the given task
    ///
    /// # Returns
    ///
    /// The updated subtask, or None if no such subtask belongs to the task
    pub async fn update(
        pool: &PgPool,
        task_id: Uuid,
        id: Uuid,
        data: UpdateSubtask,
    ) -> Result<Option<Self>, sqlx::Error> {
        let subtask = sqlx::query_as::<_, Subtask>(
            r#"
            UPDATE subtasks
            SET title = COALESCE($3, title),
                completed = COALESCE($4, completed),
                updated_at = NOW()
            WHERE id = $2 AND task_id = $1
            RETURNING id, task_id, title, completed, created_at, updated_at
            "#,
        )
        .bind(task_id)
        .bind(id)
        .bind(data.title)
        .bind(data.completed)
        .fetch_optional(pool)
        .await?;

        Ok(subtask)
    }

    /// Deletes a subtask of the given task
    pub async fn delete(pool: &PgPool, task_id: Uuid, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM subtasks WHERE id = $2 AND task_id = $1")
            .bind(task_id)
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
