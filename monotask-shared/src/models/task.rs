/// Task model and database operations
///
/// A task is the top-level item on the board. It owns an ordered list of
/// subtasks whose completion state drives the task's status (see
/// [`crate::status`]).
///
/// # Status
///
/// ```text
/// TODO → IN_PROGRESS → DONE
/// ```
///
/// Any status can be set manually; the derived transitions only move forward
/// (see [`crate::status::derive_status`]).
///
/// # Schema
///
/// ```sql
/// CREATE TABLE tasks (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     user_id UUID REFERENCES users(id) ON DELETE SET NULL,
///     title VARCHAR(255) NOT NULL,
///     description TEXT,
///     status VARCHAR(20) NOT NULL DEFAULT 'TODO',
///     priority VARCHAR(20) NOT NULL DEFAULT 'MEDIUM',
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{PgExecutor, PgPool};
use uuid::Uuid;

use super::subtask::{CreateSubtask, Subtask, SubtaskInput, SubtaskView};
use crate::validation::{check_title, FieldError};

/// Board column a task sits in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskStatus {
    Todo,
    InProgress,
    Done,
}

impl TaskStatus {
    /// Converts status to its stored/wire form
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Todo => "TODO",
            TaskStatus::InProgress => "IN_PROGRESS",
            TaskStatus::Done => "DONE",
        }
    }
}

impl Default for TaskStatus {
    fn default() -> Self {
        TaskStatus::Todo
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TaskStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "TODO" => Ok(TaskStatus::Todo),
            "IN_PROGRESS" => Ok(TaskStatus::InProgress),
            "DONE" => Ok(TaskStatus::Done),
            other => Err(format!("unknown task status '{}'", other)),
        }
    }
}

/// Task priority
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskPriority {
    Low,
    Medium,
    High,
}

impl TaskPriority {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskPriority::Low => "LOW",
            TaskPriority::Medium => "MEDIUM",
            TaskPriority::High => "HIGH",
        }
    }
}

impl Default for TaskPriority {
    fn default() -> Self {
        TaskPriority::Medium
    }
}

impl fmt::Display for TaskPriority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TaskPriority {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "LOW" => Ok(TaskPriority::Low),
            "MEDIUM" => Ok(TaskPriority::Medium),
            "HIGH" => Ok(TaskPriority::High),
            other => Err(format!("unknown task priority '{}'", other)),
        }
    }
}

/// Task aggregate: the task row plus its subtasks in creation order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    /// Unique task ID
    pub id: Uuid,

    /// User who created the task (weak reference, nulled if the user goes away)
    pub owner_id: Option<Uuid>,

    pub title: String,

    pub description: Option<String>,

    /// Current board column
    pub status: TaskStatus,

    pub priority: TaskPriority,

    /// When the task was created (immutable)
    pub created_at: DateTime<Utc>,

    /// When the task was last updated
    pub updated_at: DateTime<Utc>,

    /// Owned subtasks, oldest first
    pub subtasks: Vec<Subtask>,
}

impl Task {
    /// Completion flags of the subtasks, in order
    pub fn completions(&self) -> impl Iterator<Item = bool> + '_ {
        self.subtasks.iter().map(|s| s.completed)
    }

    /// Converts to the outward JSON shape
    pub fn view(&self) -> TaskView {
        TaskView::from(self)
    }
}

/// Raw row as stored in PostgreSQL
///
/// Status and priority are plain text columns; they are parsed when the row is
/// turned into a [`Task`].
#[derive(Debug, Clone, sqlx::FromRow)]
pub(crate) struct TaskRow {
    pub id: Uuid,
    pub user_id: Option<Uuid>,
    pub title: String,
    pub description: Option<String>,
    pub status: String,
    pub priority: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TaskRow {
    fn into_task(self, subtasks: Vec<Subtask>) -> Result<Task, sqlx::Error> {
        let status = self
            .status
            .parse::<TaskStatus>()
            .map_err(|e| sqlx::Error::Decode(e.into()))?;
        let priority = self
            .priority
            .parse::<TaskPriority>()
            .map_err(|e| sqlx::Error::Decode(e.into()))?;

        Ok(Task {
            id: self.id,
            owner_id: self.user_id,
            title: self.title,
            description: self.description,
            status,
            priority,
            created_at: self.created_at,
            updated_at: self.updated_at,
            subtasks,
        })
    }
}

/// Validated input for creating a task
#[derive(Debug, Clone, Default)]
pub struct CreateTask {
    pub owner_id: Option<Uuid>,
    pub title: String,
    pub description: Option<String>,
    pub status: TaskStatus,
    pub priority: TaskPriority,
}

/// Validated partial update for a task
///
/// Only `Some` fields are written.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UpdateTask {
    pub title: Option<String>,
    pub description: Option<String>,
    pub status: Option<TaskStatus>,
    pub priority: Option<TaskPriority>,
}

/// Unvalidated task fields as they arrive from a client
///
/// Enum fields are kept as strings so that unknown values become field errors
/// instead of deserialization failures.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TaskInput {
    #[serde(default)]
    pub title: Option<String>,

    #[serde(default)]
    pub description: Option<String>,

    #[serde(default)]
    pub status: Option<String>,

    #[serde(default)]
    pub priority: Option<String>,

    /// Initial subtasks (creation only)
    #[serde(default)]
    pub subtasks: Vec<SubtaskInput>,
}

fn parse_field<T: FromStr>(
    field: &str,
    value: Option<&str>,
    allowed: &str,
    errors: &mut Vec<FieldError>,
) -> Option<T> {
    let raw = value?;
    match raw.parse::<T>() {
        Ok(parsed) => Some(parsed),
        Err(_) => {
            errors.push(FieldError::new(
                field,
                format!("'{}' is not a valid {} (expected one of {})", raw, field, allowed),
            ));
            None
        }
    }
}

const STATUS_VALUES: &str = "TODO, IN_PROGRESS, DONE";
const PRIORITY_VALUES: &str = "LOW, MEDIUM, HIGH";

impl TaskInput {
    /// Validates input for task creation
    ///
    /// Title is required; status and priority fall back to TODO and MEDIUM.
    /// Initial subtasks are validated too and reported as `subtasks[i].field`.
    pub fn validate_create(
        &self,
        owner_id: Option<Uuid>,
    ) -> Result<(CreateTask, Vec<CreateSubtask>), Vec<FieldError>> {
        let mut errors = Vec::new();

        errors.extend(check_title("title", self.title.as_deref(), true));
        let status =
            parse_field::<TaskStatus>("status", self.status.as_deref(), STATUS_VALUES, &mut errors);
        let priority = parse_field::<TaskPriority>(
            "priority",
            self.priority.as_deref(),
            PRIORITY_VALUES,
            &mut errors,
        );

        let mut subtasks = Vec::with_capacity(self.subtasks.len());
        for (i, input) in self.subtasks.iter().enumerate() {
            match input.validate_create() {
                Ok(data) => subtasks.push(data),
                Err(field_errors) => errors.extend(field_errors.into_iter().map(|e| {
                    FieldError::new(format!("subtasks[{}].{}", i, e.field), e.message)
                })),
            }
        }

        if !errors.is_empty() {
            return Err(errors);
        }

        Ok((
            CreateTask {
                owner_id,
                title: self.title.clone().unwrap_or_default().trim().to_string(),
                description: self.description.clone(),
                status: status.unwrap_or_default(),
                priority: priority.unwrap_or_default(),
            },
            subtasks,
        ))
    }

    /// Validates a partial update
    ///
    /// A title that is present must be non-blank and fit the column.
    pub fn validate_update(&self) -> Result<UpdateTask, Vec<FieldError>> {
        let mut errors = Vec::new();

        errors.extend(check_title("title", self.title.as_deref(), false));
        let status =
            parse_field::<TaskStatus>("status", self.status.as_deref(), STATUS_VALUES, &mut errors);
        let priority = parse_field::<TaskPriority>(
            "priority",
            self.priority.as_deref(),
            PRIORITY_VALUES,
            &mut errors,
        );

        if !errors.is_empty() {
            return Err(errors);
        }

        Ok(UpdateTask {
            title: self.title.as_deref().map(|t| t.trim().to_string()),
            description: self.description.clone(),
            status,
            priority,
        })
    }
}

/// Outward representation of a task
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskView {
    pub id: String,
    pub title: String,
    pub description: String,
    pub status: TaskStatus,
    pub priority: TaskPriority,
    /// Unix timestamp (seconds)
    pub created_at: i64,
    pub subtasks: Vec<SubtaskView>,
    pub user_id: Option<Uuid>,
}

impl From<&Task> for TaskView {
    fn from(task: &Task) -> Self {
        Self {
            id: task.id.to_string(),
            title: task.title.clone(),
            description: task.description.clone().unwrap_or_default(),
            status: task.status,
            priority: task.priority,
            created_at: task.created_at.timestamp(),
            subtasks: task.subtasks.iter().map(SubtaskView::from).collect(),
            user_id: task.owner_id,
        }
    }
}

const TASK_COLUMNS: &str =
    "id, user_id, title, description, status, priority, created_at, updated_at";

impl Task {
    /// Inserts a new task row (without subtasks)
    ///
    /// Takes any executor so it can run inside a transaction.
    pub async fn create<'e, E>(executor: E, data: CreateTask) -> Result<Self, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let row = sqlx::query_as::<_, TaskRow>(&format!(
            r#"
            INSERT INTO tasks (user_id, title, description, status, priority)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {}
            "#,
            TASK_COLUMNS
        ))
        .bind(data.owner_id)
        .bind(data.title)
        .bind(data.description)
        .bind(data.status.as_str())
        .bind(data.priority.as_str())
        .fetch_one(executor)
        .await?;

        row.into_task(Vec::new())
    }

    /// Finds a task by ID, loading its subtasks
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let row = sqlx::query_as::<_, TaskRow>(&format!(
            "SELECT {} FROM tasks WHERE id = $1",
            TASK_COLUMNS
        ))
        .bind(id)
        .fetch_optional(pool)
        .await?;

        match row {
            Some(row) => {
                let subtasks = Subtask::list_by_task(pool, row.id).await?;
                Ok(Some(row.into_task(subtasks)?))
            }
            None => Ok(None),
        }
    }

    /// Lists all tasks, newest first, with their subtasks
    ///
    /// Subtasks are loaded with a single extra query for the whole page.
    pub async fn list(pool: &PgPool) -> Result<Vec<Self>, sqlx::Error> {
        let rows = sqlx::query_as::<_, TaskRow>(&format!(
            "SELECT {} FROM tasks ORDER BY created_at DESC, id DESC",
            TASK_COLUMNS
        ))
        .fetch_all(pool)
        .await?;

        let ids: Vec<Uuid> = rows.iter().map(|r| r.id).collect();
        let mut by_task: HashMap<Uuid, Vec<Subtask>> = HashMap::new();
        for subtask in Subtask::list_by_tasks(pool, &ids).await? {
            by_task.entry(subtask.task_id).or_default().push(subtask);
        }

        rows.into_iter()
            .map(|row| {
                let subtasks = by_task.remove(&row.id).unwrap_or_default();
                row.into_task(subtasks)
            })
            .collect()
    }

    /// Applies a partial update
    ///
    /// # Returns
    ///
    /// True if the task exists
    pub async fn update(pool: &PgPool, id: Uuid, data: UpdateTask) -> Result<bool, sqlx::Error> {
        // Build dynamic update query based on which fields are present
        let mut query = String::from("UPDATE tasks SET updated_at = NOW()");
        let mut bind_count = 1;

        if data.title.is_some() {
            bind_count += 1;
            query.push_str(&format!(", title = ${}", bind_count));
        }
        if data.description.is_some() {
            bind_count += 1;
            query.push_str(&format!(", description = ${}", bind_count));
        }
        if data.status.is_some() {
            bind_count += 1;
            query.push_str(&format!(", status = ${}", bind_count));
        }
        if data.priority.is_some() {
            bind_count += 1;
            query.push_str(&format!(", priority = ${}", bind_count));
        }

        query.push_str(" WHERE id = $1");

        let mut q = sqlx::query(&query).bind(id);

        if let Some(title) = data.title {
            q = q.bind(title);
        }
        if let Some(description) = data.description {
            q = q.bind(description);
        }
        if let Some(status) = data.status {
            q = q.bind(status.as_str());
        }
        if let Some(priority) = data.priority {
            q = q.bind(priority.as_str());
        }

        let result = q.execute(pool).await?;

        Ok(result.rows_affected() > 0)
    }

    /// Writes a derived status
    pub async fn set_status(
        pool: &PgPool,
        id: Uuid,
        status: TaskStatus,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            r#"
            UPDATE tasks
            SET status = $2,
                updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(status.as_str())
        .execute(pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Deletes a task
    ///
    /// Subtasks are removed by the `ON DELETE CASCADE` foreign key.
    pub async fn delete(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM tasks WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
