/// Task and subtask endpoints
///
/// All endpoints here require authentication. Every subtask mutation returns
/// the parent task so clients see the re-derived status immediately.
///
/// # Endpoints
///
/// - `GET /tasks` - List all tasks, newest first
/// - `POST /tasks` - Create a task, optionally with initial subtasks
/// - `GET /tasks/:id` - Show a task
/// - `PATCH /tasks/:id` - Partially update a task
/// - `DELETE /tasks/:id` - Delete a task and its subtasks
/// - `POST /tasks/:id/create_subtask` - Add a subtask
/// - `PATCH /tasks/:id/update_subtask/:subtask_id` - Edit or toggle a subtask
/// - `DELETE /tasks/:id/destroy_subtask/:subtask_id` - Remove a subtask

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    middleware::auth::CurrentUser,
};
use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    Json,
};
use monotask_shared::models::{subtask::SubtaskInput, task::TaskInput, task::TaskView};
use serde::Deserialize;
use tracing::info;
use uuid::Uuid;

/// Task body, flat or wrapped in `{"task": {...}}`
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum TaskBody {
    Nested { task: TaskInput },
    Flat(TaskInput),
}

impl TaskBody {
    pub fn into_input(self) -> TaskInput {
        match self {
            TaskBody::Nested { task } => task,
            TaskBody::Flat(task) => task,
        }
    }
}

/// Subtask body, flat or wrapped in `{"subtask": {...}}`
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum SubtaskBody {
    Nested { subtask: SubtaskInput },
    Flat(SubtaskInput),
}

impl SubtaskBody {
    pub fn into_input(self) -> SubtaskInput {
        match self {
            SubtaskBody::Nested { subtask } => subtask,
            SubtaskBody::Flat(subtask) => subtask,
        }
    }
}

/// Path ids that are not UUIDs cannot name an existing record
fn parse_id(raw: &str, what: &str) -> ApiResult<Uuid> {
    Uuid::parse_str(raw).map_err(|_| ApiError::NotFound(format!("{} not found", what)))
}

/// Lists every task with its subtasks
pub async fn list_tasks(State(state): State<AppState>) -> ApiResult<Json<Vec<TaskView>>> {
    let tasks = state.tasks.list().await?;

    Ok(Json(tasks.iter().map(TaskView::from).collect()))
}

/// Creates a task owned by the caller
///
/// # Endpoint
///
/// ```text
/// POST /tasks
/// Authorization: Bearer <token>
/// Content-Type: application/json
///
/// {
///   "title": "Write docs",
///   "priority": "HIGH",
///   "subtasks": [{ "title": "Outline" }]
/// }
/// ```
///
/// # Errors
///
/// - `422 Unprocessable Entity`: Blank title or unknown status/priority
pub async fn create_task(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    payload: Result<Json<TaskBody>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<TaskView>)> {
    let Json(body) = payload?;

    let task = state.tasks.create(body.into_input(), Some(user.id)).await?;

    Ok((StatusCode::CREATED, Json(task.view())))
}

pub async fn show_task(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<TaskView>> {
    let id = parse_id(&id, "Task")?;
    let task = state.tasks.get(id).await?;

    Ok(Json(task.view()))
}

/// Applies a partial update
///
/// Omitted fields are left unchanged. The status is re-derived afterwards, so
/// a manual status that contradicts the subtasks does not stick.
pub async fn update_task(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<TaskBody>, JsonRejection>,
) -> ApiResult<Json<TaskView>> {
    let id = parse_id(&id, "Task")?;
    let Json(body) = payload?;

    let task = state.tasks.update(id, body.into_input()).await?;

    Ok(Json(task.view()))
}

pub async fn delete_task(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    let id = parse_id(&id, "Task")?;

    state.tasks.delete(id).await?;
    info!(task_id = %id, user_id = %user.id, "Task deleted via API");

    Ok(StatusCode::NO_CONTENT)
}

/// Adds a subtask and returns the parent task
///
/// # Errors
///
/// - `404 Not Found`: Unknown task
/// - `422 Unprocessable Entity`: Blank title
pub async fn create_subtask(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<SubtaskBody>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<TaskView>)> {
    let id = parse_id(&id, "Task")?;
    let Json(body) = payload?;

    let task = state.tasks.create_subtask(id, body.into_input()).await?;

    Ok((StatusCode::CREATED, Json(task.view())))
}

pub async fn update_subtask(
    State(state): State<AppState>,
    Path((id, subtask_id)): Path<(String, String)>,
    payload: Result<Json<SubtaskBody>, JsonRejection>,
) -> ApiResult<Json<TaskView>> {
    let id = parse_id(&id, "Task")?;
    let subtask_id = parse_id(&subtask_id, "Subtask")?;
    let Json(body) = payload?;

    let task = state
        .tasks
        .update_subtask(id, subtask_id, body.into_input())
        .await?;

    Ok(Json(task.view()))
}

pub async fn destroy_subtask(
    State(state): State<AppState>,
    Path((id, subtask_id)): Path<(String, String)>,
) -> ApiResult<StatusCode> {
    let id = parse_id(&id, "Task")?;
    let subtask_id = parse_id(&subtask_id, "Subtask")?;

    state.tasks.destroy_subtask(id, subtask_id).await?;

    Ok(StatusCode::NO_CONTENT)
}
