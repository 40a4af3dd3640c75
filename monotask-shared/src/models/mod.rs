/// Database models for MonoTask
///
/// This module contains the persisted entities, their validated inputs and
/// outward JSON views, and the PostgreSQL queries behind them.
///
/// # Models
///
/// - `user`: Accounts and avatar rules
/// - `task`: Board tasks with status and priority
/// - `subtask`: Checklist items owned by a task
///
/// # Example
///
/// ```no_run
/// use monotask_shared::models::task::{Task, TaskInput};
/// use monotask_shared::db::pool::{create_pool, DatabaseConfig};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let pool = create_pool(DatabaseConfig::default()).await?;
///
/// let input = TaskInput {
///     title: Some("Write release notes".to_string()),
///     ..Default::default()
/// };
/// let (data, _subtasks) = input.validate_create(None).expect("valid input");
///
/// let task = Task::create(&pool, data).await?;
/// # Ok(())
/// # }
/// ```

pub mod subtask;
pub mod task;
pub mod user;
