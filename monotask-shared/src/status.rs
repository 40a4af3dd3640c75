/// Status derivation from subtask completion
///
/// A task's status follows the completion state of its subtasks. After every
/// subtask mutation (and after a task save when subtasks exist) the caller
/// hands the full current completion set to [`derive_status`] and writes the
/// returned status, if any.
///
/// # Rules
///
/// | Subtasks | Current status | Result |
/// |---|---|---|
/// | none (subtask mutation) | not TODO | TODO |
/// | all completed | not DONE | DONE |
/// | some completed | TODO | IN_PROGRESS |
/// | anything else | | no change |
///
/// DONE is never reverted automatically: reopening a subtask of a finished
/// task leaves the task DONE until someone moves it by hand.
///
/// # Example
///
/// ```
/// use monotask_shared::models::task::TaskStatus;
/// use monotask_shared::status::{derive_status, Trigger};
///
/// let next = derive_status(TaskStatus::Todo, Trigger::SubtaskUpdated, [true, false]);
/// assert_eq!(next, Some(TaskStatus::InProgress));
///
/// // Already consistent: nothing to write
/// let next = derive_status(TaskStatus::InProgress, Trigger::SubtaskUpdated, [true, false]);
/// assert_eq!(next, None);
/// ```

use std::fmt;

use crate::models::task::TaskStatus;

/// The mutation that caused a recomputation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    SubtaskCreated,
    SubtaskUpdated,
    SubtaskDestroyed,
    /// A task was created or updated
    TaskSaved,
}

impl Trigger {
    pub fn as_str(&self) -> &'static str {
        match self {
            Trigger::SubtaskCreated => "subtask_created",
            Trigger::SubtaskUpdated => "subtask_updated",
            Trigger::SubtaskDestroyed => "subtask_destroyed",
            Trigger::TaskSaved => "task_saved",
        }
    }
}

impl fmt::Display for Trigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Computes the status a task should move to
///
/// # Arguments
///
/// * `current` - The task's stored status
/// * `trigger` - What caused the recomputation
/// * `completions` - Completion flags of ALL current subtasks
///
/// # Returns
///
/// `Some(status)` only when a write is needed, `None` when the task is
/// already consistent.
pub fn derive_status<I>(current: TaskStatus, trigger: Trigger, completions: I) -> Option<TaskStatus>
where
    I: IntoIterator<Item = bool>,
{
    let (total, completed) = completions
        .into_iter()
        .fold((0usize, 0usize), |(total, done), c| (total + 1, done + usize::from(c)));

    let next = if total == 0 {
        // Task saves without subtasks keep whatever status was set by hand
        if trigger == Trigger::TaskSaved {
            return None;
        }
        TaskStatus::Todo
    } else if completed == total {
        TaskStatus::Done
    } else if completed > 0 && current == TaskStatus::Todo {
        TaskStatus::InProgress
    } else {
        return None;
    };

    (next != current).then_some(next)
}
