/// Demo data for local development
///
/// Creates a demo account, a handful of sample users and three sample tasks
/// owned by the demo account. Safe to run on every start: users are matched
/// by email and tasks by title + owner, and existing records are left alone.
///
/// Sign in with `demo@example.com` / `demo123`.

use tracing::{debug, info};

use crate::accounts::{AccountError, AccountService};
use crate::models::subtask::SubtaskInput;
use crate::models::task::TaskInput;
use crate::models::user::User;
use crate::repository::{TaskError, TaskRepository};

pub const DEMO_EMAIL: &str = "demo@example.com";
pub const DEMO_PASSWORD: &str = "demo123";
const SAMPLE_PASSWORD: &str = "password123";

/// (name, email, avatar index)
const SAMPLE_USERS: [(&str, &str, i64); 5] = [
    ("Alice Chen", "alice@example.com", 5),
    ("Bob Smith", "bob@example.com", 12),
    ("Carol White", "carol@example.com", 18),
    ("David Lee", "david@example.com", 24),
    ("Eve Brown", "eve@example.com", 30),
];

struct SampleTask {
    title: &'static str,
    description: &'static str,
    status: &'static str,
    priority: &'static str,
    subtasks: [(&'static str, bool); 2],
}

const SAMPLE_TASKS: [SampleTask; 3] = [
    SampleTask {
        title: "Welcome to MonoTask",
        description: "This is a sample task to get you started. You can create, edit, and delete tasks.",
        status: "TODO",
        priority: "HIGH",
        subtasks: [
            ("Try creating a new task", false),
            ("Drag and drop to change status", false),
        ],
    },
    SampleTask {
        title: "Learn the basics",
        description: "Explore the different task statuses and priorities.",
        status: "IN_PROGRESS",
        priority: "MEDIUM",
        subtasks: [
            ("Understand TODO status", true),
            ("Understand IN_PROGRESS status", false),
        ],
    },
    SampleTask {
        title: "Complete your first task",
        description: "Move this task to DONE when all subtasks are completed.",
        status: "IN_PROGRESS",
        priority: "LOW",
        subtasks: [("Review task details", true), ("Mark as complete", false)],
    },
];

#[derive(Debug, thiserror::Error)]
pub enum SeedError {
    #[error("Failed to seed users: {0}")]
    Account(#[from] AccountError),

    #[error("Failed to seed tasks: {0}")]
    Task(#[from] TaskError),
}

/// What a seeding run actually created
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SeedReport {
    pub users_created: usize,
    pub tasks_created: usize,
}

/// Finds or creates a user with a fixed avatar
async fn ensure_user(
    accounts: &AccountService,
    name: &str,
    email: &str,
    password: &str,
    avatar: i64,
    report: &mut SeedReport,
) -> Result<User, SeedError> {
    if let Some(user) = accounts.find_by_email(email).await? {
        debug!(email, "Seed user already exists");
        return Ok(user);
    }

    let user = accounts.register(name, email, password).await?;
    let user = accounts.update_avatar(user.id, avatar).await?;
    report.users_created += 1;

    Ok(user)
}

/// Seeds the demo account, sample users and sample tasks
pub async fn seed_demo_data(
    accounts: &AccountService,
    tasks: &TaskRepository,
) -> Result<SeedReport, SeedError> {
    let mut report = SeedReport::default();

    let demo = ensure_user(accounts, "Demo User", DEMO_EMAIL, DEMO_PASSWORD, 1, &mut report).await?;
    for (name, email, avatar) in SAMPLE_USERS {
        ensure_user(accounts, name, email, SAMPLE_PASSWORD, avatar, &mut report).await?;
    }

    let existing = tasks.list().await?;
    for sample in &SAMPLE_TASKS {
        let exists = existing
            .iter()
            .any(|t| t.title == sample.title && t.owner_id == Some(demo.id));
        if exists {
            continue;
        }

        let input = TaskInput {
            title: Some(sample.title.to_string()),
            description: Some(sample.description.to_string()),
            status: Some(sample.status.to_string()),
            priority: Some(sample.priority.to_string()),
            subtasks: sample
                .subtasks
                .iter()
                .map(|(title, completed)| SubtaskInput {
                    title: Some(title.to_string()),
                    completed: Some(*completed),
                })
                .collect(),
        };
        tasks.create(input, Some(demo.id)).await?;
        report.tasks_created += 1;
    }

    info!(
        users_created = report.users_created,
        tasks_created = report.tasks_created,
        "Demo data seeded"
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::task::TaskStatus;
    use crate::store::MemoryStore;
    use std::sync::Arc;

    fn services() -> (AccountService, TaskRepository) {
        let store = Arc::new(MemoryStore::new());
        (
            AccountService::new(store.clone()),
            TaskRepository::new(store),
        )
    }

    #[tokio::test]
    async fn test_seed_creates_demo_data() {
        let (accounts, tasks) = services();

        let report = seed_demo_data(&accounts, &tasks).await.unwrap();
        assert_eq!(report, SeedReport { users_created: 6, tasks_created: 3 });

        let demo = accounts.login(DEMO_EMAIL, DEMO_PASSWORD).await.unwrap();
        assert!(demo.avatar_url().ends_with("/memo_1.png"));

        let bob = accounts.login("bob@example.com", SAMPLE_PASSWORD).await.unwrap();
        assert!(bob.avatar_url().ends_with("/memo_12.png"));

        let listed = tasks.list().await.unwrap();
        assert_eq!(listed.len(), 3);
        assert!(listed.iter().all(|t| t.owner_id == Some(demo.id)));
        assert!(listed.iter().all(|t| t.subtasks.len() == 2));
    }

    #[tokio::test]
    async fn test_seed_statuses_are_consistent_with_subtasks() {
        let (accounts, tasks) = services();
        seed_demo_data(&accounts, &tasks).await.unwrap();

        for task in tasks.list().await.unwrap() {
            let expected = match task.title.as_str() {
                "Welcome to MonoTask" => TaskStatus::Todo,
                _ => TaskStatus::InProgress,
            };
            assert_eq!(task.status, expected, "{}", task.title);
        }
    }

    #[tokio::test]
    async fn test_seed_is_idempotent() {
        let (accounts, tasks) = services();
        seed_demo_data(&accounts, &tasks).await.unwrap();

        let second = seed_demo_data(&accounts, &tasks).await.unwrap();
        assert_eq!(second, SeedReport::default());
        assert_eq!(tasks.list().await.unwrap().len(), 3);
    }
}
