/// Integration tests for the MonoTask API
///
/// These tests drive the full router over an in-memory store:
/// - Route access (public, protected, unknown routes)
/// - Registration, login, current user and avatars
/// - Task and subtask CRUD
/// - Status derivation through subtask mutations

mod common;

use axum::http::StatusCode;
use chrono::{Duration, Utc};
use common::{subtask_ids, TestContext};
use serde_json::{json, Value};
use uuid::Uuid;

fn status_of(task: &Value) -> &str {
    task["status"].as_str().unwrap()
}

// Access control

#[tokio::test]
async fn test_health_is_public() {
    let ctx = TestContext::new();

    let (status, body) = ctx.get("/health", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["database"], "memory");
}

#[tokio::test]
async fn test_protected_routes_reject_anonymous_requests() {
    let ctx = TestContext::new();
    let id = Uuid::new_v4();

    let requests = [
        ctx.get("/tasks", None).await,
        ctx.post("/tasks", None, json!({"title": "x"})).await,
        ctx.get(&format!("/tasks/{}", id), None).await,
        ctx.patch(&format!("/tasks/{}", id), None, json!({"title": "x"})).await,
        ctx.delete(&format!("/tasks/{}", id), None).await,
        ctx.post(&format!("/tasks/{}/create_subtask", id), None, json!({"title": "x"}))
            .await,
        ctx.patch(
            &format!("/tasks/{}/update_subtask/{}", id, id),
            None,
            json!({"completed": true}),
        )
        .await,
        ctx.delete(&format!("/tasks/{}/destroy_subtask/{}", id, id), None)
            .await,
        ctx.patch("/auth/avatar", None, json!({"avatarIndex": 1})).await,
    ];

    for (status, body) in requests {
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["code"], "unauthorized");
    }
}

#[tokio::test]
async fn test_invalid_token_is_anonymous() {
    let ctx = TestContext::new();

    let (status, _) = ctx.get("/tasks", Some("not-a-token")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, body) = ctx.get("/auth/me", Some("not-a-token")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user"], Value::Null);
}

#[tokio::test]
async fn test_unknown_routes_are_protected() {
    let ctx = TestContext::new();

    let (status, _) = ctx.get("/admin", None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let user = ctx.register("Jane", "jane@example.com", "secret").await;
    let (status, body) = ctx.get("/admin", Some(&user.token)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "not_found");
}

#[tokio::test]
async fn test_token_expires_after_lifetime() {
    let ctx = TestContext::new();
    let user = ctx.register("Jane", "jane@example.com", "secret").await;
    let user_id = Uuid::parse_str(&user.id).unwrap();

    let recent = ctx
        .state
        .tokens
        .issue_at(user_id, &user.email, Utc::now() - Duration::hours(1))
        .unwrap();
    let (status, _) = ctx.get("/tasks", Some(&recent)).await;
    assert_eq!(status, StatusCode::OK);

    let stale = ctx
        .state
        .tokens
        .issue_at(user_id, &user.email, Utc::now() - Duration::hours(25))
        .unwrap();
    let (status, _) = ctx.get("/tasks", Some(&stale)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

// Accounts

#[tokio::test]
async fn test_me_reflects_identity() {
    let ctx = TestContext::new();

    let (status, body) = ctx.get("/auth/me", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"user": null}));

    let user = ctx.register("Jane", "jane@example.com", "secret").await;
    let (status, body) = ctx.get("/auth/me", Some(&user.token)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user"]["id"], user.id.as_str());
    assert_eq!(body["user"]["name"], "Jane");
    assert!(body["user"].get("passwordHash").is_none());
    assert!(body["user"]["avatarUrl"].as_str().unwrap().ends_with(".png"));
}

#[tokio::test]
async fn test_register_normalizes_email() {
    let ctx = TestContext::new();

    let user = ctx.register("Jane", "Jane@Example.COM", "secret").await;

    assert_eq!(user.email, "jane@example.com");
}

#[tokio::test]
async fn test_register_duplicate_email_is_rejected() {
    let ctx = TestContext::new();
    ctx.register("Jane", "jane@example.com", "secret").await;

    let (status, body) = ctx
        .post(
            "/auth/register",
            None,
            json!({"name": "Other", "email": "JANE@example.com", "password": "other"}),
        )
        .await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["code"], "conflict");
    assert_eq!(body["error"], "User already exists");

    // The original account is untouched
    let (status, body) = ctx
        .post(
            "/auth/login",
            None,
            json!({"email": "jane@example.com", "password": "secret"}),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user"]["name"], "Jane");
}

#[tokio::test]
async fn test_register_validation_errors() {
    let ctx = TestContext::new();

    let (status, body) = ctx
        .post(
            "/auth/register",
            None,
            json!({"name": "", "email": "not-an-email", "password": ""}),
        )
        .await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["code"], "validation_error");
    let fields: Vec<&str> = body["errors"]
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["field"].as_str().unwrap())
        .collect();
    assert_eq!(fields, vec!["email", "name", "password"]);
}

#[tokio::test]
async fn test_malformed_json_is_unprocessable() {
    let ctx = TestContext::new();

    let (status, body) = ctx.post("/auth/register", None, json!([1, 2, 3])).await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["errors"][0]["field"], "body");
}

#[tokio::test]
async fn test_login_failures_are_indistinguishable() {
    let ctx = TestContext::new();
    ctx.register("Jane", "jane@example.com", "secret").await;

    let wrong_password = ctx
        .post(
            "/auth/login",
            None,
            json!({"email": "jane@example.com", "password": "wrong"}),
        )
        .await;
    let unknown_email = ctx
        .post(
            "/auth/login",
            None,
            json!({"email": "nobody@example.com", "password": "secret"}),
        )
        .await;

    assert_eq!(wrong_password.0, StatusCode::UNAUTHORIZED);
    assert_eq!(wrong_password, unknown_email);
}

#[tokio::test]
async fn test_login_issues_usable_token() {
    let ctx = TestContext::new();
    ctx.register("Jane", "jane@example.com", "secret").await;

    let (status, body) = ctx
        .post(
            "/auth/login",
            None,
            json!({"email": " JANE@example.com ", "password": "secret"}),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let token = body["token"].as_str().unwrap();
    let (status, _) = ctx.get("/tasks", Some(token)).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_avatar_index_bounds() {
    let ctx = TestContext::new();
    let user = ctx.register("Jane", "jane@example.com", "secret").await;

    for index in [0, 36, -1] {
        let (status, body) = ctx
            .patch("/auth/avatar", Some(&user.token), json!({"avatarIndex": index}))
            .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY, "index {}", index);
        assert_eq!(body["errors"][0]["field"], "avatarIndex");
    }

    for index in [1, 35] {
        let (status, body) = ctx
            .patch("/auth/avatar", Some(&user.token), json!({"avatarIndex": index}))
            .await;
        assert_eq!(status, StatusCode::OK, "index {}", index);
        assert!(body["user"]["avatarUrl"]
            .as_str()
            .unwrap()
            .ends_with(&format!("memo_{}.png", index)));
    }

    let (status, _) = ctx.patch("/auth/avatar", Some(&user.token), json!({})).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}

// Tasks

#[tokio::test]
async fn test_task_crud() {
    let ctx = TestContext::new();
    let user = ctx.register("Jane", "jane@example.com", "secret").await;
    let token = Some(user.token.as_str());

    let task = ctx
        .create_task(&user, json!({"title": "Write docs", "description": "All of them"}))
        .await;
    assert_eq!(task["title"], "Write docs");
    assert_eq!(task["status"], "TODO");
    assert_eq!(task["priority"], "MEDIUM");
    assert_eq!(task["userId"], user.id.as_str());
    assert_eq!(task["subtasks"], json!([]));
    let id = task["id"].as_str().unwrap();

    let (status, list) = ctx.get("/tasks", token).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(list.as_array().unwrap().len(), 1);

    let (status, updated) = ctx
        .patch(
            &format!("/tasks/{}", id),
            token,
            json!({"title": "Write more docs", "priority": "HIGH"}),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["title"], "Write more docs");
    assert_eq!(updated["priority"], "HIGH");
    assert_eq!(updated["description"], "All of them");

    let (status, shown) = ctx.get(&format!("/tasks/{}", id), token).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(shown, updated);

    let (status, body) = ctx.delete(&format!("/tasks/{}", id), token).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert_eq!(body, Value::Null);

    let (status, body) = ctx.get(&format!("/tasks/{}", id), token).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Task not found");
}

#[tokio::test]
async fn test_tasks_list_newest_first() {
    let ctx = TestContext::new();
    let user = ctx.register("Jane", "jane@example.com", "secret").await;

    ctx.create_task(&user, json!({"title": "First"})).await;
    ctx.create_task(&user, json!({"title": "Second"})).await;

    let (_, list) = ctx.get("/tasks", Some(&user.token)).await;
    let titles: Vec<&str> = list
        .as_array()
        .unwrap()
        .iter()
        .map(|t| t["title"].as_str().unwrap())
        .collect();
    assert_eq!(titles, vec!["Second", "First"]);
}

#[tokio::test]
async fn test_task_accepts_nested_body() {
    let ctx = TestContext::new();
    let user = ctx.register("Jane", "jane@example.com", "secret").await;

    let task = ctx
        .create_task(
            &user,
            json!({"task": {"title": "Nested", "priority": "LOW", "subtasks": [{"title": "One"}]}}),
        )
        .await;

    assert_eq!(task["title"], "Nested");
    assert_eq!(task["priority"], "LOW");
    assert_eq!(task["subtasks"][0]["title"], "One");
    assert_eq!(task["subtasks"][0]["completed"], false);
}

#[tokio::test]
async fn test_task_validation_errors() {
    let ctx = TestContext::new();
    let user = ctx.register("Jane", "jane@example.com", "secret").await;

    let (status, body) = ctx
        .post(
            "/tasks",
            Some(&user.token),
            json!({"title": "  ", "status": "BLOCKED"}),
        )
        .await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    let fields: Vec<&str> = body["errors"]
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["field"].as_str().unwrap())
        .collect();
    assert_eq!(fields, vec!["title", "status"]);

    let (_, list) = ctx.get("/tasks", Some(&user.token)).await;
    assert_eq!(list, json!([]));
}

#[tokio::test]
async fn test_overlong_titles_are_unprocessable() {
    let ctx = TestContext::new();
    let user = ctx.register("Jane", "jane@example.com", "secret").await;
    let token = Some(user.token.as_str());
    let long = "x".repeat(256);

    let (status, body) = ctx.post("/tasks", token, json!({"title": long})).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["errors"][0]["field"], "title");
    assert_eq!(
        body["errors"][0]["message"],
        "is too long (maximum is 255 characters)"
    );

    let (status, body) = ctx
        .post(
            "/tasks",
            token,
            json!({"title": "Parent", "subtasks": [{"title": "ok"}, {"title": long}]}),
        )
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["errors"][0]["field"], "subtasks[1].title");

    let (_, list) = ctx.get("/tasks", token).await;
    assert_eq!(list, json!([]));

    let task = ctx.create_task(&user, json!({"title": "x".repeat(255)})).await;
    let id = task["id"].as_str().unwrap();

    let (status, _) = ctx
        .patch(&format!("/tasks/{}", id), token, json!({"title": long}))
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    let (status, body) = ctx
        .post(&format!("/tasks/{}/create_subtask", id), token, json!({"title": long}))
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["errors"][0]["field"], "title");
}

#[tokio::test]
async fn test_unknown_task_ids_are_not_found() {
    let ctx = TestContext::new();
    let user = ctx.register("Jane", "jane@example.com", "secret").await;
    let token = Some(user.token.as_str());

    let (status, _) = ctx.get("/tasks/not-a-uuid", token).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let missing = Uuid::new_v4();
    let (status, _) = ctx.get(&format!("/tasks/{}", missing), token).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = ctx
        .patch(&format!("/tasks/{}", missing), token, json!({"title": "x"}))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = ctx.delete(&format!("/tasks/{}", missing), token).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = ctx
        .post(
            &format!("/tasks/{}/create_subtask", missing),
            token,
            json!({"title": "x"}),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Task not found");
}

// Subtasks and status derivation

#[tokio::test]
async fn test_subtask_lifecycle_drives_status() {
    let ctx = TestContext::new();
    let user = ctx.register("Jane", "jane@example.com", "secret").await;
    let token = Some(user.token.as_str());

    let task = ctx.create_task(&user, json!({"title": "Ship it"})).await;
    let id = task["id"].as_str().unwrap().to_string();

    // Incomplete subtask on a TODO task: still TODO
    let (status, task) = ctx
        .post(
            &format!("/tasks/{}/create_subtask", id),
            token,
            json!({"title": "Build"}),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(status_of(&task), "TODO");

    // One of two complete: IN_PROGRESS
    let (_, task) = ctx
        .post(
            &format!("/tasks/{}/create_subtask", id),
            token,
            json!({"subtask": {"title": "Test", "completed": true}}),
        )
        .await;
    assert_eq!(status_of(&task), "IN_PROGRESS");

    let ids = subtask_ids(&task);
    assert_eq!(ids.len(), 2);

    // All complete: DONE
    let (status, task) = ctx
        .patch(
            &format!("/tasks/{}/update_subtask/{}", id, ids[0]),
            token,
            json!({"completed": true}),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(status_of(&task), "DONE");

    // Reopening a subtask does not revert DONE
    let (_, task) = ctx
        .patch(
            &format!("/tasks/{}/update_subtask/{}", id, ids[1]),
            token,
            json!({"completed": false}),
        )
        .await;
    assert_eq!(status_of(&task), "DONE");
    assert_eq!(task["subtasks"][1]["title"], "Test");

    // Removing every subtask: TODO
    let (status, _) = ctx
        .delete(&format!("/tasks/{}/destroy_subtask/{}", id, ids[0]), token)
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, _) = ctx
        .delete(&format!("/tasks/{}/destroy_subtask/{}", id, ids[1]), token)
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (_, task) = ctx.get(&format!("/tasks/{}", id), token).await;
    assert_eq!(status_of(&task), "TODO");
    assert_eq!(task["subtasks"], json!([]));
}

#[tokio::test]
async fn test_create_with_completed_subtasks_is_done() {
    let ctx = TestContext::new();
    let user = ctx.register("Jane", "jane@example.com", "secret").await;

    let task = ctx
        .create_task(
            &user,
            json!({
                "title": "Already finished",
                "subtasks": [
                    {"title": "a", "completed": true},
                    {"title": "b", "completed": true}
                ]
            }),
        )
        .await;

    assert_eq!(status_of(&task), "DONE");
}

#[tokio::test]
async fn test_manual_status_without_subtasks_sticks() {
    let ctx = TestContext::new();
    let user = ctx.register("Jane", "jane@example.com", "secret").await;
    let task = ctx.create_task(&user, json!({"title": "Manual"})).await;
    let id = task["id"].as_str().unwrap();

    let (status, task) = ctx
        .patch(
            &format!("/tasks/{}", id),
            Some(&user.token),
            json!({"status": "IN_PROGRESS"}),
        )
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(status_of(&task), "IN_PROGRESS");
}

#[tokio::test]
async fn test_subtask_errors() {
    let ctx = TestContext::new();
    let user = ctx.register("Jane", "jane@example.com", "secret").await;
    let token = Some(user.token.as_str());
    let task = ctx.create_task(&user, json!({"title": "Parent"})).await;
    let id = task["id"].as_str().unwrap();

    let (status, body) = ctx
        .post(&format!("/tasks/{}/create_subtask", id), token, json!({"title": ""}))
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["errors"][0]["field"], "title");

    let missing = Uuid::new_v4();
    let (status, body) = ctx
        .patch(
            &format!("/tasks/{}/update_subtask/{}", id, missing),
            token,
            json!({"completed": true}),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Subtask not found");

    let (status, _) = ctx
        .delete(&format!("/tasks/{}/destroy_subtask/{}", id, missing), token)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_subtask_belongs_to_its_task() {
    let ctx = TestContext::new();
    let user = ctx.register("Jane", "jane@example.com", "secret").await;
    let token = Some(user.token.as_str());

    let first = ctx
        .create_task(&user, json!({"title": "First", "subtasks": [{"title": "a"}]}))
        .await;
    let second = ctx.create_task(&user, json!({"title": "Second"})).await;
    let subtask_id = &subtask_ids(&first)[0];

    let (status, _) = ctx
        .patch(
            &format!(
                "/tasks/{}/update_subtask/{}",
                second["id"].as_str().unwrap(),
                subtask_id
            ),
            token,
            json!({"completed": true}),
        )
        .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_deleting_task_removes_subtasks() {
    let ctx = TestContext::new();
    let user = ctx.register("Jane", "jane@example.com", "secret").await;
    let token = Some(user.token.as_str());

    let task = ctx
        .create_task(
            &user,
            json!({"title": "Doomed", "subtasks": [{"title": "a"}, {"title": "b"}]}),
        )
        .await;
    let id = task["id"].as_str().unwrap();
    let subtask_id = &subtask_ids(&task)[0];

    let (status, _) = ctx.delete(&format!("/tasks/{}", id), token).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = ctx
        .delete(&format!("/tasks/{}/destroy_subtask/{}", id, subtask_id), token)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, list) = ctx.get("/tasks", token).await;
    assert_eq!(list, json!([]));
}
