/// Common test utilities for integration tests
///
/// Every test gets a router over a fresh in-memory store, so tests are
/// independent and need no external services.

use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use monotask_api::app::{build_router, AppState};
use monotask_api::config::Config;
use serde_json::{json, Value};
use tower::Service as _;

pub const JWT_SECRET: &str = "integration-test-secret-at-least-32-bytes";

/// Test context containing the router and its state
pub struct TestContext {
    pub app: axum::Router,
    pub state: AppState,
}

/// A registered user and their token
pub struct TestUser {
    pub id: String,
    pub email: String,
    pub token: String,
}

impl TestContext {
    pub fn new() -> Self {
        let state = AppState::in_memory(Config::for_memory(JWT_SECRET));
        let app = build_router(state.clone());

        Self { app, state }
    }

    /// Sends a request and returns the status and parsed JSON body
    ///
    /// Empty bodies come back as `Value::Null`.
    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }

        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.app.clone().call(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();

        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or_else(|_| {
                panic!("non-JSON body ({}): {}", status, String::from_utf8_lossy(&bytes))
            })
        };

        (status, json)
    }

    pub async fn get(&self, uri: &str, token: Option<&str>) -> (StatusCode, Value) {
        self.request(Method::GET, uri, token, None).await
    }

    pub async fn post(&self, uri: &str, token: Option<&str>, body: Value) -> (StatusCode, Value) {
        self.request(Method::POST, uri, token, Some(body)).await
    }

    pub async fn patch(&self, uri: &str, token: Option<&str>, body: Value) -> (StatusCode, Value) {
        self.request(Method::PATCH, uri, token, Some(body)).await
    }

    pub async fn delete(&self, uri: &str, token: Option<&str>) -> (StatusCode, Value) {
        self.request(Method::DELETE, uri, token, None).await
    }

    /// Registers a user through the API
    pub async fn register(&self, name: &str, email: &str, password: &str) -> TestUser {
        let (status, body) = self
            .post(
                "/auth/register",
                None,
                json!({ "name": name, "email": email, "password": password }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "register failed: {}", body);

        TestUser {
            id: body["user"]["id"].as_str().unwrap().to_string(),
            email: body["user"]["email"].as_str().unwrap().to_string(),
            token: body["token"].as_str().unwrap().to_string(),
        }
    }

    /// Creates a task as `user` and returns its JSON
    pub async fn create_task(&self, user: &TestUser, body: Value) -> Value {
        let (status, task) = self.post("/tasks", Some(&user.token), body).await;
        assert_eq!(status, StatusCode::CREATED, "create task failed: {}", task);
        task
    }
}

/// Ids of a task's subtasks in order
pub fn subtask_ids(task: &Value) -> Vec<String> {
    task["subtasks"]
        .as_array()
        .unwrap()
        .iter()
        .map(|s| s["id"].as_str().unwrap().to_string())
        .collect()
}
