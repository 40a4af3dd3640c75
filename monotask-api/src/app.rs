/// Application state and router builder
///
/// This module defines the shared application state and provides
/// a function to build the Axum router with all routes and middleware.
///
/// # Example
///
/// ```no_run
/// use monotask_api::{app::{build_router, AppState}, config::Config};
///
/// # async fn example() -> anyhow::Result<()> {
/// let config = Config::for_memory("a-secret-of-at-least-thirty-two-bytes");
/// let state = AppState::in_memory(config);
/// let app = build_router(state);
///
/// let listener = tokio::net::TcpListener::bind("127.0.0.1:8080").await?;
/// axum::serve(listener, app).await?;
/// # Ok(())
/// # }
/// ```

use crate::{
    config::Config,
    error::ApiError,
    middleware::auth::{auth_gate, Endpoint},
    routes,
};
use axum::{
    http::{header, HeaderValue, Method},
    routing::{get, patch, post},
    Router,
};
use monotask_shared::{
    accounts::AccountService,
    auth::jwt::TokenService,
    repository::TaskRepository,
    store::{MemoryStore, PgStore, TaskStore, UserStore},
};
use sqlx::PgPool;
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::{
    compression::CompressionLayer,
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

/// Shared application state
///
/// Cloned for each request via Axum's `State` extractor; every field is
/// cheap to clone.
#[derive(Clone)]
pub struct AppState {
    /// User lookups for the auth gate
    pub users: Arc<dyn UserStore>,

    pub accounts: AccountService,

    pub tasks: TaskRepository,

    pub tokens: TokenService,

    /// Application configuration
    pub config: Arc<Config>,
}

impl AppState {
    /// State backed by PostgreSQL
    pub fn postgres(pool: PgPool, config: Config) -> Self {
        let store = Arc::new(PgStore::new(pool));
        Self::with_store(store.clone(), store, config)
    }

    /// State backed by a fresh in-memory store
    pub fn in_memory(config: Config) -> Self {
        let store = Arc::new(MemoryStore::new());
        Self::with_store(store.clone(), store, config)
    }

    /// State over arbitrary store implementations
    pub fn with_store(
        users: Arc<dyn UserStore>,
        tasks: Arc<dyn TaskStore>,
        config: Config,
    ) -> Self {
        let tokens = TokenService::new(&config.jwt.secret)
            .with_lifetime(chrono::Duration::hours(config.jwt.ttl_hours));

        Self {
            accounts: AccountService::new(users.clone()),
            tasks: TaskRepository::new(tasks),
            users,
            tokens,
            config: Arc::new(config),
        }
    }
}

/// Builds the complete Axum router with all routes and middleware
///
/// # Architecture
///
/// ```text
/// /
/// ├── GET    /health                                   (public)
/// ├── /auth/
/// │   ├── POST   /register                             (public)
/// │   ├── POST   /login                                (public)
/// │   ├── GET    /me                                   (public, identity optional)
/// │   └── PATCH  /avatar
/// └── /tasks
///     ├── GET    /
///     ├── POST   /
///     ├── GET    /:id
///     ├── PATCH  /:id
///     ├── DELETE /:id
///     ├── POST   /:id/create_subtask
///     ├── PATCH  /:id/update_subtask/:subtask_id
///     └── DELETE /:id/destroy_subtask/:subtask_id
/// ```
///
/// Route templates come from [`Endpoint::path`] so the router and the access
/// table cannot drift apart.
///
/// # Middleware Stack
///
/// Outermost first:
/// 1. Logging (tower-http TraceLayer)
/// 2. Response compression
/// 3. CORS (tower-http CorsLayer)
/// 4. Authentication gate (every route and the fallback)
pub fn build_router(state: AppState) -> Router {
    let cors = if state.config.api.cors_origins.iter().any(|o| o == "*") {
        // Development mode: permissive CORS
        CorsLayer::permissive()
    } else {
        let origins: Vec<HeaderValue> = state
            .config
            .api
            .cors_origins
            .iter()
            .filter_map(|origin| origin.parse().ok())
            .collect();

        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods([
                Method::GET,
                Method::POST,
                Method::PATCH,
                Method::DELETE,
                Method::OPTIONS,
            ])
            .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
            .allow_credentials(true)
            .max_age(std::time::Duration::from_secs(3600))
    };

    Router::new()
        .route(Endpoint::Health.path(), get(routes::health::health_check))
        .route(Endpoint::Register.path(), post(routes::auth::register))
        .route(Endpoint::Login.path(), post(routes::auth::login))
        .route(Endpoint::Me.path(), get(routes::auth::me))
        .route(Endpoint::UpdateAvatar.path(), patch(routes::auth::update_avatar))
        .route(
            Endpoint::ListTasks.path(),
            get(routes::tasks::list_tasks).post(routes::tasks::create_task),
        )
        .route(
            Endpoint::ShowTask.path(),
            get(routes::tasks::show_task)
                .patch(routes::tasks::update_task)
                .delete(routes::tasks::delete_task),
        )
        .route(
            Endpoint::CreateSubtask.path(),
            post(routes::tasks::create_subtask),
        )
        .route(
            Endpoint::UpdateSubtask.path(),
            patch(routes::tasks::update_subtask),
        )
        .route(
            Endpoint::DestroySubtask.path(),
            axum::routing::delete(routes::tasks::destroy_subtask),
        )
        .fallback(route_not_found)
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            auth_gate,
        ))
        .layer(
            ServiceBuilder::new()
                .layer(
                    TraceLayer::new_for_http()
                        .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                        .on_response(DefaultOnResponse::new().level(Level::INFO)),
                )
                .layer(CompressionLayer::new())
                .layer(cors),
        )
        .with_state(state)
}

async fn route_not_found() -> ApiError {
    ApiError::NotFound("Route not found".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "test-secret-key-at-least-32-bytes-long";

    #[test]
    fn test_token_lifetime_follows_config() {
        let mut config = Config::for_memory(SECRET);
        config.jwt.ttl_hours = 2;

        let state = AppState::in_memory(config);
        assert_eq!(state.tokens.lifetime(), chrono::Duration::hours(2));
    }

    #[test]
    fn test_router_builds() {
        // Panics on conflicting or malformed route templates
        let _router = build_router(AppState::in_memory(Config::for_memory(SECRET)));
    }
}
