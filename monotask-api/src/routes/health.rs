/// Health check endpoint
///
/// # Endpoint
///
/// ```text
/// GET /health
/// ```
///
/// # Response
///
/// ```json
/// {
///   "status": "healthy",
///   "version": "0.1.0",
///   "database": "connected"
/// }
/// ```

use crate::{app::AppState, config::StorageBackend, error::ApiResult};
use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Health check response
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    /// `healthy` or `degraded`
    pub status: String,

    /// Application version
    pub version: String,

    /// `connected`, `disconnected` or `memory`
    pub database: String,
}

/// Reports service health, including store connectivity
pub async fn health_check(State(state): State<AppState>) -> ApiResult<Json<HealthResponse>> {
    let database_status = match state.tasks.ping().await {
        Ok(()) if state.config.storage == StorageBackend::Memory => "memory",
        Ok(()) => "connected",
        Err(e) => {
            warn!(error = %e, "Health check: store unreachable");
            "disconnected"
        }
    };

    Ok(Json(HealthResponse {
        status: if database_status == "disconnected" {
            "degraded".to_string()
        } else {
            "healthy".to_string()
        },
        version: env!("CARGO_PKG_VERSION").to_string(),
        database: database_status.to_string(),
    }))
}
