/// Authentication endpoints
///
/// # Endpoints
///
/// - `POST /auth/register` - Create an account and get a token
/// - `POST /auth/login` - Exchange credentials for a token
/// - `GET /auth/me` - Current user, or null when anonymous
/// - `PATCH /auth/avatar` - Pick one of the preset avatars

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    middleware::auth::{CurrentUser, RequestContext},
};
use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    Json,
};
use monotask_shared::{models::user::UserView, validation::FieldError};
use serde::{Deserialize, Serialize};
use tracing::info;
use validator::Validate;

/// Register request
#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    /// Display name
    #[serde(default)]
    #[validate(length(min = 1, max = 100, message = "must be between 1 and 100 characters"))]
    pub name: String,

    #[serde(default)]
    #[validate(email(message = "is not a valid email"))]
    pub email: String,

    /// Argon2 accepts any length; the cap keeps hashing cost bounded
    #[serde(default)]
    #[validate(length(min = 1, max = 72, message = "must be between 1 and 72 characters"))]
    pub password: String,
}

/// Login request
///
/// Deliberately not format-validated: every failure is the same 401.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: String,

    #[serde(default)]
    pub password: String,
}

/// Avatar update request
#[derive(Debug, Deserialize)]
pub struct AvatarRequest {
    /// 1-based index into the avatar set
    #[serde(rename = "avatarIndex", alias = "avatar_index")]
    pub avatar_index: Option<i64>,
}

/// Register and login response
#[derive(Debug, Serialize, Deserialize)]
pub struct AuthResponse {
    pub user: UserView,

    /// Bearer token
    pub token: String,
}

/// Current user response
#[derive(Debug, Serialize, Deserialize)]
pub struct UserResponse {
    pub user: Option<UserView>,
}

/// Registers a new user
///
/// # Endpoint
///
/// ```text
/// POST /auth/register
/// Content-Type: application/json
///
/// {
///   "name": "Jane Doe",
///   "email": "jane@example.com",
///   "password": "secret"
/// }
/// ```
///
/// # Errors
///
/// - `422 Unprocessable Entity`: Invalid fields
/// - `422 Unprocessable Entity`: Email already exists (code `conflict`)
pub async fn register(
    State(state): State<AppState>,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<AuthResponse>)> {
    let Json(req) = payload?;
    req.validate()?;

    let user = state
        .accounts
        .register(&req.name, &req.email, &req.password)
        .await?;
    let token = state.tokens.issue(user.id, &user.email)?;

    Ok((
        StatusCode::CREATED,
        Json(AuthResponse {
            user: user.view(),
            token,
        }),
    ))
}

/// Exchanges credentials for a token
///
/// # Errors
///
/// - `401 Unauthorized`: Unknown email or wrong password (same response)
pub async fn login(
    State(state): State<AppState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> ApiResult<Json<AuthResponse>> {
    let Json(req) = payload?;

    let user = state.accounts.login(&req.email, &req.password).await?;
    let token = state.tokens.issue(user.id, &user.email)?;

    info!(user_id = %user.id, "User logged in");

    Ok(Json(AuthResponse {
        user: user.view(),
        token,
    }))
}

/// Returns the caller's user, or `{"user": null}` when anonymous
pub async fn me(ctx: RequestContext) -> Json<UserResponse> {
    Json(UserResponse {
        user: ctx.current_user().map(|u| u.view()),
    })
}

/// Sets the caller's avatar
///
/// # Errors
///
/// - `422 Unprocessable Entity`: Index missing or outside 1..=35
pub async fn update_avatar(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    payload: Result<Json<AvatarRequest>, JsonRejection>,
) -> ApiResult<Json<UserResponse>> {
    let Json(req) = payload?;
    let index = req
        .avatar_index
        .ok_or_else(|| ApiError::ValidationError(vec![FieldError::blank("avatarIndex")]))?;

    let user = state.accounts.update_avatar(user.id, index).await?;

    Ok(Json(UserResponse {
        user: Some(user.view()),
    }))
}
