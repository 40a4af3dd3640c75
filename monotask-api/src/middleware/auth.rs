/// Route access table and authentication gate
///
/// Every endpoint the server exposes is listed in [`Endpoint`] together with
/// its access level. The gate runs before dispatch:
///
/// 1. Resolve the caller's identity from an optional `Authorization: Bearer`
///    header (failures mean anonymous, never an error)
/// 2. Store it in a request-scoped [`RequestContext`]
/// 3. Reject anonymous requests to protected endpoints with 401
///
/// Requests that match no endpoint are treated as protected.
///
/// # Example
///
/// ```no_run
/// use monotask_api::middleware::auth::CurrentUser;
///
/// async fn handler(CurrentUser(user): CurrentUser) -> String {
///     format!("Hello, {}!", user.name)
/// }
/// ```

use axum::{
    async_trait,
    extract::{FromRequestParts, MatchedPath, Request, State},
    http::{header, request::Parts, HeaderMap, Method},
    middleware::Next,
    response::Response,
};
use monotask_shared::models::user::User;
use tracing::debug;

use crate::{app::AppState, error::ApiError};

/// Who may call an endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    /// Anyone, identity optional
    Public,
    /// Authenticated users only
    Protected,
}

/// Every endpoint of the API
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint {
    Health,
    Register,
    Login,
    Me,
    UpdateAvatar,
    ListTasks,
    CreateTask,
    ShowTask,
    UpdateTask,
    DeleteTask,
    CreateSubtask,
    UpdateSubtask,
    DestroySubtask,
}

impl Endpoint {
    pub const ALL: [Endpoint; 13] = [
        Endpoint::Health,
        Endpoint::Register,
        Endpoint::Login,
        Endpoint::Me,
        Endpoint::UpdateAvatar,
        Endpoint::ListTasks,
        Endpoint::CreateTask,
        Endpoint::ShowTask,
        Endpoint::UpdateTask,
        Endpoint::DeleteTask,
        Endpoint::CreateSubtask,
        Endpoint::UpdateSubtask,
        Endpoint::DestroySubtask,
    ];

    pub fn method(&self) -> Method {
        match self {
            Endpoint::Health | Endpoint::Me | Endpoint::ListTasks | Endpoint::ShowTask => {
                Method::GET
            }
            Endpoint::Register | Endpoint::Login | Endpoint::CreateTask | Endpoint::CreateSubtask => {
                Method::POST
            }
            Endpoint::UpdateAvatar | Endpoint::UpdateTask | Endpoint::UpdateSubtask => {
                Method::PATCH
            }
            Endpoint::DeleteTask | Endpoint::DestroySubtask => Method::DELETE,
        }
    }

    /// Route template as registered with the router
    pub fn path(&self) -> &'static str {
        match self {
            Endpoint::Health => "/health",
            Endpoint::Register => "/auth/register",
            Endpoint::Login => "/auth/login",
            Endpoint::Me => "/auth/me",
            Endpoint::UpdateAvatar => "/auth/avatar",
            Endpoint::ListTasks | Endpoint::CreateTask => "/tasks",
            Endpoint::ShowTask | Endpoint::UpdateTask | Endpoint::DeleteTask => "/tasks/:id",
            Endpoint::CreateSubtask => "/tasks/:id/create_subtask",
            Endpoint::UpdateSubtask => "/tasks/:id/update_subtask/:subtask_id",
            Endpoint::DestroySubtask => "/tasks/:id/destroy_subtask/:subtask_id",
        }
    }

    pub fn access(&self) -> Access {
        match self {
            Endpoint::Health | Endpoint::Register | Endpoint::Login | Endpoint::Me => Access::Public,
            _ => Access::Protected,
        }
    }

    /// Finds the endpoint for a method and route template
    pub fn resolve(method: &Method, path: &str) -> Option<Endpoint> {
        Self::ALL
            .into_iter()
            .find(|e| e.method() == *method && e.path() == path)
    }
}

/// Identity resolved for the current request
#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    pub user: Option<User>,
}

impl RequestContext {
    pub fn current_user(&self) -> Option<&User> {
        self.user.as_ref()
    }
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

/// Authentication gate middleware
///
/// Applied to the whole router so that it also sees requests no route matched.
pub async fn auth_gate(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let endpoint = req
        .extensions()
        .get::<MatchedPath>()
        .and_then(|path| Endpoint::resolve(req.method(), path.as_str()));
    let access = endpoint.map_or(Access::Protected, |e| e.access());

    let user = match bearer_token(req.headers()) {
        Some(token) => state.tokens.authenticate(token, state.users.as_ref()).await,
        None => None,
    };

    if access == Access::Protected && user.is_none() {
        debug!(
            method = %req.method(),
            uri = %req.uri(),
            endpoint = ?endpoint,
            "Rejected anonymous request"
        );
        return Err(ApiError::Unauthorized("Not authenticated".to_string()));
    }

    req.extensions_mut().insert(RequestContext { user });

    Ok(next.run(req).await)
}

/// The request's resolved identity; anonymous if the gate did not run
#[async_trait]
impl<S> FromRequestParts<S> for RequestContext
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(parts
            .extensions
            .get::<RequestContext>()
            .cloned()
            .unwrap_or_default())
    }
}

/// Extractor for handlers that require an authenticated user
pub struct CurrentUser(pub User);

#[async_trait]
impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<RequestContext>()
            .and_then(|ctx| ctx.user.clone())
            .map(CurrentUser)
            .ok_or_else(|| ApiError::Unauthorized("Not authenticated".to_string()))
    }
}
