/// Error handling for the API server
///
/// All handlers return `Result<T, ApiError>`, which converts to an HTTP
/// response with a JSON body:
///
/// ```json
/// { "error": "Task not found", "code": "not_found" }
/// ```
///
/// Validation failures also carry the failing fields:
///
/// ```json
/// {
///   "error": "Validation failed",
///   "code": "validation_error",
///   "errors": [{ "field": "title", "message": "can't be blank" }]
/// }
/// ```

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use monotask_shared::{
    accounts::AccountError,
    repository::TaskError,
    store::StoreError,
    validation::FieldError,
};
use serde::{Deserialize, Serialize};
use std::fmt;

/// API result type alias
pub type ApiResult<T> = Result<T, ApiError>;

/// Unified API error type
#[derive(Debug)]
pub enum ApiError {
    /// Unauthorized (401)
    Unauthorized(String),

    /// Not found (404)
    NotFound(String),

    /// Conflicts with existing data, e.g. duplicate email
    ///
    /// Answered as 422 with code `conflict`, like other rejected submissions.
    Conflict(String),

    /// Unprocessable entity (422)
    ValidationError(Vec<FieldError>),

    /// Internal server error (500); the message is logged, never returned
    InternalError(String),
}

/// Error response format
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Human-readable error message
    pub error: String,

    /// Machine-readable error code
    pub code: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<Vec<FieldError>>,
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::Unauthorized(msg) => write!(f, "Unauthorized: {}", msg),
            ApiError::NotFound(msg) => write!(f, "Not found: {}", msg),
            ApiError::Conflict(msg) => write!(f, "Conflict: {}", msg),
            ApiError::ValidationError(errors) => {
                write!(f, "Validation failed: {} errors", errors.len())
            }
            ApiError::InternalError(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl std::error::Error for ApiError {}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code, message, errors) = match self {
            ApiError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, "unauthorized", msg, None),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, "not_found", msg, None),
            ApiError::Conflict(msg) => (StatusCode::UNPROCESSABLE_ENTITY, "conflict", msg, None),
            ApiError::ValidationError(errors) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "validation_error",
                "Validation failed".to_string(),
                Some(errors),
            ),
            ApiError::InternalError(msg) => {
                // Log internal errors but don't expose details to clients
                tracing::error!(error = %msg, "Internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "An internal error occurred".to_string(),
                    None,
                )
            }
        };

        let body = Json(ErrorResponse {
            error: message,
            code: code.to_string(),
            errors,
        });

        (status, body).into_response()
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        ApiError::InternalError(err.to_string())
    }
}

impl From<TaskError> for ApiError {
    fn from(err: TaskError) -> Self {
        match err {
            TaskError::NotFound(what) => ApiError::NotFound(format!("{} not found", what)),
            TaskError::Validation(errors) => ApiError::ValidationError(errors),
            TaskError::Store(e) => e.into(),
        }
    }
}

impl From<AccountError> for ApiError {
    fn from(err: AccountError) -> Self {
        match err {
            AccountError::Conflict => ApiError::Conflict("User already exists".to_string()),
            AccountError::InvalidCredentials => {
                ApiError::Unauthorized("Invalid email or password".to_string())
            }
            AccountError::Validation(errors) => ApiError::ValidationError(errors),
            AccountError::NotFound => ApiError::NotFound("User not found".to_string()),
            AccountError::Password(e) => {
                ApiError::InternalError(format!("Password operation failed: {}", e))
            }
            AccountError::Store(e) => e.into(),
        }
    }
}

/// Token issuing failures are server-side problems
impl From<monotask_shared::auth::jwt::JwtError> for ApiError {
    fn from(err: monotask_shared::auth::jwt::JwtError) -> Self {
        ApiError::InternalError(format!("Token operation failed: {}", err))
    }
}

/// Request validation failures from `validator`
///
/// Fields are reported in name order so responses are stable.
impl From<validator::ValidationErrors> for ApiError {
    fn from(err: validator::ValidationErrors) -> Self {
        let mut fields: Vec<_> = err.field_errors().into_iter().collect();
        fields.sort_by(|a, b| a.0.cmp(&b.0));

        let errors = fields
            .into_iter()
            .flat_map(|(field, errors)| {
                errors.iter().map(move |error| {
                    FieldError::new(
                        field.to_string(),
                        error
                            .message
                            .as_ref()
                            .map(|m| m.to_string())
                            .unwrap_or_else(|| "is invalid".to_string()),
                    )
                })
            })
            .collect();

        ApiError::ValidationError(errors)
    }
}

/// Malformed JSON bodies are reported as a single body-level field error
impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::ValidationError(vec![FieldError::new("body", rejection.body_text())])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use validator::Validate;

    #[derive(Validate)]
    struct Form {
        #[validate(email(message = "is not a valid email"))]
        email: String,
        #[validate(length(min = 1, message = "can't be blank"))]
        name: String,
    }

    #[test]
    fn test_error_display() {
        let err = ApiError::NotFound("Task not found".to_string());
        assert_eq!(err.to_string(), "Not found: Task not found");

        let err = ApiError::ValidationError(vec![FieldError::blank("title")]);
        assert_eq!(err.to_string(), "Validation failed: 1 errors");
    }

    #[test]
    fn test_status_codes() {
        let cases = [
            (ApiError::Unauthorized("x".into()), StatusCode::UNAUTHORIZED),
            (ApiError::NotFound("x".into()), StatusCode::NOT_FOUND),
            (ApiError::Conflict("x".into()), StatusCode::UNPROCESSABLE_ENTITY),
            (ApiError::ValidationError(vec![]), StatusCode::UNPROCESSABLE_ENTITY),
            (ApiError::InternalError("x".into()), StatusCode::INTERNAL_SERVER_ERROR),
        ];

        for (err, status) in cases {
            assert_eq!(err.into_response().status(), status);
        }
    }

    #[test]
    fn test_account_errors_map() {
        assert!(matches!(
            ApiError::from(AccountError::Conflict),
            ApiError::Conflict(msg) if msg == "User already exists"
        ));
        assert!(matches!(
            ApiError::from(AccountError::InvalidCredentials),
            ApiError::Unauthorized(msg) if msg == "Invalid email or password"
        ));
        assert!(matches!(
            ApiError::from(AccountError::Store(StoreError::Database("down".into()))),
            ApiError::InternalError(_)
        ));
    }

    #[test]
    fn test_task_errors_map() {
        let err: ApiError = TaskError::NotFound("Subtask".to_string()).into();
        assert!(matches!(err, ApiError::NotFound(msg) if msg == "Subtask not found"));
    }

    #[test]
    fn test_validator_errors_are_sorted_field_errors() {
        let form = Form {
            email: "nope".to_string(),
            name: String::new(),
        };
        let err: ApiError = form.validate().unwrap_err().into();

        let ApiError::ValidationError(errors) = err else {
            panic!("expected validation error");
        };
        assert_eq!(
            errors,
            vec![
                FieldError::new("email", "is not a valid email"),
                FieldError::blank("name"),
            ]
        );
    }
}
