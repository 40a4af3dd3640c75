/// Field-level validation errors
///
/// Validation failures are never fatal: every validator in this crate collects
/// all failing fields into a `Vec<FieldError>` so callers can report them
/// together.

use serde::{Deserialize, Serialize};

/// A single failing field with a human-readable message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    /// Field that failed validation
    pub field: String,

    /// Error message
    pub message: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }

    /// The standard error for a required field that is missing or blank
    pub fn blank(field: impl Into<String>) -> Self {
        Self::new(field, "can't be blank")
    }
}

/// Longest title the schema stores (`VARCHAR(255)`), in characters
pub const MAX_TITLE_LEN: usize = 255;

/// Returns true if the value is missing or contains only whitespace
pub fn is_blank(value: Option<&str>) -> bool {
    value.map_or(true, |v| v.trim().is_empty())
}

/// Checks a title field
///
/// A missing title fails only when `required`. A present title must not be
/// blank and must fit in [`MAX_TITLE_LEN`] characters once trimmed.
pub fn check_title(field: &str, value: Option<&str>, required: bool) -> Option<FieldError> {
    match value {
        None if !required => None,
        _ if is_blank(value) => Some(FieldError::blank(field)),
        Some(v) if v.trim().chars().count() > MAX_TITLE_LEN => Some(FieldError::new(
            field,
            format!("is too long (maximum is {} characters)", MAX_TITLE_LEN),
        )),
        _ => None,
    }
}
