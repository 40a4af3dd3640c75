/// API route handlers
///
/// Handlers are grouped by resource. Access control is not decided here: the
/// gate in [`crate::middleware::auth`] has already run for every request.

pub mod auth;
pub mod health;
pub mod tasks;
