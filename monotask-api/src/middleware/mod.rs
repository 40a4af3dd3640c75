/// Middleware modules for the API server
///
/// - `auth`: Route access table, identity resolution and the 401 gate

pub mod auth;
