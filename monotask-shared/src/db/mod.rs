/// Database layer for MonoTask
///
/// # Modules
///
/// - `pool`: PostgreSQL connection pool with health checks
/// - `migrations`: Embedded migration runner
///
/// Queries live next to the models in [`crate::models`].

pub mod migrations;
pub mod pool;
