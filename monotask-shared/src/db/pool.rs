/// PostgreSQL connection pool
///
/// # Example
///
/// ```no_run
/// use monotask_shared::db::pool::{create_pool, DatabaseConfig};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let pool = create_pool(DatabaseConfig::from_url(std::env::var("DATABASE_URL")?)).await?;
///
///     let row: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM tasks")
///         .fetch_one(&pool)
///         .await?;
///
///     println!("{} tasks", row.0);
///     Ok(())
/// }
/// ```

use sqlx::postgres::{PgPool, PgPoolOptions};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Connection pool settings
///
/// Timeouts are in seconds so they can come straight from environment variables.
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    /// PostgreSQL connection URL
    pub url: String,

    /// Maximum number of pooled connections
    pub max_connections: u32,

    /// Idle connections kept warm
    pub min_connections: u32,

    /// How long to wait for a free connection
    pub connect_timeout_seconds: u64,

    /// Close connections idle for longer than this (None = never)
    pub idle_timeout_seconds: Option<u64>,

    /// Recycle connections older than this (None = never)
    pub max_lifetime_seconds: Option<u64>,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            max_connections: 10,
            min_connections: 1,
            connect_timeout_seconds: 30,
            idle_timeout_seconds: Some(600),
            max_lifetime_seconds: Some(1800),
        }
    }
}

impl DatabaseConfig {
    /// Default settings for the given URL
    pub fn from_url(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Default::default()
        }
    }
}

/// Creates a pool and verifies the database answers
///
/// # Errors
///
/// Returns an error if the URL is invalid, the server is unreachable, or the
/// health check fails.
pub async fn create_pool(config: DatabaseConfig) -> Result<PgPool, sqlx::Error> {
    info!(
        max_connections = config.max_connections,
        min_connections = config.min_connections,
        "Creating database connection pool"
    );

    let mut options = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .acquire_timeout(Duration::from_secs(config.connect_timeout_seconds));

    if let Some(idle_timeout) = config.idle_timeout_seconds {
        options = options.idle_timeout(Duration::from_secs(idle_timeout));
    }
    if let Some(max_lifetime) = config.max_lifetime_seconds {
        options = options.max_lifetime(Duration::from_secs(max_lifetime));
    }

    let pool = options.connect(&config.url).await?;
    health_check(&pool).await?;

    info!("Database connection pool ready");
    Ok(pool)
}

/// Runs `SELECT 1` against the pool
pub async fn health_check(pool: &PgPool) -> Result<(), sqlx::Error> {
    let (value,): (i32,) = sqlx::query_as("SELECT 1").fetch_one(pool).await?;

    if value == 1 {
        debug!("Database health check passed");
        Ok(())
    } else {
        warn!(value, "Database health check returned unexpected value");
        Err(sqlx::Error::Protocol(
            "Health check returned unexpected value".into(),
        ))
    }
}

/// Closes all connections; call during shutdown
pub async fn close_pool(pool: PgPool) {
    info!("Closing database connection pool");
    pool.close().await;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_database_config_default() {
        let config = DatabaseConfig::default();
        assert_eq!(config.max_connections, 10);
        assert_eq!(config.min_connections, 1);
        assert_eq!(config.idle_timeout_seconds, Some(600));
        assert!(config.url.is_empty());
    }

    #[test]
    fn test_database_config_from_url() {
        let config = DatabaseConfig::from_url("postgresql://localhost/monotask");
        assert_eq!(config.url, "postgresql://localhost/monotask");
        assert_eq!(config.connect_timeout_seconds, 30);
    }
}
