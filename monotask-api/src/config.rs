/// Configuration management for the API server
///
/// Configuration comes from environment variables, with a `.env` file loaded
/// first in development.
///
/// # Environment Variables
///
/// - `API_HOST`: Host to bind to (default: 0.0.0.0)
/// - `API_PORT`: Port to bind to (default: 8080)
/// - `CORS_ORIGINS`: Comma-separated allowed origins (default: `*`)
/// - `STORAGE_BACKEND`: `postgres` or `memory` (default: postgres)
/// - `DATABASE_URL`: PostgreSQL connection string (required for postgres)
/// - `DATABASE_MAX_CONNECTIONS`: Pool size (default: 10)
/// - `JWT_SECRET`: Token signing secret, at least 32 characters (required)
/// - `JWT_TTL_HOURS`: Token lifetime (default: 24)
/// - `SEED_DEMO_DATA`: Create demo accounts and tasks at startup (default: false)
/// - `LOG_FORMAT`: `pretty` or `json` (default: pretty)
/// - `RUST_LOG`: Log filter
///
/// # Example
///
/// ```no_run
/// use monotask_api::config::Config;
///
/// # fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// println!("Server will listen on {}", config.bind_address());
/// # Ok(())
/// # }
/// ```

use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::env;

/// Minimum length of the token signing secret
pub const MIN_JWT_SECRET_LEN: usize = 32;

/// Complete application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub api: ApiConfig,

    /// Where users and tasks are persisted
    pub storage: StorageBackend,

    /// Present when `storage` is postgres
    pub database: Option<DatabaseConfig>,

    pub jwt: JwtConfig,

    /// Seed demo accounts and tasks at startup
    pub seed_demo_data: bool,

    pub log_format: LogFormat,
}

/// API server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    pub host: String,

    pub port: u16,

    /// Allowed CORS origins; `*` allows any
    pub cors_origins: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    Postgres,
    /// Process-local, lost on restart
    Memory,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Pretty,
    Json,
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// PostgreSQL connection URL
    pub url: String,

    /// Maximum number of connections in pool
    pub max_connections: u32,
}

/// JWT configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JwtConfig {
    /// Secret key for JWT signing
    ///
    /// Generate with: `openssl rand -hex 32`
    #[serde(skip_serializing)]
    pub secret: String,

    /// Token lifetime in hours
    pub ttl_hours: i64,
}

fn parse_bool(name: &str, value: Option<String>) -> anyhow::Result<bool> {
    match value.as_deref().map(str::trim) {
        None | Some("") => Ok(false),
        Some(v) if v.eq_ignore_ascii_case("true") || v == "1" => Ok(true),
        Some(v) if v.eq_ignore_ascii_case("false") || v == "0" => Ok(false),
        Some(v) => anyhow::bail!("{} must be true or false, got '{}'", name, v),
    }
}

impl Config {
    /// Loads configuration from environment variables
    ///
    /// # Errors
    ///
    /// Returns an error if a required variable is missing or a value is invalid.
    pub fn from_env() -> anyhow::Result<Self> {
        // Load .env file if present (for development)
        dotenvy::dotenv().ok();

        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Builds configuration from an arbitrary variable source
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let host = lookup("API_HOST").unwrap_or_else(|| "0.0.0.0".to_string());
        let port = lookup("API_PORT")
            .unwrap_or_else(|| "8080".to_string())
            .parse::<u16>()
            .context("API_PORT must be a port number")?;

        let cors_origins = lookup("CORS_ORIGINS")
            .unwrap_or_else(|| "*".to_string())
            .split(',')
            .map(|origin| origin.trim().to_string())
            .filter(|origin| !origin.is_empty())
            .collect();

        let storage = match lookup("STORAGE_BACKEND").as_deref().map(str::trim) {
            None | Some("") | Some("postgres") => StorageBackend::Postgres,
            Some("memory") => StorageBackend::Memory,
            Some(other) => anyhow::bail!("STORAGE_BACKEND must be postgres or memory, got '{}'", other),
        };

        let database = match storage {
            StorageBackend::Postgres => {
                let url = lookup("DATABASE_URL")
                    .ok_or_else(|| anyhow::anyhow!("DATABASE_URL environment variable is required"))?;
                let max_connections = lookup("DATABASE_MAX_CONNECTIONS")
                    .unwrap_or_else(|| "10".to_string())
                    .parse::<u32>()
                    .context("DATABASE_MAX_CONNECTIONS must be a number")?;
                Some(DatabaseConfig { url, max_connections })
            }
            StorageBackend::Memory => None,
        };

        let secret = lookup("JWT_SECRET")
            .ok_or_else(|| anyhow::anyhow!("JWT_SECRET environment variable is required"))?;
        if secret.len() < MIN_JWT_SECRET_LEN {
            anyhow::bail!("JWT_SECRET must be at least {} characters long", MIN_JWT_SECRET_LEN);
        }
        let ttl_hours = lookup("JWT_TTL_HOURS")
            .unwrap_or_else(|| "24".to_string())
            .parse::<i64>()
            .context("JWT_TTL_HOURS must be a number")?;
        if ttl_hours <= 0 {
            anyhow::bail!("JWT_TTL_HOURS must be positive");
        }

        let seed_demo_data = parse_bool("SEED_DEMO_DATA", lookup("SEED_DEMO_DATA"))?;
        let log_format = match lookup("LOG_FORMAT").as_deref() {
            Some(v) if v.eq_ignore_ascii_case("json") => LogFormat::Json,
            _ => LogFormat::Pretty,
        };

        Ok(Self {
            api: ApiConfig {
                host,
                port,
                cors_origins,
            },
            storage,
            database,
            jwt: JwtConfig { secret, ttl_hours },
            seed_demo_data,
            log_format,
        })
    }

    /// Configuration for tests and local runs: in-memory storage, no seeding
    pub fn for_memory(jwt_secret: impl Into<String>) -> Self {
        Self {
            api: ApiConfig {
                host: "127.0.0.1".to_string(),
                port: 0,
                cors_origins: vec!["*".to_string()],
            },
            storage: StorageBackend::Memory,
            database: None,
            jwt: JwtConfig {
                secret: jwt_secret.into(),
                ttl_hours: 24,
            },
            seed_demo_data: false,
            log_format: LogFormat::Pretty,
        }
    }

    /// Returns the server bind address
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.api.host, self.api.port)
    }
}
