//! # MonoTask API Server
//!
//! Serves the MonoTask task tracker: bearer-token authentication, tasks with
//! checklist subtasks, and task statuses derived from subtask completion.
//!
//! ## Usage
//!
//! ```bash
//! JWT_SECRET=... DATABASE_URL=postgres://... cargo run -p monotask-api
//! STORAGE_BACKEND=memory SEED_DEMO_DATA=true JWT_SECRET=... cargo run -p monotask-api
//! ```

use anyhow::Context;
use monotask_api::{
    app::{build_router, AppState},
    config::{Config, LogFormat, StorageBackend},
};
use monotask_shared::{
    db::{
        migrations::run_migrations,
        pool::{close_pool, create_pool, DatabaseConfig},
    },
    seed::seed_demo_data,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn init_tracing(format: LogFormat) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        "monotask_api=debug,monotask_shared=debug,tower_http=debug".into()
    });

    let registry = tracing_subscriber::registry().with(filter);
    match format {
        LogFormat::Json => registry.with(tracing_subscriber::fmt::layer().json()).init(),
        LogFormat::Pretty => registry.with(tracing_subscriber::fmt::layer()).init(),
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
    }
    tracing::info!("Shutdown signal received");
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env().context("Failed to load configuration")?;
    init_tracing(config.log_format);

    tracing::info!(
        "MonoTask API Server v{} starting...",
        env!("CARGO_PKG_VERSION")
    );

    let (state, pool) = match (config.storage, config.database.clone()) {
        (StorageBackend::Postgres, Some(db)) => {
            let pool = create_pool(DatabaseConfig {
                max_connections: db.max_connections,
                ..DatabaseConfig::from_url(db.url)
            })
            .await
            .context("Failed to connect to database")?;

            run_migrations(&pool)
                .await
                .context("Failed to run database migrations")?;

            (AppState::postgres(pool.clone(), config.clone()), Some(pool))
        }
        (StorageBackend::Postgres, None) => {
            anyhow::bail!("DATABASE_URL is required for postgres storage")
        }
        (StorageBackend::Memory, _) => {
            tracing::warn!("Using in-memory storage; data is lost on restart");
            (AppState::in_memory(config.clone()), None)
        }
    };

    if config.seed_demo_data {
        let report = seed_demo_data(&state.accounts, &state.tasks)
            .await
            .context("Failed to seed demo data")?;
        tracing::info!(
            users_created = report.users_created,
            tasks_created = report.tasks_created,
            "Demo data seeded"
        );
    }

    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(config.bind_address())
        .await
        .with_context(|| format!("Failed to bind {}", config.bind_address()))?;
    tracing::info!("Server listening on http://{}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    if let Some(pool) = pool {
        close_pool(pool).await;
    }

    tracing::info!("Server stopped");
    Ok(())
}
