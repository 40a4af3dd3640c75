/// Database migration runner
///
/// Migrations live in `monotask-shared/migrations/` and are embedded into the
/// binary at compile time with `sqlx::migrate!`.
///
/// # Example
///
/// ```no_run
/// use monotask_shared::db::pool::{create_pool, DatabaseConfig};
/// use monotask_shared::db::migrations::{run_migrations, get_migration_status};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let pool = create_pool(DatabaseConfig::from_url(std::env::var("DATABASE_URL")?)).await?;
///
///     run_migrations(&pool).await?;
///
///     let status = get_migration_status(&pool).await?;
///     assert!(status.is_up_to_date);
///     Ok(())
/// }
/// ```

use sqlx::migrate::Migrator;
use sqlx::postgres::PgPool;
use tracing::{debug, info, warn};

static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

/// Migration status information
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationStatus {
    /// Number of successfully applied migrations
    pub applied_migrations: usize,

    /// Number of migrations embedded in this build
    pub known_migrations: usize,

    /// Latest applied migration version
    pub latest_version: Option<i64>,

    /// Whether every embedded migration has been applied
    pub is_up_to_date: bool,
}

/// Runs all pending migrations
///
/// # Errors
///
/// Returns an error if a migration fails; that migration is rolled back.
pub async fn run_migrations(pool: &PgPool) -> Result<(), sqlx::migrate::MigrateError> {
    info!(
        known_migrations = MIGRATOR.iter().count(),
        "Running database migrations"
    );

    match MIGRATOR.run(pool).await {
        Ok(()) => {
            info!("Database migrations completed");
            Ok(())
        }
        Err(e) => {
            warn!(error = %e, "Migration failed");
            Err(e)
        }
    }
}

/// Reports how many migrations are applied versus embedded
pub async fn get_migration_status(pool: &PgPool) -> Result<MigrationStatus, sqlx::Error> {
    let known_migrations = MIGRATOR.iter().filter(|m| m.migration_type.is_up_migration()).count();

    let table_exists: bool = sqlx::query_scalar(
        "SELECT EXISTS (
            SELECT FROM information_schema.tables
            WHERE table_schema = 'public'
            AND table_name = '_sqlx_migrations'
        )",
    )
    .fetch_one(pool)
    .await?;

    if !table_exists {
        debug!("Migrations table does not exist yet");
        return Ok(MigrationStatus {
            applied_migrations: 0,
            known_migrations,
            latest_version: None,
            is_up_to_date: known_migrations == 0,
        });
    }

    let (count, latest_version): (i64, Option<i64>) = sqlx::query_as(
        "SELECT COUNT(*), MAX(version) FROM _sqlx_migrations WHERE success = true",
    )
    .fetch_one(pool)
    .await?;

    let applied_migrations = usize::try_from(count).unwrap_or_default();

    debug!(
        applied_migrations,
        known_migrations,
        latest_version = ?latest_version,
        "Migration status retrieved"
    );

    Ok(MigrationStatus {
        applied_migrations,
        known_migrations,
        latest_version,
        is_up_to_date: applied_migrations >= known_migrations,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_migrations_are_embedded() {
        let versions: Vec<i64> = MIGRATOR.iter().map(|m| m.version).collect();
        assert_eq!(versions.len(), 3);

        let mut sorted = versions.clone();
        sorted.sort_unstable();
        assert_eq!(versions, sorted);
    }
}
