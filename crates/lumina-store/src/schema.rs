//! Database schema bootstrap.

use sqlx::PgPool;
use sqlx::migrate::{MigrateError, Migrator};
use tracing::info;

/// Migrations embedded from the workspace `migrations/` directory.
pub static MIGRATOR: Migrator = sqlx::migrate!("../../migrations");

/// Applies any pending migrations.
///
/// # Errors
///
/// Returns `MigrateError` if a migration fails or the recorded history
/// disagrees with the embedded files.
pub async fn run_migrations(pool: &PgPool) -> Result<(), MigrateError> {
    MIGRATOR.run(pool).await?;
    info!(migrations = MIGRATOR.iter().count(), "database schema is up to date");
    Ok(())
}
