//! Embedded schema migrations.

use sqlx::PgPool;
use sqlx::migrate::Migrator;
use tracing::info;

use warden_core::error::{AppError, ErrorKind};

static MIGRATOR: Migrator = sqlx::migrate!("../../migrations");

/// Apply every embedded migration that the database has not seen yet.
pub async fn run_migrations(pool: &PgPool) -> Result<(), AppError> {
    info!(embedded = MIGRATOR.iter().count(), "Applying schema migrations");

    MIGRATOR
        .run(pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Schema migration failed", e))?;

    info!("Schema is up to date");
    Ok(())
}
