//! Database migration command.

use warden_core::config::DatabaseBackend;
use warden_core::error::AppError;
use warden_database::DatabasePool;

use crate::output;

/// Apply every pending migration
pub async fn execute(config_path: Option<&str>) -> Result<(), AppError> {
    let config = super::load_config(config_path)?;
    if config.database.backend == DatabaseBackend::Memory {
        return Err(AppError::configuration(
            "database.backend is \"memory\"; migrations need PostgreSQL",
        ));
    }

    let pool = DatabasePool::connect(&config.database).await?;
    println!("Running database migrations...");
    warden_database::migration::run_migrations(pool.pool()).await?;
    pool.close().await;
    output::print_success("All migrations applied.");
    Ok(())
}
