//! Feature flag repository implementation.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::json;
use sqlx::PgPool;

use warden_core::result::AppResult;
use warden_entity::audit::CreateAuditEntry;
use warden_entity::flag::AppFlag;

use super::audit::insert_entry;
use super::db_err;
use crate::store::FlagStore;

/// Repository for feature flags.
#[derive(Debug, Clone)]
pub struct FlagRepository {
    pool: PgPool,
}

impl FlagRepository {
    /// Create a new flag repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl FlagStore for FlagRepository {
    async fn list(&self) -> AppResult<Vec<AppFlag>> {
        sqlx::query_as::<_, AppFlag>("SELECT * FROM app_flags ORDER BY key")
            .fetch_all(&self.pool)
            .await
            .map_err(db_err("Failed to list flags"))
    }

    async fn get(&self, key: &str) -> AppResult<Option<AppFlag>> {
        sqlx::query_as::<_, AppFlag>("SELECT * FROM app_flags WHERE key = $1")
            .bind(key)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err("Failed to load flag"))
    }

    async fn toggle(
        &self,
        key: &str,
        updated_by: i64,
        audit: &CreateAuditEntry,
        now: DateTime<Utc>,
    ) -> AppResult<AppFlag> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(db_err("Failed to begin toggle transaction"))?;

        let flag = sqlx::query_as::<_, AppFlag>(
            "INSERT INTO app_flags (key, value_bool, updated_at, updated_by) \
             VALUES ($1, TRUE, $2, $3) \
             ON CONFLICT (key) DO UPDATE SET \
                value_bool = NOT app_flags.value_bool, \
                updated_at = EXCLUDED.updated_at, \
                updated_by = EXCLUDED.updated_by \
             RETURNING *",
        )
        .bind(key)
        .bind(now)
        .bind(updated_by)
        .fetch_one(&mut *tx)
        .await
        .map_err(db_err("Failed to toggle flag"))?;

        let audit = audit.with_fields(json!({ "value": flag.value_bool }));
        insert_entry(&mut *tx, &audit, now).await?;
        tx.commit()
            .await
            .map_err(db_err("Failed to commit toggle"))?;
        Ok(flag)
    }
}
