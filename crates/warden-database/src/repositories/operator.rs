//! Operator repository implementation.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use warden_core::result::AppResult;
use warden_entity::operator::{CreateOperator, FailureOutcome, Operator};

use super::db_err;
use crate::store::OperatorStore;

/// Repository for operator accounts.
#[derive(Debug, Clone)]
pub struct OperatorRepository {
    pool: PgPool,
}

impl OperatorRepository {
    /// Create a new operator repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl OperatorStore for OperatorRepository {
    async fn find_by_id(&self, id: i64) -> AppResult<Option<Operator>> {
        sqlx::query_as::<_, Operator>("SELECT * FROM operators WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err("Failed to find operator"))
    }

    async fn find_by_external_id(&self, external_id: i64) -> AppResult<Option<Operator>> {
        sqlx::query_as::<_, Operator>("SELECT * FROM operators WHERE external_id = $1")
            .bind(external_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err("Failed to find operator by external id"))
    }

    async fn list(&self) -> AppResult<Vec<Operator>> {
        sqlx::query_as::<_, Operator>("SELECT * FROM operators ORDER BY id")
            .fetch_all(&self.pool)
            .await
            .map_err(db_err("Failed to list operators"))
    }

    async fn create(&self, data: &CreateOperator, now: DateTime<Utc>) -> AppResult<Operator> {
        sqlx::query_as::<_, Operator>(
            "INSERT INTO operators \
             (external_id, login_handle, display_name, role, password_hash, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $6) RETURNING *",
        )
        .bind(data.external_id)
        .bind(&data.login_handle)
        .bind(&data.display_name)
        .bind(data.role)
        .bind(&data.password_hash)
        .bind(now)
        .fetch_one(&self.pool)
        .await
        .map_err(db_err("Failed to create operator"))
    }

    async fn register_failure(
        &self,
        id: i64,
        threshold: i32,
        lock_until: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> AppResult<Option<FailureOutcome>> {
        sqlx::query_as::<_, FailureOutcome>(
            "UPDATE operators SET \
                failed_attempts = failed_attempts + 1, \
                locked_until = CASE WHEN failed_attempts + 1 >= $2 THEN $3 ELSE locked_until END, \
                updated_at = $4 \
             WHERE id = $1 \
             RETURNING failed_attempts, locked_until",
        )
        .bind(id)
        .bind(threshold)
        .bind(lock_until)
        .bind(now)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err("Failed to record failed attempt"))
    }

    async fn reset_failures(&self, id: i64, now: DateTime<Utc>) -> AppResult<bool> {
        let result = sqlx::query(
            "UPDATE operators SET failed_attempts = 0, locked_until = NULL, updated_at = $2 \
             WHERE id = $1",
        )
        .bind(id)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(db_err("Failed to reset failed attempts"))?;
        Ok(result.rows_affected() > 0)
    }

    async fn enable_totp(
        &self,
        id: i64,
        sealed_secret: &str,
        now: DateTime<Utc>,
    ) -> AppResult<bool> {
        let result = sqlx::query(
            "UPDATE operators SET totp_secret = $2, totp_enabled = TRUE, updated_at = $3 \
             WHERE id = $1",
        )
        .bind(id)
        .bind(sealed_secret)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(db_err("Failed to enable TOTP"))?;
        Ok(result.rows_affected() > 0)
    }

    async fn replace_totp_secret(
        &self,
        id: i64,
        sealed_secret: &str,
        now: DateTime<Utc>,
    ) -> AppResult<bool> {
        let result =
            sqlx::query("UPDATE operators SET totp_secret = $2, updated_at = $3 WHERE id = $1")
                .bind(id)
                .bind(sealed_secret)
                .bind(now)
                .execute(&self.pool)
                .await
                .map_err(db_err("Failed to replace TOTP secret"))?;
        Ok(result.rows_affected() > 0)
    }

    async fn disable_totp(&self, id: i64, now: DateTime<Utc>) -> AppResult<bool> {
        let result = sqlx::query(
            "UPDATE operators SET totp_secret = NULL, totp_enabled = FALSE, updated_at = $2 \
             WHERE id = $1",
        )
        .bind(id)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(db_err("Failed to disable TOTP"))?;
        Ok(result.rows_affected() > 0)
    }

    async fn set_active(&self, id: i64, active: bool, now: DateTime<Utc>) -> AppResult<bool> {
        let result =
            sqlx::query("UPDATE operators SET is_active = $2, updated_at = $3 WHERE id = $1")
                .bind(id)
                .bind(active)
                .bind(now)
                .execute(&self.pool)
                .await
                .map_err(db_err("Failed to update operator status"))?;
        Ok(result.rows_affected() > 0)
    }
}
