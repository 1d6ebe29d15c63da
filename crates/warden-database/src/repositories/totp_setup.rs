//! TOTP enrollment token repository implementation.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use warden_core::result::AppResult;
use warden_entity::auth::TotpSetupToken;

use super::db_err;
use crate::store::TotpSetupStore;

/// Repository for pending TOTP enrollments.
#[derive(Debug, Clone)]
pub struct TotpSetupRepository {
    pool: PgPool,
}

impl TotpSetupRepository {
    /// Create a new enrollment repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TotpSetupStore for TotpSetupRepository {
    async fn create(
        &self,
        operator_id: i64,
        secret: &str,
        expires_at: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> AppResult<TotpSetupToken> {
        sqlx::query_as::<_, TotpSetupToken>(
            "INSERT INTO totp_setup_tokens (id, operator_id, secret, expires_at, created_at) \
             VALUES ($1, $2, $3, $4, $5) RETURNING *",
        )
        .bind(Uuid::new_v4())
        .bind(operator_id)
        .bind(secret)
        .bind(expires_at)
        .bind(now)
        .fetch_one(&self.pool)
        .await
        .map_err(db_err("Failed to create TOTP setup token"))
    }

    async fn find_active(
        &self,
        id: Uuid,
        now: DateTime<Utc>,
    ) -> AppResult<Option<TotpSetupToken>> {
        sqlx::query_as::<_, TotpSetupToken>(
            "SELECT * FROM totp_setup_tokens WHERE id = $1 AND expires_at > $2",
        )
        .bind(id)
        .bind(now)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err("Failed to load TOTP setup token"))
    }

    async fn consume(&self, id: Uuid, now: DateTime<Utc>) -> AppResult<Option<TotpSetupToken>> {
        sqlx::query_as::<_, TotpSetupToken>(
            "DELETE FROM totp_setup_tokens WHERE id = $1 AND expires_at > $2 RETURNING *",
        )
        .bind(id)
        .bind(now)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err("Failed to consume TOTP setup token"))
    }

    async fn purge_expired(&self, before: DateTime<Utc>) -> AppResult<u64> {
        let result = sqlx::query("DELETE FROM totp_setup_tokens WHERE expires_at <= $1")
            .bind(before)
            .execute(&self.pool)
            .await
            .map_err(db_err("Failed to purge TOTP setup tokens"))?;
        Ok(result.rows_affected())
    }
}
