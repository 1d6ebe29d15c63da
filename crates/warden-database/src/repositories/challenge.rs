//! Login challenge repository implementation.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use warden_core::result::AppResult;
use warden_entity::auth::{ChallengeStatus, CreateChallenge, LoginChallenge};

use super::db_err;
use crate::store::ChallengeStore;

/// Repository for login challenges.
#[derive(Debug, Clone)]
pub struct ChallengeRepository {
    pool: PgPool,
}

impl ChallengeRepository {
    /// Create a new challenge repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ChallengeStore for ChallengeRepository {
    async fn create(
        &self,
        data: &CreateChallenge,
        now: DateTime<Utc>,
    ) -> AppResult<LoginChallenge> {
        sqlx::query_as::<_, LoginChallenge>(
            "INSERT INTO login_challenges \
             (id, operator_id, status, expires_at, ip, user_agent, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $7) RETURNING *",
        )
        .bind(Uuid::new_v4())
        .bind(data.operator_id)
        .bind(ChallengeStatus::TelegramVerified)
        .bind(data.expires_at)
        .bind(&data.ip)
        .bind(&data.user_agent)
        .bind(now)
        .fetch_one(&self.pool)
        .await
        .map_err(db_err("Failed to create login challenge"))
    }

    async fn find_active(
        &self,
        id: Uuid,
        now: DateTime<Utc>,
    ) -> AppResult<Option<LoginChallenge>> {
        sqlx::query_as::<_, LoginChallenge>(
            "SELECT * FROM login_challenges WHERE id = $1 AND expires_at > $2",
        )
        .bind(id)
        .bind(now)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err("Failed to load login challenge"))
    }

    async fn advance(
        &self,
        id: Uuid,
        from: ChallengeStatus,
        to: ChallengeStatus,
        now: DateTime<Utc>,
    ) -> AppResult<bool> {
        let result = sqlx::query(
            "UPDATE login_challenges SET status = $3, updated_at = $4 \
             WHERE id = $1 AND status = $2 AND expires_at > $4",
        )
        .bind(id)
        .bind(from)
        .bind(to)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(db_err("Failed to advance login challenge"))?;
        Ok(result.rows_affected() == 1)
    }

    async fn expire(&self, id: Uuid, now: DateTime<Utc>) -> AppResult<()> {
        sqlx::query(
            "UPDATE login_challenges SET expires_at = $2, updated_at = $2 \
             WHERE id = $1 AND expires_at > $2",
        )
        .bind(id)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(db_err("Failed to expire login challenge"))?;
        Ok(())
    }

    async fn purge_expired(&self, before: DateTime<Utc>) -> AppResult<u64> {
        let result = sqlx::query("DELETE FROM login_challenges WHERE expires_at <= $1")
            .bind(before)
            .execute(&self.pool)
            .await
            .map_err(db_err("Failed to purge login challenges"))?;
        Ok(result.rows_affected())
    }
}
