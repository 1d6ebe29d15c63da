//! Session repository implementation.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use warden_core::result::AppResult;
use warden_entity::auth::{CreateSession, Session};

use super::db_err;
use crate::store::SessionStore;

/// Repository for server-side sessions.
#[derive(Debug, Clone)]
pub struct SessionRepository {
    pool: PgPool,
}

impl SessionRepository {
    /// Create a new session repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SessionStore for SessionRepository {
    async fn create(&self, data: &CreateSession) -> AppResult<Session> {
        sqlx::query_as::<_, Session>(
            "INSERT INTO sessions \
             (id, operator_id, created_at, last_seen_at, idle_expires_at, max_expires_at, ip, user_agent) \
             VALUES ($1, $2, $3, $3, $4, $5, $6, $7) RETURNING *",
        )
        .bind(Uuid::new_v4())
        .bind(data.operator_id)
        .bind(data.now)
        .bind(data.idle_expires_at)
        .bind(data.max_expires_at)
        .bind(&data.ip)
        .bind(&data.user_agent)
        .fetch_one(&self.pool)
        .await
        .map_err(db_err("Failed to create session"))
    }

    async fn find(&self, id: Uuid) -> AppResult<Option<Session>> {
        sqlx::query_as::<_, Session>("SELECT * FROM sessions WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err("Failed to find session"))
    }

    async fn touch(
        &self,
        id: Uuid,
        operator_id: i64,
        now: DateTime<Utc>,
        idle_expires_at: DateTime<Utc>,
    ) -> AppResult<Option<Session>> {
        sqlx::query_as::<_, Session>(
            "UPDATE sessions SET last_seen_at = $3, idle_expires_at = $4 \
             WHERE id = $1 AND operator_id = $2 AND revoked_at IS NULL \
               AND $3 < max_expires_at AND $3 < idle_expires_at \
             RETURNING *",
        )
        .bind(id)
        .bind(operator_id)
        .bind(now)
        .bind(idle_expires_at)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err("Failed to touch session"))
    }

    async fn revoke(&self, id: Uuid, operator_id: i64, now: DateTime<Utc>) -> AppResult<bool> {
        let result = sqlx::query(
            "UPDATE sessions SET revoked_at = $3 \
             WHERE id = $1 AND operator_id = $2 AND revoked_at IS NULL \
               AND $3 < max_expires_at AND $3 < idle_expires_at",
        )
        .bind(id)
        .bind(operator_id)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(db_err("Failed to revoke session"))?;
        Ok(result.rows_affected() == 1)
    }

    async fn purge_expired(&self, before: DateTime<Utc>) -> AppResult<u64> {
        let result = sqlx::query(
            "DELETE FROM sessions \
             WHERE max_expires_at <= $1 OR idle_expires_at <= $1 OR revoked_at <= $1",
        )
        .bind(before)
        .execute(&self.pool)
        .await
        .map_err(db_err("Failed to purge sessions"))?;
        Ok(result.rows_affected())
    }
}
