//! User ban repository implementation.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use warden_core::result::AppResult;
use warden_entity::audit::CreateAuditEntry;
use warden_entity::ban::UserBan;

use super::audit::insert_entry;
use super::db_err;
use crate::store::BanStore;

/// Repository for user bans.
#[derive(Debug, Clone)]
pub struct BanRepository {
    pool: PgPool,
}

impl BanRepository {
    /// Create a new ban repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl BanStore for BanRepository {
    async fn upsert(
        &self,
        subject_user_id: i64,
        banned: bool,
        reason: Option<&str>,
        updated_by: i64,
        audit: &CreateAuditEntry,
        now: DateTime<Utc>,
    ) -> AppResult<UserBan> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(db_err("Failed to begin ban transaction"))?;

        let ban = sqlx::query_as::<_, UserBan>(
            "INSERT INTO user_bans (subject_user_id, banned, reason, updated_by, updated_at) \
             VALUES ($1, $2, $3, $4, $5) \
             ON CONFLICT (subject_user_id) DO UPDATE SET \
                banned = EXCLUDED.banned, reason = EXCLUDED.reason, \
                updated_by = EXCLUDED.updated_by, updated_at = EXCLUDED.updated_at \
             RETURNING *",
        )
        .bind(subject_user_id)
        .bind(banned)
        .bind(reason)
        .bind(updated_by)
        .bind(now)
        .fetch_one(&mut *tx)
        .await
        .map_err(db_err("Failed to upsert ban"))?;

        insert_entry(&mut *tx, audit, now).await?;
        tx.commit()
            .await
            .map_err(db_err("Failed to commit ban"))?;
        Ok(ban)
    }

    async fn find(&self, subject_user_id: i64) -> AppResult<Option<UserBan>> {
        sqlx::query_as::<_, UserBan>("SELECT * FROM user_bans WHERE subject_user_id = $1")
            .bind(subject_user_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err("Failed to find ban"))
    }
}
