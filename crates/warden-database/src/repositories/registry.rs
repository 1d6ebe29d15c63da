//! Bot contact registry and role assignment repository.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use warden_core::result::AppResult;
use warden_entity::audit::CreateAuditEntry;
use warden_entity::bot_user::{BotUser, BotUserTouch, RoleAssignment, StaffMember};
use warden_entity::operator::Role;

use super::audit::insert_entry;
use super::db_err;
use crate::store::RegistryStore;

/// Repository for `bot_users` and `role_assignments`.
#[derive(Debug, Clone)]
pub struct RegistryRepository {
    pool: PgPool,
}

impl RegistryRepository {
    /// Create a new registry repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RegistryStore for RegistryRepository {
    async fn touch(&self, user: &BotUserTouch, now: DateTime<Utc>) -> AppResult<BotUser> {
        sqlx::query_as::<_, BotUser>(
            "INSERT INTO bot_users \
             (external_id, username, first_name, last_name, first_seen_at, last_seen_at) \
             VALUES ($1, $2, $3, $4, $5, $5) \
             ON CONFLICT (external_id) DO UPDATE SET \
                username = EXCLUDED.username, first_name = EXCLUDED.first_name, \
                last_name = EXCLUDED.last_name, last_seen_at = EXCLUDED.last_seen_at \
             RETURNING *",
        )
        .bind(user.external_id)
        .bind(&user.username)
        .bind(&user.first_name)
        .bind(&user.last_name)
        .bind(now)
        .fetch_one(&self.pool)
        .await
        .map_err(db_err("Failed to touch bot user"))
    }

    async fn find_by_username(&self, username: &str) -> AppResult<Option<BotUser>> {
        sqlx::query_as::<_, BotUser>(
            "SELECT * FROM bot_users WHERE LOWER(username) = LOWER($1) \
             ORDER BY last_seen_at DESC LIMIT 1",
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err("Failed to find bot user"))
    }

    async fn active_role(&self, external_id: i64) -> AppResult<Option<Role>> {
        sqlx::query_scalar::<_, Role>(
            "SELECT role FROM role_assignments WHERE external_id = $1 AND revoked_at IS NULL",
        )
        .bind(external_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err("Failed to resolve role"))
    }

    async fn grant(
        &self,
        external_id: i64,
        role: Role,
        granted_by: i64,
        audit: &CreateAuditEntry,
        now: DateTime<Utc>,
    ) -> AppResult<RoleAssignment> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(db_err("Failed to begin grant transaction"))?;

        sqlx::query(
            "UPDATE role_assignments SET revoked_at = $3, revoked_by = $2 \
             WHERE external_id = $1 AND revoked_at IS NULL",
        )
        .bind(external_id)
        .bind(granted_by)
        .bind(now)
        .execute(&mut *tx)
        .await
        .map_err(db_err("Failed to supersede role"))?;

        let assignment = sqlx::query_as::<_, RoleAssignment>(
            "INSERT INTO role_assignments (external_id, role, granted_by, granted_at) \
             VALUES ($1, $2, $3, $4) RETURNING *",
        )
        .bind(external_id)
        .bind(role)
        .bind(granted_by)
        .bind(now)
        .fetch_one(&mut *tx)
        .await
        .map_err(db_err("Failed to grant role"))?;

        insert_entry(&mut *tx, audit, now).await?;

        tx.commit()
            .await
            .map_err(db_err("Failed to commit grant"))?;
        Ok(assignment)
    }

    async fn revoke(
        &self,
        external_id: i64,
        role: Role,
        revoked_by: i64,
        audit: &CreateAuditEntry,
        now: DateTime<Utc>,
    ) -> AppResult<bool> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(db_err("Failed to begin revoke transaction"))?;

        let result = sqlx::query(
            "UPDATE role_assignments SET revoked_at = $4, revoked_by = $3 \
             WHERE external_id = $1 AND role = $2 AND revoked_at IS NULL",
        )
        .bind(external_id)
        .bind(role)
        .bind(revoked_by)
        .bind(now)
        .execute(&mut *tx)
        .await
        .map_err(db_err("Failed to revoke role"))?;
        if result.rows_affected() == 0 {
            return Ok(false);
        }

        insert_entry(&mut *tx, audit, now).await?;
        tx.commit()
            .await
            .map_err(db_err("Failed to commit revoke"))?;
        Ok(true)
    }

    async fn list_staff(&self) -> AppResult<Vec<StaffMember>> {
        sqlx::query_as::<_, StaffMember>(
            "SELECT r.external_id, r.role, u.username, r.granted_at \
             FROM role_assignments r \
             LEFT JOIN bot_users u ON u.external_id = r.external_id \
             WHERE r.revoked_at IS NULL \
             ORDER BY r.role ASC, r.external_id ASC",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(db_err("Failed to list staff"))
    }
}
