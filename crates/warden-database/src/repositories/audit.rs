//! Audit log repository implementation.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgExecutor, PgPool};

use warden_core::result::AppResult;
use warden_entity::audit::{AuditEntry, CreateAuditEntry};

use super::db_err;
use crate::store::AuditStore;

/// Repository for the append-only audit log.
#[derive(Debug, Clone)]
pub struct AuditRepository {
    pool: PgPool,
}

impl AuditRepository {
    /// Create a new audit repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AuditStore for AuditRepository {
    async fn append(&self, entry: &CreateAuditEntry, now: DateTime<Utc>) -> AppResult<AuditEntry> {
        insert_entry(&self.pool, entry, now).await
    }

    async fn recent(&self, limit: i64) -> AppResult<Vec<AuditEntry>> {
        sqlx::query_as::<_, AuditEntry>(
            "SELECT * FROM audit_log ORDER BY created_at DESC, id DESC LIMIT $1",
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(db_err("Failed to list audit entries"))
    }
}

/// Append `entry` on `executor`, which is the open transaction of the
/// mutation being audited.
pub(crate) async fn insert_entry<'e, E>(
    executor: E,
    entry: &CreateAuditEntry,
    now: DateTime<Utc>,
) -> AppResult<AuditEntry>
where
    E: PgExecutor<'e>,
{
    sqlx::query_as::<_, AuditEntry>(
        "INSERT INTO audit_log (actor_external_id, action, payload, created_at) \
         VALUES ($1, $2, $3, $4) RETURNING *",
    )
    .bind(entry.actor_external_id)
    .bind(entry.action)
    .bind(&entry.payload)
    .bind(now)
    .fetch_one(executor)
    .await
    .map_err(db_err("Failed to append audit entry"))
}
