//! Moderation queue repository implementation.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::json;
use sqlx::PgPool;

use warden_core::error::{AppError, ErrorKind};
use warden_core::result::AppResult;
use warden_entity::audit::CreateAuditEntry;
use warden_entity::moderation::{
    ActorWorkStats, Decision, EtaBucket, ModerationItem, ModerationStatus, RejectReason,
};

use super::audit::insert_entry;
use super::db_err;
use crate::store::{DecisionRecord, ForceReviewOutcome, ModerationStore, StatsWindow};

/// Repository for moderation items and the moderation action log.
#[derive(Debug, Clone)]
pub struct ModerationRepository {
    pool: PgPool,
}

impl ModerationRepository {
    /// Create a new moderation repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ModerationStore for ModerationRepository {
    async fn enqueue(
        &self,
        subject_user_id: i64,
        eta: EtaBucket,
        now: DateTime<Utc>,
    ) -> AppResult<ModerationItem> {
        sqlx::query_as::<_, ModerationItem>(
            "INSERT INTO moderation_items (subject_user_id, status, eta_bucket, created_at, updated_at) \
             VALUES ($1, 'PENDING', $2, $3, $3) RETURNING *",
        )
        .bind(subject_user_id)
        .bind(eta)
        .bind(now)
        .fetch_one(&self.pool)
        .await
        .map_err(db_err("Failed to enqueue moderation item"))
    }

    async fn acquire_next(
        &self,
        actor_external_id: i64,
        now: DateTime<Utc>,
        lease_until: DateTime<Utc>,
    ) -> AppResult<Option<ModerationItem>> {
        sqlx::query_as::<_, ModerationItem>(
            "UPDATE moderation_items \
             SET locked_by = $1, locked_at = $2, locked_until = $3, updated_at = $2 \
             WHERE id = ( \
                SELECT id FROM moderation_items \
                WHERE status = 'PENDING' AND (locked_until IS NULL OR locked_until < $2) \
                ORDER BY created_at ASC, id ASC \
                LIMIT 1 \
                FOR UPDATE SKIP LOCKED \
             ) RETURNING *",
        )
        .bind(actor_external_id)
        .bind(now)
        .bind(lease_until)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err("Failed to acquire moderation item"))
    }

    async fn find(&self, id: i64) -> AppResult<Option<ModerationItem>> {
        sqlx::query_as::<_, ModerationItem>("SELECT * FROM moderation_items WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err("Failed to find moderation item"))
    }

    async fn latest_for_subject(&self, subject_user_id: i64) -> AppResult<Option<ModerationItem>> {
        sqlx::query_as::<_, ModerationItem>(
            "SELECT * FROM moderation_items WHERE subject_user_id = $1 \
             ORDER BY created_at DESC, id DESC LIMIT 1",
        )
        .bind(subject_user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err("Failed to find latest moderation item"))
    }

    async fn decide(
        &self,
        record: &DecisionRecord,
        now: DateTime<Utc>,
    ) -> AppResult<ModerationItem> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(db_err("Failed to begin decision transaction"))?;

        let current = sqlx::query_as::<_, ModerationItem>(
            "SELECT * FROM moderation_items WHERE id = $1 FOR UPDATE",
        )
        .bind(record.item_id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(db_err("Failed to lock moderation item"))?
        .ok_or_else(|| AppError::not_found(format!("Moderation item {} not found", record.item_id)))?;

        if current.status != ModerationStatus::Pending {
            return Err(not_pending(record.item_id));
        }

        let (status, approved) = match record.action.decision {
            Decision::Approve => (ModerationStatus::Approved, true),
            Decision::Reject => (ModerationStatus::Rejected, false),
        };

        let decided = sqlx::query_as::<_, ModerationItem>(
            "UPDATE moderation_items SET \
                status = $2, reason_code = $3, reason_text = $4, required_fix_step = $5, \
                decided_at = $6, updated_at = $6, \
                locked_by = NULL, locked_at = NULL, locked_until = NULL \
             WHERE id = $1 AND status = 'PENDING' \
             RETURNING *",
        )
        .bind(record.item_id)
        .bind(status)
        .bind(record.action.reason_code)
        .bind(&record.reason_text)
        .bind(&record.required_fix_step)
        .bind(now)
        .fetch_optional(&mut *tx)
        .await
        .map_err(db_err("Failed to decide moderation item"))?
        .ok_or_else(|| not_pending(record.item_id))?;

        sqlx::query(
            "INSERT INTO profiles (user_id, moderation_status, approved, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $4) \
             ON CONFLICT (user_id) DO UPDATE SET \
                moderation_status = EXCLUDED.moderation_status, \
                approved = EXCLUDED.approved, \
                updated_at = EXCLUDED.updated_at",
        )
        .bind(decided.subject_user_id)
        .bind(status)
        .bind(approved)
        .bind(now)
        .execute(&mut *tx)
        .await
        .map_err(db_err("Failed to update profile moderation status"))?;

        let duration_sec = current
            .locked_at
            .map(|locked_at| (now - locked_at).num_seconds().max(0));

        sqlx::query(
            "INSERT INTO moderation_actions \
             (actor_external_id, actor_role, subject_user_id, moderation_item_id, decision, \
              reason_code, duration_sec, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)",
        )
        .bind(record.action.actor_external_id)
        .bind(record.action.actor_role)
        .bind(decided.subject_user_id)
        .bind(decided.id)
        .bind(record.action.decision)
        .bind(record.action.reason_code)
        .bind(duration_sec)
        .bind(now)
        .execute(&mut *tx)
        .await
        .map_err(db_err("Failed to record moderation action"))?;

        let audit = record
            .audit
            .with_fields(json!({ "subject": decided.subject_user_id }));
        insert_entry(&mut *tx, &audit, now).await?;

        tx.commit()
            .await
            .map_err(db_err("Failed to commit decision"))?;

        Ok(decided)
    }

    async fn force_review(
        &self,
        subject_user_id: i64,
        audit: &CreateAuditEntry,
        now: DateTime<Utc>,
    ) -> AppResult<ForceReviewOutcome> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(db_err("Failed to begin force-review transaction"))?;

        sqlx::query("SELECT pg_advisory_xact_lock($1)")
            .bind(subject_user_id)
            .execute(&mut *tx)
            .await
            .map_err(db_err("Failed to lock subject"))?;

        sqlx::query(
            "INSERT INTO profiles (user_id, moderation_status, approved, created_at, updated_at) \
             VALUES ($1, 'PENDING', FALSE, $2, $2) \
             ON CONFLICT (user_id) DO UPDATE SET \
                moderation_status = 'PENDING', approved = FALSE, updated_at = EXCLUDED.updated_at",
        )
        .bind(subject_user_id)
        .bind(now)
        .execute(&mut *tx)
        .await
        .map_err(db_err("Failed to reset profile"))?;

        let existing = sqlx::query_as::<_, ModerationItem>(
            "SELECT * FROM moderation_items \
             WHERE subject_user_id = $1 AND status = 'PENDING' \
             ORDER BY created_at DESC, id DESC LIMIT 1 FOR UPDATE",
        )
        .bind(subject_user_id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(db_err("Failed to find pending item"))?;

        let outcome = match existing {
            Some(item) => {
                let item = sqlx::query_as::<_, ModerationItem>(
                    "UPDATE moderation_items \
                     SET locked_by = NULL, locked_at = NULL, locked_until = NULL, updated_at = $2 \
                     WHERE id = $1 RETURNING *",
                )
                .bind(item.id)
                .bind(now)
                .fetch_one(&mut *tx)
                .await
                .map_err(db_err("Failed to release pending item"))?;
                ForceReviewOutcome {
                    item,
                    created: false,
                }
            }
            None => {
                let item = sqlx::query_as::<_, ModerationItem>(
                    "INSERT INTO moderation_items \
                     (subject_user_id, status, eta_bucket, created_at, updated_at) \
                     VALUES ($1, 'PENDING', $2, $3, $3) RETURNING *",
                )
                .bind(subject_user_id)
                .bind(EtaBucket::UpTo10)
                .bind(now)
                .fetch_one(&mut *tx)
                .await
                .map_err(db_err("Failed to insert pending item"))?;
                ForceReviewOutcome {
                    item,
                    created: true,
                }
            }
        };

        let audit = audit.with_fields(json!({
            "item_id": outcome.item.id,
            "created": outcome.created,
        }));
        insert_entry(&mut *tx, &audit, now).await?;

        tx.commit()
            .await
            .map_err(db_err("Failed to commit force review"))?;

        Ok(outcome)
    }

    async fn pending_count(&self) -> AppResult<i64> {
        sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM moderation_items WHERE status = 'PENDING'",
        )
        .fetch_one(&self.pool)
        .await
        .map_err(db_err("Failed to count pending items"))
    }

    async fn work_stats(&self, window: &StatsWindow) -> AppResult<Vec<ActorWorkStats>> {
        sqlx::query_as::<_, ActorWorkStats>(
            "SELECT actor_external_id, actor_role, \
                COUNT(*) FILTER (WHERE created_at >= $1 AND created_at < $2) AS day, \
                COUNT(*) FILTER (WHERE created_at >= $3 AND created_at < $4) AS week, \
                COUNT(*) FILTER (WHERE created_at >= $5 AND created_at < $6) AS month, \
                COUNT(*) AS \"all\" \
             FROM moderation_actions \
             GROUP BY actor_external_id, actor_role \
             ORDER BY \"all\" DESC, actor_external_id ASC, actor_role ASC",
        )
        .bind(window.day_start)
        .bind(window.day_end)
        .bind(window.week_start)
        .bind(window.week_end)
        .bind(window.month_start)
        .bind(window.month_end)
        .fetch_all(&self.pool)
        .await
        .map_err(db_err("Failed to aggregate work stats"))
    }

    async fn last_rejection(&self, subject_user_id: i64) -> AppResult<Option<RejectReason>> {
        let reason = sqlx::query_scalar::<_, Option<RejectReason>>(
            "SELECT reason_code FROM moderation_items \
             WHERE subject_user_id = $1 AND status = 'REJECTED' \
             ORDER BY decided_at DESC NULLS LAST, id DESC LIMIT 1",
        )
        .bind(subject_user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err("Failed to load last rejection"))?;
        Ok(reason.flatten())
    }
}

fn not_pending(item_id: i64) -> AppError {
    AppError::new(
        ErrorKind::NotPending,
        format!("Moderation item {item_id} was already decided"),
    )
}
