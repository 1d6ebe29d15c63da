//! Moderation, ban, audit and flag tables.

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::json;

use warden_core::error::{AppError, ErrorKind};
use warden_core::result::AppResult;
use warden_entity::audit::{AuditEntry, CreateAuditEntry};
use warden_entity::ban::UserBan;
use warden_entity::flag::AppFlag;
use warden_entity::moderation::{
    ActorWorkStats, Decision, EtaBucket, ModerationAction, ModerationItem, ModerationStatus,
    RejectReason,
};
use warden_entity::operator::Role;
use warden_entity::profile::Profile;

use super::{MemoryStore, Tables};
use crate::store::{
    AuditStore, BanStore, DecisionRecord, FlagStore, ForceReviewOutcome, ModerationStore,
    StatsWindow,
};

impl Tables {
    fn set_profile_status(
        &mut self,
        user_id: i64,
        status: ModerationStatus,
        approved: bool,
        now: DateTime<Utc>,
    ) {
        let profile = self.profiles.entry(user_id).or_insert_with(|| Profile {
            user_id,
            username: None,
            display_name: None,
            bio: None,
            moderation_status: status,
            approved,
            created_at: now,
            updated_at: now,
        });
        profile.moderation_status = status;
        profile.approved = approved;
        profile.updated_at = now;
    }

    fn insert_item(&mut self, subject_user_id: i64, eta: EtaBucket, now: DateTime<Utc>) -> ModerationItem {
        let item = ModerationItem {
            id: self.next_id(),
            subject_user_id,
            status: ModerationStatus::Pending,
            eta_bucket: eta,
            reason_code: None,
            reason_text: None,
            required_fix_step: None,
            created_at: now,
            locked_by: None,
            locked_at: None,
            locked_until: None,
            decided_at: None,
            updated_at: now,
        };
        self.items.insert(item.id, item.clone());
        item
    }
}

fn in_window(at: DateTime<Utc>, start: DateTime<Utc>, end: DateTime<Utc>) -> bool {
    start <= at && at < end
}

#[async_trait]
impl ModerationStore for MemoryStore {
    async fn enqueue(
        &self,
        subject_user_id: i64,
        eta: EtaBucket,
        now: DateTime<Utc>,
    ) -> AppResult<ModerationItem> {
        Ok(self
            .tables
            .lock()
            .await
            .insert_item(subject_user_id, eta, now))
    }

    async fn acquire_next(
        &self,
        actor_external_id: i64,
        now: DateTime<Utc>,
        lease_until: DateTime<Utc>,
    ) -> AppResult<Option<ModerationItem>> {
        let mut tables = self.tables.lock().await;
        let next = tables
            .items
            .values()
            .filter(|item| item.is_acquirable(now))
            .min_by_key(|item| (item.created_at, item.id))
            .map(|item| item.id);

        Ok(next.and_then(|id| {
            tables.items.get_mut(&id).map(|item| {
                item.locked_by = Some(actor_external_id);
                item.locked_at = Some(now);
                item.locked_until = Some(lease_until);
                item.updated_at = now;
                item.clone()
            })
        }))
    }

    async fn find(&self, id: i64) -> AppResult<Option<ModerationItem>> {
        Ok(self.tables.lock().await.items.get(&id).cloned())
    }

    async fn latest_for_subject(&self, subject_user_id: i64) -> AppResult<Option<ModerationItem>> {
        let tables = self.tables.lock().await;
        Ok(tables
            .items
            .values()
            .filter(|item| item.subject_user_id == subject_user_id)
            .max_by_key(|item| (item.created_at, item.id))
            .cloned())
    }

    async fn decide(
        &self,
        record: &DecisionRecord,
        now: DateTime<Utc>,
    ) -> AppResult<ModerationItem> {
        let mut tables = self.tables.lock().await;
        let (status, approved) = match record.action.decision {
            Decision::Approve => (ModerationStatus::Approved, true),
            Decision::Reject => (ModerationStatus::Rejected, false),
        };

        let item = tables.items.get_mut(&record.item_id).ok_or_else(|| {
            AppError::not_found(format!("Moderation item {} not found", record.item_id))
        })?;
        if item.status != ModerationStatus::Pending {
            return Err(AppError::new(
                ErrorKind::NotPending,
                format!("Moderation item {} was already decided", record.item_id),
            ));
        }
        self.audit_writable()?;

        let duration_sec = item
            .locked_at
            .map(|locked_at| (now - locked_at).num_seconds().max(0));
        item.status = status;
        item.reason_code = record.action.reason_code;
        item.reason_text = record.reason_text.clone();
        item.required_fix_step = record.required_fix_step.clone();
        item.decided_at = Some(now);
        item.updated_at = now;
        item.locked_by = None;
        item.locked_at = None;
        item.locked_until = None;
        let decided = item.clone();

        tables.set_profile_status(decided.subject_user_id, status, approved, now);

        let action = ModerationAction {
            id: tables.next_id(),
            actor_external_id: record.action.actor_external_id,
            actor_role: record.action.actor_role,
            subject_user_id: decided.subject_user_id,
            moderation_item_id: decided.id,
            decision: record.action.decision,
            reason_code: record.action.reason_code,
            duration_sec,
            created_at: now,
        };
        tables.actions.push(action);
        tables.push_audit(
            &record
                .audit
                .with_fields(json!({ "subject": decided.subject_user_id })),
            now,
        );

        Ok(decided)
    }

    async fn force_review(
        &self,
        subject_user_id: i64,
        audit: &CreateAuditEntry,
        now: DateTime<Utc>,
    ) -> AppResult<ForceReviewOutcome> {
        let mut tables = self.tables.lock().await;
        self.audit_writable()?;
        tables.set_profile_status(subject_user_id, ModerationStatus::Pending, false, now);

        let existing = tables
            .items
            .values()
            .filter(|item| {
                item.subject_user_id == subject_user_id && item.status == ModerationStatus::Pending
            })
            .max_by_key(|item| (item.created_at, item.id))
            .map(|item| item.id);

        let reclaimed = existing.and_then(|id| tables.items.get_mut(&id)).map(|item| {
            item.locked_by = None;
            item.locked_at = None;
            item.locked_until = None;
            item.updated_at = now;
            item.clone()
        });
        let outcome = match reclaimed {
            Some(item) => ForceReviewOutcome {
                item,
                created: false,
            },
            None => ForceReviewOutcome {
                item: tables.insert_item(subject_user_id, EtaBucket::UpTo10, now),
                created: true,
            },
        };

        tables.push_audit(
            &audit.with_fields(json!({
                "item_id": outcome.item.id,
                "created": outcome.created,
            })),
            now,
        );
        Ok(outcome)
    }

    async fn pending_count(&self) -> AppResult<i64> {
        let tables = self.tables.lock().await;
        Ok(tables
            .items
            .values()
            .filter(|item| item.status == ModerationStatus::Pending)
            .count() as i64)
    }

    async fn work_stats(&self, window: &StatsWindow) -> AppResult<Vec<ActorWorkStats>> {
        let tables = self.tables.lock().await;
        let mut grouped: BTreeMap<(i64, Role), ActorWorkStats> = BTreeMap::new();

        for action in &tables.actions {
            let row = grouped
                .entry((action.actor_external_id, action.actor_role))
                .or_insert_with(|| ActorWorkStats {
                    actor_external_id: action.actor_external_id,
                    actor_role: action.actor_role,
                    day: 0,
                    week: 0,
                    month: 0,
                    all: 0,
                });
            let at = action.created_at;
            row.day += i64::from(in_window(at, window.day_start, window.day_end));
            row.week += i64::from(in_window(at, window.week_start, window.week_end));
            row.month += i64::from(in_window(at, window.month_start, window.month_end));
            row.all += 1;
        }

        let mut rows: Vec<ActorWorkStats> = grouped.into_values().collect();
        rows.sort_by(|a, b| {
            b.all
                .cmp(&a.all)
                .then(a.actor_external_id.cmp(&b.actor_external_id))
                .then(a.actor_role.cmp(&b.actor_role))
        });
        Ok(rows)
    }

    async fn last_rejection(&self, subject_user_id: i64) -> AppResult<Option<RejectReason>> {
        let tables = self.tables.lock().await;
        Ok(tables
            .items
            .values()
            .filter(|item| {
                item.subject_user_id == subject_user_id
                    && item.status == ModerationStatus::Rejected
            })
            .max_by_key(|item| (item.decided_at, item.id))
            .and_then(|item| item.reason_code))
    }
}

#[async_trait]
impl BanStore for MemoryStore {
    async fn upsert(
        &self,
        subject_user_id: i64,
        banned: bool,
        reason: Option<&str>,
        updated_by: i64,
        audit: &CreateAuditEntry,
        now: DateTime<Utc>,
    ) -> AppResult<UserBan> {
        let mut tables = self.tables.lock().await;
        self.audit_writable()?;
        let ban = UserBan {
            subject_user_id,
            banned,
            reason: reason.map(str::to_string),
            updated_by,
            updated_at: now,
        };
        tables.bans.insert(subject_user_id, ban.clone());
        tables.push_audit(audit, now);
        Ok(ban)
    }

    async fn find(&self, subject_user_id: i64) -> AppResult<Option<UserBan>> {
        Ok(self.tables.lock().await.bans.get(&subject_user_id).cloned())
    }
}

#[async_trait]
impl AuditStore for MemoryStore {
    async fn append(&self, entry: &CreateAuditEntry, now: DateTime<Utc>) -> AppResult<AuditEntry> {
        let mut tables = self.tables.lock().await;
        self.audit_writable()?;
        Ok(tables.push_audit(entry, now))
    }

    async fn recent(&self, limit: i64) -> AppResult<Vec<AuditEntry>> {
        let tables = self.tables.lock().await;
        let limit = usize::try_from(limit).unwrap_or(0);
        Ok(tables.audit.iter().rev().take(limit).cloned().collect())
    }
}

#[async_trait]
impl FlagStore for MemoryStore {
    async fn list(&self) -> AppResult<Vec<AppFlag>> {
        Ok(self.tables.lock().await.flags.values().cloned().collect())
    }

    async fn get(&self, key: &str) -> AppResult<Option<AppFlag>> {
        Ok(self.tables.lock().await.flags.get(key).cloned())
    }

    async fn toggle(
        &self,
        key: &str,
        updated_by: i64,
        audit: &CreateAuditEntry,
        now: DateTime<Utc>,
    ) -> AppResult<AppFlag> {
        let mut tables = self.tables.lock().await;
        self.audit_writable()?;
        let flag = tables
            .flags
            .entry(key.to_string())
            .and_modify(|flag| flag.value_bool = !flag.value_bool)
            .or_insert_with(|| AppFlag {
                key: key.to_string(),
                value_bool: true,
                updated_at: now,
                updated_by: None,
            });
        flag.updated_at = now;
        flag.updated_by = Some(updated_by);
        let flag = flag.clone();
        tables.push_audit(&audit.with_fields(json!({ "value": flag.value_bool })), now);
        Ok(flag)
    }
}
