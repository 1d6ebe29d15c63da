//! Per-table store capabilities.
//!
//! Each trait covers one logical table. Every operation that depends on the
//! current time takes `now` explicitly so that TTL and lease predicates are
//! evaluated against the caller's clock, never the database's.
//!
//! Staff mutations carry their `CreateAuditEntry`; the store appends it in
//! the same transaction as the change, so a mutation is visible if and only if
//! its audit row is.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use warden_core::result::AppResult;
use warden_entity::audit::{AuditEntry, CreateAuditEntry};
use warden_entity::auth::{
    ChallengeStatus, CreateChallenge, CreateSession, LoginChallenge, Session, TotpSetupToken,
};
use warden_entity::ban::UserBan;
use warden_entity::bot_user::{BotUser, BotUserTouch, RoleAssignment, StaffMember};
use warden_entity::flag::AppFlag;
use warden_entity::moderation::{
    ActorWorkStats, EtaBucket, ModerationItem, NewModerationAction, RejectReason,
};
use warden_entity::operator::{CreateOperator, FailureOutcome, Operator, Role};
use warden_entity::profile::{MediaKind, MediaRef, Profile, ProfileCounts};

/// Operator accounts.
#[async_trait]
pub trait OperatorStore: Send + Sync {
    /// Find by numeric id.
    async fn find_by_id(&self, id: i64) -> AppResult<Option<Operator>>;

    /// Find by Telegram id.
    async fn find_by_external_id(&self, external_id: i64) -> AppResult<Option<Operator>>;

    /// All operators ordered by id.
    async fn list(&self) -> AppResult<Vec<Operator>>;

    /// Provision a new operator.
    async fn create(&self, data: &CreateOperator, now: DateTime<Utc>) -> AppResult<Operator>;

    /// Atomically increment the failure counter and, when the post-increment
    /// value reaches `threshold`, install `lock_until`.
    ///
    /// Returns `None` if the operator row no longer exists.
    async fn register_failure(
        &self,
        id: i64,
        threshold: i32,
        lock_until: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> AppResult<Option<FailureOutcome>>;

    /// Clear the failure counter and any lockout.
    async fn reset_failures(&self, id: i64, now: DateTime<Utc>) -> AppResult<bool>;

    /// Store a sealed secret and mark TOTP enabled. False if the row vanished.
    async fn enable_totp(&self, id: i64, sealed_secret: &str, now: DateTime<Utc>)
    -> AppResult<bool>;

    /// Replace the stored secret without touching the enabled flag.
    async fn replace_totp_secret(
        &self,
        id: i64,
        sealed_secret: &str,
        now: DateTime<Utc>,
    ) -> AppResult<bool>;

    /// Drop the secret and disable TOTP.
    async fn disable_totp(&self, id: i64, now: DateTime<Utc>) -> AppResult<bool>;

    /// Activate or deactivate.
    async fn set_active(&self, id: i64, active: bool, now: DateTime<Utc>) -> AppResult<bool>;
}

/// Login challenges.
#[async_trait]
pub trait ChallengeStore: Send + Sync {
    /// Open a challenge at `TelegramVerified`.
    async fn create(&self, data: &CreateChallenge, now: DateTime<Utc>)
    -> AppResult<LoginChallenge>;

    /// Load a challenge only if `now < expires_at`.
    async fn find_active(&self, id: Uuid, now: DateTime<Utc>) -> AppResult<Option<LoginChallenge>>;

    /// Move `from -> to` only if the row is still at `from` and unexpired.
    async fn advance(
        &self,
        id: Uuid,
        from: ChallengeStatus,
        to: ChallengeStatus,
        now: DateTime<Utc>,
    ) -> AppResult<bool>;

    /// Force expiry at `now`.
    async fn expire(&self, id: Uuid, now: DateTime<Utc>) -> AppResult<()>;

    /// Delete challenges that expired before `before`.
    async fn purge_expired(&self, before: DateTime<Utc>) -> AppResult<u64>;
}

/// TOTP enrollment tokens.
#[async_trait]
pub trait TotpSetupStore: Send + Sync {
    /// Persist a new token.
    async fn create(
        &self,
        operator_id: i64,
        secret: &str,
        expires_at: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> AppResult<TotpSetupToken>;

    /// Load a token only if unexpired.
    async fn find_active(&self, id: Uuid, now: DateTime<Utc>) -> AppResult<Option<TotpSetupToken>>;

    /// Delete and return an unexpired token. At most one caller receives it.
    async fn consume(&self, id: Uuid, now: DateTime<Utc>) -> AppResult<Option<TotpSetupToken>>;

    /// Delete tokens that expired before `before`.
    async fn purge_expired(&self, before: DateTime<Utc>) -> AppResult<u64>;
}

/// Server-side sessions.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Open a session.
    async fn create(&self, data: &CreateSession) -> AppResult<Session>;

    /// Load without any liveness predicate.
    async fn find(&self, id: Uuid) -> AppResult<Option<Session>>;

    /// If active at `now`, slide `idle_expires_at` and stamp `last_seen_at`.
    /// `max_expires_at` is never touched.
    async fn touch(
        &self,
        id: Uuid,
        operator_id: i64,
        now: DateTime<Utc>,
        idle_expires_at: DateTime<Utc>,
    ) -> AppResult<Option<Session>>;

    /// Revoke if active at `now`.
    async fn revoke(&self, id: Uuid, operator_id: i64, now: DateTime<Utc>) -> AppResult<bool>;

    /// Delete sessions that ended before `before`.
    async fn purge_expired(&self, before: DateTime<Utc>) -> AppResult<u64>;
}

/// A decision to apply to a pending item.
#[derive(Debug, Clone)]
pub struct DecisionRecord {
    /// Target item.
    pub item_id: i64,
    /// Action log entry; also selects APPROVED vs REJECTED.
    pub action: NewModerationAction,
    /// Rejection text.
    pub reason_text: Option<String>,
    /// Required fix.
    pub required_fix_step: Option<String>,
    /// Audit entry; the store adds `subject` to its payload.
    pub audit: CreateAuditEntry,
}

/// Result of a force-review.
#[derive(Debug, Clone)]
pub struct ForceReviewOutcome {
    /// The single pending item for the subject.
    pub item: ModerationItem,
    /// True if a fresh item was inserted, false if an existing one was reclaimed.
    pub created: bool,
}

/// Half-open `[start, end)` windows for the calendar buckets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatsWindow {
    /// Day start.
    pub day_start: DateTime<Utc>,
    /// Day end.
    pub day_end: DateTime<Utc>,
    /// ISO week start.
    pub week_start: DateTime<Utc>,
    /// ISO week end.
    pub week_end: DateTime<Utc>,
    /// Month start.
    pub month_start: DateTime<Utc>,
    /// Month end.
    pub month_end: DateTime<Utc>,
}

/// Moderation queue and its action log.
#[async_trait]
pub trait ModerationStore: Send + Sync {
    /// Insert a PENDING item.
    async fn enqueue(
        &self,
        subject_user_id: i64,
        eta: EtaBucket,
        now: DateTime<Utc>,
    ) -> AppResult<ModerationItem>;

    /// Lease the oldest acquirable item, skipping rows another worker holds.
    async fn acquire_next(
        &self,
        actor_external_id: i64,
        now: DateTime<Utc>,
        lease_until: DateTime<Utc>,
    ) -> AppResult<Option<ModerationItem>>;

    /// Load by id.
    async fn find(&self, id: i64) -> AppResult<Option<ModerationItem>>;

    /// Most recent item for a subject.
    async fn latest_for_subject(&self, subject_user_id: i64) -> AppResult<Option<ModerationItem>>;

    /// Apply a terminal decision, update the subject's profile and log the
    /// action in one transaction. Fails with `NotFound` or `NotPending`.
    async fn decide(&self, record: &DecisionRecord, now: DateTime<Utc>)
    -> AppResult<ModerationItem>;

    /// Reset the subject's profile to PENDING and ensure exactly one
    /// reclaimable PENDING item exists. The store adds `item_id` and
    /// `created` to the audit payload.
    async fn force_review(
        &self,
        subject_user_id: i64,
        audit: &CreateAuditEntry,
        now: DateTime<Utc>,
    ) -> AppResult<ForceReviewOutcome>;

    /// Number of PENDING items.
    async fn pending_count(&self) -> AppResult<i64>;

    /// Per-actor decision counts, ordered by `all DESC, actor ASC, role ASC`.
    async fn work_stats(&self, window: &StatsWindow) -> AppResult<Vec<ActorWorkStats>>;

    /// Reason code of the subject's most recent rejection.
    async fn last_rejection(&self, subject_user_id: i64) -> AppResult<Option<RejectReason>>;
}

/// User bans.
#[async_trait]
pub trait BanStore: Send + Sync {
    /// Insert or update the ban flag for a subject.
    async fn upsert(
        &self,
        subject_user_id: i64,
        banned: bool,
        reason: Option<&str>,
        updated_by: i64,
        audit: &CreateAuditEntry,
        now: DateTime<Utc>,
    ) -> AppResult<UserBan>;

    /// Load by subject.
    async fn find(&self, subject_user_id: i64) -> AppResult<Option<UserBan>>;
}

/// Append-only audit log.
#[async_trait]
pub trait AuditStore: Send + Sync {
    /// Append an entry.
    async fn append(&self, entry: &CreateAuditEntry, now: DateTime<Utc>) -> AppResult<AuditEntry>;

    /// Newest entries first.
    async fn recent(&self, limit: i64) -> AppResult<Vec<AuditEntry>>;
}

/// Feature flags.
#[async_trait]
pub trait FlagStore: Send + Sync {
    /// All flags ordered by key.
    async fn list(&self) -> AppResult<Vec<AppFlag>>;

    /// Load by key.
    async fn get(&self, key: &str) -> AppResult<Option<AppFlag>>;

    /// Atomically flip a flag (a missing flag becomes `true`). The store adds
    /// the new `value` to the audit payload.
    async fn toggle(
        &self,
        key: &str,
        updated_by: i64,
        audit: &CreateAuditEntry,
        now: DateTime<Utc>,
    ) -> AppResult<AppFlag>;
}

/// Bot contact registry and staff role assignments.
#[async_trait]
pub trait RegistryStore: Send + Sync {
    /// Record a contact, creating the row on first touch.
    async fn touch(&self, user: &BotUserTouch, now: DateTime<Utc>) -> AppResult<BotUser>;

    /// Find a contact by username, case-insensitively.
    async fn find_by_username(&self, username: &str) -> AppResult<Option<BotUser>>;

    /// The active (non-revoked) role, if any.
    async fn active_role(&self, external_id: i64) -> AppResult<Option<Role>>;

    /// Replace any active assignment with `role`.
    async fn grant(
        &self,
        external_id: i64,
        role: Role,
        granted_by: i64,
        audit: &CreateAuditEntry,
        now: DateTime<Utc>,
    ) -> AppResult<RoleAssignment>;

    /// Revoke the active assignment if it equals `role`. Nothing is audited
    /// when no assignment matched.
    async fn revoke(
        &self,
        external_id: i64,
        role: Role,
        revoked_by: i64,
        audit: &CreateAuditEntry,
        now: DateTime<Utc>,
    ) -> AppResult<bool>;

    /// Active staff ordered by role privilege then id.
    async fn list_staff(&self) -> AppResult<Vec<StaffMember>>;
}

/// End-user profiles and media.
#[async_trait]
pub trait ProfileStore: Send + Sync {
    /// Load by Telegram id.
    async fn find(&self, user_id: i64) -> AppResult<Option<Profile>>;

    /// Load by username, case-insensitively.
    async fn find_by_username(&self, username: &str) -> AppResult<Option<Profile>>;

    /// Insert or replace a profile.
    async fn save(&self, profile: &Profile) -> AppResult<()>;

    /// Attach a media reference.
    async fn add_media(
        &self,
        user_id: i64,
        kind: MediaKind,
        position: Option<i32>,
        storage_ref: &str,
        now: DateTime<Utc>,
    ) -> AppResult<MediaRef>;

    /// Active photos at positions 1..=3 ordered by position.
    async fn active_photos(&self, user_id: i64) -> AppResult<Vec<MediaRef>>;

    /// Most recent active circle.
    async fn latest_circle(&self, user_id: i64) -> AppResult<Option<MediaRef>>;

    /// Population counts.
    async fn counts(&self) -> AppResult<ProfileCounts>;
}
