//! Moderation action log used by work stats.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::reason::RejectReason;
use crate::operator::Role;

/// Terminal decision on a moderation item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "moderation_decision", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Decision {
    /// Profile accepted.
    Approve,
    /// Profile rejected.
    Reject,
}

/// Append-only record of a decision.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ModerationAction {
    /// Row id.
    pub id: i64,
    /// Deciding moderator.
    pub actor_external_id: i64,
    /// Moderator's role at decision time.
    pub actor_role: Role,
    /// Profile owner.
    pub subject_user_id: i64,
    /// Decided item.
    pub moderation_item_id: i64,
    /// Decision.
    pub decision: Decision,
    /// Rejection code.
    pub reason_code: Option<RejectReason>,
    /// Seconds between lease start and decision.
    pub duration_sec: Option<i64>,
    /// Decision time.
    pub created_at: DateTime<Utc>,
}

/// Fields a decider supplies; the store fills in subject, duration and time.
#[derive(Debug, Clone)]
pub struct NewModerationAction {
    /// Deciding moderator.
    pub actor_external_id: i64,
    /// Moderator's role.
    pub actor_role: Role,
    /// Decision.
    pub decision: Decision,
    /// Rejection code.
    pub reason_code: Option<RejectReason>,
}

/// Per-actor decision counts over calendar buckets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct ActorWorkStats {
    /// Moderator.
    pub actor_external_id: i64,
    /// Moderator's role at decision time.
    pub actor_role: Role,
    /// Decisions today.
    pub day: i64,
    /// Decisions this ISO week.
    pub week: i64,
    /// Decisions this month.
    pub month: i64,
    /// All decisions.
    pub all: i64,
}
