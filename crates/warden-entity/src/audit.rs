//! Audit log entity.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;

/// Every mutating or sensitive staff action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "audit_action", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum AuditAction {
    /// A role was granted.
    RoleGranted,
    /// A role was revoked.
    RoleRevoked,
    /// A moderation item was approved.
    ModerationApproved,
    /// A moderation item was rejected.
    ModerationRejected,
    /// A profile was sent back to review.
    ForceReview,
    /// A user lookup was performed.
    Lookup,
    /// A user was banned.
    UserBanned,
    /// A user was unbanned.
    UserUnbanned,
    /// A system flag was toggled.
    SystemToggle,
    /// The users count was viewed.
    UsersCountViewed,
}

impl fmt::Display for AuditAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::RoleGranted => "role_granted",
            Self::RoleRevoked => "role_revoked",
            Self::ModerationApproved => "moderation_approved",
            Self::ModerationRejected => "moderation_rejected",
            Self::ForceReview => "force_review",
            Self::Lookup => "lookup",
            Self::UserBanned => "user_banned",
            Self::UserUnbanned => "user_unbanned",
            Self::SystemToggle => "system_toggle",
            Self::UsersCountViewed => "users_count_viewed",
        };
        f.write_str(s)
    }
}

/// An immutable audit log entry.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct AuditEntry {
    /// Row id.
    pub id: i64,
    /// Telegram id of the acting staff member.
    pub actor_external_id: i64,
    /// What happened.
    pub action: AuditAction,
    /// Structured details.
    pub payload: serde_json::Value,
    /// When it happened.
    pub created_at: DateTime<Utc>,
}

/// Data required to append an audit entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateAuditEntry {
    /// Telegram id of the acting staff member.
    pub actor_external_id: i64,
    /// What happened.
    pub action: AuditAction,
    /// Structured details.
    pub payload: serde_json::Value,
}

impl CreateAuditEntry {
    /// Merge `fields` into an object payload; later keys win.
    ///
    /// Stores use this to add facts only known once the mutation ran, such as
    /// the id of an inserted row.
    pub fn with_fields(&self, fields: serde_json::Value) -> Self {
        let mut payload = self.payload.clone();
        if let (serde_json::Value::Object(target), serde_json::Value::Object(extra)) =
            (&mut payload, fields)
        {
            target.extend(extra);
        }
        Self {
            payload,
            ..self.clone()
        }
    }
}
