//! Bot contact registry and role assignments.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::operator::Role;

/// Someone who has written to the moderation bot.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct BotUser {
    /// Telegram id.
    pub external_id: i64,
    /// Telegram username, without `@`.
    pub username: Option<String>,
    /// First name.
    pub first_name: Option<String>,
    /// Last name.
    pub last_name: Option<String>,
    /// First contact.
    pub first_seen_at: DateTime<Utc>,
    /// Latest contact.
    pub last_seen_at: DateTime<Utc>,
}

/// Display fields captured on every contact.
#[derive(Debug, Clone, Default)]
pub struct BotUserTouch {
    /// Telegram id.
    pub external_id: i64,
    /// Telegram username.
    pub username: Option<String>,
    /// First name.
    pub first_name: Option<String>,
    /// Last name.
    pub last_name: Option<String>,
}

/// A granted staff role. At most one active (non-revoked) row per user.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct RoleAssignment {
    /// Row id.
    pub id: i64,
    /// Telegram id of the staff member.
    pub external_id: i64,
    /// Granted role.
    pub role: Role,
    /// Granting staff member.
    pub granted_by: i64,
    /// Grant time.
    pub granted_at: DateTime<Utc>,
    /// Revoking staff member.
    pub revoked_by: Option<i64>,
    /// Revocation time.
    pub revoked_at: Option<DateTime<Utc>>,
}

/// A staff member as listed in the access menu.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct StaffMember {
    /// Telegram id.
    pub external_id: i64,
    /// Active role.
    pub role: Role,
    /// Telegram username, if the member has contacted the bot.
    pub username: Option<String>,
    /// Grant time.
    pub granted_at: DateTime<Utc>,
}
