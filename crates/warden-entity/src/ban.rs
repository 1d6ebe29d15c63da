//! User ban entity.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Ban state of an end user, upserted by subject.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct UserBan {
    /// Telegram id of the banned user.
    pub subject_user_id: i64,
    /// Current ban flag.
    pub banned: bool,
    /// Free-text reason.
    pub reason: Option<String>,
    /// Staff member who last changed the flag.
    pub updated_by: i64,
    /// Last change.
    pub updated_at: DateTime<Utc>,
}
