//! Feature flag entity.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Flag key: new users may register.
pub const REGISTRATION_OPEN: &str = "registration_open";
/// Flag key: moderation queue is paused for end users.
pub const MODERATION_PAUSED: &str = "moderation_paused";

/// Keys the system menu may toggle.
pub const KNOWN_FLAGS: [&str; 2] = [REGISTRATION_OPEN, MODERATION_PAUSED];

/// One boolean feature toggle.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct AppFlag {
    /// Flag key.
    pub key: String,
    /// Current value.
    pub value_bool: bool,
    /// Last change.
    pub updated_at: DateTime<Utc>,
    /// Staff member who last changed it.
    pub updated_by: Option<i64>,
}
