//! Moderation item entity.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;

use super::reason::RejectReason;

/// Lifecycle of a moderation item. `Approved` and `Rejected` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "moderation_status", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ModerationStatus {
    /// Waiting for a decision.
    Pending,
    /// Accepted.
    Approved,
    /// Sent back to the user with a reason.
    Rejected,
}

impl fmt::Display for ModerationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pending => write!(f, "PENDING"),
            Self::Approved => write!(f, "APPROVED"),
            Self::Rejected => write!(f, "REJECTED"),
        }
    }
}

/// Coarse time-to-moderate hint shown to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "eta_bucket")]
pub enum EtaBucket {
    /// Up to ten minutes.
    #[sqlx(rename = "up_to_10")]
    #[serde(rename = "up_to_10")]
    UpTo10,
    /// Up to thirty minutes.
    #[sqlx(rename = "up_to_30")]
    #[serde(rename = "up_to_30")]
    UpTo30,
    /// Up to an hour.
    #[sqlx(rename = "up_to_60")]
    #[serde(rename = "up_to_60")]
    UpTo60,
    /// Longer than an hour.
    #[sqlx(rename = "over_60")]
    #[serde(rename = "over_60")]
    Over60,
}

impl EtaBucket {
    /// Wire string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::UpTo10 => "up_to_10",
            Self::UpTo30 => "up_to_30",
            Self::UpTo60 => "up_to_60",
            Self::Over60 => "over_60",
        }
    }
}

/// One unit of moderation work for a subject's profile.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ModerationItem {
    /// Numeric item id.
    pub id: i64,
    /// Telegram id of the profile owner.
    pub subject_user_id: i64,
    /// Current status.
    pub status: ModerationStatus,
    /// ETA hint.
    pub eta_bucket: EtaBucket,
    /// Rejection code.
    pub reason_code: Option<RejectReason>,
    /// Rejection text shown to the user.
    pub reason_text: Option<String>,
    /// What the user must fix.
    pub required_fix_step: Option<String>,
    /// Enqueue time; primary queue order.
    pub created_at: DateTime<Utc>,
    /// Telegram id of the leasing moderator.
    pub locked_by: Option<i64>,
    /// Lease start.
    pub locked_at: Option<DateTime<Utc>>,
    /// Lease end.
    pub locked_until: Option<DateTime<Utc>>,
    /// Decision time.
    pub decided_at: Option<DateTime<Utc>>,
    /// Last change.
    pub updated_at: DateTime<Utc>,
}

impl ModerationItem {
    /// True while someone holds an unexpired lease.
    pub fn is_leased(&self, now: DateTime<Utc>) -> bool {
        self.locked_until.is_some_and(|until| until > now)
    }

    /// True if the item may be handed out by acquire.
    pub fn is_acquirable(&self, now: DateTime<Utc>) -> bool {
        self.status == ModerationStatus::Pending
            && self.locked_until.is_none_or(|until| until < now)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn item(now: DateTime<Utc>) -> ModerationItem {
        ModerationItem {
            id: 7,
            subject_user_id: 1001,
            status: ModerationStatus::Pending,
            eta_bucket: EtaBucket::UpTo10,
            reason_code: None,
            reason_text: None,
            required_fix_step: None,
            created_at: now,
            locked_by: None,
            locked_at: None,
            locked_until: None,
            decided_at: None,
            updated_at: now,
        }
    }

    #[test]
    fn test_acquirable_after_lease_lapses() {
        let now = Utc::now();
        let mut it = item(now);
        assert!(it.is_acquirable(now));

        it.locked_by = Some(5);
        it.locked_until = Some(now + Duration::minutes(10));
        assert!(it.is_leased(now));
        assert!(!it.is_acquirable(now));
        assert!(it.is_acquirable(now + Duration::minutes(11)));
    }

    #[test]
    fn test_decided_items_are_never_acquirable() {
        let now = Utc::now();
        let mut it = item(now);
        it.status = ModerationStatus::Approved;
        assert!(!it.is_acquirable(now));
    }
}
