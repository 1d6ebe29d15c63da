//! Login challenge entity.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;
use uuid::Uuid;

/// Progress of a login attempt across factors.
///
/// Status only ever moves forward along
/// `TelegramVerified -> TotpVerified -> Completed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "challenge_status", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ChallengeStatus {
    /// Telegram identity proven.
    TelegramVerified,
    /// TOTP code accepted.
    TotpVerified,
    /// Password accepted and token issued.
    Completed,
}

impl ChallengeStatus {
    /// The only status this one may advance to.
    pub fn next(&self) -> Option<Self> {
        match self {
            Self::TelegramVerified => Some(Self::TotpVerified),
            Self::TotpVerified => Some(Self::Completed),
            Self::Completed => None,
        }
    }
}

impl fmt::Display for ChallengeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TelegramVerified => write!(f, "TELEGRAM_VERIFIED"),
            Self::TotpVerified => write!(f, "TOTP_VERIFIED"),
            Self::Completed => write!(f, "COMPLETED"),
        }
    }
}

/// Server-side record of a login attempt.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct LoginChallenge {
    /// Random challenge id.
    pub id: Uuid,
    /// Operator being authenticated.
    pub operator_id: i64,
    /// Current progress.
    pub status: ChallengeStatus,
    /// Hard expiry.
    pub expires_at: DateTime<Utc>,
    /// Client IP at stage 1.
    pub ip: Option<String>,
    /// Client user agent at stage 1.
    pub user_agent: Option<String>,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Last status change.
    pub updated_at: DateTime<Utc>,
}

impl LoginChallenge {
    /// A challenge is usable only strictly before its expiry.
    pub fn is_active(&self, now: DateTime<Utc>) -> bool {
        now < self.expires_at
    }
}

/// Data required to open a challenge.
#[derive(Debug, Clone)]
pub struct CreateChallenge {
    /// Operator being authenticated.
    pub operator_id: i64,
    /// Hard expiry.
    pub expires_at: DateTime<Utc>,
    /// Client IP.
    pub ip: Option<String>,
    /// Client user agent.
    pub user_agent: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_chain_is_linear() {
        assert_eq!(
            ChallengeStatus::TelegramVerified.next(),
            Some(ChallengeStatus::TotpVerified)
        );
        assert_eq!(
            ChallengeStatus::TotpVerified.next(),
            Some(ChallengeStatus::Completed)
        );
        assert_eq!(ChallengeStatus::Completed.next(), None);
    }
}
