//! Server-side session entity.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// A session bound 1:1 to an issued bearer token.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Session {
    /// Session id carried in the token's `sid` claim.
    pub id: Uuid,
    /// Owning operator.
    pub operator_id: i64,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Last successful validation.
    pub last_seen_at: DateTime<Utc>,
    /// Sliding idle expiry.
    pub idle_expires_at: DateTime<Utc>,
    /// Absolute expiry; never extended.
    pub max_expires_at: DateTime<Utc>,
    /// Set on logout.
    pub revoked_at: Option<DateTime<Utc>>,
    /// Client IP at login.
    pub ip: Option<String>,
    /// Client user agent at login.
    pub user_agent: Option<String>,
}

impl Session {
    /// Active iff not revoked and before both expiries.
    pub fn is_active(&self, now: DateTime<Utc>) -> bool {
        self.revoked_at.is_none() && now < self.max_expires_at && now < self.idle_expires_at
    }
}

/// Data required to open a session.
#[derive(Debug, Clone)]
pub struct CreateSession {
    /// Owning operator.
    pub operator_id: i64,
    /// Creation time.
    pub now: DateTime<Utc>,
    /// Initial idle expiry.
    pub idle_expires_at: DateTime<Utc>,
    /// Absolute expiry.
    pub max_expires_at: DateTime<Utc>,
    /// Client IP.
    pub ip: Option<String>,
    /// Client user agent.
    pub user_agent: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_active_requires_both_windows() {
        let now = Utc::now();
        let mut session = Session {
            id: Uuid::new_v4(),
            operator_id: 1,
            created_at: now,
            last_seen_at: now,
            idle_expires_at: now + Duration::minutes(30),
            max_expires_at: now + Duration::hours(12),
            revoked_at: None,
            ip: None,
            user_agent: None,
        };
        assert!(session.is_active(now));
        assert!(!session.is_active(now + Duration::minutes(30)));

        session.idle_expires_at = now + Duration::hours(13);
        assert!(!session.is_active(now + Duration::hours(12)));

        session.revoked_at = Some(now);
        assert!(!session.is_active(now));
    }
}
