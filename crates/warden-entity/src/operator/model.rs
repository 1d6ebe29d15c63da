//! Operator entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::role::Role;

/// An internal operator allowed to sign in to the admin surface.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Operator {
    /// Numeric operator id.
    pub id: i64,
    /// Telegram user id.
    pub external_id: i64,
    /// Telegram username, without `@`.
    pub login_handle: Option<String>,
    /// Human-readable name.
    pub display_name: Option<String>,
    /// Staff role.
    pub role: Role,
    /// Argon2id PHC string.
    #[serde(skip_serializing)]
    pub password_hash: String,
    /// Sealed TOTP secret (`enc:v1:...`), legacy plaintext, or `None`.
    #[serde(skip_serializing)]
    pub totp_secret: Option<String>,
    /// Whether TOTP enrollment completed.
    pub totp_enabled: bool,
    /// Inactive operators cannot sign in.
    pub is_active: bool,
    /// Consecutive failed factor checks.
    pub failed_attempts: i32,
    /// Lockout end, if any.
    pub locked_until: Option<DateTime<Utc>>,
    /// Row creation time.
    pub created_at: DateTime<Utc>,
    /// Last update time.
    pub updated_at: DateTime<Utc>,
}

impl Operator {
    /// True while a lockout is in force.
    pub fn is_locked(&self, now: DateTime<Utc>) -> bool {
        self.locked_until.is_some_and(|until| until > now)
    }

    /// True when a TOTP secret is stored and enrollment finished.
    pub fn has_totp(&self) -> bool {
        self.totp_enabled && self.totp_secret.as_deref().is_some_and(|s| !s.is_empty())
    }
}

/// Data required to provision a new operator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateOperator {
    /// Telegram user id.
    pub external_id: i64,
    /// Telegram username.
    pub login_handle: Option<String>,
    /// Display name.
    pub display_name: Option<String>,
    /// Staff role.
    pub role: Role,
    /// Pre-computed Argon2id hash.
    pub password_hash: String,
}

/// Result of atomically recording a failed factor check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, FromRow)]
pub struct FailureOutcome {
    /// Counter value after the increment.
    pub failed_attempts: i32,
    /// Lockout end after the increment.
    pub locked_until: Option<DateTime<Utc>>,
}

impl FailureOutcome {
    /// True if this increment reached the threshold and installed a lockout.
    pub fn locked(&self, threshold: i32, now: DateTime<Utc>) -> bool {
        self.failed_attempts >= threshold && self.locked_until.is_some_and(|until| until > now)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn operator(now: DateTime<Utc>) -> Operator {
        Operator {
            id: 1,
            external_id: 42,
            login_handle: Some("alice".into()),
            display_name: None,
            role: Role::Admin,
            password_hash: String::new(),
            totp_secret: Some("enc:v1:abc".into()),
            totp_enabled: true,
            is_active: true,
            failed_attempts: 0,
            locked_until: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_lock_window_is_exclusive_at_end() {
        let now = Utc::now();
        let mut op = operator(now);
        assert!(!op.is_locked(now));
        op.locked_until = Some(now + Duration::minutes(1));
        assert!(op.is_locked(now));
        assert!(!op.is_locked(now + Duration::minutes(1)));
    }

    #[test]
    fn test_has_totp_requires_secret_and_flag() {
        let now = Utc::now();
        let mut op = operator(now);
        assert!(op.has_totp());
        op.totp_enabled = false;
        assert!(!op.has_totp());
        op.totp_enabled = true;
        op.totp_secret = Some(String::new());
        assert!(!op.has_totp());
    }
}
