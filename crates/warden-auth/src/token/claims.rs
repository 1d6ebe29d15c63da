//! Bearer token claims.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use warden_entity::operator::Role;

/// Claims carried by every bearer token. Never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Unique token id.
    pub jti: Uuid,
    /// Operator id.
    pub uid: i64,
    /// Operator's Telegram id.
    pub tid: i64,
    /// Role at issue time.
    pub role: Role,
    /// Login handle, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    /// Bound session.
    pub sid: Uuid,
    /// Issued at (seconds since epoch).
    pub iat: i64,
    /// Not before (seconds since epoch).
    pub nbf: i64,
    /// Expires at (seconds since epoch).
    pub exp: i64,
}

impl Claims {
    /// Expiry as a timestamp.
    pub fn expires_at(&self) -> DateTime<Utc> {
        DateTime::from_timestamp(self.exp, 0).unwrap_or_default()
    }

    /// True inside `[nbf, exp)`.
    pub fn is_live(&self, now: DateTime<Utc>) -> bool {
        let now = now.timestamp();
        self.nbf <= now && now < self.exp
    }
}
