//! TOTP enrollment token entity.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// A pending TOTP enrollment. The plaintext secret lives only here until
/// the operator confirms a code, after which the row is deleted.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct TotpSetupToken {
    /// Setup id handed to the enrolling client.
    pub id: Uuid,
    /// Operator being enrolled.
    pub operator_id: i64,
    /// Base32 secret.
    #[serde(skip_serializing)]
    pub secret: String,
    /// Hard expiry.
    pub expires_at: DateTime<Utc>,
    /// Creation time.
    pub created_at: DateTime<Utc>,
}
