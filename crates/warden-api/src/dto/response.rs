//! Response DTOs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use warden_auth::enrollment::SetupStarted;
use warden_auth::login::{ChallengeStarted, FactorAccepted, LoginCompleted};
use warden_auth::session::AuthenticatedOperator;
use warden_entity::operator::Role;

/// `{"status":"ok"}`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusResponse {
    /// Always `ok`.
    pub status: String,
}

impl StatusResponse {
    /// The only value this body ever carries.
    pub fn ok() -> Self {
        Self {
            status: "ok".to_string(),
        }
    }
}

/// Stage 1 and 2 result.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChallengeResponse {
    /// Challenge to carry forward.
    pub challenge_id: Uuid,
    /// `2fa` or `password`.
    pub next_step: String,
    /// Telegram username; stage 1 only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
}

impl From<ChallengeStarted> for ChallengeResponse {
    fn from(started: ChallengeStarted) -> Self {
        Self {
            challenge_id: started.challenge_id,
            next_step: started.next_step.to_string(),
            username: started.username,
        }
    }
}

impl From<FactorAccepted> for ChallengeResponse {
    fn from(accepted: FactorAccepted) -> Self {
        Self {
            challenge_id: accepted.challenge_id,
            next_step: accepted.next_step.to_string(),
            username: None,
        }
    }
}

/// Operator summary embedded in the login response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdminSummary {
    /// Operator id.
    pub id: i64,
    /// Telegram id.
    pub telegram_id: i64,
    /// Login handle.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    /// Display name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    /// Role.
    pub role: Role,
}

/// Stage 3 result.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginResponse {
    /// Bearer token.
    pub access_token: String,
    /// Always `Bearer`.
    pub token_type: String,
    /// Token expiry.
    pub expires_at: DateTime<Utc>,
    /// The authenticated operator.
    pub admin: AdminSummary,
}

impl From<LoginCompleted> for LoginResponse {
    fn from(done: LoginCompleted) -> Self {
        Self {
            access_token: done.access_token,
            token_type: done.token_type.to_string(),
            expires_at: done.expires_at,
            admin: AdminSummary {
                id: done.operator.id,
                telegram_id: done.operator.external_id,
                username: done.operator.login_handle,
                display_name: done.operator.display_name,
                role: done.operator.role,
            },
        }
    }
}

/// `GET /v1/auth/me`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MeResponse {
    /// Operator id.
    pub id: i64,
    /// Telegram id.
    pub telegram_id: i64,
    /// Role at token issue.
    pub role: Role,
    /// Login handle, `null` if unset.
    pub username: Option<String>,
}

impl From<&AuthenticatedOperator> for MeResponse {
    fn from(auth: &AuthenticatedOperator) -> Self {
        Self {
            id: auth.claims.uid,
            telegram_id: auth.claims.tid,
            role: auth.claims.role,
            username: auth.claims.username.clone(),
        }
    }
}

/// TOTP enrollment material.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SetupStartResponse {
    /// Token to quote on confirm.
    pub setup_id: Uuid,
    /// Operator's Telegram id.
    pub telegram_id: i64,
    /// Provisioning URI.
    pub otpauth_url: String,
    /// Base32 secret.
    pub secret: String,
    /// PNG data URL of the QR code.
    pub qr_code_data_url: String,
    /// Token expiry.
    pub expires_at: DateTime<Utc>,
}

impl From<SetupStarted> for SetupStartResponse {
    fn from(started: SetupStarted) -> Self {
        Self {
            setup_id: started.setup_id,
            telegram_id: started.telegram_id,
            otpauth_url: started.otpauth_url,
            secret: started.secret,
            qr_code_data_url: started.qr_code_data_url,
            expires_at: started.expires_at,
        }
    }
}
