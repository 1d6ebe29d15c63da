//! Request DTOs with validation.

use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// `POST /v1/auth/telegram/start`
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct TelegramStartRequest {
    /// Raw `initData` query string.
    #[validate(length(min = 1, max = 8192, message = "init_data is required"))]
    pub init_data: String,
}

/// `POST /v1/auth/2fa/verify`
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct TotpVerifyRequest {
    /// Challenge from stage 1.
    pub challenge_id: Uuid,
    /// Six-digit code.
    #[validate(length(min = 1, max = 16, message = "code is required"))]
    pub code: String,
}

/// `POST /v1/auth/password/verify`
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct PasswordVerifyRequest {
    /// Challenge from stage 2.
    pub challenge_id: Uuid,
    /// Operator password.
    #[validate(length(min = 1, max = 1024, message = "password is required"))]
    pub password: String,
}

/// `POST /v1/admin/2fa/setup/start`
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct SetupStartRequest {
    /// Operator's Telegram id.
    #[validate(range(min = 1, message = "telegram_id must be positive"))]
    pub telegram_id: i64,
    /// Label shown in the authenticator app.
    #[serde(default)]
    #[validate(length(max = 64))]
    pub account_name: Option<String>,
}

/// `POST /v1/admin/2fa/setup/confirm`
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct SetupConfirmRequest {
    /// Token from setup start.
    pub setup_id: Uuid,
    /// Code from the freshly configured authenticator.
    #[validate(length(min = 1, max = 16, message = "code is required"))]
    pub code: String,
}
