//! Maps domain `AppError` to HTTP responses.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};

use warden_core::error::{AppError, ErrorKind};

/// Error envelope returned by every endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    /// The error itself.
    pub error: ErrorDetail,
}

/// Machine-readable code plus a caller-safe message.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorDetail {
    /// Lower snake case code, e.g. `account_locked`.
    pub code: String,
    /// Human-readable message.
    pub message: String,
}

/// Everything a handler can fail with.
#[derive(Debug)]
pub enum ApiError {
    /// A domain error from the auth layer.
    App(AppError),
    /// The body was not valid JSON or did not match the request shape.
    InvalidJson(String),
}

impl From<AppError> for ApiError {
    fn from(err: AppError) -> Self {
        Self::App(err)
    }
}

/// Status and wire code for an error kind.
pub fn status_for(kind: ErrorKind) -> (StatusCode, &'static str) {
    match kind {
        ErrorKind::InvalidInput => (StatusCode::BAD_REQUEST, "invalid_input"),
        ErrorKind::Unauthorized => (StatusCode::UNAUTHORIZED, "unauthorized"),
        ErrorKind::Forbidden => (StatusCode::FORBIDDEN, "forbidden"),
        ErrorKind::AccountLocked => (StatusCode::LOCKED, "account_locked"),
        ErrorKind::ChallengeExpired => (StatusCode::UNAUTHORIZED, "challenge_expired"),
        ErrorKind::InvalidStep => (StatusCode::CONFLICT, "invalid_step"),
        ErrorKind::TotpNotConfigured => (StatusCode::PRECONDITION_REQUIRED, "totp_not_configured"),
        ErrorKind::SessionExpired => (StatusCode::UNAUTHORIZED, "session_expired"),
        ErrorKind::BootstrapDisabled => (StatusCode::NOT_IMPLEMENTED, "bootstrap_disabled"),
        ErrorKind::NotFound => (StatusCode::NOT_FOUND, "not_found"),
        ErrorKind::NotPending => (StatusCode::CONFLICT, "not_pending"),
        ErrorKind::QueueEmpty => (StatusCode::NOT_FOUND, "queue_empty"),
        ErrorKind::Conflict => (StatusCode::CONFLICT, "conflict"),
        ErrorKind::RateLimited => (StatusCode::TOO_MANY_REQUESTS, "rate_limited"),
        ErrorKind::ServiceUnavailable => (StatusCode::SERVICE_UNAVAILABLE, "service_unavailable"),
        ErrorKind::Internal
        | ErrorKind::Database
        | ErrorKind::Configuration
        | ErrorKind::ExternalService
        | ErrorKind::Serialization => (StatusCode::INTERNAL_SERVER_ERROR, "internal_error"),
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code, message) = match self {
            Self::InvalidJson(message) => (StatusCode::BAD_REQUEST, "invalid_json", message),
            Self::App(err) => {
                let (status, code) = status_for(err.kind);
                if status.is_server_error() {
                    tracing::error!(
                        kind = %err.kind,
                        error = %err.message,
                        source = ?err.source,
                        "Request failed"
                    );
                    (status, code, "internal error".to_string())
                } else {
                    (status, code, err.message)
                }
            }
        };

        let body = ErrorBody {
            error: ErrorDetail {
                code: code.to_string(),
                message,
            },
        };

        (status, Json(body)).into_response()
    }
}
