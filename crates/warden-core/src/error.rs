//! Unified application error types for Warden.
//!
//! All crates map their internal errors into [`AppError`] for consistent
//! propagation through the ? operator.

use std::fmt;
use thiserror::Error;

/// Top-level error kind categorization used across the entire application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum ErrorKind {
    /// Shape or parse failure, bad identifier, empty required field.
    InvalidInput,
    /// Bad credentials, bad token, wrong code, missing operator.
    Unauthorized,
    /// Inactive operator, insufficient role, wrong bootstrap key.
    Forbidden,
    /// The operator is locked out until `locked_until`.
    AccountLocked,
    /// The login challenge is missing, expired, or lost a race.
    ChallengeExpired,
    /// A factor arrived out of order.
    InvalidStep,
    /// The operator has no enabled TOTP secret.
    TotpNotConfigured,
    /// A validly signed token names a session that is no longer active.
    SessionExpired,
    /// Enrollment endpoints are disabled because no bootstrap key is set.
    BootstrapDisabled,
    /// The requested resource was not found.
    NotFound,
    /// A moderation item was already decided by someone else.
    NotPending,
    /// No pending moderation item is available for leasing.
    QueueEmpty,
    /// A conflict occurred (duplicate entry, illegal transition).
    Conflict,
    /// An anti-abuse limit was exceeded.
    RateLimited,
    /// A supporting component is temporarily unavailable.
    ServiceUnavailable,
    /// An internal server error occurred.
    Internal,
    /// A database error occurred.
    Database,
    /// A configuration error occurred.
    Configuration,
    /// An external service (Telegram, object storage) failed.
    ExternalService,
    /// A serialization/deserialization error occurred.
    Serialization,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidInput => write!(f, "INVALID_INPUT"),
            Self::Unauthorized => write!(f, "UNAUTHORIZED"),
            Self::Forbidden => write!(f, "FORBIDDEN"),
            Self::AccountLocked => write!(f, "ACCOUNT_LOCKED"),
            Self::ChallengeExpired => write!(f, "CHALLENGE_EXPIRED"),
            Self::InvalidStep => write!(f, "INVALID_STEP"),
            Self::TotpNotConfigured => write!(f, "TOTP_NOT_CONFIGURED"),
            Self::SessionExpired => write!(f, "SESSION_EXPIRED"),
            Self::BootstrapDisabled => write!(f, "BOOTSTRAP_DISABLED"),
            Self::NotFound => write!(f, "NOT_FOUND"),
            Self::NotPending => write!(f, "NOT_PENDING"),
            Self::QueueEmpty => write!(f, "QUEUE_EMPTY"),
            Self::Conflict => write!(f, "CONFLICT"),
            Self::RateLimited => write!(f, "RATE_LIMITED"),
            Self::ServiceUnavailable => write!(f, "SERVICE_UNAVAILABLE"),
            Self::Internal => write!(f, "INTERNAL"),
            Self::Database => write!(f, "DATABASE"),
            Self::Configuration => write!(f, "CONFIGURATION"),
            Self::ExternalService => write!(f, "EXTERNAL_SERVICE"),
            Self::Serialization => write!(f, "SERIALIZATION"),
        }
    }
}

/// The unified application error used throughout Warden.
///
/// All crate-specific errors are mapped into `AppError` using `From` impls
/// or explicit `.map_err()` calls.
#[derive(Debug, Error)]
#[error("{kind}: {message}")]
pub struct AppError {
    /// The category of error.
    pub kind: ErrorKind,
    /// A human-readable error message.
    pub message: String,
    /// Optional underlying cause.
    #[source]
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl AppError {
    /// Create a new application error.
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            source: None,
        }
    }

    /// Create a new application error with an underlying cause.
    pub fn with_source(
        kind: ErrorKind,
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self {
            kind,
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create an invalid-input error.
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvalidInput, message)
    }

    /// Create an unauthorized error.
    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Unauthorized, message)
    }

    /// Create a forbidden error.
    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Forbidden, message)
    }

    /// Create an account-locked error.
    pub fn account_locked() -> Self {
        Self::new(ErrorKind::AccountLocked, "Account is temporarily locked")
    }

    /// Create a challenge-expired error.
    pub fn challenge_expired() -> Self {
        Self::new(ErrorKind::ChallengeExpired, "Login challenge expired")
    }

    /// Create an invalid-step error.
    pub fn invalid_step() -> Self {
        Self::new(ErrorKind::InvalidStep, "Login step out of order")
    }

    /// Create a TOTP-not-configured error.
    pub fn totp_not_configured() -> Self {
        Self::new(ErrorKind::TotpNotConfigured, "Two-factor authentication is not configured")
    }

    /// Create a session-expired error.
    pub fn session_expired() -> Self {
        Self::new(ErrorKind::SessionExpired, "Session expired")
    }

    /// Create a not-found error.
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::NotFound, message)
    }

    /// Create a conflict error.
    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Conflict, message)
    }

    /// Create an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Internal, message)
    }

    /// Create a configuration error.
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Configuration, message)
    }

    /// Create an external-service error.
    pub fn external(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::ExternalService, message)
    }

    /// Create a service-unavailable error.
    pub fn service_unavailable(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::ServiceUnavailable, message)
    }

    /// Returns true if this error has the given kind.
    pub fn is(&self, kind: ErrorKind) -> bool {
        self.kind == kind
    }
}

impl Clone for AppError {
    fn clone(&self) -> Self {
        Self {
            kind: self.kind,
            message: self.message.clone(),
            source: None,
        }
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        Self::with_source(
            ErrorKind::Serialization,
            format!("JSON serialization error: {err}"),
            err,
        )
    }
}

impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        Self::with_source(
            ErrorKind::Configuration,
            format!("Configuration error: {err}"),
            err,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_uses_kind_code() {
        let err = AppError::account_locked();
        assert_eq!(err.to_string(), "ACCOUNT_LOCKED: Account is temporarily locked");
    }

    #[test]
    fn test_clone_drops_source() {
        let io = std::io::Error::other("boom");
        let err = AppError::with_source(ErrorKind::Database, "query failed", io);
        assert!(std::error::Error::source(&err).is_some());
        let cloned = err.clone();
        assert!(cloned.is(ErrorKind::Database));
        assert!(std::error::Error::source(&cloned).is_none());
    }
}
