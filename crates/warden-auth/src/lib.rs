//! # warden-auth
//!
//! Operator authentication for the admin surface.
//!
//! ## Modules
//!
//! - `password` — Argon2id hashing with a configurable work factor
//! - `token` — HS256 bearer tokens bound to a session id
//! - `totp` — RFC 6238 codes and the at-rest secret envelope
//! - `telegram` — Mini App / Login Widget `initData` verification
//! - `login` — the three-stage challenge state machine and IP throttle
//! - `session` — per-request session validation, logout, and state cleanup
//! - `enrollment` — bootstrap-gated TOTP enrollment

pub mod enrollment;
pub mod login;
pub mod password;
pub mod session;
pub mod telegram;
pub mod token;
pub mod totp;

use std::sync::Arc;

use warden_core::clock::Clock;
use warden_core::config::AppConfig;
use warden_core::result::AppResult;
use warden_database::Stores;

pub use enrollment::{BootstrapGuard, TotpEnrollment};
pub use login::{LoginManager, LoginThrottle};
pub use password::PasswordHasher;
pub use session::{SessionManager, StateCleanup};
pub use telegram::{InitDataValidator, TelegramIdentity};
pub use token::{Claims, TokenCodec};
pub use totp::{SecretEnvelope, TotpAuthenticator};

/// Every authentication component, wired from one configuration.
#[derive(Debug, Clone)]
pub struct AuthSuite {
    /// Login state machine.
    pub login: Arc<LoginManager>,
    /// Session validation and logout.
    pub sessions: Arc<SessionManager>,
    /// TOTP enrollment.
    pub enrollment: Arc<TotpEnrollment>,
    /// Enrollment gate.
    pub bootstrap: Arc<BootstrapGuard>,
    /// Expired-state purger.
    pub cleanup: Arc<StateCleanup>,
}

impl AuthSuite {
    /// Build the suite. Fails if the envelope key or the Argon2 parameters
    /// are unusable.
    pub fn build(config: &AppConfig, stores: &Stores, clock: Arc<dyn Clock>) -> AppResult<Self> {
        let hasher = PasswordHasher::new(&config.auth.password)?;
        let envelope = Arc::new(SecretEnvelope::from_config(&config.totp)?);
        let authenticator = Arc::new(TotpAuthenticator::new(&config.totp.issuer));
        let codec = Arc::new(TokenCodec::new(&config.auth));
        let validator = InitDataValidator::new(&config.telegram);
        let throttle = Arc::new(LoginThrottle::new(
            config.auth.login_attempts_per_minute,
            clock.clone(),
        ));

        let sessions = Arc::new(SessionManager::new(
            stores.sessions.clone(),
            codec.clone(),
            &config.session,
            clock.clone(),
        ));

        let login = Arc::new(LoginManager::new(
            stores.clone(),
            validator,
            hasher,
            authenticator.clone(),
            envelope.clone(),
            codec,
            sessions.clone(),
            throttle,
            &config.auth,
            clock.clone(),
        ));

        let enrollment = Arc::new(TotpEnrollment::new(
            stores.operators.clone(),
            stores.totp_setups.clone(),
            authenticator,
            envelope,
            &config.auth,
            clock.clone(),
        ));

        let cleanup = Arc::new(StateCleanup::new(stores, &config.session, clock));

        Ok(Self {
            login,
            sessions,
            enrollment,
            bootstrap: Arc::new(BootstrapGuard::new(&config.totp.bootstrap_key)),
            cleanup,
        })
    }
}
