//! Two-step TOTP enrollment.
//!
//! `start_setup` parks a fresh plaintext secret in a short-lived setup
//! token. `confirm_setup` proves the operator's authenticator produces codes
//! for it, consumes the token, and stores the sealed secret on the operator.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use tracing::info;
use uuid::Uuid;

use warden_core::clock::Clock;
use warden_core::config::AuthConfig;
use warden_core::error::AppError;
use warden_core::result::AppResult;
use warden_database::store::{OperatorStore, TotpSetupStore};

use crate::totp::{SecretEnvelope, TotpAuthenticator};

/// Material the operator needs to configure an authenticator app.
#[derive(Debug, Clone)]
pub struct SetupStarted {
    /// Token to quote on confirm.
    pub setup_id: Uuid,
    /// Operator's Telegram id.
    pub telegram_id: i64,
    /// Provisioning URI.
    pub otpauth_url: String,
    /// Base32 secret for manual entry.
    pub secret: String,
    /// QR code of the URI.
    pub qr_code_data_url: String,
    /// Token expiry.
    pub expires_at: DateTime<Utc>,
}

/// Enrolls operators into TOTP.
pub struct TotpEnrollment {
    operators: Arc<dyn OperatorStore>,
    setups: Arc<dyn TotpSetupStore>,
    authenticator: Arc<TotpAuthenticator>,
    envelope: Arc<SecretEnvelope>,
    ttl: Duration,
    clock: Arc<dyn Clock>,
}

impl std::fmt::Debug for TotpEnrollment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TotpEnrollment")
            .field("ttl", &self.ttl)
            .finish_non_exhaustive()
    }
}

impl TotpEnrollment {
    /// Wire the enrollment flow.
    pub fn new(
        operators: Arc<dyn OperatorStore>,
        setups: Arc<dyn TotpSetupStore>,
        authenticator: Arc<TotpAuthenticator>,
        envelope: Arc<SecretEnvelope>,
        config: &AuthConfig,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            operators,
            setups,
            authenticator,
            envelope,
            ttl: Duration::minutes(config.totp_setup_ttl_minutes as i64),
            clock,
        }
    }

    /// Generate a secret for the operator with Telegram id `telegram_id`.
    ///
    /// `account_name` overrides the label shown in the authenticator app.
    pub async fn start_setup(
        &self,
        telegram_id: i64,
        account_name: Option<String>,
    ) -> AppResult<SetupStarted> {
        let now = self.clock.now();
        let operator = self
            .operators
            .find_by_external_id(telegram_id)
            .await?
            .ok_or_else(|| AppError::unauthorized("Unknown operator"))?;
        if !operator.is_active {
            return Err(AppError::forbidden("Operator is disabled"));
        }

        let account = account_name
            .map(|name| name.trim().to_string())
            .filter(|name| !name.is_empty())
            .or_else(|| operator.login_handle.clone())
            .unwrap_or_else(|| telegram_id.to_string());
        let provision = self.authenticator.generate(&account)?;

        let token = self
            .setups
            .create(operator.id, &provision.secret, now + self.ttl, now)
            .await?;

        info!(operator_id = operator.id, setup_id = %token.id, "TOTP setup started");

        Ok(SetupStarted {
            setup_id: token.id,
            telegram_id,
            otpauth_url: provision.otpauth_url,
            secret: provision.secret,
            qr_code_data_url: provision.qr_code_data_url,
            expires_at: token.expires_at,
        })
    }

    /// Verify `code` against the pending secret and enable TOTP.
    pub async fn confirm_setup(&self, setup_id: Uuid, code: &str) -> AppResult<()> {
        let now = self.clock.now();
        let token = self
            .setups
            .find_active(setup_id, now)
            .await?
            .ok_or_else(AppError::challenge_expired)?;

        if !self.authenticator.validate(&token.secret, code.trim(), now) {
            return Err(AppError::unauthorized("Invalid code"));
        }

        let token = self
            .setups
            .consume(setup_id, now)
            .await?
            .ok_or_else(AppError::challenge_expired)?;

        let sealed = self.envelope.seal(&token.secret)?;
        if !self.operators.enable_totp(token.operator_id, &sealed, now).await? {
            return Err(AppError::unauthorized("Unknown operator"));
        }

        info!(operator_id = token.operator_id, "TOTP enabled");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use totp_rs::{Algorithm, Secret, TOTP};
    use warden_core::clock::ManualClock;
    use warden_core::error::ErrorKind;
    use warden_database::MemoryStore;
    use warden_entity::operator::{CreateOperator, Role};

    const KEY: &str = "0123456789abcdef0123456789abcdef";

    fn code_for(secret: &str, at: DateTime<Utc>) -> String {
        let bytes = Secret::Encoded(secret.to_string()).to_bytes().unwrap();
        TOTP::new_unchecked(Algorithm::SHA1, 6, 1, 30, bytes, None, String::new())
            .generate(at.timestamp() as u64)
    }

    async fn fixture(active: bool) -> (Arc<MemoryStore>, TotpEnrollment, Arc<ManualClock>) {
        let now = Utc.with_ymd_and_hms(2026, 5, 1, 9, 0, 0).unwrap();
        let store = Arc::new(MemoryStore::new());
        let op = OperatorStore::create(
            store.as_ref(),
            &CreateOperator {
                external_id: 42,
                login_handle: Some("alice".into()),
                display_name: None,
                role: Role::Admin,
                password_hash: "x".into(),
            },
            now,
        )
        .await
        .unwrap();
        if !active {
            store.set_active(op.id, false, now).await.unwrap();
        }
        let clock = Arc::new(ManualClock::new(now));
        let envelope = SecretEnvelope::new(KEY, now).unwrap();
        let enrollment = TotpEnrollment::new(
            store.clone(),
            store.clone(),
            Arc::new(TotpAuthenticator::new("Warden")),
            Arc::new(envelope),
            &AuthConfig::default(),
            clock.clone(),
        );
        (store, enrollment, clock)
    }

    #[tokio::test]
    async fn test_round_trip_enables_sealed_secret() {
        let (store, enrollment, clock) = fixture(true).await;
        let started = enrollment.start_setup(42, None).await.unwrap();
        assert!(started.otpauth_url.contains("alice"));
        assert!(started.qr_code_data_url.starts_with("data:image/png;base64,"));

        let code = code_for(&started.secret, clock.now());
        enrollment.confirm_setup(started.setup_id, &code).await.unwrap();

        let op = store.find_by_external_id(42).await.unwrap().unwrap();
        assert!(op.has_totp());
        let sealed = op.totp_secret.unwrap();
        assert!(sealed.starts_with("enc:v1:"));
        let opened = SecretEnvelope::new(KEY, clock.now())
            .unwrap()
            .open(&sealed, clock.now())
            .unwrap();
        assert_eq!(opened.secret, started.secret);

        let again = enrollment.confirm_setup(started.setup_id, &code).await;
        assert!(again.unwrap_err().is(ErrorKind::ChallengeExpired));
    }

    #[tokio::test]
    async fn test_wrong_code_keeps_token() {
        let (store, enrollment, clock) = fixture(true).await;
        let started = enrollment.start_setup(42, Some("ops".into())).await.unwrap();

        let err = enrollment
            .confirm_setup(started.setup_id, "000000x")
            .await
            .unwrap_err();
        assert!(err.is(ErrorKind::Unauthorized));
        assert!(!store.find_by_external_id(42).await.unwrap().unwrap().totp_enabled);

        let code = code_for(&started.secret, clock.now());
        assert!(enrollment.confirm_setup(started.setup_id, &code).await.is_ok());
    }

    #[tokio::test]
    async fn test_expired_token_rejected() {
        let (_, enrollment, clock) = fixture(true).await;
        let started = enrollment.start_setup(42, None).await.unwrap();
        clock.advance(Duration::minutes(11));
        let code = code_for(&started.secret, clock.now());
        let err = enrollment
            .confirm_setup(started.setup_id, &code)
            .await
            .unwrap_err();
        assert!(err.is(ErrorKind::ChallengeExpired));
    }

    #[tokio::test]
    async fn test_start_requires_active_known_operator() {
        let (_, enrollment, _) = fixture(false).await;
        assert!(enrollment.start_setup(42, None).await.unwrap_err().is(ErrorKind::Forbidden));
        assert!(enrollment.start_setup(7, None).await.unwrap_err().is(ErrorKind::Unauthorized));
    }
}
