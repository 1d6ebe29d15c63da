//! Login challenge state machine.
//!
//! A challenge moves `TELEGRAM_VERIFIED -> TOTP_VERIFIED -> COMPLETED`.
//! Every transition is a conditional update in the store, so two racing
//! requests for the same stage produce exactly one winner.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use tracing::{info, warn};
use uuid::Uuid;

use warden_core::clock::Clock;
use warden_core::config::AuthConfig;
use warden_core::error::AppError;
use warden_core::result::AppResult;
use warden_database::Stores;
use warden_entity::auth::{ChallengeStatus, CreateChallenge, LoginChallenge};
use warden_entity::operator::Operator;

use crate::password::PasswordHasher;
use crate::session::SessionManager;
use crate::telegram::InitDataValidator;
use crate::token::TokenCodec;
use crate::totp::{SecretEnvelope, TotpAuthenticator};

use super::throttle::LoginThrottle;

/// Stage 1 input.
#[derive(Debug, Clone, Default)]
pub struct StartLogin {
    /// Raw `initData` or, in development, a bare Telegram id.
    pub init_data: String,
    /// Client IP.
    pub ip: Option<String>,
    /// Client user agent.
    pub user_agent: Option<String>,
}

/// Stage 1 result.
#[derive(Debug, Clone)]
pub struct ChallengeStarted {
    /// Challenge to carry into stage 2.
    pub challenge_id: Uuid,
    /// Always `"2fa"`.
    pub next_step: &'static str,
    /// Telegram username, if known.
    pub username: Option<String>,
}

/// Stage 2 result.
#[derive(Debug, Clone)]
pub struct FactorAccepted {
    /// Same challenge.
    pub challenge_id: Uuid,
    /// Always `"password"`.
    pub next_step: &'static str,
}

/// Stage 3 result.
#[derive(Debug, Clone)]
pub struct LoginCompleted {
    /// Signed bearer token.
    pub access_token: String,
    /// Always `"Bearer"`.
    pub token_type: &'static str,
    /// Token expiry.
    pub expires_at: DateTime<Utc>,
    /// Session bound to the token.
    pub session_id: Uuid,
    /// The authenticated operator, counters already reset.
    pub operator: Operator,
}

/// Drives the three-factor login protocol.
#[derive(Debug)]
pub struct LoginManager {
    stores: Stores,
    validator: InitDataValidator,
    hasher: PasswordHasher,
    authenticator: Arc<TotpAuthenticator>,
    envelope: Arc<SecretEnvelope>,
    codec: Arc<TokenCodec>,
    sessions: Arc<SessionManager>,
    throttle: Arc<LoginThrottle>,
    challenge_ttl: Duration,
    max_failed_attempts: i32,
    lockout: Duration,
    clock: Arc<dyn Clock>,
}

impl LoginManager {
    /// Wire the state machine.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        stores: Stores,
        validator: InitDataValidator,
        hasher: PasswordHasher,
        authenticator: Arc<TotpAuthenticator>,
        envelope: Arc<SecretEnvelope>,
        codec: Arc<TokenCodec>,
        sessions: Arc<SessionManager>,
        throttle: Arc<LoginThrottle>,
        config: &AuthConfig,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            stores,
            validator,
            hasher,
            authenticator,
            envelope,
            codec,
            sessions,
            throttle,
            challenge_ttl: Duration::milliseconds(config.challenge_ttl_ms as i64),
            max_failed_attempts: config.max_failed_attempts,
            lockout: Duration::minutes(config.lockout_minutes as i64),
            clock,
        }
    }

    /// Stage 1: prove the Telegram identity and open a challenge.
    pub async fn start_telegram(&self, input: StartLogin) -> AppResult<ChallengeStarted> {
        self.throttle.check(input.ip.as_deref())?;
        let now = self.clock.now();

        let identity = self.validator.validate(&input.init_data, now)?;
        let operator = self
            .stores
            .operators
            .find_by_external_id(identity.user_id)
            .await?
            .ok_or_else(bad_credentials)?;
        admit(&operator, now)?;

        let challenge = self
            .stores
            .challenges
            .create(
                &CreateChallenge {
                    operator_id: operator.id,
                    expires_at: now + self.challenge_ttl,
                    ip: input.ip,
                    user_agent: input.user_agent,
                },
                now,
            )
            .await?;

        info!(operator_id = operator.id, challenge_id = %challenge.id, "Login challenge opened");

        Ok(ChallengeStarted {
            challenge_id: challenge.id,
            next_step: "2fa",
            username: identity.username.or(operator.login_handle),
        })
    }

    /// Stage 2: check the TOTP code.
    pub async fn verify_totp(
        &self,
        challenge_id: Uuid,
        code: &str,
        ip: Option<&str>,
    ) -> AppResult<FactorAccepted> {
        self.throttle.check(ip)?;
        let now = self.clock.now();
        let (_, operator) = self
            .load_stage(challenge_id, ChallengeStatus::TelegramVerified, now)
            .await?;

        let sealed = operator
            .totp_secret
            .as_deref()
            .ok_or_else(AppError::totp_not_configured)?;
        let opened = self.envelope.open(sealed, now)?;

        if !self.authenticator.validate(&opened.secret, code.trim(), now) {
            return Err(self.record_failure(&operator, now).await);
        }

        let advanced = self
            .stores
            .challenges
            .advance(
                challenge_id,
                ChallengeStatus::TelegramVerified,
                ChallengeStatus::TotpVerified,
                now,
            )
            .await?;
        if !advanced {
            return Err(AppError::challenge_expired());
        }

        if opened.legacy {
            self.reseal(&operator, &opened.secret, now).await;
        }

        Ok(FactorAccepted {
            challenge_id,
            next_step: "password",
        })
    }

    /// Stage 3: check the password, open a session and mint a token.
    pub async fn verify_password(
        &self,
        challenge_id: Uuid,
        password: &str,
        ip: Option<&str>,
        user_agent: Option<&str>,
    ) -> AppResult<LoginCompleted> {
        self.throttle.check(ip)?;
        let now = self.clock.now();
        let (challenge, operator) = self
            .load_stage(challenge_id, ChallengeStatus::TotpVerified, now)
            .await?;

        if !self.check_password(&operator, password).await? {
            return Err(self.record_failure(&operator, now).await);
        }

        self.stores.operators.reset_failures(operator.id, now).await?;

        let session = self
            .sessions
            .open(
                operator.id,
                ip.map(str::to_string).or(challenge.ip),
                user_agent.map(str::to_string).or(challenge.user_agent),
            )
            .await?;
        let issued = self.codec.issue(&operator, session.id, now)?;

        let completed = self
            .stores
            .challenges
            .advance(
                challenge_id,
                ChallengeStatus::TotpVerified,
                ChallengeStatus::Completed,
                now,
            )
            .await?;
        if !completed {
            if let Err(e) = self.sessions.revoke(session.id, operator.id).await {
                warn!(session_id = %session.id, error = %e, "Failed to revoke orphaned session");
            }
            return Err(AppError::challenge_expired());
        }

        if let Err(e) = self.stores.challenges.expire(challenge_id, now).await {
            warn!(challenge_id = %challenge_id, error = %e, "Failed to expire completed challenge");
        }

        info!(operator_id = operator.id, session_id = %session.id, "Operator signed in");

        Ok(LoginCompleted {
            access_token: issued.token,
            token_type: "Bearer",
            expires_at: issued.expires_at,
            session_id: session.id,
            operator: Operator {
                failed_attempts: 0,
                locked_until: None,
                ..operator
            },
        })
    }

    async fn load_stage(
        &self,
        challenge_id: Uuid,
        expected: ChallengeStatus,
        now: DateTime<Utc>,
    ) -> AppResult<(LoginChallenge, Operator)> {
        let challenge = self
            .stores
            .challenges
            .find_active(challenge_id, now)
            .await?
            .ok_or_else(AppError::challenge_expired)?;
        if challenge.status != expected {
            return Err(AppError::invalid_step());
        }

        let operator = self
            .stores
            .operators
            .find_by_id(challenge.operator_id)
            .await?
            .ok_or_else(bad_credentials)?;
        admit(&operator, now)?;
        Ok((challenge, operator))
    }

    async fn check_password(&self, operator: &Operator, password: &str) -> AppResult<bool> {
        let hasher = self.hasher.clone();
        let hash = operator.password_hash.clone();
        let password = password.to_string();
        tokio::task::spawn_blocking(move || hasher.verify_password(&password, &hash))
            .await
            .map_err(|e| AppError::internal(format!("Password check aborted: {e}")))?
    }

    /// Count a failed factor and pick the error to surface.
    async fn record_failure(&self, operator: &Operator, now: DateTime<Utc>) -> AppError {
        let outcome = self
            .stores
            .operators
            .register_failure(
                operator.id,
                self.max_failed_attempts,
                now + self.lockout,
                now,
            )
            .await;

        match outcome {
            Ok(Some(outcome)) if outcome.locked(self.max_failed_attempts, now) => {
                warn!(
                    operator_id = operator.id,
                    failed_attempts = outcome.failed_attempts,
                    "Operator locked out"
                );
                AppError::account_locked()
            }
            Ok(Some(outcome)) => {
                warn!(
                    operator_id = operator.id,
                    failed_attempts = outcome.failed_attempts,
                    "Login factor rejected"
                );
                bad_credentials()
            }
            Ok(None) => bad_credentials(),
            Err(e) => e,
        }
    }

    async fn reseal(&self, operator: &Operator, secret: &str, now: DateTime<Utc>) {
        let sealed = match self.envelope.seal(secret) {
            Ok(sealed) => sealed,
            Err(e) => {
                warn!(operator_id = operator.id, error = %e, "Failed to seal legacy TOTP secret");
                return;
            }
        };
        match self
            .stores
            .operators
            .replace_totp_secret(operator.id, &sealed, now)
            .await
        {
            Ok(_) => info!(operator_id = operator.id, "Legacy TOTP secret sealed"),
            Err(e) => warn!(operator_id = operator.id, error = %e, "Failed to store sealed TOTP secret"),
        }
    }
}

/// Gate shared by every stage.
fn admit(operator: &Operator, now: DateTime<Utc>) -> AppResult<()> {
    if !operator.is_active {
        return Err(AppError::forbidden("Operator is disabled"));
    }
    if operator.is_locked(now) {
        return Err(AppError::account_locked());
    }
    if !operator.has_totp() {
        return Err(AppError::totp_not_configured());
    }
    Ok(())
}

fn bad_credentials() -> AppError {
    AppError::unauthorized("Invalid credentials")
}
