//! Token-to-session binding.

use std::sync::Arc;

use chrono::Duration;
use tracing::info;
use uuid::Uuid;

use warden_core::clock::Clock;
use warden_core::config::SessionConfig;
use warden_core::error::AppError;
use warden_core::result::AppResult;
use warden_database::store::SessionStore;
use warden_entity::auth::{CreateSession, Session};

use crate::token::{Claims, TokenCodec};

/// A request that presented a live token and session.
#[derive(Debug, Clone)]
pub struct AuthenticatedOperator {
    /// Verified claims.
    pub claims: Claims,
    /// Session after the touch.
    pub session: Session,
}

/// Opens, validates and revokes server-side sessions.
pub struct SessionManager {
    store: Arc<dyn SessionStore>,
    codec: Arc<TokenCodec>,
    idle: Duration,
    max_lifetime: Duration,
    clock: Arc<dyn Clock>,
}

impl std::fmt::Debug for SessionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionManager")
            .field("idle", &self.idle)
            .field("max_lifetime", &self.max_lifetime)
            .finish_non_exhaustive()
    }
}

impl SessionManager {
    /// Create a session manager.
    pub fn new(
        store: Arc<dyn SessionStore>,
        codec: Arc<TokenCodec>,
        config: &SessionConfig,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            store,
            codec,
            idle: Duration::minutes(config.idle_timeout_minutes as i64),
            max_lifetime: Duration::hours(config.max_lifetime_hours as i64),
            clock,
        }
    }

    /// Open a session for a freshly authenticated operator.
    pub async fn open(
        &self,
        operator_id: i64,
        ip: Option<String>,
        user_agent: Option<String>,
    ) -> AppResult<Session> {
        let now = self.clock.now();
        self.store
            .create(&CreateSession {
                operator_id,
                now,
                idle_expires_at: now + self.idle,
                max_expires_at: now + self.max_lifetime,
                ip,
                user_agent,
            })
            .await
    }

    /// Check a bearer token and slide its session's idle window.
    ///
    /// A validly signed token whose session is revoked, idle, past its
    /// absolute lifetime, or whose own `exp` has passed yields
    /// `SessionExpired`.
    pub async fn validate(&self, token: &str) -> AppResult<AuthenticatedOperator> {
        let claims = self.codec.parse(token)?;
        let now = self.clock.now();

        if now.timestamp() < claims.nbf {
            return Err(AppError::unauthorized("Token not yet valid"));
        }
        if !claims.is_live(now) {
            return Err(AppError::session_expired());
        }

        let session = self
            .store
            .touch(claims.sid, claims.uid, now, now + self.idle)
            .await?
            .ok_or_else(AppError::session_expired)?;

        Ok(AuthenticatedOperator { claims, session })
    }

    /// Revoke the session named by a bearer token.
    pub async fn logout(&self, token: &str) -> AppResult<()> {
        let claims = self.codec.parse(token)?;
        if !self.revoke(claims.sid, claims.uid).await? {
            return Err(AppError::session_expired());
        }
        info!(operator_id = claims.uid, session_id = %claims.sid, "Session revoked");
        Ok(())
    }

    /// Revoke a session if it is still active.
    pub async fn revoke(&self, session_id: Uuid, operator_id: i64) -> AppResult<bool> {
        self.store
            .revoke(session_id, operator_id, self.clock.now())
            .await
    }
}
