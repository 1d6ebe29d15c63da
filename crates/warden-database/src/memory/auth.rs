//! Operator, challenge, enrollment and session tables.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use warden_core::error::AppError;
use warden_core::result::AppResult;
use warden_entity::auth::{
    ChallengeStatus, CreateChallenge, CreateSession, LoginChallenge, Session, TotpSetupToken,
};
use warden_entity::operator::{CreateOperator, FailureOutcome, Operator};

use super::MemoryStore;
use crate::store::{ChallengeStore, OperatorStore, SessionStore, TotpSetupStore};

#[async_trait]
impl OperatorStore for MemoryStore {
    async fn find_by_id(&self, id: i64) -> AppResult<Option<Operator>> {
        Ok(self.tables.lock().await.operators.get(&id).cloned())
    }

    async fn find_by_external_id(&self, external_id: i64) -> AppResult<Option<Operator>> {
        let tables = self.tables.lock().await;
        Ok(tables
            .operators
            .values()
            .find(|op| op.external_id == external_id)
            .cloned())
    }

    async fn list(&self) -> AppResult<Vec<Operator>> {
        Ok(self.tables.lock().await.operators.values().cloned().collect())
    }

    async fn create(&self, data: &CreateOperator, now: DateTime<Utc>) -> AppResult<Operator> {
        let mut tables = self.tables.lock().await;
        if tables
            .operators
            .values()
            .any(|op| op.external_id == data.external_id)
        {
            return Err(AppError::conflict(format!(
                "Operator with external id {} already exists",
                data.external_id
            )));
        }
        let id = tables.next_id();
        let operator = Operator {
            id,
            external_id: data.external_id,
            login_handle: data.login_handle.clone(),
            display_name: data.display_name.clone(),
            role: data.role,
            password_hash: data.password_hash.clone(),
            totp_secret: None,
            totp_enabled: false,
            is_active: true,
            failed_attempts: 0,
            locked_until: None,
            created_at: now,
            updated_at: now,
        };
        tables.operators.insert(id, operator.clone());
        Ok(operator)
    }

    async fn register_failure(
        &self,
        id: i64,
        threshold: i32,
        lock_until: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> AppResult<Option<FailureOutcome>> {
        let mut tables = self.tables.lock().await;
        let Some(op) = tables.operators.get_mut(&id) else {
            return Ok(None);
        };
        op.failed_attempts += 1;
        if op.failed_attempts >= threshold {
            op.locked_until = Some(lock_until);
        }
        op.updated_at = now;
        Ok(Some(FailureOutcome {
            failed_attempts: op.failed_attempts,
            locked_until: op.locked_until,
        }))
    }

    async fn reset_failures(&self, id: i64, now: DateTime<Utc>) -> AppResult<bool> {
        let mut tables = self.tables.lock().await;
        Ok(match tables.operators.get_mut(&id) {
            Some(op) => {
                op.failed_attempts = 0;
                op.locked_until = None;
                op.updated_at = now;
                true
            }
            None => false,
        })
    }

    async fn enable_totp(
        &self,
        id: i64,
        sealed_secret: &str,
        now: DateTime<Utc>,
    ) -> AppResult<bool> {
        let mut tables = self.tables.lock().await;
        Ok(match tables.operators.get_mut(&id) {
            Some(op) => {
                op.totp_secret = Some(sealed_secret.to_string());
                op.totp_enabled = true;
                op.updated_at = now;
                true
            }
            None => false,
        })
    }

    async fn replace_totp_secret(
        &self,
        id: i64,
        sealed_secret: &str,
        now: DateTime<Utc>,
    ) -> AppResult<bool> {
        let mut tables = self.tables.lock().await;
        Ok(match tables.operators.get_mut(&id) {
            Some(op) => {
                op.totp_secret = Some(sealed_secret.to_string());
                op.updated_at = now;
                true
            }
            None => false,
        })
    }

    async fn disable_totp(&self, id: i64, now: DateTime<Utc>) -> AppResult<bool> {
        let mut tables = self.tables.lock().await;
        Ok(match tables.operators.get_mut(&id) {
            Some(op) => {
                op.totp_secret = None;
                op.totp_enabled = false;
                op.updated_at = now;
                true
            }
            None => false,
        })
    }

    async fn set_active(&self, id: i64, active: bool, now: DateTime<Utc>) -> AppResult<bool> {
        let mut tables = self.tables.lock().await;
        Ok(match tables.operators.get_mut(&id) {
            Some(op) => {
                op.is_active = active;
                op.updated_at = now;
                true
            }
            None => false,
        })
    }
}

#[async_trait]
impl ChallengeStore for MemoryStore {
    async fn create(
        &self,
        data: &CreateChallenge,
        now: DateTime<Utc>,
    ) -> AppResult<LoginChallenge> {
        let challenge = LoginChallenge {
            id: Uuid::new_v4(),
            operator_id: data.operator_id,
            status: ChallengeStatus::TelegramVerified,
            expires_at: data.expires_at,
            ip: data.ip.clone(),
            user_agent: data.user_agent.clone(),
            created_at: now,
            updated_at: now,
        };
        self.tables
            .lock()
            .await
            .challenges
            .insert(challenge.id, challenge.clone());
        Ok(challenge)
    }

    async fn find_active(
        &self,
        id: Uuid,
        now: DateTime<Utc>,
    ) -> AppResult<Option<LoginChallenge>> {
        let tables = self.tables.lock().await;
        Ok(tables
            .challenges
            .get(&id)
            .filter(|c| c.is_active(now))
            .cloned())
    }

    async fn advance(
        &self,
        id: Uuid,
        from: ChallengeStatus,
        to: ChallengeStatus,
        now: DateTime<Utc>,
    ) -> AppResult<bool> {
        let mut tables = self.tables.lock().await;
        match tables.challenges.get_mut(&id) {
            Some(c) if c.status == from && c.is_active(now) => {
                c.status = to;
                c.updated_at = now;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn expire(&self, id: Uuid, now: DateTime<Utc>) -> AppResult<()> {
        let mut tables = self.tables.lock().await;
        if let Some(c) = tables.challenges.get_mut(&id).filter(|c| c.is_active(now)) {
            c.expires_at = now;
            c.updated_at = now;
        }
        Ok(())
    }

    async fn purge_expired(&self, before: DateTime<Utc>) -> AppResult<u64> {
        let mut tables = self.tables.lock().await;
        let len = tables.challenges.len();
        tables.challenges.retain(|_, c| c.expires_at > before);
        Ok((len - tables.challenges.len()) as u64)
    }
}

#[async_trait]
impl TotpSetupStore for MemoryStore {
    async fn create(
        &self,
        operator_id: i64,
        secret: &str,
        expires_at: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> AppResult<TotpSetupToken> {
        let token = TotpSetupToken {
            id: Uuid::new_v4(),
            operator_id,
            secret: secret.to_string(),
            expires_at,
            created_at: now,
        };
        self.tables
            .lock()
            .await
            .totp_setups
            .insert(token.id, token.clone());
        Ok(token)
    }

    async fn find_active(
        &self,
        id: Uuid,
        now: DateTime<Utc>,
    ) -> AppResult<Option<TotpSetupToken>> {
        let tables = self.tables.lock().await;
        Ok(tables
            .totp_setups
            .get(&id)
            .filter(|t| now < t.expires_at)
            .cloned())
    }

    async fn consume(&self, id: Uuid, now: DateTime<Utc>) -> AppResult<Option<TotpSetupToken>> {
        let mut tables = self.tables.lock().await;
        let live = tables
            .totp_setups
            .get(&id)
            .is_some_and(|t| now < t.expires_at);
        Ok(if live { tables.totp_setups.remove(&id) } else { None })
    }

    async fn purge_expired(&self, before: DateTime<Utc>) -> AppResult<u64> {
        let mut tables = self.tables.lock().await;
        let len = tables.totp_setups.len();
        tables.totp_setups.retain(|_, t| t.expires_at > before);
        Ok((len - tables.totp_setups.len()) as u64)
    }
}

#[async_trait]
impl SessionStore for MemoryStore {
    async fn create(&self, data: &CreateSession) -> AppResult<Session> {
        let session = Session {
            id: Uuid::new_v4(),
            operator_id: data.operator_id,
            created_at: data.now,
            last_seen_at: data.now,
            idle_expires_at: data.idle_expires_at,
            max_expires_at: data.max_expires_at,
            revoked_at: None,
            ip: data.ip.clone(),
            user_agent: data.user_agent.clone(),
        };
        self.tables
            .lock()
            .await
            .sessions
            .insert(session.id, session.clone());
        Ok(session)
    }

    async fn find(&self, id: Uuid) -> AppResult<Option<Session>> {
        Ok(self.tables.lock().await.sessions.get(&id).cloned())
    }

    async fn touch(
        &self,
        id: Uuid,
        operator_id: i64,
        now: DateTime<Utc>,
        idle_expires_at: DateTime<Utc>,
    ) -> AppResult<Option<Session>> {
        let mut tables = self.tables.lock().await;
        match tables.sessions.get_mut(&id) {
            Some(s) if s.operator_id == operator_id && s.is_active(now) => {
                s.last_seen_at = now;
                s.idle_expires_at = idle_expires_at;
                Ok(Some(s.clone()))
            }
            _ => Ok(None),
        }
    }

    async fn revoke(&self, id: Uuid, operator_id: i64, now: DateTime<Utc>) -> AppResult<bool> {
        let mut tables = self.tables.lock().await;
        match tables.sessions.get_mut(&id) {
            Some(s) if s.operator_id == operator_id && s.is_active(now) => {
                s.revoked_at = Some(now);
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn purge_expired(&self, before: DateTime<Utc>) -> AppResult<u64> {
        let mut tables = self.tables.lock().await;
        let len = tables.sessions.len();
        tables.sessions.retain(|_, s| {
            s.max_expires_at > before
                && s.idle_expires_at > before
                && s.revoked_at.is_none_or(|at| at > before)
        });
        Ok((len - tables.sessions.len()) as u64)
    }
}
