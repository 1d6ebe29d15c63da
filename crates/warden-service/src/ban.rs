//! Ban and unban end users.

use std::sync::Arc;

use serde_json::json;
use tracing::info;

use warden_core::clock::Clock;
use warden_core::error::AppError;
use warden_core::result::AppResult;
use warden_database::store::BanStore;
use warden_entity::audit::AuditAction;
use warden_entity::ban::UserBan;

use crate::access::Capability;
use crate::audit::AuditService;
use crate::context::Actor;

/// Flips the ban flag on a subject.
#[derive(Clone)]
pub struct BanService {
    bans: Arc<dyn BanStore>,
    clock: Arc<dyn Clock>,
}

impl std::fmt::Debug for BanService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BanService").finish_non_exhaustive()
    }
}

impl BanService {
    /// Creates a ban service.
    pub fn new(bans: Arc<dyn BanStore>, clock: Arc<dyn Clock>) -> Self {
        Self { bans, clock }
    }

    /// Ban `subject`.
    pub async fn ban(&self, actor: &Actor, subject: i64, reason: Option<&str>) -> AppResult<UserBan> {
        self.set(actor, subject, true, reason).await
    }

    /// Lift a ban on `subject`.
    pub async fn unban(&self, actor: &Actor, subject: i64) -> AppResult<UserBan> {
        self.set(actor, subject, false, None).await
    }

    /// Current ban row, if any.
    pub async fn status(&self, subject: i64) -> AppResult<Option<UserBan>> {
        self.bans.find(subject).await
    }

    async fn set(
        &self,
        actor: &Actor,
        subject: i64,
        banned: bool,
        reason: Option<&str>,
    ) -> AppResult<UserBan> {
        actor.require(Capability::Ban)?;
        if subject == actor.external_id {
            return Err(AppError::invalid_input("You cannot ban yourself"));
        }
        let reason = reason.map(str::trim).filter(|r| !r.is_empty());

        let action = if banned {
            AuditAction::UserBanned
        } else {
            AuditAction::UserUnbanned
        };
        let audit = AuditService::entry(actor, action, json!({ "subject": subject, "reason": reason }));
        let ban = self
            .bans
            .upsert(subject, banned, reason, actor.external_id, &audit, self.clock.now())
            .await?;

        info!(actor = actor.external_id, subject, banned, "Ban state changed");
        Ok(ban)
    }
}
