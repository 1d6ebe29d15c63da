//! System flags and population counts.

use std::sync::Arc;

use serde_json::json;
use tracing::info;

use warden_core::clock::Clock;
use warden_core::error::AppError;
use warden_core::result::AppResult;
use warden_database::store::{FlagStore, ProfileStore};
use warden_entity::audit::AuditAction;
use warden_entity::flag::{AppFlag, KNOWN_FLAGS};
use warden_entity::profile::ProfileCounts;

use crate::access::Capability;
use crate::audit::AuditService;
use crate::context::Actor;

/// Owner-level switches.
#[derive(Clone)]
pub struct SystemService {
    flags: Arc<dyn FlagStore>,
    profiles: Arc<dyn ProfileStore>,
    audit: AuditService,
    clock: Arc<dyn Clock>,
}

impl std::fmt::Debug for SystemService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SystemService").finish_non_exhaustive()
    }
}

impl SystemService {
    /// Creates a system service.
    pub fn new(
        flags: Arc<dyn FlagStore>,
        profiles: Arc<dyn ProfileStore>,
        audit: AuditService,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            flags,
            profiles,
            audit,
            clock,
        }
    }

    /// All flags.
    pub async fn flags(&self, actor: &Actor) -> AppResult<Vec<AppFlag>> {
        actor.require(Capability::SystemToggles)?;
        self.flags.list().await
    }

    /// Flip a known flag.
    pub async fn toggle(&self, actor: &Actor, key: &str) -> AppResult<AppFlag> {
        actor.require(Capability::SystemToggles)?;
        if !KNOWN_FLAGS.contains(&key) {
            return Err(AppError::invalid_input(format!("Unknown flag '{key}'")));
        }

        let audit = AuditService::entry(actor, AuditAction::SystemToggle, json!({ "key": key }));
        let flag = self
            .flags
            .toggle(key, actor.external_id, &audit, self.clock.now())
            .await?;

        info!(actor = actor.external_id, key, value = flag.value_bool, "Flag toggled");
        Ok(flag)
    }

    /// Profile population.
    pub async fn users_count(&self, actor: &Actor) -> AppResult<ProfileCounts> {
        actor.require(Capability::ViewUsersCount)?;
        let counts = self.profiles.counts().await?;
        self.audit
            .record(actor, AuditAction::UsersCountViewed, json!(counts))
            .await?;
        Ok(counts)
    }
}
