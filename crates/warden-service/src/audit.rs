//! Append-only audit trail for staff actions.
//!
//! Mutations hand their entry to the store, which commits it together with
//! the change. [`AuditService::record`] is for reads that are audited on
//! their own, such as lookups.

use std::sync::Arc;

use serde_json::Value;
use tracing::debug;

use warden_core::clock::Clock;
use warden_core::result::AppResult;
use warden_database::store::AuditStore;
use warden_entity::audit::{AuditAction, AuditEntry, CreateAuditEntry};

use crate::context::Actor;

/// Writes one audit row per successful mutating action.
#[derive(Clone)]
pub struct AuditService {
    store: Arc<dyn AuditStore>,
    clock: Arc<dyn Clock>,
}

impl std::fmt::Debug for AuditService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuditService").finish_non_exhaustive()
    }
}

impl AuditService {
    /// Creates an audit service.
    pub fn new(store: Arc<dyn AuditStore>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    /// Entry attributed to `actor`, to be committed with a mutation.
    pub fn entry(actor: &Actor, action: AuditAction, payload: Value) -> CreateAuditEntry {
        CreateAuditEntry {
            actor_external_id: actor.external_id,
            action,
            payload,
        }
    }

    /// Appends a standalone entry attributed to `actor`.
    pub async fn record(
        &self,
        actor: &Actor,
        action: AuditAction,
        payload: Value,
    ) -> AppResult<AuditEntry> {
        let entry = self
            .store
            .append(&Self::entry(actor, action, payload), self.clock.now())
            .await?;
        debug!(actor = actor.external_id, %action, audit_id = entry.id, "Audit entry appended");
        Ok(entry)
    }

    /// Newest entries first.
    pub async fn recent(&self, limit: i64) -> AppResult<Vec<AuditEntry>> {
        self.store.recent(limit).await
    }
}
