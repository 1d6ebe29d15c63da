//! Staff role resolution and management.

use std::sync::Arc;

use serde_json::json;
use tracing::{info, warn};

use warden_core::clock::Clock;
use warden_core::error::AppError;
use warden_core::result::AppResult;
use warden_database::store::RegistryStore;
use warden_entity::audit::AuditAction;
use warden_entity::bot_user::{BotUserTouch, StaffMember};
use warden_entity::operator::Role;

use super::capability::{Capability, can_assign};
use crate::audit::AuditService;
use crate::context::Actor;

/// Outcome of a grant or revoke.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoleChange {
    /// Target Telegram id.
    pub target: i64,
    /// Role granted or revoked.
    pub role: Role,
}

/// Resolves who a bot user is and manages staff assignments.
#[derive(Clone)]
pub struct AccessService {
    registry: Arc<dyn RegistryStore>,
    owner_id: i64,
    clock: Arc<dyn Clock>,
}

impl std::fmt::Debug for AccessService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccessService")
            .field("owner_id", &self.owner_id)
            .finish_non_exhaustive()
    }
}

impl AccessService {
    /// Creates an access service. `owner_id` of zero means no configured owner.
    pub fn new(
        registry: Arc<dyn RegistryStore>,
        owner_id: i64,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            registry,
            owner_id,
            clock,
        }
    }

    /// The role of `external_id`. The configured owner never hits the store.
    pub async fn resolve(&self, external_id: i64) -> AppResult<Role> {
        if self.is_owner(external_id) {
            return Ok(Role::Owner);
        }
        Ok(self
            .registry
            .active_role(external_id)
            .await?
            .unwrap_or(Role::None))
    }

    /// Record the contact and resolve its role.
    pub async fn identify(&self, contact: &BotUserTouch) -> AppResult<Actor> {
        self.registry.touch(contact, self.clock.now()).await?;
        let role = self.resolve(contact.external_id).await?;
        Ok(Actor::new(contact.external_id, role))
    }

    /// Turn `@username` or a numeric id into a Telegram id.
    pub async fn resolve_target(&self, reference: &str) -> AppResult<i64> {
        let reference = reference.trim();
        if let Ok(id) = reference.parse::<i64>() {
            return if id > 0 {
                Ok(id)
            } else {
                Err(AppError::invalid_input("User id must be positive"))
            };
        }

        let username = reference.trim_start_matches('@');
        if username.is_empty() {
            return Err(AppError::invalid_input("Expected @username or numeric id"));
        }
        self.registry
            .find_by_username(username)
            .await?
            .map(|user| user.external_id)
            .ok_or_else(|| AppError::not_found(format!("@{username} has not contacted the bot")))
    }

    /// Give `target` the role `role`, replacing any current assignment.
    pub async fn grant(&self, actor: &Actor, target: i64, role: Role) -> AppResult<RoleChange> {
        self.authorize_change(actor, target, role).await?;

        let audit = AuditService::entry(
            actor,
            AuditAction::RoleGranted,
            json!({ "target": target, "role": role }),
        );
        let assignment = self
            .registry
            .grant(target, role, actor.external_id, &audit, self.clock.now())
            .await?;

        info!(actor = actor.external_id, target, %role, assignment_id = assignment.id, "Role granted");
        Ok(RoleChange { target, role })
    }

    /// Remove `role` from `target` if that is the active assignment.
    pub async fn revoke(&self, actor: &Actor, target: i64, role: Role) -> AppResult<RoleChange> {
        self.authorize_change(actor, target, role).await?;

        let audit = AuditService::entry(
            actor,
            AuditAction::RoleRevoked,
            json!({ "target": target, "role": role }),
        );
        let revoked = self
            .registry
            .revoke(target, role, actor.external_id, &audit, self.clock.now())
            .await?;
        if !revoked {
            return Err(AppError::not_found(format!("{target} does not hold {role}")));
        }

        info!(actor = actor.external_id, target, %role, "Role revoked");
        Ok(RoleChange { target, role })
    }

    /// Active staff, strongest role first.
    pub async fn list_staff(&self, actor: &Actor) -> AppResult<Vec<StaffMember>> {
        actor.require(Capability::ManageRoles)?;
        self.registry.list_staff().await
    }

    /// The actor must be allowed to assign both the requested role and the
    /// role the target holds now, since a grant replaces it.
    async fn authorize_change(&self, actor: &Actor, target: i64, role: Role) -> AppResult<()> {
        actor.require(Capability::ManageRoles)?;
        if !can_assign(actor.role, role) {
            warn!(actor = actor.external_id, target, %role, "Role change refused");
            return Err(AppError::forbidden(format!(
                "{} cannot assign {role}",
                actor.role
            )));
        }
        if self.is_owner(target) || target == actor.external_id {
            return Err(AppError::forbidden("This user's role cannot be changed"));
        }
        let current = self.registry.active_role(target).await?.unwrap_or(Role::None);
        if current != Role::None && !can_assign(actor.role, current) {
            warn!(actor = actor.external_id, target, %current, "Change of a stronger role refused");
            return Err(AppError::forbidden(format!(
                "{} cannot change the role of a {current}",
                actor.role
            )));
        }
        Ok(())
    }

    fn is_owner(&self, external_id: i64) -> bool {
        self.owner_id != 0 && external_id == self.owner_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use warden_core::clock::ManualClock;
    use warden_core::error::ErrorKind;
    use warden_database::MemoryStore;
    use warden_database::store::AuditStore;

    const OWNER: i64 = 1;

    fn service(store: &Arc<MemoryStore>) -> AccessService {
        let clock: Arc<dyn Clock> =
            Arc::new(ManualClock::new(Utc.with_ymd_and_hms(2026, 2, 2, 10, 0, 0).unwrap()));
        AccessService::new(store.clone(), OWNER, clock)
    }

    #[tokio::test]
    async fn test_owner_resolves_without_assignment() {
        let store = Arc::new(MemoryStore::new());
        let access = service(&store);
        assert_eq!(access.resolve(OWNER).await.unwrap(), Role::Owner);
        assert_eq!(access.resolve(2).await.unwrap(), Role::None);
    }

    #[tokio::test]
    async fn test_grant_and_revoke_are_audited() {
        let store = Arc::new(MemoryStore::new());
        let access = service(&store);
        let owner = Actor::new(OWNER, Role::Owner);

        access.grant(&owner, 10, Role::Admin).await.unwrap();
        assert_eq!(access.resolve(10).await.unwrap(), Role::Admin);

        let admin = Actor::new(10, Role::Admin);
        access.grant(&admin, 20, Role::Moderator).await.unwrap();
        access.revoke(&admin, 20, Role::Moderator).await.unwrap();
        assert_eq!(access.resolve(20).await.unwrap(), Role::None);

        let entries = store.recent(10).await.unwrap();
        assert_eq!(entries.len(), 3);
        assert_eq!(entries[0].action, AuditAction::RoleRevoked);
    }

    #[tokio::test]
    async fn test_admin_cannot_touch_admins_or_owner() {
        let store = Arc::new(MemoryStore::new());
        let access = service(&store);
        let admin = Actor::new(10, Role::Admin);

        let err = access.grant(&admin, 30, Role::Admin).await.unwrap_err();
        assert!(err.is(ErrorKind::Forbidden));
        let err = access.revoke(&admin, 30, Role::Admin).await.unwrap_err();
        assert!(err.is(ErrorKind::Forbidden));

        let owner = Actor::new(OWNER, Role::Owner);
        let err = access.grant(&owner, 40, Role::Owner).await.unwrap_err();
        assert!(err.is(ErrorKind::Forbidden));
        let err = access.grant(&admin, OWNER, Role::Moderator).await.unwrap_err();
        assert!(err.is(ErrorKind::Forbidden));

        let moderator = Actor::new(50, Role::Moderator);
        let err = access.grant(&moderator, 60, Role::Moderator).await.unwrap_err();
        assert!(err.is(ErrorKind::Forbidden));

        assert!(store.recent(10).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_admin_cannot_demote_another_admin() {
        let store = Arc::new(MemoryStore::new());
        let access = service(&store);
        let owner = Actor::new(OWNER, Role::Owner);
        let admin = Actor::new(10, Role::Admin);
        access.grant(&owner, 30, Role::Admin).await.unwrap();

        let err = access.grant(&admin, 30, Role::Moderator).await.unwrap_err();
        assert!(err.is(ErrorKind::Forbidden));
        let err = access.revoke(&admin, 30, Role::Moderator).await.unwrap_err();
        assert!(err.is(ErrorKind::Forbidden));
        assert_eq!(access.resolve(30).await.unwrap(), Role::Admin);

        access.grant(&owner, 30, Role::Moderator).await.unwrap();
        assert_eq!(access.resolve(30).await.unwrap(), Role::Moderator);
        access.grant(&admin, 30, Role::Moderator).await.unwrap();
        assert_eq!(store.recent(10).await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_failed_audit_leaves_role_unchanged() {
        let store = Arc::new(MemoryStore::new());
        let access = service(&store);
        let owner = Actor::new(OWNER, Role::Owner);

        store.set_audit_offline(true);
        let err = access.grant(&owner, 10, Role::Admin).await.unwrap_err();
        assert!(err.is(ErrorKind::Database));
        store.set_audit_offline(false);

        assert_eq!(access.resolve(10).await.unwrap(), Role::None);
        assert!(store.recent(10).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_resolve_target_by_username() {
        let store = Arc::new(MemoryStore::new());
        let access = service(&store);
        access
            .identify(&BotUserTouch {
                external_id: 77,
                username: Some("Carol".into()),
                first_name: None,
                last_name: None,
            })
            .await
            .unwrap();

        assert_eq!(access.resolve_target("@carol").await.unwrap(), 77);
        assert_eq!(access.resolve_target("77").await.unwrap(), 77);
        assert!(access.resolve_target("@nobody").await.unwrap_err().is(ErrorKind::NotFound));
        assert!(access.resolve_target("-5").await.unwrap_err().is(ErrorKind::InvalidInput));
    }
}
