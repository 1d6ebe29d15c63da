//! What each role may do.

use serde::{Deserialize, Serialize};

use warden_entity::operator::Role;

/// A bot action gated by role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Capability {
    /// Lease and decide moderation items.
    Moderate,
    /// Look up user profiles.
    Lookup,
    /// Ban and unban users.
    Ban,
    /// Send a profile back to the queue.
    ForceReview,
    /// Grant and revoke staff roles.
    ManageRoles,
    /// Flip system flags.
    SystemToggles,
    /// See population counts.
    ViewUsersCount,
    /// See work stats.
    ViewStats,
}

impl Capability {
    /// Every capability.
    pub const ALL: [Capability; 8] = [
        Self::Moderate,
        Self::Lookup,
        Self::Ban,
        Self::ForceReview,
        Self::ManageRoles,
        Self::SystemToggles,
        Self::ViewUsersCount,
        Self::ViewStats,
    ];

    /// Whether `role` holds this capability.
    pub fn granted_to(self, role: Role) -> bool {
        match role {
            Role::Owner => true,
            Role::Admin => self != Self::SystemToggles,
            Role::Moderator => matches!(self, Self::Moderate | Self::ViewStats),
            Role::None => false,
        }
    }

    /// Human-readable verb phrase for error messages.
    pub fn describe(self) -> &'static str {
        match self {
            Self::Moderate => "moderate profiles",
            Self::Lookup => "look up users",
            Self::Ban => "ban users",
            Self::ForceReview => "force a review",
            Self::ManageRoles => "manage roles",
            Self::SystemToggles => "change system flags",
            Self::ViewUsersCount => "view user counts",
            Self::ViewStats => "view work stats",
        }
    }
}

/// Whether `actor` may grant or revoke `target`.
///
/// OWNER manages ADMIN and MODERATOR; ADMIN manages MODERATOR. OWNER is
/// never assignable.
pub fn can_assign(actor: Role, target: Role) -> bool {
    matches!(
        (actor, target),
        (Role::Owner, Role::Admin | Role::Moderator) | (Role::Admin, Role::Moderator)
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_grant_matrix() {
        assert!(can_assign(Role::Owner, Role::Admin));
        assert!(can_assign(Role::Owner, Role::Moderator));
        assert!(can_assign(Role::Admin, Role::Moderator));

        assert!(!can_assign(Role::Admin, Role::Admin));
        assert!(!can_assign(Role::Moderator, Role::Moderator));
        assert!(!can_assign(Role::None, Role::Moderator));
        for actor in [Role::Owner, Role::Admin, Role::Moderator, Role::None] {
            assert!(!can_assign(actor, Role::Owner));
            assert!(!can_assign(actor, Role::None));
        }
    }

    #[test]
    fn test_capabilities_per_role() {
        assert!(Capability::ALL.iter().all(|c| c.granted_to(Role::Owner)));
        assert!(!Capability::SystemToggles.granted_to(Role::Admin));
        assert!(Capability::ManageRoles.granted_to(Role::Admin));

        let moderator: Vec<_> = Capability::ALL
            .into_iter()
            .filter(|c| c.granted_to(Role::Moderator))
            .collect();
        assert_eq!(moderator, vec![Capability::Moderate, Capability::ViewStats]);
        assert!(Capability::ALL.iter().all(|c| !c.granted_to(Role::None)));
    }
}
