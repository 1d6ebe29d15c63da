//! Profile lookup by username or id.

use std::sync::Arc;

use serde::Serialize;
use serde_json::json;

use warden_core::error::AppError;
use warden_core::result::AppResult;
use warden_database::store::{BanStore, ModerationStore, ProfileStore, RegistryStore};
use warden_entity::audit::AuditAction;
use warden_entity::ban::UserBan;
use warden_entity::moderation::{ModerationItem, RejectReason};
use warden_entity::profile::Profile;

use crate::access::Capability;
use crate::audit::AuditService;
use crate::context::Actor;

/// A parsed lookup query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LookupQuery {
    /// Numeric Telegram id.
    Id(i64),
    /// Username without the leading `@`.
    Username(String),
}

impl LookupQuery {
    /// Accepts `@name`, `name` or a positive integer.
    pub fn parse(raw: &str) -> AppResult<Self> {
        let raw = raw.trim();
        if let Ok(id) = raw.parse::<i64>() {
            return if id > 0 {
                Ok(Self::Id(id))
            } else {
                Err(AppError::invalid_input("User id must be positive"))
            };
        }
        let name = raw.trim_start_matches('@');
        let valid = !name.is_empty()
            && name.len() <= 32
            && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_');
        if !valid {
            return Err(AppError::invalid_input("Send @username or a numeric id"));
        }
        Ok(Self::Username(name.to_string()))
    }
}

/// What staff see about one user.
#[derive(Debug, Clone, Serialize)]
pub struct ProfileCard {
    /// Telegram id.
    pub user_id: i64,
    /// Profile, if the user registered.
    pub profile: Option<Profile>,
    /// Ban row, if any.
    pub ban: Option<UserBan>,
    /// Most recent moderation item.
    pub latest_item: Option<ModerationItem>,
    /// Reason of the last rejection.
    pub last_rejection: Option<RejectReason>,
}

impl ProfileCard {
    /// Whether the user is currently banned.
    pub fn is_banned(&self) -> bool {
        self.ban.as_ref().is_some_and(|b| b.banned)
    }
}

/// Finds users for staff.
#[derive(Clone)]
pub struct LookupService {
    profiles: Arc<dyn ProfileStore>,
    registry: Arc<dyn RegistryStore>,
    bans: Arc<dyn BanStore>,
    queue: Arc<dyn ModerationStore>,
    audit: AuditService,
}

impl std::fmt::Debug for LookupService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LookupService").finish_non_exhaustive()
    }
}

impl LookupService {
    /// Creates a lookup service.
    pub fn new(
        profiles: Arc<dyn ProfileStore>,
        registry: Arc<dyn RegistryStore>,
        bans: Arc<dyn BanStore>,
        queue: Arc<dyn ModerationStore>,
        audit: AuditService,
    ) -> Self {
        Self {
            profiles,
            registry,
            bans,
            queue,
            audit,
        }
    }

    /// Resolve `raw` and load the user's card.
    pub async fn lookup(&self, actor: &Actor, raw: &str) -> AppResult<ProfileCard> {
        actor.require(Capability::Lookup)?;
        let query = LookupQuery::parse(raw)?;

        let card = match &query {
            LookupQuery::Id(id) => self.card(*id).await?,
            LookupQuery::Username(name) => match self.profiles.find_by_username(name).await? {
                Some(profile) => self.card(profile.user_id).await?,
                None => {
                    let contact = self
                        .registry
                        .find_by_username(name)
                        .await?
                        .ok_or_else(|| AppError::not_found(format!("@{name} not found")))?;
                    self.card(contact.external_id).await?
                }
            },
        };

        if card.profile.is_none() && card.latest_item.is_none() && card.ban.is_none() {
            return Err(AppError::not_found(format!("User {} not found", card.user_id)));
        }

        self.audit
            .record(
                actor,
                AuditAction::Lookup,
                json!({ "query": raw.trim(), "user_id": card.user_id }),
            )
            .await?;
        Ok(card)
    }

    /// Card for a known id, without audit.
    pub async fn card(&self, user_id: i64) -> AppResult<ProfileCard> {
        Ok(ProfileCard {
            user_id,
            profile: self.profiles.find(user_id).await?,
            ban: self.bans.find(user_id).await?,
            latest_item: self.queue.latest_for_subject(user_id).await?,
            last_rejection: self.queue.last_rejection(user_id).await?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_query() {
        assert_eq!(LookupQuery::parse(" 123 ").unwrap(), LookupQuery::Id(123));
        assert_eq!(
            LookupQuery::parse("@Some_User").unwrap(),
            LookupQuery::Username("Some_User".into())
        );
        assert_eq!(
            LookupQuery::parse("bob").unwrap(),
            LookupQuery::Username("bob".into())
        );
        assert!(LookupQuery::parse("0").is_err());
        assert!(LookupQuery::parse("@").is_err());
        assert!(LookupQuery::parse("bad name").is_err());
    }
}
