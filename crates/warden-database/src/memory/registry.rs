//! Bot registry, role assignments, profiles and media.

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use warden_core::result::AppResult;
use warden_entity::audit::CreateAuditEntry;
use warden_entity::bot_user::{BotUser, BotUserTouch, RoleAssignment, StaffMember};
use warden_entity::moderation::ModerationStatus;
use warden_entity::operator::Role;
use warden_entity::profile::{MediaKind, MediaRef, Profile, ProfileCounts};

use super::MemoryStore;
use crate::store::{ProfileStore, RegistryStore};

fn same_username(stored: Option<&str>, wanted: &str) -> bool {
    stored.is_some_and(|name| name.eq_ignore_ascii_case(wanted))
}

#[async_trait]
impl RegistryStore for MemoryStore {
    async fn touch(&self, user: &BotUserTouch, now: DateTime<Utc>) -> AppResult<BotUser> {
        let mut tables = self.tables.lock().await;
        let row = tables
            .bot_users
            .entry(user.external_id)
            .or_insert_with(|| BotUser {
                external_id: user.external_id,
                username: None,
                first_name: None,
                last_name: None,
                first_seen_at: now,
                last_seen_at: now,
            });
        row.username = user.username.clone();
        row.first_name = user.first_name.clone();
        row.last_name = user.last_name.clone();
        row.last_seen_at = now;
        Ok(row.clone())
    }

    async fn find_by_username(&self, username: &str) -> AppResult<Option<BotUser>> {
        let tables = self.tables.lock().await;
        Ok(tables
            .bot_users
            .values()
            .filter(|user| same_username(user.username.as_deref(), username))
            .max_by_key(|user| user.last_seen_at)
            .cloned())
    }

    async fn active_role(&self, external_id: i64) -> AppResult<Option<Role>> {
        let tables = self.tables.lock().await;
        Ok(tables
            .assignments
            .iter()
            .find(|a| a.external_id == external_id && a.revoked_at.is_none())
            .map(|a| a.role))
    }

    async fn grant(
        &self,
        external_id: i64,
        role: Role,
        granted_by: i64,
        audit: &CreateAuditEntry,
        now: DateTime<Utc>,
    ) -> AppResult<RoleAssignment> {
        let mut tables = self.tables.lock().await;
        self.audit_writable()?;
        for active in tables
            .assignments
            .iter_mut()
            .filter(|a| a.external_id == external_id && a.revoked_at.is_none())
        {
            active.revoked_at = Some(now);
            active.revoked_by = Some(granted_by);
        }

        let assignment = RoleAssignment {
            id: tables.next_id(),
            external_id,
            role,
            granted_by,
            granted_at: now,
            revoked_by: None,
            revoked_at: None,
        };
        tables.assignments.push(assignment.clone());
        tables.push_audit(audit, now);
        Ok(assignment)
    }

    async fn revoke(
        &self,
        external_id: i64,
        role: Role,
        revoked_by: i64,
        audit: &CreateAuditEntry,
        now: DateTime<Utc>,
    ) -> AppResult<bool> {
        let mut tables = self.tables.lock().await;
        let Some(index) = tables.assignments.iter().position(|a| {
            a.external_id == external_id && a.role == role && a.revoked_at.is_none()
        }) else {
            return Ok(false);
        };
        self.audit_writable()?;

        let assignment = &mut tables.assignments[index];
        assignment.revoked_at = Some(now);
        assignment.revoked_by = Some(revoked_by);
        tables.push_audit(audit, now);
        Ok(true)
    }

    async fn list_staff(&self) -> AppResult<Vec<StaffMember>> {
        let tables = self.tables.lock().await;
        let mut staff: Vec<StaffMember> = tables
            .assignments
            .iter()
            .filter(|a| a.revoked_at.is_none())
            .map(|a| StaffMember {
                external_id: a.external_id,
                role: a.role,
                username: tables
                    .bot_users
                    .get(&a.external_id)
                    .and_then(|u| u.username.clone()),
                granted_at: a.granted_at,
            })
            .collect();
        staff.sort_by_key(|m| (m.role, m.external_id));
        Ok(staff)
    }
}

#[async_trait]
impl ProfileStore for MemoryStore {
    async fn find(&self, user_id: i64) -> AppResult<Option<Profile>> {
        Ok(self.tables.lock().await.profiles.get(&user_id).cloned())
    }

    async fn find_by_username(&self, username: &str) -> AppResult<Option<Profile>> {
        let tables = self.tables.lock().await;
        Ok(tables
            .profiles
            .values()
            .filter(|p| same_username(p.username.as_deref(), username))
            .max_by_key(|p| p.updated_at)
            .cloned())
    }

    async fn save(&self, profile: &Profile) -> AppResult<()> {
        let mut tables = self.tables.lock().await;
        let created_at = tables
            .profiles
            .get(&profile.user_id)
            .map_or(profile.created_at, |existing| existing.created_at);
        tables.profiles.insert(
            profile.user_id,
            Profile {
                created_at,
                ..profile.clone()
            },
        );
        Ok(())
    }

    async fn add_media(
        &self,
        user_id: i64,
        kind: MediaKind,
        position: Option<i32>,
        storage_ref: &str,
        now: DateTime<Utc>,
    ) -> AppResult<MediaRef> {
        let mut tables = self.tables.lock().await;
        let media = MediaRef {
            id: tables.next_id(),
            user_id,
            kind,
            position,
            storage_ref: storage_ref.to_string(),
            is_active: true,
            created_at: now,
        };
        tables.media.push(media.clone());
        Ok(media)
    }

    async fn active_photos(&self, user_id: i64) -> AppResult<Vec<MediaRef>> {
        let tables = self.tables.lock().await;
        let mut slots: BTreeMap<i32, &MediaRef> = BTreeMap::new();
        for media in tables.media.iter().filter(|m| {
            m.user_id == user_id && m.kind == MediaKind::Photo && m.is_active
        }) {
            let Some(position) = media.position.filter(|p| (1..=3).contains(p)) else {
                continue;
            };
            let newer = slots
                .get(&position)
                .is_none_or(|held| (media.created_at, media.id) > (held.created_at, held.id));
            if newer {
                slots.insert(position, media);
            }
        }
        Ok(slots.into_values().cloned().collect())
    }

    async fn latest_circle(&self, user_id: i64) -> AppResult<Option<MediaRef>> {
        let tables = self.tables.lock().await;
        Ok(tables
            .media
            .iter()
            .filter(|m| m.user_id == user_id && m.kind == MediaKind::Circle && m.is_active)
            .max_by_key(|m| (m.created_at, m.id))
            .cloned())
    }

    async fn counts(&self) -> AppResult<ProfileCounts> {
        let tables = self.tables.lock().await;
        let count = |pred: &dyn Fn(&Profile) -> bool| {
            tables.profiles.values().filter(|p| pred(p)).count() as i64
        };
        Ok(ProfileCounts {
            total: tables.profiles.len() as i64,
            approved: count(&|p| p.approved),
            pending: count(&|p| p.moderation_status == ModerationStatus::Pending),
            banned: tables.bans.values().filter(|b| b.banned).count() as i64,
        })
    }
}
