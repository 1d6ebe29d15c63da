//! Profile and media repository implementation.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use warden_core::result::AppResult;
use warden_entity::profile::{MediaKind, MediaRef, Profile, ProfileCounts};

use super::db_err;
use crate::store::ProfileStore;

/// Repository for end-user profiles and their media.
#[derive(Debug, Clone)]
pub struct ProfileRepository {
    pool: PgPool,
}

impl ProfileRepository {
    /// Create a new profile repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ProfileStore for ProfileRepository {
    async fn find(&self, user_id: i64) -> AppResult<Option<Profile>> {
        sqlx::query_as::<_, Profile>("SELECT * FROM profiles WHERE user_id = $1")
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err("Failed to find profile"))
    }

    async fn find_by_username(&self, username: &str) -> AppResult<Option<Profile>> {
        sqlx::query_as::<_, Profile>(
            "SELECT * FROM profiles WHERE LOWER(username) = LOWER($1) \
             ORDER BY updated_at DESC LIMIT 1",
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err("Failed to find profile by username"))
    }

    async fn save(&self, profile: &Profile) -> AppResult<()> {
        sqlx::query(
            "INSERT INTO profiles \
             (user_id, username, display_name, bio, moderation_status, approved, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8) \
             ON CONFLICT (user_id) DO UPDATE SET \
                username = EXCLUDED.username, display_name = EXCLUDED.display_name, \
                bio = EXCLUDED.bio, moderation_status = EXCLUDED.moderation_status, \
                approved = EXCLUDED.approved, updated_at = EXCLUDED.updated_at",
        )
        .bind(profile.user_id)
        .bind(&profile.username)
        .bind(&profile.display_name)
        .bind(&profile.bio)
        .bind(profile.moderation_status)
        .bind(profile.approved)
        .bind(profile.created_at)
        .bind(profile.updated_at)
        .execute(&self.pool)
        .await
        .map_err(db_err("Failed to save profile"))?;
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
        sqlx::query_as::<_, MediaRef>(
            "INSERT INTO media_refs (user_id, kind, position, storage_ref, is_active, created_at) \
             VALUES ($1, $2, $3, $4, TRUE, $5) RETURNING *",
        )
        .bind(user_id)
        .bind(kind)
        .bind(position)
        .bind(storage_ref)
        .bind(now)
        .fetch_one(&self.pool)
        .await
        .map_err(db_err("Failed to add media"))
    }

    async fn active_photos(&self, user_id: i64) -> AppResult<Vec<MediaRef>> {
        sqlx::query_as::<_, MediaRef>(
            "SELECT DISTINCT ON (position) * FROM media_refs \
             WHERE user_id = $1 AND kind = 'photo' AND is_active AND position BETWEEN 1 AND 3 \
             ORDER BY position ASC, created_at DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(db_err("Failed to list photos"))
    }

    async fn latest_circle(&self, user_id: i64) -> AppResult<Option<MediaRef>> {
        sqlx::query_as::<_, MediaRef>(
            "SELECT * FROM media_refs WHERE user_id = $1 AND kind = 'circle' AND is_active \
             ORDER BY created_at DESC, id DESC LIMIT 1",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err("Failed to load circle"))
    }

    async fn counts(&self) -> AppResult<ProfileCounts> {
        sqlx::query_as::<_, ProfileCounts>(
            "SELECT \
                (SELECT COUNT(*) FROM profiles) AS total, \
                (SELECT COUNT(*) FROM profiles WHERE approved) AS approved, \
                (SELECT COUNT(*) FROM profiles WHERE moderation_status = 'PENDING') AS pending, \
                (SELECT COUNT(*) FROM user_bans WHERE banned) AS banned",
        )
        .fetch_one(&self.pool)
        .await
        .map_err(db_err("Failed to count profiles"))
    }
}
