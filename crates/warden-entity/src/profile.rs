//! End-user profile and media references.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::moderation::ModerationStatus;

/// Moderation-relevant slice of an end-user profile.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Profile {
    /// Telegram id.
    pub user_id: i64,
    /// Telegram username, without `@`.
    pub username: Option<String>,
    /// Display name.
    pub display_name: Option<String>,
    /// About text.
    pub bio: Option<String>,
    /// Latest moderation outcome.
    pub moderation_status: ModerationStatus,
    /// Visible to other users.
    pub approved: bool,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Last change.
    pub updated_at: DateTime<Utc>,
}

/// Kind of stored media.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "media_kind", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    /// Still photo at a slot 1..3.
    Photo,
    /// Short round video.
    Circle,
}

/// A stored media object or absolute URL.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct MediaRef {
    /// Row id.
    pub id: i64,
    /// Owner.
    pub user_id: i64,
    /// Kind.
    pub kind: MediaKind,
    /// Slot for photos.
    pub position: Option<i32>,
    /// Object key or `http(s)://` URL.
    pub storage_ref: String,
    /// Soft-delete flag.
    pub is_active: bool,
    /// Upload time.
    pub created_at: DateTime<Utc>,
}

/// Profile population shown by the users-count screen.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct ProfileCounts {
    /// All profiles.
    pub total: i64,
    /// Approved profiles.
    pub approved: i64,
    /// Profiles waiting for review.
    pub pending: i64,
    /// Currently banned users.
    pub banned: i64,
}
