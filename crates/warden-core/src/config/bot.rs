//! Moderation bot configuration.

use serde::{Deserialize, Serialize};

/// Moderation bot settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BotConfig {
    /// Telegram id that always resolves to OWNER. Zero means none.
    #[serde(default)]
    pub owner_id: i64,
    /// Moderation lease length in seconds.
    #[serde(default = "default_lease")]
    pub lease_seconds: u64,
    /// Lifetime of a pending free-text dialog in seconds.
    #[serde(default = "default_dialog_ttl")]
    pub dialog_ttl_seconds: u64,
    /// Maximum number of pending dialogs per kind.
    #[serde(default = "default_dialog_capacity")]
    pub dialog_capacity: u64,
    /// Maximum number of cached moderation cards.
    #[serde(default = "default_cache_capacity")]
    pub lookup_cache_capacity: u64,
    /// Updates handled concurrently.
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            owner_id: 0,
            lease_seconds: default_lease(),
            dialog_ttl_seconds: default_dialog_ttl(),
            dialog_capacity: default_dialog_capacity(),
            lookup_cache_capacity: default_cache_capacity(),
            concurrency: default_concurrency(),
        }
    }
}

fn default_lease() -> u64 {
    600
}

fn default_dialog_ttl() -> u64 {
    300
}

fn default_dialog_capacity() -> u64 {
    10_000
}

fn default_cache_capacity() -> u64 {
    1_000
}

fn default_concurrency() -> usize {
    8
}
