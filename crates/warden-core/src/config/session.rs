//! Session lifetime configuration.

use serde::{Deserialize, Serialize};

/// Server-side session lifetimes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Sliding idle window in minutes.
    #[serde(default = "default_idle_timeout")]
    pub idle_timeout_minutes: u64,
    /// Absolute lifetime in hours; never extended.
    #[serde(default = "default_max_lifetime")]
    pub max_lifetime_hours: u64,
    /// Interval for purging expired challenges, setup tokens and sessions.
    #[serde(default = "default_cleanup_interval")]
    pub cleanup_interval_minutes: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            idle_timeout_minutes: default_idle_timeout(),
            max_lifetime_hours: default_max_lifetime(),
            cleanup_interval_minutes: default_cleanup_interval(),
        }
    }
}

fn default_idle_timeout() -> u64 {
    30
}

fn default_max_lifetime() -> u64 {
    12
}

fn default_cleanup_interval() -> u64 {
    10
}
