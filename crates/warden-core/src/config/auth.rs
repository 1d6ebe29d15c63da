//! Authentication configuration.

use serde::{Deserialize, Serialize};

/// Login protocol, token and lockout settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// HMAC secret used to sign bearer tokens.
    #[serde(default)]
    pub jwt_secret: String,
    /// Bearer token lifetime in minutes.
    #[serde(default = "default_jwt_ttl")]
    pub jwt_ttl_minutes: u64,
    /// Login challenge lifetime in milliseconds.
    #[serde(default = "default_challenge_ttl")]
    pub challenge_ttl_ms: u64,
    /// TOTP enrollment token lifetime in minutes.
    #[serde(default = "default_setup_ttl")]
    pub totp_setup_ttl_minutes: u64,
    /// Failed factor checks before the account locks.
    #[serde(default = "default_max_failed_attempts")]
    pub max_failed_attempts: i32,
    /// Lockout duration in minutes.
    #[serde(default = "default_lockout")]
    pub lockout_minutes: u64,
    /// Login attempts accepted per client IP per minute.
    #[serde(default = "default_attempts_per_minute")]
    pub login_attempts_per_minute: u32,
    /// Argon2id work factor.
    #[serde(default)]
    pub password: PasswordConfig,
}

/// Argon2id parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PasswordConfig {
    /// Memory cost in KiB.
    #[serde(default = "default_memory_kib")]
    pub memory_kib: u32,
    /// Number of passes.
    #[serde(default = "default_iterations")]
    pub iterations: u32,
    /// Degree of parallelism.
    #[serde(default = "default_parallelism")]
    pub parallelism: u32,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: String::new(),
            jwt_ttl_minutes: default_jwt_ttl(),
            challenge_ttl_ms: default_challenge_ttl(),
            totp_setup_ttl_minutes: default_setup_ttl(),
            max_failed_attempts: default_max_failed_attempts(),
            lockout_minutes: default_lockout(),
            login_attempts_per_minute: default_attempts_per_minute(),
            password: PasswordConfig::default(),
        }
    }
}

impl Default for PasswordConfig {
    fn default() -> Self {
        Self {
            memory_kib: default_memory_kib(),
            iterations: default_iterations(),
            parallelism: default_parallelism(),
        }
    }
}

fn default_jwt_ttl() -> u64 {
    720
}

fn default_challenge_ttl() -> u64 {
    300_000
}

fn default_setup_ttl() -> u64 {
    10
}

fn default_max_failed_attempts() -> i32 {
    5
}

fn default_lockout() -> u64 {
    15
}

fn default_attempts_per_minute() -> u32 {
    30
}

fn default_memory_kib() -> u32 {
    19_456
}

fn default_iterations() -> u32 {
    2
}

fn default_parallelism() -> u32 {
    1
}
