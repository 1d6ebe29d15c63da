//! Application configuration schemas.
//!
//! All configuration structs are deserialized from TOML files via the
//! `config` crate. Each sub-module represents a logical configuration
//! section.

pub mod auth;
pub mod bot;
pub mod database;
pub mod logging;
pub mod media;
pub mod server;
pub mod session;
pub mod stats;
pub mod telegram;
pub mod totp;

use serde::{Deserialize, Serialize};

pub use self::auth::{AuthConfig, PasswordConfig};
pub use self::bot::BotConfig;
pub use self::database::{DatabaseBackend, DatabaseConfig};
pub use self::logging::{LogFormat, LoggingConfig};
pub use self::media::{MediaConfig, MediaProvider};
pub use self::server::ServerConfig;
pub use self::session::SessionConfig;
pub use self::stats::StatsConfig;
pub use self::telegram::TelegramConfig;
pub use self::totp::TotpConfig;

use crate::error::AppError;

/// Upper bound for the HTTP shutdown grace period.
pub const MAX_SHUTDOWN_GRACE_SECONDS: u64 = 10;

/// Root application configuration.
///
/// Top-level deserialization target for the merged TOML configuration
/// (default.toml + environment overlay + `WARDEN__*` variables).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// HTTP server settings.
    #[serde(default)]
    pub server: ServerConfig,
    /// Database connection settings.
    #[serde(default)]
    pub database: DatabaseConfig,
    /// Authentication settings.
    #[serde(default)]
    pub auth: AuthConfig,
    /// Session lifetimes.
    #[serde(default)]
    pub session: SessionConfig,
    /// Telegram credentials and initData policy.
    #[serde(default)]
    pub telegram: TelegramConfig,
    /// TOTP and secret envelope settings.
    #[serde(default)]
    pub totp: TotpConfig,
    /// Moderation bot settings.
    #[serde(default)]
    pub bot: BotConfig,
    /// Media signer settings.
    #[serde(default)]
    pub media: MediaConfig,
    /// Work-stats calendar.
    #[serde(default)]
    pub stats: StatsConfig,
    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Load configuration for a named environment.
    ///
    /// Merges `config/default.toml`, `config/{env}.toml` and environment
    /// variables prefixed with `WARDEN__`.
    pub fn load(env: &str) -> Result<Self, AppError> {
        Self::build(
            config::Config::builder()
                .add_source(config::File::with_name("config/default").required(false))
                .add_source(config::File::with_name(&format!("config/{env}")).required(false)),
        )
    }

    /// Load configuration from an explicit file, still honouring `WARDEN__*` overrides.
    pub fn load_file(path: &str) -> Result<Self, AppError> {
        Self::build(config::Config::builder().add_source(config::File::with_name(path)))
    }

    fn build(
        builder: config::ConfigBuilder<config::builder::DefaultState>,
    ) -> Result<Self, AppError> {
        let config = builder
            .add_source(
                config::Environment::with_prefix("WARDEN")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .map_err(|e| AppError::configuration(format!("Failed to build config: {e}")))?;

        config
            .try_deserialize()
            .map_err(|e| AppError::configuration(format!("Failed to deserialize config: {e}")))
    }

    /// Checks invariants that serde defaults cannot express.
    pub fn validate(&self) -> Result<(), AppError> {
        if self.auth.jwt_secret.trim().is_empty() {
            return Err(AppError::configuration("auth.jwt_secret must be set"));
        }
        if self.telegram.bot_token.trim().is_empty() && !self.telegram.dev_mode {
            return Err(AppError::configuration(
                "telegram.bot_token must be set unless telegram.dev_mode is enabled",
            ));
        }
        if self.totp.encryption_key.trim().is_empty() {
            return Err(AppError::configuration("totp.encryption_key must be set"));
        }
        if self.server.shutdown_grace_seconds > MAX_SHUTDOWN_GRACE_SECONDS {
            return Err(AppError::configuration(format!(
                "server.shutdown_grace_seconds must not exceed {MAX_SHUTDOWN_GRACE_SECONDS}"
            )));
        }
        if self.auth.max_failed_attempts < 1 {
            return Err(AppError::configuration(
                "auth.max_failed_attempts must be positive",
            ));
        }
        if self.database.backend == DatabaseBackend::Postgres && self.database.url.is_empty() {
            return Err(AppError::configuration("database.url must be set"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid() -> AppConfig {
        let mut config = AppConfig::default();
        config.auth.jwt_secret = "secret".into();
        config.telegram.bot_token = "123:abc".into();
        config.totp.encryption_key = "k".repeat(32);
        config.database.url = "postgres://localhost/warden".into();
        config
    }

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.auth.max_failed_attempts, 5);
        assert_eq!(config.session.idle_timeout_minutes, 30);
        assert_eq!(config.session.max_lifetime_hours, 12);
        assert_eq!(config.stats.timezone, "Europe/Minsk");
        assert_eq!(config.media.url_ttl_seconds, 300);
    }

    #[test]
    fn test_validate_accepts_complete_config() {
        assert!(valid().validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_missing_bot_token_outside_dev_mode() {
        let mut config = valid();
        config.telegram.bot_token.clear();
        assert!(config.validate().is_err());
        config.telegram.dev_mode = true;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_caps_shutdown_grace() {
        let mut config = valid();
        config.server.shutdown_grace_seconds = 30;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_memory_backend_needs_no_url() {
        let mut config = valid();
        config.database.url.clear();
        assert!(config.validate().is_err());
        config.database.backend = DatabaseBackend::Memory;
        assert!(config.validate().is_ok());
    }
}
