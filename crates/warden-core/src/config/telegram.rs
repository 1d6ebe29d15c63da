//! Telegram configuration.

use serde::{Deserialize, Serialize};

/// Bot credentials and initData policy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelegramConfig {
    /// Bot API token; keys the initData HMAC and authenticates the bot client.
    #[serde(default)]
    pub bot_token: String,
    /// Maximum accepted age of `auth_date` in seconds.
    #[serde(default = "default_max_age")]
    pub init_data_max_age_seconds: u64,
    /// Accept a bare numeric id in place of signed initData.
    #[serde(default)]
    pub dev_mode: bool,
    /// Bot API base URL.
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,
    /// Long-poll timeout for `getUpdates` in seconds.
    #[serde(default = "default_poll_timeout")]
    pub poll_timeout_seconds: u64,
}

impl Default for TelegramConfig {
    fn default() -> Self {
        Self {
            bot_token: String::new(),
            init_data_max_age_seconds: default_max_age(),
            dev_mode: false,
            api_base_url: default_api_base_url(),
            poll_timeout_seconds: default_poll_timeout(),
        }
    }
}

fn default_max_age() -> u64 {
    86_400
}

fn default_api_base_url() -> String {
    "https://api.telegram.org".to_string()
}

fn default_poll_timeout() -> u64 {
    30
}
