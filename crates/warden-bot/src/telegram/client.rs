//! Bot API HTTP client.
//!
//! Wraps the handful of Bot API methods the bot needs using [`reqwest`].
//! The token is part of every URL, so URLs are never logged.

use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::json;
use tracing::{debug, warn};

use warden_core::config::TelegramConfig;
use warden_core::error::{AppError, ErrorKind};
use warden_core::result::AppResult;

use super::types::{ApiResponse, InlineKeyboardMarkup, ReplyMarkup, Update};

/// Extra seconds on top of the long-poll timeout before the HTTP call gives up.
const POLL_SLACK_SECS: u64 = 10;

/// Telegram accepts between two and ten items in one media group.
const MEDIA_GROUP_MAX: usize = 10;

/// Everything handlers send back to Telegram.
#[async_trait]
pub trait Outbox: Send + Sync {
    /// `sendMessage`, optionally with a keyboard.
    async fn send_message(
        &self,
        chat_id: i64,
        text: &str,
        markup: Option<ReplyMarkup>,
    ) -> AppResult<()>;

    /// `editMessageText` on a message the bot sent earlier.
    async fn edit_message(
        &self,
        chat_id: i64,
        message_id: i64,
        text: &str,
        markup: Option<InlineKeyboardMarkup>,
    ) -> AppResult<()>;

    /// `answerCallbackQuery`, which stops the client-side spinner.
    async fn answer_callback(&self, callback_id: &str, text: Option<&str>) -> AppResult<()>;

    /// Photos by URL, as one album when there is more than one.
    async fn send_photos(&self, chat_id: i64, urls: &[String]) -> AppResult<()>;
}

/// HTTP client for the Telegram Bot API.
pub struct BotApi {
    client: reqwest::Client,
    base_url: String,
    token: String,
    poll_timeout: u64,
}

impl std::fmt::Debug for BotApi {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BotApi")
            .field("base_url", &self.base_url)
            .field("poll_timeout", &self.poll_timeout)
            .finish_non_exhaustive()
    }
}

impl BotApi {
    /// Create a client from the `[telegram]` section.
    pub fn new(config: &TelegramConfig) -> AppResult<Self> {
        if config.bot_token.trim().is_empty() {
            return Err(AppError::configuration("telegram.bot_token is required for the bot"));
        }
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.poll_timeout_seconds + POLL_SLACK_SECS))
            .build()
            .map_err(|e| {
                AppError::with_source(ErrorKind::Configuration, "Failed to build HTTP client", e)
            })?;

        Ok(Self::with_client(client, config))
    }

    /// Create a client reusing an existing [`reqwest::Client`].
    pub fn with_client(client: reqwest::Client, config: &TelegramConfig) -> Self {
        Self {
            client,
            base_url: config.api_base_url.trim_end_matches('/').to_string(),
            token: config.bot_token.trim().to_string(),
            poll_timeout: config.poll_timeout_seconds,
        }
    }

    /// Long-poll for updates at or after `offset`, confirming everything before it.
    pub async fn get_updates(&self, offset: i64, timeout_secs: u64) -> AppResult<Vec<Update>> {
        self.call(
            "getUpdates",
            &json!({
                "offset": offset,
                "timeout": timeout_secs,
                "allowed_updates": ["message", "callback_query"],
            }),
        )
        .await
    }

    /// Configured long-poll timeout.
    pub fn poll_timeout(&self) -> u64 {
        self.poll_timeout
    }

    /// The bot's own username, used as a startup credential check.
    pub async fn get_me(&self) -> AppResult<Option<String>> {
        let me: serde_json::Value = self.call("getMe", &json!({})).await?;
        Ok(me["username"].as_str().map(str::to_string))
    }

    async fn call<B, T>(&self, method: &str, body: &B) -> AppResult<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let response = self
            .client
            .post(format!("{}/bot{}/{}", self.base_url, self.token, method))
            .json(body)
            .send()
            .await
            .map_err(|e| {
                AppError::with_source(
                    ErrorKind::ExternalService,
                    format!("Telegram {method} request failed"),
                    e.without_url(),
                )
            })?;

        let envelope: ApiResponse<T> = response.json().await.map_err(|e| {
            AppError::with_source(
                ErrorKind::ExternalService,
                format!("Telegram {method} returned an unreadable body"),
                e.without_url(),
            )
        })?;

        Self::unwrap_envelope(method, envelope)
    }

    fn unwrap_envelope<T>(method: &str, envelope: ApiResponse<T>) -> AppResult<T> {
        if envelope.ok {
            return envelope.result.ok_or_else(|| {
                AppError::external(format!("Telegram {method} returned no result"))
            });
        }

        let description = envelope
            .description
            .unwrap_or_else(|| "unknown error".to_string());
        if envelope.error_code == Some(429) {
            let retry_after = envelope.parameters.and_then(|p| p.retry_after);
            warn!(method, retry_after, "Telegram flood control");
            return Err(AppError::new(
                ErrorKind::RateLimited,
                format!("Telegram {method}: {description}"),
            ));
        }
        Err(AppError::external(format!(
            "Telegram {method} failed ({}): {description}",
            envelope.error_code.unwrap_or_default()
        )))
    }
}

#[async_trait]
impl Outbox for BotApi {
    async fn send_message(
        &self,
        chat_id: i64,
        text: &str,
        markup: Option<ReplyMarkup>,
    ) -> AppResult<()> {
        let mut body = json!({ "chat_id": chat_id, "text": text });
        if let Some(markup) = markup {
            body["reply_markup"] = serde_json::to_value(markup).map_err(|e| {
                AppError::with_source(ErrorKind::Serialization, "Failed to encode keyboard", e)
            })?;
        }
        let _: serde_json::Value = self.call("sendMessage", &body).await?;
        Ok(())
    }

    async fn edit_message(
        &self,
        chat_id: i64,
        message_id: i64,
        text: &str,
        markup: Option<InlineKeyboardMarkup>,
    ) -> AppResult<()> {
        let body = json!({
            "chat_id": chat_id,
            "message_id": message_id,
            "text": text,
            "reply_markup": markup.unwrap_or_default(),
        });
        match self.call::<_, serde_json::Value>("editMessageText", &body).await {
            Ok(_) => Ok(()),
            Err(e) if e.message.contains("message is not modified") => {
                debug!(chat_id, message_id, "Edit was a no-op");
                Ok(())
            }
            Err(e) => Err(e),
        }
    }

    async fn answer_callback(&self, callback_id: &str, text: Option<&str>) -> AppResult<()> {
        let mut body = json!({ "callback_query_id": callback_id });
        if let Some(text) = text {
            body["text"] = json!(text);
        }
        let _: bool = self.call("answerCallbackQuery", &body).await?;
        Ok(())
    }

    async fn send_photos(&self, chat_id: i64, urls: &[String]) -> AppResult<()> {
        match urls {
            [] => Ok(()),
            [single] => {
                let _: serde_json::Value = self
                    .call("sendPhoto", &json!({ "chat_id": chat_id, "photo": single }))
                    .await?;
                Ok(())
            }
            many => {
                let media: Vec<_> = many
                    .iter()
                    .take(MEDIA_GROUP_MAX)
                    .map(|url| json!({ "type": "photo", "media": url }))
                    .collect();
                let _: serde_json::Value = self
                    .call("sendMediaGroup", &json!({ "chat_id": chat_id, "media": media }))
                    .await?;
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn failed(code: i32, description: &str, retry_after: Option<u64>) -> ApiResponse<bool> {
        ApiResponse {
            ok: false,
            result: None,
            description: Some(description.into()),
            error_code: Some(code),
            parameters: Some(super::super::types::ResponseParameters { retry_after }),
        }
    }

    #[test]
    fn test_flood_control_maps_to_rate_limited() {
        let err = BotApi::unwrap_envelope("sendMessage", failed(429, "Too Many Requests", Some(3)))
            .unwrap_err();
        assert!(err.is(ErrorKind::RateLimited));
    }

    #[test]
    fn test_other_failures_are_external() {
        let err = BotApi::unwrap_envelope("sendMessage", failed(400, "chat not found", None))
            .unwrap_err();
        assert!(err.is(ErrorKind::ExternalService));
        assert!(err.message.contains("chat not found"));
    }

    #[test]
    fn test_missing_token_is_a_configuration_error() {
        let err = BotApi::new(&TelegramConfig::default()).unwrap_err();
        assert!(err.is(ErrorKind::Configuration));
    }

    #[test]
    fn test_debug_hides_token() {
        let config = TelegramConfig {
            bot_token: "123:secret".into(),
            ..TelegramConfig::default()
        };
        let api = BotApi::new(&config).unwrap();
        assert!(!format!("{api:?}").contains("secret"));
    }
}
