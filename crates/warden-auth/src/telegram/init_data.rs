//! `initData` verification for Mini Apps and the Login Widget.

use chrono::{DateTime, Duration, Utc};
use hmac::{Hmac, Mac};
use serde::Deserialize;
use sha2::{Digest, Sha256};

use warden_core::config::TelegramConfig;
use warden_core::error::AppError;

type HmacSha256 = Hmac<Sha256>;

/// Tolerance for `auth_date` values ahead of the server clock.
const MAX_FUTURE_SKEW_SECONDS: i64 = 120;

/// Identity proven by a valid payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TelegramIdentity {
    /// Telegram user id.
    pub user_id: i64,
    /// Telegram username, if the payload carried one.
    pub username: Option<String>,
}

#[derive(Deserialize)]
struct WebAppUser {
    id: i64,
    #[serde(default)]
    username: Option<String>,
}

/// Verifies signed `initData` against the bot token.
#[derive(Clone)]
pub struct InitDataValidator {
    bot_token: String,
    max_age: Duration,
    dev_mode: bool,
}

impl std::fmt::Debug for InitDataValidator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InitDataValidator")
            .field("max_age", &self.max_age)
            .field("dev_mode", &self.dev_mode)
            .finish_non_exhaustive()
    }
}

impl InitDataValidator {
    /// Build from the Telegram settings.
    pub fn new(config: &TelegramConfig) -> Self {
        Self {
            bot_token: config.bot_token.clone(),
            max_age: Duration::seconds(config.init_data_max_age_seconds as i64),
            dev_mode: config.dev_mode,
        }
    }

    /// Verify `raw` and extract the caller's identity.
    pub fn validate(&self, raw: &str, now: DateTime<Utc>) -> Result<TelegramIdentity, AppError> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Err(AppError::invalid_input("init_data is required"));
        }

        if self.dev_mode && raw.bytes().all(|b| b.is_ascii_digit()) {
            return positive_id(raw).map(|user_id| TelegramIdentity {
                user_id,
                username: None,
            });
        }

        let mut fields: Vec<(String, String)> = url::form_urlencoded::parse(raw.as_bytes())
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();
        let hash_at = fields
            .iter()
            .position(|(k, _)| k == "hash")
            .ok_or_else(invalid)?;
        let (_, hash) = fields.remove(hash_at);

        if !self.signature_matches(&data_check_string(&fields), &hash) {
            return Err(invalid());
        }

        self.check_auth_date(field(&fields, "auth_date"), now)?;
        identity(&fields)
    }

    fn signature_matches(&self, data: &str, hash: &str) -> bool {
        let Ok(expected) = hex::decode(hash.trim().to_ascii_lowercase()) else {
            return false;
        };

        let web_app_key = hmac_sha256(b"WebAppData", self.bot_token.as_bytes());
        let widget_key = Sha256::digest(self.bot_token.as_bytes());

        [web_app_key.as_slice(), widget_key.as_slice()]
            .into_iter()
            .any(|key| match HmacSha256::new_from_slice(key) {
                Ok(mut mac) => {
                    mac.update(data.as_bytes());
                    mac.verify_slice(&expected).is_ok()
                }
                Err(_) => false,
            })
    }

    fn check_auth_date(&self, value: Option<&str>, now: DateTime<Utc>) -> Result<(), AppError> {
        let auth_date = value
            .and_then(|v| v.parse::<i64>().ok())
            .filter(|v| *v > 0)
            .ok_or_else(invalid)?;
        let now = now.timestamp();
        if auth_date > now + MAX_FUTURE_SKEW_SECONDS {
            return Err(invalid());
        }
        if now - auth_date > self.max_age.num_seconds() {
            return Err(AppError::unauthorized("Telegram authorization is too old"));
        }
        Ok(())
    }
}

/// `k=v` lines, sorted, joined by newlines.
fn data_check_string(fields: &[(String, String)]) -> String {
    let mut lines: Vec<String> = fields.iter().map(|(k, v)| format!("{k}={v}")).collect();
    lines.sort();
    lines.join("\n")
}

fn hmac_sha256(key: &[u8], message: &[u8]) -> Vec<u8> {
    match HmacSha256::new_from_slice(key) {
        Ok(mut mac) => {
            mac.update(message);
            mac.finalize().into_bytes().to_vec()
        }
        Err(_) => Vec::new(),
    }
}

fn field<'a>(fields: &'a [(String, String)], name: &str) -> Option<&'a str> {
    fields
        .iter()
        .find(|(k, _)| k == name)
        .map(|(_, v)| v.as_str())
}

fn identity(fields: &[(String, String)]) -> Result<TelegramIdentity, AppError> {
    if let Some(user) = field(fields, "user") {
        let user: WebAppUser = serde_json::from_str(user).map_err(|_| invalid())?;
        if user.id <= 0 {
            return Err(invalid());
        }
        return Ok(TelegramIdentity {
            user_id: user.id,
            username: user.username.filter(|u| !u.is_empty()),
        });
    }

    let user_id = ["id", "user_id", "tg_user_id"]
        .into_iter()
        .find_map(|name| field(fields, name))
        .ok_or_else(invalid)
        .and_then(positive_id)?;
    Ok(TelegramIdentity {
        user_id,
        username: field(fields, "username")
            .filter(|u| !u.is_empty())
            .map(str::to_string),
    })
}

fn positive_id(raw: &str) -> Result<i64, AppError> {
    raw.parse::<i64>()
        .ok()
        .filter(|id| *id > 0)
        .ok_or_else(invalid)
}

fn invalid() -> AppError {
    AppError::unauthorized("Invalid Telegram authorization")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use warden_core::error::ErrorKind;

    const TOKEN: &str = "123456:TEST-TOKEN";

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap()
    }

    fn validator(dev_mode: bool) -> InitDataValidator {
        InitDataValidator::new(&TelegramConfig {
            bot_token: TOKEN.into(),
            dev_mode,
            ..TelegramConfig::default()
        })
    }

    fn sign(key: &[u8], pairs: &[(&str, &str)]) -> String {
        let owned: Vec<(String, String)> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        let hash = hex::encode(hmac_sha256(key, data_check_string(&owned).as_bytes()));
        let mut out = url::form_urlencoded::Serializer::new(String::new());
        for (k, v) in pairs {
            out.append_pair(k, v);
        }
        out.append_pair("hash", &hash);
        out.finish()
    }

    fn web_app(pairs: &[(&str, &str)]) -> String {
        sign(&hmac_sha256(b"WebAppData", TOKEN.as_bytes()), pairs)
    }

    #[test]
    fn test_web_app_payload_with_user_json() {
        let auth_date = now().timestamp().to_string();
        let raw = web_app(&[
            ("auth_date", &auth_date),
            ("query_id", "AAE"),
            ("user", r#"{"id":42,"username":"ops","first_name":"O"}"#),
        ]);
        let identity = validator(false).validate(&raw, now()).unwrap();
        assert_eq!(identity.user_id, 42);
        assert_eq!(identity.username.as_deref(), Some("ops"));
    }

    #[test]
    fn test_login_widget_payload_with_flat_id() {
        let auth_date = now().timestamp().to_string();
        let key = Sha256::digest(TOKEN.as_bytes());
        let raw = sign(
            &key,
            &[("auth_date", &auth_date), ("id", "42"), ("username", "ops")],
        );
        let identity = validator(false).validate(&raw, now()).unwrap();
        assert_eq!(identity.user_id, 42);
    }

    #[test]
    fn test_uppercase_hash_accepted() {
        let auth_date = now().timestamp().to_string();
        let raw = web_app(&[("auth_date", &auth_date), ("id", "42")]);
        let (body, hash) = raw.rsplit_once("hash=").unwrap();
        let upper = format!("{body}hash={}", hash.to_uppercase());
        assert!(validator(false).validate(&upper, now()).is_ok());
    }

    #[test]
    fn test_tampered_field_rejected() {
        let auth_date = now().timestamp().to_string();
        let raw = web_app(&[("auth_date", &auth_date), ("id", "42")]);
        let forged = raw.replace("id=42", "id=43");
        let err = validator(false).validate(&forged, now()).unwrap_err();
        assert!(err.is(ErrorKind::Unauthorized));
    }

    #[test]
    fn test_auth_date_window() {
        let v = validator(false);
        let at = |offset: i64| {
            let date = (now().timestamp() + offset).to_string();
            web_app(&[("auth_date", &date), ("id", "42")])
        };
        assert!(v.validate(&at(120), now()).is_ok());
        assert!(v.validate(&at(121), now()).is_err());
        assert!(v.validate(&at(-86_400), now()).is_ok());
        assert!(v.validate(&at(-86_401), now()).is_err());
        assert!(v.validate(&web_app(&[("auth_date", "0"), ("id", "42")]), now()).is_err());
        assert!(v.validate(&web_app(&[("id", "42")]), now()).is_err());
    }

    #[test]
    fn test_bare_id_only_in_dev_mode() {
        assert_eq!(validator(true).validate("42", now()).unwrap().user_id, 42);
        assert!(validator(false).validate("42", now()).is_err());
        assert!(validator(true).validate("0", now()).is_err());
    }
}
