//! Shared test helpers for API tests.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::Extension;
use axum::extract::ConnectInfo;
use chrono::{DateTime, TimeZone, Utc};
use http::{Request, StatusCode};
use serde_json::Value;
use totp_rs::{Algorithm, Secret, TOTP};
use tower::ServiceExt;

use warden_api::{AppState, build_app};
use warden_auth::{AuthSuite, PasswordHasher, SecretEnvelope};
use warden_core::clock::{Clock, ManualClock};
use warden_core::config::AppConfig;
use warden_database::store::OperatorStore;
use warden_database::{MemoryStore, Stores};
use warden_entity::operator::{CreateOperator, Role};

/// TOTP secret enrolled for the seeded operator.
pub const SECRET: &str = "JBSWY3DPEHPK3PXPJBSWY3DPEHPK3PXP";
/// Password of the seeded operator.
pub const PASSWORD: &str = "correct horse";
/// Telegram id of the seeded operator.
pub const TELEGRAM_ID: i64 = 42;
/// Socket address every test request arrives from.
pub const PEER: ([u8; 4], u16) = ([198, 51, 100, 1], 40_000);

/// Test application context
pub struct TestApp {
    /// The Axum router for making test requests
    pub router: Router,
    /// Backing store for direct inspection
    pub store: Arc<MemoryStore>,
    /// Controls every timestamp the app sees
    pub clock: Arc<ManualClock>,
}

/// Config with cheap hashing, no IP throttle and dev-mode initData.
pub fn test_config() -> AppConfig {
    let mut config = AppConfig::default();
    config.auth.jwt_secret = "api-test-secret".into();
    config.auth.login_attempts_per_minute = 0;
    config.auth.password.memory_kib = 64;
    config.auth.password.iterations = 1;
    config.telegram.bot_token = "123456:TEST".into();
    config.telegram.dev_mode = true;
    config.totp.encryption_key = "0123456789abcdef0123456789abcdef".into();
    config
}

fn epoch() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 6, 15, 10, 0, 0).unwrap()
}

/// Six-digit code for `secret` at `at`.
pub fn code_for(secret: &str, at: DateTime<Utc>) -> String {
    let bytes = Secret::Encoded(secret.to_string()).to_bytes().unwrap();
    TOTP::new_unchecked(Algorithm::SHA1, 6, 1, 30, bytes, None, String::new())
        .generate(at.timestamp() as u64)
}

impl TestApp {
    /// App with the default test config and one enrolled admin.
    pub async fn new() -> Self {
        Self::with_config(test_config()).await
    }

    /// App with a custom config and one enrolled admin.
    pub async fn with_config(config: AppConfig) -> Self {
        let store = Arc::new(MemoryStore::new());
        let clock = Arc::new(ManualClock::new(epoch()));
        let now = clock.now();

        let hash = PasswordHasher::new(&config.auth.password)
            .unwrap()
            .hash_password(PASSWORD)
            .unwrap();
        let operator = OperatorStore::create(
            store.as_ref(),
            &CreateOperator {
                external_id: TELEGRAM_ID,
                login_handle: Some("alice".into()),
                display_name: Some("Alice".into()),
                role: Role::Admin,
                password_hash: hash,
            },
            now,
        )
        .await
        .unwrap();
        let sealed = SecretEnvelope::from_config(&config.totp)
            .unwrap()
            .seal(SECRET)
            .unwrap();
        store.enable_totp(operator.id, &sealed, now).await.unwrap();

        let auth = AuthSuite::build(&config, &Stores::from_memory(store.clone()), clock.clone())
            .unwrap();
        let router = build_app(AppState::new(config, auth))
            .layer(Extension(ConnectInfo(SocketAddr::from(PEER))));

        Self {
            router,
            store,
            clock,
        }
    }

    /// Make an HTTP request to the test app
    pub async fn request(
        &self,
        method: &str,
        path: &str,
        body: Option<Value>,
        token: Option<&str>,
    ) -> TestResponse {
        let body = body.map(|b| b.to_string()).unwrap_or_default();
        self.send(method, path, Body::from(body), token, &[]).await
    }

    /// Send a raw body with extra headers.
    pub async fn send(
        &self,
        method: &str,
        path: &str,
        body: Body,
        token: Option<&str>,
        headers: &[(&str, &str)],
    ) -> TestResponse {
        let mut req = Request::builder()
            .method(method)
            .uri(path)
            .header("Content-Type", "application/json");

        if let Some(token) = token {
            req = req.header("Authorization", format!("Bearer {token}"));
        }
        for (name, value) in headers {
            req = req.header(*name, *value);
        }

        let response = self
            .router
            .clone()
            .oneshot(req.body(body).unwrap())
            .await
            .unwrap();

        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), 1024 * 1024)
            .await
            .unwrap();
        let body: Value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);

        TestResponse { status, body }
    }

    /// Run stage 1 and return the challenge id.
    pub async fn start(&self) -> String {
        let res = self
            .request(
                "POST",
                "/v1/auth/telegram/start",
                Some(serde_json::json!({ "init_data": TELEGRAM_ID.to_string() })),
                None,
            )
            .await;
        assert_eq!(res.status, StatusCode::OK, "{:?}", res.body);
        res.body["challenge_id"].as_str().unwrap().to_string()
    }

    /// Run stages 1 and 2 and return the challenge id.
    pub async fn challenge_at_password(&self) -> String {
        let challenge = self.start().await;
        let res = self
            .request(
                "POST",
                "/v1/auth/2fa/verify",
                Some(serde_json::json!({
                    "challenge_id": challenge,
                    "code": code_for(SECRET, self.clock.now()),
                })),
                None,
            )
            .await;
        assert_eq!(res.status, StatusCode::OK, "{:?}", res.body);
        challenge
    }

    /// Full login; returns the bearer token.
    pub async fn login(&self) -> String {
        let challenge = self.challenge_at_password().await;
        let res = self
            .request(
                "POST",
                "/v1/auth/password/verify",
                Some(serde_json::json!({ "challenge_id": challenge, "password": PASSWORD })),
                None,
            )
            .await;
        assert_eq!(res.status, StatusCode::OK, "{:?}", res.body);
        res.body["access_token"].as_str().unwrap().to_string()
    }
}

/// Response from a test request
#[derive(Debug)]
pub struct TestResponse {
    /// HTTP status code
    pub status: StatusCode,
    /// Parsed JSON body
    pub body: Value,
}

impl TestResponse {
    /// `error.code` from the envelope.
    pub fn code(&self) -> &str {
        self.body["error"]["code"].as_str().unwrap_or_default()
    }
}
