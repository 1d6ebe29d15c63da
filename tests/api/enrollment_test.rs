//! Bootstrap-gated TOTP enrollment over HTTP.

use http::StatusCode;
use serde_json::json;

use warden_core::clock::Clock;

use crate::helpers::{TELEGRAM_ID, TestApp, code_for, test_config};

const BOOTSTRAP: &str = "let-me-in";

async fn app_with_bootstrap() -> TestApp {
    let mut config = test_config();
    config.totp.bootstrap_key = BOOTSTRAP.into();
    TestApp::with_config(config).await
}

#[tokio::test]
async fn test_disabled_without_bootstrap_key() {
    let app = TestApp::new().await;
    let res = app
        .send(
            "POST",
            "/v1/admin/2fa/setup/start",
            json!({ "telegram_id": TELEGRAM_ID }).to_string().into(),
            None,
            &[("X-Bootstrap-Key", "anything")],
        )
        .await;
    assert_eq!(res.status, StatusCode::NOT_IMPLEMENTED);
    assert_eq!(res.code(), "bootstrap_disabled");
}

#[tokio::test]
async fn test_wrong_or_missing_key_is_forbidden() {
    let app = app_with_bootstrap().await;
    let body = json!({ "telegram_id": TELEGRAM_ID });

    let res = app
        .request("POST", "/v1/admin/2fa/setup/start", Some(body.clone()), None)
        .await;
    assert_eq!(res.status, StatusCode::FORBIDDEN);

    let res = app
        .send(
            "POST",
            "/v1/admin/2fa/setup/start",
            body.to_string().into(),
            None,
            &[("X-Bootstrap-Key", "let-me-out")],
        )
        .await;
    assert_eq!(res.status, StatusCode::FORBIDDEN);
    assert_eq!(res.code(), "forbidden");
}

#[tokio::test]
async fn test_enroll_round_trip() {
    let app = app_with_bootstrap().await;

    let res = app
        .send(
            "POST",
            "/v1/admin/2fa/setup/start",
            json!({ "telegram_id": TELEGRAM_ID, "account_name": "alice@warden" })
                .to_string()
                .into(),
            None,
            &[("X-Bootstrap-Key", BOOTSTRAP)],
        )
        .await;
    assert_eq!(res.status, StatusCode::OK, "{:?}", res.body);
    assert_eq!(res.body["telegram_id"], TELEGRAM_ID);
    assert!(res.body["otpauth_url"].as_str().unwrap().starts_with("otpauth://totp/"));
    assert!(
        res.body["qr_code_data_url"]
            .as_str()
            .unwrap()
            .starts_with("data:image/png;base64,")
    );
    let setup_id = res.body["setup_id"].as_str().unwrap().to_string();
    let secret = res.body["secret"].as_str().unwrap().to_string();

    let confirm = json!({ "setup_id": setup_id, "code": code_for(&secret, app.clock.now()) });
    let res = app
        .send(
            "POST",
            "/v1/admin/2fa/setup/confirm",
            confirm.to_string().into(),
            None,
            &[("X-Bootstrap-Key", BOOTSTRAP)],
        )
        .await;
    assert_eq!(res.status, StatusCode::OK, "{:?}", res.body);
    assert_eq!(res.body["status"], "ok");

    let res = app
        .send(
            "POST",
            "/v1/admin/2fa/setup/confirm",
            confirm.to_string().into(),
            None,
            &[("X-Bootstrap-Key", BOOTSTRAP)],
        )
        .await;
    assert_eq!(res.status, StatusCode::UNAUTHORIZED);
    assert_eq!(res.code(), "challenge_expired");
}

#[tokio::test]
async fn test_unknown_operator_cannot_enroll() {
    let app = app_with_bootstrap().await;
    let res = app
        .send(
            "POST",
            "/v1/admin/2fa/setup/start",
            json!({ "telegram_id": 999 }).to_string().into(),
            None,
            &[("X-Bootstrap-Key", BOOTSTRAP)],
        )
        .await;
    assert_eq!(res.status, StatusCode::UNAUTHORIZED);
}
