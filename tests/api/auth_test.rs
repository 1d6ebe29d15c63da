//! Login, identity and logout over HTTP.

use axum::body::Body;
use chrono::Duration;
use http::StatusCode;
use serde_json::json;

use warden_core::clock::Clock;

use crate::helpers::{PASSWORD, PEER, SECRET, TELEGRAM_ID, TestApp, code_for, test_config};

#[tokio::test]
async fn test_healthz() {
    let app = TestApp::new().await;
    let res = app.request("GET", "/healthz", None, None).await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.body, json!({ "status": "ok" }));
}

#[tokio::test]
async fn test_three_factor_login_and_me() {
    let app = TestApp::new().await;

    let res = app
        .request(
            "POST",
            "/v1/auth/telegram/start",
            Some(json!({ "init_data": TELEGRAM_ID.to_string() })),
            None,
        )
        .await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.body["next_step"], "2fa");
    assert_eq!(res.body["username"], "alice");
    let challenge = res.body["challenge_id"].as_str().unwrap().to_string();

    let res = app
        .request(
            "POST",
            "/v1/auth/2fa/verify",
            Some(json!({ "challenge_id": challenge, "code": code_for(SECRET, app.clock.now()) })),
            None,
        )
        .await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.body["next_step"], "password");
    assert_eq!(res.body["challenge_id"], challenge.as_str());

    let res = app
        .request(
            "POST",
            "/v1/auth/password/verify",
            Some(json!({ "challenge_id": challenge, "password": PASSWORD })),
            None,
        )
        .await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.body["token_type"], "Bearer");
    assert_eq!(res.body["admin"]["telegram_id"], TELEGRAM_ID);
    assert_eq!(res.body["admin"]["role"], "ADMIN");
    assert_eq!(res.body["admin"]["display_name"], "Alice");
    let token = res.body["access_token"].as_str().unwrap().to_string();

    let me = app.request("GET", "/v1/auth/me", None, Some(&token)).await;
    assert_eq!(me.status, StatusCode::OK);
    assert_eq!(me.body["telegram_id"], TELEGRAM_ID);
    assert_eq!(me.body["role"], "ADMIN");
    assert_eq!(me.body["username"], "alice");
}

#[tokio::test]
async fn test_me_requires_bearer() {
    let app = TestApp::new().await;

    let res = app.request("GET", "/v1/auth/me", None, None).await;
    assert_eq!(res.status, StatusCode::UNAUTHORIZED);
    assert_eq!(res.code(), "unauthorized");

    let res = app.request("GET", "/v1/auth/me", None, Some("not-a-jwt")).await;
    assert_eq!(res.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_malformed_bodies() {
    let app = TestApp::new().await;

    let res = app
        .send("POST", "/v1/auth/telegram/start", Body::from("{not json"), None, &[])
        .await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    assert_eq!(res.code(), "invalid_json");

    let res = app
        .request("POST", "/v1/auth/2fa/verify", Some(json!({ "code": "123456" })), None)
        .await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    assert_eq!(res.code(), "invalid_json");

    let res = app
        .request("POST", "/v1/auth/telegram/start", Some(json!({ "init_data": "" })), None)
        .await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    assert_eq!(res.code(), "invalid_input");
}

#[tokio::test]
async fn test_unknown_identity_is_unauthorized() {
    let app = TestApp::new().await;
    let res = app
        .request("POST", "/v1/auth/telegram/start", Some(json!({ "init_data": "777" })), None)
        .await;
    assert_eq!(res.status, StatusCode::UNAUTHORIZED);
    assert_eq!(res.code(), "unauthorized");
}

#[tokio::test]
async fn test_password_before_totp_is_invalid_step() {
    let app = TestApp::new().await;
    let challenge = app.start().await;

    let res = app
        .request(
            "POST",
            "/v1/auth/password/verify",
            Some(json!({ "challenge_id": challenge, "password": PASSWORD })),
            None,
        )
        .await;
    assert_eq!(res.status, StatusCode::CONFLICT);
    assert_eq!(res.code(), "invalid_step");
}

#[tokio::test]
async fn test_wrong_passwords_lock_the_account() {
    let app = TestApp::new().await;
    let challenge = app.challenge_at_password().await;

    let mut statuses = Vec::new();
    for _ in 0..6 {
        let res = app
            .request(
                "POST",
                "/v1/auth/password/verify",
                Some(json!({ "challenge_id": challenge, "password": "wrong" })),
                None,
            )
            .await;
        statuses.push(res.status.as_u16());
    }
    assert_eq!(statuses, vec![401, 401, 401, 401, 423, 423]);

    let res = app
        .request(
            "POST",
            "/v1/auth/telegram/start",
            Some(json!({ "init_data": TELEGRAM_ID.to_string() })),
            None,
        )
        .await;
    assert_eq!(res.status.as_u16(), 423);
    assert_eq!(res.code(), "account_locked");

    app.clock.advance(Duration::minutes(16));
    app.login().await;
}

#[tokio::test]
async fn test_expired_challenge() {
    let app = TestApp::new().await;
    let challenge = app.start().await;
    app.clock.advance(Duration::minutes(6));

    let res = app
        .request(
            "POST",
            "/v1/auth/2fa/verify",
            Some(json!({ "challenge_id": challenge, "code": code_for(SECRET, app.clock.now()) })),
            None,
        )
        .await;
    assert_eq!(res.status, StatusCode::UNAUTHORIZED);
    assert_eq!(res.code(), "challenge_expired");
}

#[tokio::test]
async fn test_logout_then_token_is_dead() {
    let app = TestApp::new().await;
    let token = app.login().await;

    let res = app.request("POST", "/v1/auth/logout", None, Some(&token)).await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.body, json!({ "status": "ok" }));

    let res = app.request("GET", "/v1/auth/me", None, Some(&token)).await;
    assert_eq!(res.status, StatusCode::UNAUTHORIZED);
    assert_eq!(res.code(), "session_expired");

    let res = app.request("POST", "/v1/auth/logout", None, Some(&token)).await;
    assert_eq!(res.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_idle_session_expires() {
    let app = TestApp::new().await;
    let token = app.login().await;

    app.clock.advance(Duration::minutes(20));
    let res = app.request("GET", "/v1/auth/me", None, Some(&token)).await;
    assert_eq!(res.status, StatusCode::OK);

    app.clock.advance(Duration::minutes(31));
    let res = app.request("GET", "/v1/auth/me", None, Some(&token)).await;
    assert_eq!(res.code(), "session_expired");
}

async fn start_from(app: &TestApp, forwarded_for: &str) -> StatusCode {
    let body = json!({ "init_data": TELEGRAM_ID.to_string() }).to_string();
    app.send(
        "POST",
        "/v1/auth/telegram/start",
        Body::from(body),
        None,
        &[("X-Forwarded-For", forwarded_for)],
    )
    .await
    .status
}

#[tokio::test]
async fn test_rotating_forwarded_for_does_not_dodge_throttle() {
    let mut config = test_config();
    config.auth.login_attempts_per_minute = 3;
    let app = TestApp::with_config(config).await;

    let mut statuses = Vec::new();
    for n in 0..10 {
        statuses.push(start_from(&app, &format!("203.0.113.{n}")).await);
    }
    assert_eq!(&statuses[..3], &[StatusCode::OK; 3]);
    assert!(statuses[3..].iter().all(|s| *s == StatusCode::TOO_MANY_REQUESTS));
}

#[tokio::test]
async fn test_trusted_proxy_forwards_client_address() {
    let mut config = test_config();
    config.auth.login_attempts_per_minute = 3;
    config.server.trusted_proxies = vec![PEER.0.into()];
    let app = TestApp::with_config(config).await;

    for n in 0..5 {
        assert_eq!(start_from(&app, &format!("203.0.113.{n}")).await, StatusCode::OK);
    }
    for _ in 0..3 {
        assert_eq!(start_from(&app, "192.0.2.50").await, StatusCode::OK);
    }
    assert_eq!(start_from(&app, "192.0.2.50").await, StatusCode::TOO_MANY_REQUESTS);
}
