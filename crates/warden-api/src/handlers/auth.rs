//! Login, identity and logout handlers.

use axum::Json;
use axum::extract::State;

use warden_auth::login::StartLogin;

use crate::dto::request::{PasswordVerifyRequest, TelegramStartRequest, TotpVerifyRequest};
use crate::dto::response::{ChallengeResponse, LoginResponse, MeResponse, StatusResponse};
use crate::error::ApiError;
use crate::extractors::{BearerToken, ClientInfo, CurrentOperator, ValidatedJson};
use crate::state::AppState;

/// POST /v1/auth/telegram/start
pub async fn telegram_start(
    State(state): State<AppState>,
    client: ClientInfo,
    ValidatedJson(req): ValidatedJson<TelegramStartRequest>,
) -> Result<Json<ChallengeResponse>, ApiError> {
    let started = state
        .auth
        .login
        .start_telegram(StartLogin {
            init_data: req.init_data,
            ip: client.ip,
            user_agent: client.user_agent,
        })
        .await?;

    Ok(Json(started.into()))
}

/// POST /v1/auth/2fa/verify
pub async fn totp_verify(
    State(state): State<AppState>,
    client: ClientInfo,
    ValidatedJson(req): ValidatedJson<TotpVerifyRequest>,
) -> Result<Json<ChallengeResponse>, ApiError> {
    let accepted = state
        .auth
        .login
        .verify_totp(req.challenge_id, &req.code, client.ip.as_deref())
        .await?;

    Ok(Json(accepted.into()))
}

/// POST /v1/auth/password/verify
pub async fn password_verify(
    State(state): State<AppState>,
    client: ClientInfo,
    ValidatedJson(req): ValidatedJson<PasswordVerifyRequest>,
) -> Result<Json<LoginResponse>, ApiError> {
    let completed = state
        .auth
        .login
        .verify_password(
            req.challenge_id,
            &req.password,
            client.ip.as_deref(),
            client.user_agent.as_deref(),
        )
        .await?;

    Ok(Json(completed.into()))
}

/// GET /v1/auth/me
pub async fn me(operator: CurrentOperator) -> Json<MeResponse> {
    Json(MeResponse::from(&*operator))
}

/// POST /v1/auth/logout
pub async fn logout(
    State(state): State<AppState>,
    BearerToken(token): BearerToken,
) -> Result<Json<StatusResponse>, ApiError> {
    state.auth.sessions.logout(&token).await?;
    Ok(Json(StatusResponse::ok()))
}
