//! Bootstrap-gated TOTP enrollment.

use axum::Json;
use axum::extract::State;
use axum::http::HeaderMap;

use crate::dto::request::{SetupConfirmRequest, SetupStartRequest};
use crate::dto::response::{SetupStartResponse, StatusResponse};
use crate::error::ApiError;
use crate::extractors::ValidatedJson;
use crate::state::AppState;

/// Header carrying the enrollment bootstrap key.
pub const BOOTSTRAP_HEADER: &str = "x-bootstrap-key";

fn check_bootstrap(state: &AppState, headers: &HeaderMap) -> Result<(), ApiError> {
    let presented = headers
        .get(BOOTSTRAP_HEADER)
        .and_then(|v| v.to_str().ok());
    state.auth.bootstrap.check(presented)?;
    Ok(())
}

/// POST /v1/admin/2fa/setup/start
pub async fn setup_start(
    State(state): State<AppState>,
    headers: HeaderMap,
    ValidatedJson(req): ValidatedJson<SetupStartRequest>,
) -> Result<Json<SetupStartResponse>, ApiError> {
    check_bootstrap(&state, &headers)?;

    let started = state
        .auth
        .enrollment
        .start_setup(req.telegram_id, req.account_name)
        .await?;

    Ok(Json(started.into()))
}

/// POST /v1/admin/2fa/setup/confirm
pub async fn setup_confirm(
    State(state): State<AppState>,
    headers: HeaderMap,
    ValidatedJson(req): ValidatedJson<SetupConfirmRequest>,
) -> Result<Json<StatusResponse>, ApiError> {
    check_bootstrap(&state, &headers)?;

    state
        .auth
        .enrollment
        .confirm_setup(req.setup_id, req.code.trim())
        .await?;

    Ok(Json(StatusResponse::ok()))
}
