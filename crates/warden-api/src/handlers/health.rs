//! Liveness probe.

use axum::Json;

use crate::dto::response::StatusResponse;

/// GET /healthz
pub async fn healthz() -> Json<StatusResponse> {
    Json(StatusResponse::ok())
}
