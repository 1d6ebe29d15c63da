//! Route definitions for the admin login API.

use std::time::Duration;

use axum::{
    Router,
    extract::DefaultBodyLimit,
    middleware as axum_middleware,
    routing::{get, post},
};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::middleware;
use crate::state::AppState;

/// Build the router with every route and layer.
pub fn build_router(state: AppState) -> Router {
    let body_limit = state.config.server.body_limit_bytes;
    let timeout = Duration::from_secs(state.config.server.request_timeout_seconds);

    Router::new()
        .merge(health_routes())
        .merge(auth_routes())
        .merge(enrollment_routes())
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(RequestBodyLimitLayer::new(body_limit))
        .layer(TimeoutLayer::new(timeout))
        .layer(TraceLayer::new_for_http())
        .layer(axum_middleware::from_fn(middleware::logging::request_logging))
        .with_state(state)
}

fn health_routes() -> Router<AppState> {
    Router::new().route("/healthz", get(handlers::health::healthz))
}

/// Three-factor login, identity, logout
fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/v1/auth/telegram/start", post(handlers::auth::telegram_start))
        .route("/v1/auth/2fa/verify", post(handlers::auth::totp_verify))
        .route("/v1/auth/password/verify", post(handlers::auth::password_verify))
        .route("/v1/auth/me", get(handlers::auth::me))
        .route("/v1/auth/logout", post(handlers::auth::logout))
}

/// TOTP enrollment behind the bootstrap key
fn enrollment_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/v1/admin/2fa/setup/start",
            post(handlers::enrollment::setup_start),
        )
        .route(
            "/v1/admin/2fa/setup/confirm",
            post(handlers::enrollment::setup_confirm),
        )
}
