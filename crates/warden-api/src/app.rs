//! Application builder and server loop.

use std::net::SocketAddr;
use std::time::Duration;

use axum::Router;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tracing::{info, warn};

use warden_core::error::{AppError, ErrorKind};
use warden_core::result::AppResult;

use crate::router::build_router;
use crate::state::AppState;

/// Builds the complete Axum application with all routes and middleware.
pub fn build_app(state: AppState) -> Router {
    build_router(state)
}

/// Serve `app` until `shutdown` flips to `true`, then give in-flight requests
/// at most `grace` to finish before dropping them.
pub async fn serve(
    listener: TcpListener,
    app: Router,
    mut shutdown: watch::Receiver<bool>,
    grace: Duration,
) -> AppResult<()> {
    let addr = listener
        .local_addr()
        .map_err(|e| AppError::with_source(ErrorKind::Internal, "Listener has no address", e))?;
    info!(%addr, "Admin API listening");

    let mut drain = shutdown.clone();
    let server = axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(async move {
        let _ = drain.wait_for(|stop| *stop).await;
    });

    let mut handle = tokio::spawn(async move { server.await });

    tokio::select! {
        joined = &mut handle => return flatten(joined),
        _ = shutdown.wait_for(|stop| *stop) => {}
    }

    info!(grace_seconds = grace.as_secs(), "Draining HTTP connections");
    match tokio::time::timeout(grace, &mut handle).await {
        Ok(joined) => flatten(joined),
        Err(_) => {
            warn!("Shutdown grace elapsed with requests still in flight");
            handle.abort();
            Ok(())
        }
    }
}

fn flatten(
    joined: Result<std::io::Result<()>, tokio::task::JoinError>,
) -> AppResult<()> {
    match joined {
        Ok(Ok(())) => Ok(()),
        Ok(Err(e)) => Err(AppError::with_source(ErrorKind::Internal, "HTTP server failed", e)),
        Err(e) => Err(AppError::with_source(ErrorKind::Internal, "HTTP server task panicked", e)),
    }
}
