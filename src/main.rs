//! Warden admin API server.
//!
//! Wires configuration, persistence and the auth suite together and serves
//! the three-factor login endpoints until SIGINT or SIGTERM.

use std::sync::Arc;
use std::time::Duration;

use tokio::net::TcpListener;
use tokio::sync::watch;
use tracing::{error, info, warn};
use tracing_subscriber::{EnvFilter, fmt};

use warden_api::{AppState, build_app, serve};
use warden_auth::AuthSuite;
use warden_core::clock::{Clock, SystemClock};
use warden_core::config::{AppConfig, LogFormat, LoggingConfig};
use warden_core::error::{AppError, ErrorKind};
use warden_core::result::AppResult;
use warden_database::Stores;

#[tokio::main]
async fn main() {
    let config = match load_configuration() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load configuration: {e}");
            std::process::exit(1);
        }
    };

    init_logging(&config.logging);

    if let Err(e) = run(config).await {
        error!(error = %e, "Server error");
        std::process::exit(1);
    }
}

/// `WARDEN_CONFIG` names an explicit file; otherwise `config/default.toml`
/// is layered with `config/$WARDEN_ENV.toml`.
fn load_configuration() -> AppResult<AppConfig> {
    let config = match std::env::var("WARDEN_CONFIG") {
        Ok(path) => AppConfig::load_file(&path)?,
        Err(_) => {
            let env = std::env::var("WARDEN_ENV").unwrap_or_else(|_| "development".to_string());
            AppConfig::load(&env)?
        }
    };
    config.validate()?;
    Ok(config)
}

fn init_logging(config: &LoggingConfig) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));

    match config.format {
        LogFormat::Json => {
            fmt()
                .json()
                .with_env_filter(filter)
                .with_target(true)
                .init();
        }
        LogFormat::Pretty => {
            fmt().pretty().with_env_filter(filter).with_target(true).init();
        }
    }
}

async fn run(config: AppConfig) -> AppResult<()> {
    info!(version = env!("CARGO_PKG_VERSION"), "Starting Warden admin API");
    if config.telegram.dev_mode {
        warn!("telegram.dev_mode is on: bare Telegram ids are accepted at login");
    }

    let (stores, pool) = Stores::connect(&config.database).await?;
    if let Some(pool) = &pool {
        match pool.ping().await {
            Ok(()) => info!("Database healthy"),
            Err(e) => warn!(error = %e, "Database ping failed at startup"),
        }
    }

    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let auth = AuthSuite::build(&config, &stores, clock)?;

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let shutdown_tx = Arc::new(shutdown_tx);

    let cleanup = auth.cleanup.clone();
    let cleanup_cancel = shutdown_rx.clone();
    let cleanup_handle = tokio::spawn(async move { cleanup.run(cleanup_cancel).await });

    let signal_tx = shutdown_tx.clone();
    tokio::spawn(async move {
        shutdown_signal().await;
        let _ = signal_tx.send(true);
    });

    let grace = Duration::from_secs(config.server.shutdown_grace_seconds);
    let addr = config.server.bind_address();
    let listener = TcpListener::bind(&addr)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Internal, format!("Failed to bind {addr}"), e))?;

    let app = build_app(AppState::new(config, auth));
    let served = serve(listener, app, shutdown_rx, grace).await;

    let _ = shutdown_tx.send(true);
    if let Err(e) = cleanup_handle.await {
        warn!(error = %e, "Cleanup task ended abnormally");
    }
    if let Some(pool) = pool {
        pool.close().await;
    }

    info!("Warden admin API stopped");
    served
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }

    info!("Shutdown signal received");
}
