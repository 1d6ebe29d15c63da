//! Warden moderation bot.
//!
//! Long-polls Telegram and serves staff menus until SIGINT or SIGTERM.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tracing::{error, info, warn};
use tracing_subscriber::{EnvFilter, fmt};

use warden_bot::{BotApi, BotContext, DialogMap, Outbox, PollRunner, UpdateRouter, UpdateSource};
use warden_core::clock::{Clock, SystemClock};
use warden_core::config::{AppConfig, LogFormat, LoggingConfig};
use warden_core::error::AppError;
use warden_core::result::AppResult;
use warden_database::Stores;
use warden_service::Services;

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
        error!(error = %e, "Bot error");
        std::process::exit(1);
    }
}

fn load_configuration() -> AppResult<AppConfig> {
    let config = match std::env::var("WARDEN_CONFIG") {
        Ok(path) => AppConfig::load_file(&path)?,
        Err(_) => {
            let env = std::env::var("WARDEN_ENV").unwrap_or_else(|_| "development".to_string());
            AppConfig::load(&env)?
        }
    };
    config.validate()?;
    if config.bot.owner_id <= 0 {
        return Err(AppError::configuration("bot.owner_id must be set for the bot"));
    }
    Ok(config)
}

fn init_logging(config: &LoggingConfig) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));
    match config.format {
        LogFormat::Json => fmt().json().with_env_filter(filter).with_target(true).init(),
        LogFormat::Pretty => fmt().pretty().with_env_filter(filter).with_target(true).init(),
    }
}

async fn run(config: AppConfig) -> AppResult<()> {
    info!(version = env!("CARGO_PKG_VERSION"), "Starting Warden bot");

    let api = Arc::new(BotApi::new(&config.telegram)?);
    match api.get_me().await {
        Ok(Some(username)) => info!(bot = %username, "Bot token accepted"),
        Ok(None) => info!("Bot token accepted"),
        Err(e) => return Err(e),
    }

    let (stores, pool) = Stores::connect(&config.database).await?;
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let services = Services::build(&config, &stores, clock).await?;

    let dialogs = DialogMap::new(
        config.bot.dialog_capacity,
        Duration::from_secs(config.bot.dialog_ttl_seconds),
    );
    let outbox: Arc<dyn Outbox> = api.clone();
    let router = Arc::new(UpdateRouter::new(BotContext {
        services,
        outbox,
        dialogs,
    }));
    let source: Arc<dyn UpdateSource> = api.clone();
    let runner = PollRunner::new(source, router, config.bot.concurrency, api.poll_timeout());

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        shutdown_signal().await;
        let _ = shutdown_tx.send(true);
    });

    runner.run(shutdown_rx).await;

    if let Some(pool) = pool {
        pool.close().await;
    }
    info!("Warden bot stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to install Ctrl+C handler");
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
                warn!(error = %e, "Failed to install SIGTERM handler");
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
