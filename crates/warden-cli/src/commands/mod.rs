//! CLI command definitions and dispatch.

pub mod key;
pub mod migrate;
pub mod operator;
pub mod password;

use clap::{Parser, Subcommand};

use warden_core::config::AppConfig;
use warden_core::error::AppError;

use crate::output::OutputFormat;

/// Warden: operator administration for the admin API and moderation bot
#[derive(Debug, Parser)]
#[command(name = "warden", version, about, long_about = None)]
pub struct Cli {
    /// Configuration file; defaults to config/default.toml layered with $WARDEN_ENV
    #[arg(short, long)]
    pub config: Option<String>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "table")]
    pub format: OutputFormat,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level commands
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Hash a password with the configured Argon2id parameters
    HashPassword(password::HashPasswordArgs),
    /// Generate a 32-byte TOTP envelope key
    GenKey,
    /// Apply pending database migrations
    Migrate,
    /// Operator account management
    Operator(operator::OperatorArgs),
}

impl Cli {
    /// Execute the CLI command
    pub async fn execute(&self) -> Result<(), AppError> {
        match &self.command {
            Commands::HashPassword(args) => password::execute(args, self.config.as_deref()),
            Commands::GenKey => {
                println!("{}", key::generate());
                Ok(())
            }
            Commands::Migrate => migrate::execute(self.config.as_deref()).await,
            Commands::Operator(args) => {
                operator::execute(args, self.config.as_deref(), self.format).await
            }
        }
    }
}

/// Load configuration from an explicit file or the environment layers
pub fn load_config(config_path: Option<&str>) -> Result<AppConfig, AppError> {
    match config_path {
        Some(path) => AppConfig::load_file(path),
        None => {
            let env = std::env::var("WARDEN_ENV").unwrap_or_else(|_| "development".to_string());
            AppConfig::load(&env)
        }
    }
}

/// Map a terminal prompt failure
pub fn input_error(e: dialoguer::Error) -> AppError {
    AppError::internal(format!("Input error: {e}"))
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parses_operator_create() {
        let cli = Cli::try_parse_from([
            "warden",
            "--format",
            "json",
            "operator",
            "create",
            "--telegram-id",
            "42",
            "--role",
            "admin",
        ])
        .unwrap();
        assert_eq!(cli.format, OutputFormat::Json);
        assert!(matches!(cli.command, Commands::Operator(_)));
    }
}
