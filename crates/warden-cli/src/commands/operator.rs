//! Operator account management.

use chrono::Utc;
use clap::{Args, Subcommand};
use serde::Serialize;
use tabled::Tabled;

use warden_auth::PasswordHasher;
use warden_core::error::AppError;
use warden_database::Stores;
use warden_entity::operator::{CreateOperator, Operator, Role};

use super::input_error;
use super::password::{check_strength, prompt_password};
use crate::output::{self, OutputFormat};

/// Arguments for operator commands
#[derive(Debug, Args)]
pub struct OperatorArgs {
    /// Operator subcommand
    #[command(subcommand)]
    pub command: OperatorCommand,
}

/// Operator subcommands
#[derive(Debug, Subcommand)]
pub enum OperatorCommand {
    /// Create an operator; TOTP is enrolled afterwards through the setup endpoints
    Create {
        /// Telegram user id
        #[arg(long)]
        telegram_id: i64,
        /// Telegram username, without @
        #[arg(long)]
        username: Option<String>,
        /// Display name
        #[arg(long)]
        display_name: Option<String>,
        /// Role: OWNER, ADMIN or MODERATOR
        #[arg(long, default_value = "ADMIN")]
        role: String,
        /// Password (will prompt if not provided)
        #[arg(long)]
        password: Option<String>,
    },
    /// List all operators
    List,
    /// Enable or disable sign-in
    SetActive {
        /// Telegram user id
        telegram_id: i64,
        /// New state
        #[arg(long, action = clap::ArgAction::Set)]
        active: bool,
    },
    /// Clear failed attempts and any lockout
    Unlock {
        /// Telegram user id
        telegram_id: i64,
    },
    /// Remove the TOTP secret so the operator can enroll again
    ResetTotp {
        /// Telegram user id
        telegram_id: i64,
        /// Skip confirmation prompt
        #[arg(long)]
        force: bool,
    },
}

/// Operator display row
#[derive(Debug, Serialize, Tabled)]
struct OperatorRow {
    /// Operator id
    id: i64,
    /// Telegram id
    telegram_id: i64,
    /// Username
    username: String,
    /// Role
    role: String,
    /// Active flag
    active: bool,
    /// TOTP enrolled
    totp: bool,
    /// Failed attempts
    failures: i32,
    /// Lockout end
    locked_until: String,
    /// Created at
    created_at: String,
}

impl From<&Operator> for OperatorRow {
    fn from(op: &Operator) -> Self {
        Self {
            id: op.id,
            telegram_id: op.external_id,
            username: op.login_handle.clone().unwrap_or_default(),
            role: op.role.as_str().to_string(),
            active: op.is_active,
            totp: op.has_totp(),
            failures: op.failed_attempts,
            locked_until: op
                .locked_until
                .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
                .unwrap_or_default(),
            created_at: op.created_at.format("%Y-%m-%d %H:%M").to_string(),
        }
    }
}

/// Roles an operator account may hold
fn operator_role(raw: &str) -> Result<Role, AppError> {
    match raw.parse::<Role>()? {
        Role::None => Err(AppError::invalid_input("Operators need a staff role")),
        role => Ok(role),
    }
}

/// Execute operator commands
pub async fn execute(
    args: &OperatorArgs,
    config_path: Option<&str>,
    format: OutputFormat,
) -> Result<(), AppError> {
    let config = super::load_config(config_path)?;
    let (stores, pool) = Stores::connect(&config.database).await?;
    let operators = stores.operators.clone();
    let now = Utc::now();

    match &args.command {
        OperatorCommand::Create {
            telegram_id,
            username,
            display_name,
            role,
            password,
        } => {
            if *telegram_id <= 0 {
                return Err(AppError::invalid_input("telegram-id must be positive"));
            }
            let role = operator_role(role)?;
            if operators.find_by_external_id(*telegram_id).await?.is_some() {
                return Err(AppError::conflict(format!(
                    "Operator with Telegram id {telegram_id} already exists"
                )));
            }

            let password = match password {
                Some(p) => p.clone(),
                None => prompt_password("Operator password")?,
            };
            check_strength(&password)?;
            let hasher = PasswordHasher::new(&config.auth.password)?;

            let operator = operators
                .create(
                    &CreateOperator {
                        external_id: *telegram_id,
                        login_handle: username.as_ref().map(|u| u.trim_start_matches('@').to_string()),
                        display_name: display_name.clone(),
                        role,
                        password_hash: hasher.hash_password(&password)?,
                    },
                    now,
                )
                .await?;

            output::print_item(&OperatorRow::from(&operator), format);
            output::print_success("Operator created; enroll TOTP before first login.");
        }
        OperatorCommand::List => {
            let rows: Vec<OperatorRow> = operators.list().await?.iter().map(OperatorRow::from).collect();
            output::print_list(&rows, format);
        }
        OperatorCommand::SetActive {
            telegram_id,
            active,
        } => {
            let operator = find(&stores, *telegram_id).await?;
            operators.set_active(operator.id, *active, now).await?;
            let state = if *active { "enabled" } else { "disabled" };
            output::print_success(&format!("Operator {telegram_id} {state}"));
        }
        OperatorCommand::Unlock { telegram_id } => {
            let operator = find(&stores, *telegram_id).await?;
            operators.reset_failures(operator.id, now).await?;
            output::print_success(&format!("Operator {telegram_id} unlocked"));
        }
        OperatorCommand::ResetTotp { telegram_id, force } => {
            let operator = find(&stores, *telegram_id).await?;
            if !force {
                let confirm = dialoguer::Confirm::new()
                    .with_prompt(format!(
                        "Remove the TOTP secret of operator {telegram_id}? They cannot sign in until they enroll again."
                    ))
                    .default(false)
                    .interact()
                    .map_err(input_error)?;
                if !confirm {
                    println!("Cancelled.");
                    return Ok(());
                }
            }
            operators.disable_totp(operator.id, now).await?;
            output::print_success(&format!("TOTP cleared for operator {telegram_id}"));
        }
    }

    if let Some(pool) = pool {
        pool.close().await;
    }
    Ok(())
}

async fn find(stores: &Stores, telegram_id: i64) -> Result<Operator, AppError> {
    stores
        .operators
        .find_by_external_id(telegram_id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("No operator with Telegram id {telegram_id}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_operator_roles() {
        assert_eq!(operator_role("admin").unwrap(), Role::Admin);
        assert_eq!(operator_role("MOD").unwrap(), Role::Moderator);
        assert!(operator_role("none").is_err());
        assert!(operator_role("root").is_err());
    }
}
