//! Interactive password hashing.

use clap::Args;

use warden_auth::PasswordHasher;
use warden_core::error::AppError;

use super::input_error;

/// Minimum accepted password length
pub const MIN_PASSWORD_LEN: usize = 12;

/// Arguments for hash-password
#[derive(Debug, Args)]
pub struct HashPasswordArgs {
    /// Read the password from this argument instead of prompting
    #[arg(long)]
    pub password: Option<String>,
}

/// Prompt twice and hash
pub fn execute(args: &HashPasswordArgs, config_path: Option<&str>) -> Result<(), AppError> {
    let config = super::load_config(config_path)?;
    let hasher = PasswordHasher::new(&config.auth.password)?;

    let password = match &args.password {
        Some(p) => p.clone(),
        None => prompt_password("Password")?,
    };
    check_strength(&password)?;

    println!("{}", hasher.hash_password(&password)?);
    Ok(())
}

/// Hidden prompt with confirmation
pub fn prompt_password(prompt: &str) -> Result<String, AppError> {
    dialoguer::Password::new()
        .with_prompt(prompt)
        .with_confirmation("Repeat password", "Passwords do not match")
        .interact()
        .map_err(input_error)
}

/// Length floor for operator passwords
pub fn check_strength(password: &str) -> Result<(), AppError> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(AppError::invalid_input(format!(
            "Password must be at least {MIN_PASSWORD_LEN} characters"
        )));
    }
    Ok(())
}
