//! PostgreSQL implementations of the store traits, one repository per table.

pub mod audit;
pub mod ban;
pub mod challenge;
pub mod flag;
pub mod moderation;
pub mod operator;
pub mod profile;
pub mod registry;
pub mod session;
pub mod totp_setup;

pub use audit::AuditRepository;
pub use ban::BanRepository;
pub use challenge::ChallengeRepository;
pub use flag::FlagRepository;
pub use moderation::ModerationRepository;
pub use operator::OperatorRepository;
pub use profile::ProfileRepository;
pub use registry::RegistryRepository;
pub use session::SessionRepository;
pub use totp_setup::TotpSetupRepository;

use warden_core::error::{AppError, ErrorKind};

/// Wrap a sqlx error with a short description of the failed operation.
pub(crate) fn db_err(context: &'static str) -> impl FnOnce(sqlx::Error) -> AppError {
    move |e| AppError::with_source(ErrorKind::Database, context, e)
}
