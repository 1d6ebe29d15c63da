//! TOTP enrollment, reachable only through the bootstrap key.

pub mod bootstrap;
pub mod setup;

pub use bootstrap::BootstrapGuard;
pub use setup::{SetupStarted, TotpEnrollment};
