//! Session lifecycle.

pub mod cleanup;
pub mod manager;

pub use cleanup::{CleanupReport, StateCleanup};
pub use manager::{AuthenticatedOperator, SessionManager};
