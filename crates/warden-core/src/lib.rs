//! # warden-core
//!
//! Core crate for Warden. Contains the layered configuration schema,
//! the injectable clock, and the unified error system.
//!
//! This crate has **no** internal dependencies on other Warden crates.

pub mod clock;
pub mod config;
pub mod error;
pub mod result;

pub use clock::{Clock, ManualClock, SystemClock};
pub use error::{AppError, ErrorKind};
pub use result::AppResult;
