//! # warden-api
//!
//! HTTP surface of the admin login service.
//!
//! Handlers translate JSON requests into calls on [`warden_auth::AuthSuite`]
//! and map [`warden_core::AppError`] kinds onto the public error envelope
//! `{"error":{"code","message"}}`.

pub mod app;
pub mod dto;
pub mod error;
pub mod extractors;
pub mod handlers;
pub mod middleware;
pub mod router;
pub mod state;

pub use app::{build_app, serve};
pub use error::ApiError;
pub use state::AppState;
