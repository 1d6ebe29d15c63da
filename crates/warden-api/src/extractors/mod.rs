//! Request extractors.

pub mod auth;
pub mod client;
pub mod json;

pub use auth::{BearerToken, CurrentOperator};
pub use client::ClientInfo;
pub use json::ValidatedJson;
