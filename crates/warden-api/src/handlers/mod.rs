//! Route handlers.

pub mod auth;
pub mod enrollment;
pub mod health;
