//! # warden-entity
//!
//! Domain entity models for Warden. Every struct in this crate represents
//! a database table row or a domain value object. Database entities derive
//! `sqlx::FromRow`; database enums derive `sqlx::Type` and map onto the
//! PostgreSQL enum types declared in the migrations.

pub mod audit;
pub mod auth;
pub mod ban;
pub mod bot_user;
pub mod flag;
pub mod moderation;
pub mod operator;
pub mod profile;

pub use operator::{Operator, Role};
