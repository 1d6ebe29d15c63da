//! Role resolution, the grant matrix and per-role capabilities.

pub mod capability;
pub mod service;

pub use capability::{Capability, can_assign};
pub use service::{AccessService, RoleChange};
