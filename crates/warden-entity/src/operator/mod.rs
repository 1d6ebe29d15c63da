//! Operator domain entities.

pub mod model;
pub mod role;

pub use model::{CreateOperator, FailureOutcome, Operator};
pub use role::Role;
