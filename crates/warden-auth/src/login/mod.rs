//! Three-stage operator login.

pub mod manager;
pub mod throttle;

pub use manager::{ChallengeStarted, FactorAccepted, LoginCompleted, LoginManager, StartLogin};
pub use throttle::LoginThrottle;
