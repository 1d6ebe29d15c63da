//! Login protocol entities: challenges, enrollment tokens and sessions.

pub mod challenge;
pub mod session;
pub mod totp_setup;

pub use challenge::{ChallengeStatus, CreateChallenge, LoginChallenge};
pub use session::{CreateSession, Session};
pub use totp_setup::TotpSetupToken;
