//! One-time passcodes and the at-rest secret envelope.

pub mod authenticator;
pub mod envelope;

pub use authenticator::{TotpAuthenticator, TotpProvision};
pub use envelope::{OpenedSecret, SecretEnvelope};
