//! Moderation queue entities.

pub mod action;
pub mod item;
pub mod reason;

pub use action::{ActorWorkStats, Decision, ModerationAction, NewModerationAction};
pub use item::{EtaBucket, ModerationItem, ModerationStatus};
pub use reason::RejectReason;
