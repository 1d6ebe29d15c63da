//! Leased moderation queue with CAS decisions.

pub mod cache;
pub mod service;
pub mod templates;

pub use cache::LookupCache;
pub use service::{ModerationCard, ModerationService};
pub use templates::{COMMENT_PREFIX, RejectionText, compose};
