//! # warden-bot
//!
//! Staff-facing Telegram bot over the moderation services.
//!
//! ## Modules
//!
//! - `telegram` — Bot API wire types and the long-poll HTTP client
//! - `callback` — the `prefix:verb[:arg1[:arg2]]` inline button grammar
//! - `keyboard` — role-specific reply menus and inline keyboards
//! - `dialog` — bounded, expiring "next text input" state per chat and author
//! - `render` — plain-text cards and reports
//! - `router` / `handlers` — update dispatch
//! - `runner` — the `getUpdates` loop with bounded concurrency

pub mod callback;
pub mod dialog;
pub mod handlers;
pub mod keyboard;
pub mod render;
pub mod router;
pub mod runner;
pub mod telegram;

pub use callback::Callback;
pub use dialog::{Dialog, DialogMap};
pub use router::{BotContext, UpdateRouter};
pub use runner::{PollRunner, UpdateSource};
pub use telegram::{BotApi, Outbox};
