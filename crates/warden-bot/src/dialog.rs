//! Pending free-text input per chat and author.
//!
//! Most state rides in callback payloads. The two flows that need a typed
//! reply (a reject comment and a lookup query) park one expectation here;
//! it expires after the configured TTL and the map is capacity-bounded.

use std::time::Duration;

use moka::future::Cache;

/// What the next plain-text message from this author means.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dialog {
    /// Free-text comment for an `OTHER` rejection.
    RejectComment { item_id: i64 },
    /// `@username` or numeric id to look up.
    LookupQuery,
}

/// `(chat_id, author_id) -> Dialog`.
#[derive(Debug, Clone)]
pub struct DialogMap {
    pending: Cache<(i64, i64), Dialog>,
}

impl DialogMap {
    /// Holds at most `capacity` dialogs, each for at most `ttl`.
    pub fn new(capacity: u64, ttl: Duration) -> Self {
        Self {
            pending: Cache::builder()
                .max_capacity(capacity)
                .time_to_live(ttl)
                .build(),
        }
    }

    /// Replace whatever this author was doing in this chat.
    pub async fn expect(&self, chat_id: i64, author_id: i64, dialog: Dialog) {
        self.pending.insert((chat_id, author_id), dialog).await;
    }

    /// Remove and return the pending dialog, if any.
    pub async fn take(&self, chat_id: i64, author_id: i64) -> Option<Dialog> {
        self.pending.remove(&(chat_id, author_id)).await
    }

    /// Peek without consuming.
    pub async fn current(&self, chat_id: i64, author_id: i64) -> Option<Dialog> {
        self.pending.get(&(chat_id, author_id)).await
    }
}
