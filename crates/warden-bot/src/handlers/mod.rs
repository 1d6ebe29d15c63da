//! One module per menu section.

pub mod access;
pub mod lookup;
pub mod moderation;
pub mod stats;
pub mod system;

/// Where a handler answers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Reply {
    /// Chat to answer in.
    pub chat_id: i64,
    /// Message to edit in place, for button presses.
    pub message_id: Option<i64>,
}

impl Reply {
    /// Answer with a fresh message.
    pub fn new(chat_id: i64) -> Self {
        Self {
            chat_id,
            message_id: None,
        }
    }

    /// Answer by editing `message_id`.
    pub fn edit(chat_id: i64, message_id: i64) -> Self {
        Self {
            chat_id,
            message_id: Some(message_id),
        }
    }

    /// Same chat, fresh message.
    pub fn fresh(self) -> Self {
        Self::new(self.chat_id)
    }
}
