//! Telegram Bot API surface used by the bot.

pub mod client;
pub mod types;

pub use client::{BotApi, Outbox};
pub use types::{
    ApiResponse, CallbackQuery, Chat, InlineKeyboardButton, InlineKeyboardMarkup, KeyboardButton,
    Message, ReplyKeyboardMarkup, ReplyKeyboardRemove, ReplyMarkup, Update, User,
};
