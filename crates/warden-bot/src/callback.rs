//! Inline button payloads.
//!
//! Callback data follows `prefix:verb[:arg1[:arg2]]` with
//! `prefix ∈ {acc, mod, find, sys, wst}`. Everything a button needs is
//! carried in the payload itself; Telegram caps it at 64 bytes.

use std::fmt;
use std::str::FromStr;

use warden_core::error::AppError;
use warden_entity::moderation::RejectReason;
use warden_entity::operator::Role;

/// Telegram's limit on `callback_data`.
pub const MAX_CALLBACK_BYTES: usize = 64;

/// A decoded inline button press.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Callback {
    /// `mod:next`
    ModNext,
    /// `mod:approve:<item>`
    ModApprove(i64),
    /// `mod:reject:<item>`, which opens the reason keyboard.
    ModReject(i64),
    /// `mod:reason:<item>:<CODE>`
    ModReason(i64, RejectReason),
    /// `mod:skip:<item>`
    ModSkip(i64),
    /// `find:start`
    FindStart,
    /// `find:ban:<uid>`
    FindBan(i64),
    /// `find:unban:<uid>`
    FindUnban(i64),
    /// `find:review:<uid>`
    FindReview(i64),
    /// `acc:list`
    AccList,
    /// `acc:grant:<uid>:<ROLE>`
    AccGrant(i64, Role),
    /// `acc:revoke:<uid>:<ROLE>`
    AccRevoke(i64, Role),
    /// `sys:toggle:<key>`
    SysToggle(String),
    /// `sys:users`
    SysUsers,
    /// `wst:show`
    WstShow,
}

impl FromStr for Callback {
    type Err = AppError;

    fn from_str(data: &str) -> Result<Self, Self::Err> {
        if data.len() > MAX_CALLBACK_BYTES {
            return Err(malformed(data));
        }
        let parts: Vec<&str> = data.split(':').collect();
        let parsed = match parts.as_slice() {
            ["mod", "next"] => Self::ModNext,
            ["mod", "approve", item] => Self::ModApprove(id(item)?),
            ["mod", "reject", item] => Self::ModReject(id(item)?),
            ["mod", "reason", item, code] => Self::ModReason(id(item)?, code.parse()?),
            ["mod", "skip", item] => Self::ModSkip(id(item)?),
            ["find", "start"] => Self::FindStart,
            ["find", "ban", uid] => Self::FindBan(id(uid)?),
            ["find", "unban", uid] => Self::FindUnban(id(uid)?),
            ["find", "review", uid] => Self::FindReview(id(uid)?),
            ["acc", "list"] => Self::AccList,
            ["acc", "grant", uid, role] => Self::AccGrant(id(uid)?, role.parse()?),
            ["acc", "revoke", uid, role] => Self::AccRevoke(id(uid)?, role.parse()?),
            ["sys", "toggle", key] if flag_key(key) => Self::SysToggle((*key).to_string()),
            ["sys", "users"] => Self::SysUsers,
            ["wst", "show"] => Self::WstShow,
            _ => return Err(malformed(data)),
        };
        Ok(parsed)
    }
}

impl fmt::Display for Callback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ModNext => write!(f, "mod:next"),
            Self::ModApprove(item) => write!(f, "mod:approve:{item}"),
            Self::ModReject(item) => write!(f, "mod:reject:{item}"),
            Self::ModReason(item, reason) => write!(f, "mod:reason:{item}:{}", reason.as_str()),
            Self::ModSkip(item) => write!(f, "mod:skip:{item}"),
            Self::FindStart => write!(f, "find:start"),
            Self::FindBan(uid) => write!(f, "find:ban:{uid}"),
            Self::FindUnban(uid) => write!(f, "find:unban:{uid}"),
            Self::FindReview(uid) => write!(f, "find:review:{uid}"),
            Self::AccList => write!(f, "acc:list"),
            Self::AccGrant(uid, role) => write!(f, "acc:grant:{uid}:{}", role.as_str()),
            Self::AccRevoke(uid, role) => write!(f, "acc:revoke:{uid}:{}", role.as_str()),
            Self::SysToggle(key) => write!(f, "sys:toggle:{key}"),
            Self::SysUsers => write!(f, "sys:users"),
            Self::WstShow => write!(f, "wst:show"),
        }
    }
}

fn id(raw: &str) -> Result<i64, AppError> {
    raw.parse::<i64>()
        .ok()
        .filter(|v| *v > 0)
        .ok_or_else(|| AppError::invalid_input(format!("Bad id in callback: {raw}")))
}

fn flag_key(key: &str) -> bool {
    !key.is_empty() && key.bytes().all(|b| b.is_ascii_lowercase() || b == b'_')
}

fn malformed(data: &str) -> AppError {
    AppError::invalid_input(format!("Unknown callback: {data}"))
}
