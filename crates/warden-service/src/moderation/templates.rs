//! User-facing rejection texts.

use warden_entity::moderation::RejectReason;

/// Separator placed before a moderator's free-text comment.
pub const COMMENT_PREFIX: &str = " Комментарий модератора: ";

/// What went wrong and what the user should do about it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RejectionText {
    /// Explanation shown to the user.
    pub reason_text: String,
    /// Required fix step.
    pub required_fix_step: String,
}

/// Canned `(reason, fix)` pair for a reason code.
pub fn template(reason: RejectReason) -> (&'static str, &'static str) {
    match reason {
        RejectReason::PhotoNoFace => (
            "На фото не видно лица.",
            "Загрузите фото, где хорошо видно ваше лицо.",
        ),
        RejectReason::PhotoFakeNotYou => (
            "Фото похоже на чужое или взято из интернета.",
            "Загрузите собственные фотографии.",
        ),
        RejectReason::PhotoProhibited => (
            "Фото содержит запрещённый контент.",
            "Замените фото в соответствии с правилами.",
        ),
        RejectReason::CircleMismatch => (
            "Человек в видеокружке не совпадает с фото.",
            "Запишите новый видеокружок.",
        ),
        RejectReason::CircleFailed => (
            "Видеокружок не удалось проверить.",
            "Запишите видеокружок заново при хорошем освещении.",
        ),
        RejectReason::ProfileIncomplete => (
            "Анкета заполнена не полностью.",
            "Заполните все обязательные поля анкеты.",
        ),
        RejectReason::SpamAdsLinks => (
            "Анкета содержит рекламу или ссылки.",
            "Удалите рекламу и ссылки из анкеты.",
        ),
        RejectReason::BotSuspect => (
            "Анкета похожа на автоматическую.",
            "Свяжитесь с поддержкой для проверки.",
        ),
        RejectReason::Other => (
            "Анкета не прошла модерацию.",
            "Исправьте анкету и отправьте её повторно.",
        ),
    }
}

/// Template texts with an optional moderator comment appended to both.
pub fn compose(reason: RejectReason, comment: Option<&str>) -> RejectionText {
    let (reason_text, fix) = template(reason);
    match comment.map(str::trim).filter(|c| !c.is_empty()) {
        Some(comment) => RejectionText {
            reason_text: format!("{reason_text}{COMMENT_PREFIX}{comment}"),
            required_fix_step: format!("{fix}{COMMENT_PREFIX}{comment}"),
        },
        None => RejectionText {
            reason_text: reason_text.to_string(),
            required_fix_step: fix.to_string(),
        },
    }
}
