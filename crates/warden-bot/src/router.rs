//! Update dispatch.
//!
//! Every update is resolved to an [`Actor`] first; users without a staff
//! role get a refusal and nothing else. Callback errors surface as a
//! toast on the pressed button, message errors as a reply.

use std::sync::Arc;

use tracing::{debug, error, warn};

use warden_core::error::{AppError, ErrorKind};
use warden_core::result::AppResult;
use warden_entity::operator::Role;
use warden_service::{Actor, Services};

use crate::callback::Callback;
use crate::dialog::{Dialog, DialogMap};
use crate::handlers::{self, Reply};
use crate::keyboard::{self, MenuEntry};
use crate::render;
use crate::telegram::{
    CallbackQuery, InlineKeyboardMarkup, Message, Outbox, ReplyKeyboardRemove, ReplyMarkup, Update,
};

const REFUSAL: &str = "You have no staff access.";

const HELP: &str = "Use the menu below.\n\
/next: next profile to review\n\
/find <@username|id>: look up a user\n\
/grant <@username|id> <role>, /revoke <@username|id> <role>\n\
/stats: work stats\n\
/cancel: drop a pending input";

/// Everything handlers need.
#[derive(Clone)]
pub struct BotContext {
    /// Business services.
    pub services: Services,
    /// Outgoing Telegram calls.
    pub outbox: Arc<dyn Outbox>,
    /// Pending free-text inputs.
    pub dialogs: DialogMap,
}

impl std::fmt::Debug for BotContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BotContext")
            .field("services", &self.services)
            .field("dialogs", &self.dialogs)
            .finish_non_exhaustive()
    }
}

impl BotContext {
    /// Send a new message.
    pub async fn send(
        &self,
        chat_id: i64,
        text: impl AsRef<str>,
        markup: Option<ReplyMarkup>,
    ) -> AppResult<()> {
        self.outbox.send_message(chat_id, text.as_ref(), markup).await
    }

    /// Edit the message behind a button press, or send when there is none.
    pub async fn show(
        &self,
        at: Reply,
        text: impl AsRef<str>,
        markup: Option<InlineKeyboardMarkup>,
    ) -> AppResult<()> {
        match at.message_id {
            Some(message_id) => {
                self.outbox
                    .edit_message(at.chat_id, message_id, text.as_ref(), markup)
                    .await
            }
            None => {
                self.outbox
                    .send_message(at.chat_id, text.as_ref(), markup.map(ReplyMarkup::from))
                    .await
            }
        }
    }
}

/// A slash command.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Command {
    Start,
    Cancel,
    Next,
    Stats,
    Find(String),
    Grant(String),
    Revoke(String),
    Unknown,
}

impl Command {
    fn parse(text: &str) -> Option<Self> {
        let text = text.trim();
        let rest = text.strip_prefix('/')?;
        let (head, args) = rest.split_once(char::is_whitespace).unwrap_or((rest, ""));
        let name = head.split('@').next().unwrap_or(head).to_ascii_lowercase();
        let args = args.trim().to_string();

        Some(match name.as_str() {
            "start" | "menu" | "help" => Self::Start,
            "cancel" => Self::Cancel,
            "next" => Self::Next,
            "stats" => Self::Stats,
            "find" => Self::Find(args),
            "grant" => Self::Grant(args),
            "revoke" => Self::Revoke(args),
            _ => Self::Unknown,
        })
    }
}

/// Routes updates to handlers.
#[derive(Debug, Clone)]
pub struct UpdateRouter {
    ctx: BotContext,
}

impl UpdateRouter {
    pub fn new(ctx: BotContext) -> Self {
        Self { ctx }
    }

    pub fn context(&self) -> &BotContext {
        &self.ctx
    }

    /// Handle one update end to end.
    ///
    /// Business failures are reported to the chat; only a failure to talk
    /// to Telegram is returned.
    pub async fn handle(&self, update: Update) -> AppResult<()> {
        if let Some(query) = update.callback_query {
            return self.on_callback(query).await;
        }
        if let Some(message) = update.message {
            return self.on_message(message).await;
        }
        debug!(update_id = update.update_id, "Ignoring update without message or callback");
        Ok(())
    }

    async fn on_message(&self, message: Message) -> AppResult<()> {
        let (Some(from), Some(text)) = (message.from.as_ref(), message.text.as_deref()) else {
            return Ok(());
        };
        if from.is_bot {
            return Ok(());
        }
        let chat_id = message.chat.id;
        let at = Reply::new(chat_id);

        let actor = match self.ctx.services.access.identify(&from.touch()).await {
            Ok(actor) => actor,
            Err(e) => return self.report(chat_id, &e).await,
        };
        if actor.role == Role::None {
            return self.refuse(chat_id).await;
        }

        let outcome = self.dispatch_text(&actor, at, text).await;
        match outcome {
            Ok(()) => Ok(()),
            Err(e) => self.report(chat_id, &e).await,
        }
    }

    async fn dispatch_text(&self, actor: &Actor, at: Reply, text: &str) -> AppResult<()> {
        let ctx = &self.ctx;
        let chat_id = at.chat_id;

        if let Some(command) = Command::parse(text) {
            ctx.dialogs.take(chat_id, actor.external_id).await;
            return match command {
                Command::Start | Command::Unknown => self.menu(actor, chat_id, HELP).await,
                Command::Cancel => self.menu(actor, chat_id, "Cancelled.").await,
                Command::Next => handlers::moderation::next(ctx, actor, at).await,
                Command::Stats => handlers::stats::show(ctx, actor, at).await,
                Command::Find(query) if query.is_empty() => {
                    handlers::lookup::start(ctx, actor, at).await
                }
                Command::Find(query) => handlers::lookup::run(ctx, actor, at, &query).await,
                Command::Grant(args) => handlers::access::command(ctx, actor, at, &args, true).await,
                Command::Revoke(args) => {
                    handlers::access::command(ctx, actor, at, &args, false).await
                }
            };
        }

        if let Some(entry) = MenuEntry::from_label(text) {
            ctx.dialogs.take(chat_id, actor.external_id).await;
            if !entry.visible_to(actor.role) {
                return self.menu(actor, chat_id, HELP).await;
            }
            return match entry {
                MenuEntry::Moderation => handlers::moderation::menu(ctx, actor, at).await,
                MenuEntry::Lookup => handlers::lookup::start(ctx, actor, at).await,
                MenuEntry::Access => handlers::access::menu(ctx, actor, at).await,
                MenuEntry::System => handlers::system::menu(ctx, actor, at).await,
                MenuEntry::Stats => handlers::stats::show(ctx, actor, at).await,
            };
        }

        match ctx.dialogs.take(chat_id, actor.external_id).await {
            Some(Dialog::RejectComment { item_id }) => {
                handlers::moderation::reject_with_comment(ctx, actor, at, item_id, text).await
            }
            Some(Dialog::LookupQuery) => handlers::lookup::run(ctx, actor, at, text).await,
            None => self.menu(actor, chat_id, HELP).await,
        }
    }

    async fn on_callback(&self, query: CallbackQuery) -> AppResult<()> {
        let outcome = self.dispatch_callback(&query).await;
        let toast = match &outcome {
            Ok(()) => None,
            Err(e) => {
                log_failure(e);
                Some(render::error(e))
            }
        };
        self.ctx
            .outbox
            .answer_callback(&query.id, toast.as_deref())
            .await
    }

    async fn dispatch_callback(&self, query: &CallbackQuery) -> AppResult<()> {
        let Some(message) = query.message.as_ref() else {
            return Ok(());
        };
        let Some(data) = query.data.as_deref() else {
            return Ok(());
        };
        let callback: Callback = data.parse()?;

        let actor = self.ctx.services.access.identify(&query.from.touch()).await?;
        if actor.role == Role::None {
            return Err(AppError::forbidden("no staff role"));
        }

        let ctx = &self.ctx;
        let at = Reply::edit(message.chat.id, message.message_id);
        let actor = &actor;
        match callback {
            Callback::ModNext => handlers::moderation::next(ctx, actor, Reply::new(at.chat_id)).await,
            Callback::ModApprove(item) => handlers::moderation::approve(ctx, actor, at, item).await,
            Callback::ModReject(item) => {
                handlers::moderation::choose_reason(ctx, actor, at, item).await
            }
            Callback::ModReason(item, reason) => {
                handlers::moderation::reason(ctx, actor, at, item, reason).await
            }
            Callback::ModSkip(item) => handlers::moderation::skip(ctx, actor, at, item).await,
            Callback::FindStart => handlers::lookup::start(ctx, actor, Reply::new(at.chat_id)).await,
            Callback::FindBan(uid) => handlers::lookup::ban(ctx, actor, at, uid).await,
            Callback::FindUnban(uid) => handlers::lookup::unban(ctx, actor, at, uid).await,
            Callback::FindReview(uid) => handlers::lookup::review(ctx, actor, at, uid).await,
            Callback::AccList => handlers::access::list(ctx, actor, at).await,
            Callback::AccGrant(uid, role) => {
                handlers::access::change(ctx, actor, at, uid, role, true).await
            }
            Callback::AccRevoke(uid, role) => {
                handlers::access::change(ctx, actor, at, uid, role, false).await
            }
            Callback::SysToggle(key) => handlers::system::toggle(ctx, actor, at, &key).await,
            Callback::SysUsers => handlers::system::users(ctx, actor, Reply::new(at.chat_id)).await,
            Callback::WstShow => handlers::stats::show(ctx, actor, at).await,
        }
    }

    async fn menu(&self, actor: &Actor, chat_id: i64, text: &str) -> AppResult<()> {
        match keyboard::main_menu(actor.role) {
            Some(menu) => self.ctx.send(chat_id, text, Some(menu.into())).await,
            None => self.refuse(chat_id).await,
        }
    }

    async fn refuse(&self, chat_id: i64) -> AppResult<()> {
        self.ctx
            .send(
                chat_id,
                REFUSAL,
                Some(ReplyMarkup::Remove(ReplyKeyboardRemove {
                    remove_keyboard: true,
                })),
            )
            .await
    }

    async fn report(&self, chat_id: i64, err: &AppError) -> AppResult<()> {
        log_failure(err);
        self.ctx.send(chat_id, render::error(err), None).await
    }
}

fn log_failure(err: &AppError) {
    match err.kind {
        ErrorKind::Internal
        | ErrorKind::Database
        | ErrorKind::Configuration
        | ErrorKind::ExternalService
        | ErrorKind::Serialization => {
            error!(kind = %err.kind, error = %err.message, source = ?err.source, "Bot action failed");
        }
        ErrorKind::Forbidden => warn!(error = %err.message, "Bot action refused"),
        _ => debug!(kind = %err.kind, error = %err.message, "Bot action declined"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_parse() {
        assert_eq!(Command::parse("/start"), Some(Command::Start));
        assert_eq!(Command::parse("/next@warden_bot"), Some(Command::Next));
        assert_eq!(
            Command::parse("/grant @dana moderator"),
            Some(Command::Grant("@dana moderator".into()))
        );
        assert_eq!(Command::parse("/find"), Some(Command::Find(String::new())));
        assert_eq!(Command::parse("/whatever"), Some(Command::Unknown));
        assert_eq!(Command::parse("hello"), None);
    }
}
