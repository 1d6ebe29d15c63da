//! User lookup and the actions hanging off a profile card.

use warden_core::result::AppResult;
use warden_service::{Actor, Capability};

use super::Reply;
use crate::dialog::Dialog;
use crate::keyboard;
use crate::render;
use crate::router::BotContext;

/// Ask for a username or id.
pub async fn start(ctx: &BotContext, actor: &Actor, at: Reply) -> AppResult<()> {
    actor.require(Capability::Lookup)?;
    ctx.dialogs
        .expect(at.chat_id, actor.external_id, Dialog::LookupQuery)
        .await;
    ctx.send(at.chat_id, "Send @username or a numeric id.", None).await
}

/// Resolve the query and show the card.
pub async fn run(ctx: &BotContext, actor: &Actor, at: Reply, query: &str) -> AppResult<()> {
    let card = ctx.services.lookup.lookup(actor, query).await?;
    ctx.show(
        at,
        render::profile_card(&card),
        Some(keyboard::profile_actions(&card, actor)),
    )
    .await
}

async fn refresh(ctx: &BotContext, actor: &Actor, at: Reply, user_id: i64) -> AppResult<()> {
    let card = ctx.services.lookup.card(user_id).await?;
    ctx.show(
        at,
        render::profile_card(&card),
        Some(keyboard::profile_actions(&card, actor)),
    )
    .await
}

pub async fn ban(ctx: &BotContext, actor: &Actor, at: Reply, user_id: i64) -> AppResult<()> {
    ctx.services.bans.ban(actor, user_id, None).await?;
    refresh(ctx, actor, at, user_id).await
}

pub async fn unban(ctx: &BotContext, actor: &Actor, at: Reply, user_id: i64) -> AppResult<()> {
    ctx.services.bans.unban(actor, user_id).await?;
    refresh(ctx, actor, at, user_id).await
}

/// Put the user back in the moderation queue.
pub async fn review(ctx: &BotContext, actor: &Actor, at: Reply, user_id: i64) -> AppResult<()> {
    let outcome = ctx.services.moderation.force_review(actor, user_id).await?;
    let note = if outcome.created {
        format!("Queued as item #{}.", outcome.item.id)
    } else {
        format!("Item #{} is pending again and free to take.", outcome.item.id)
    };
    refresh(ctx, actor, at, user_id).await?;
    ctx.send(at.chat_id, note, None).await
}
