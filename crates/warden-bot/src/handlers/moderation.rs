//! Queue handlers: lease, decide, skip.

use tracing::{info, warn};

use warden_core::error::ErrorKind;
use warden_core::result::AppResult;
use warden_entity::moderation::RejectReason;
use warden_service::{Actor, Capability};

use super::Reply;
use crate::dialog::Dialog;
use crate::keyboard::{self, reason_label};
use crate::render;
use crate::router::BotContext;

/// Queue size plus a "next" button.
pub async fn menu(ctx: &BotContext, actor: &Actor, at: Reply) -> AppResult<()> {
    actor.require(Capability::Moderate)?;
    let pending = ctx.services.moderation.pending_count().await?;
    ctx.show(
        at,
        format!("Profiles waiting for review: {pending}"),
        Some(keyboard::queue_start()),
    )
    .await
}

/// Lease the next item and show its card.
pub async fn next(ctx: &BotContext, actor: &Actor, at: Reply) -> AppResult<()> {
    let card = ctx.services.moderation.acquire(actor).await?;

    if !card.photos.is_empty() {
        if let Err(e) = ctx.outbox.send_photos(at.chat_id, &card.photos).await {
            warn!(item_id = card.item.id, error = %e, "Failed to send card photos");
        }
    }

    ctx.show(
        at.fresh(),
        render::moderation_card(&card),
        Some(keyboard::moderation_card(card.item.id)),
    )
    .await
}

/// Show the next card after a decision; an empty queue is news, not a failure.
async fn advance(ctx: &BotContext, actor: &Actor, at: Reply) -> AppResult<()> {
    match next(ctx, actor, at).await {
        Err(e) if e.is(ErrorKind::QueueEmpty) => {
            ctx.show(at, "The queue is empty.", None).await
        }
        other => other,
    }
}

/// Approve, then move on to the next item.
pub async fn approve(ctx: &BotContext, actor: &Actor, at: Reply, item_id: i64) -> AppResult<()> {
    let item = ctx.services.moderation.approve(actor, item_id).await?;
    info!(item_id, actor = actor.external_id, "Approved from bot");
    ctx.show(at, format!("Item #{} approved.", item.id), None).await?;
    advance(ctx, actor, at.fresh()).await
}

/// Swap the card's buttons for the reason keyboard.
pub async fn choose_reason(
    ctx: &BotContext,
    actor: &Actor,
    at: Reply,
    item_id: i64,
) -> AppResult<()> {
    actor.require(Capability::Moderate)?;
    let card = ctx.services.moderation.card(actor, item_id).await?;
    ctx.show(
        at,
        format!("{}\n\nChoose a rejection reason:", render::moderation_card(&card)),
        Some(keyboard::reject_reasons(item_id)),
    )
    .await
}

/// Reject with a canned reason; `OTHER` asks for a comment first.
pub async fn reason(
    ctx: &BotContext,
    actor: &Actor,
    at: Reply,
    item_id: i64,
    reason: RejectReason,
) -> AppResult<()> {
    if reason == RejectReason::Other {
        actor.require(Capability::Moderate)?;
        ctx.dialogs
            .expect(at.chat_id, actor.external_id, Dialog::RejectComment { item_id })
            .await;
        return ctx
            .show(
                at,
                format!("Item #{item_id}: send a comment for the user, or /cancel."),
                None,
            )
            .await;
    }

    ctx.services
        .moderation
        .reject(actor, item_id, reason, None)
        .await?;
    ctx.show(
        at,
        format!("Item #{item_id} rejected: {}.", reason_label(reason)),
        None,
    )
    .await?;
    advance(ctx, actor, at.fresh()).await
}

/// Finish an `OTHER` rejection with the typed comment.
pub async fn reject_with_comment(
    ctx: &BotContext,
    actor: &Actor,
    at: Reply,
    item_id: i64,
    comment: &str,
) -> AppResult<()> {
    ctx.services
        .moderation
        .reject(actor, item_id, RejectReason::Other, Some(comment))
        .await?;
    ctx.send(at.chat_id, format!("Item #{item_id} rejected with comment."), None)
        .await?;
    advance(ctx, actor, at.fresh()).await
}

/// Leave the item leased to this moderator and show the next one.
pub async fn skip(ctx: &BotContext, actor: &Actor, at: Reply, item_id: i64) -> AppResult<()> {
    actor.require(Capability::Moderate)?;
    ctx.show(at, format!("Item #{item_id} skipped."), None).await?;
    advance(ctx, actor, at.fresh()).await
}
