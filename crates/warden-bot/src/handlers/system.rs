//! Flags and population counts.

use warden_core::result::AppResult;
use warden_service::{Actor, Capability};

use super::Reply;
use crate::keyboard;
use crate::render;
use crate::router::BotContext;

pub async fn menu(ctx: &BotContext, actor: &Actor, at: Reply) -> AppResult<()> {
    if actor.can(Capability::SystemToggles) {
        return panel(ctx, actor, at).await;
    }
    actor.require(Capability::ViewUsersCount)?;
    ctx.show(at, "System", Some(keyboard::system_panel(&[], actor)))
        .await
}

async fn panel(ctx: &BotContext, actor: &Actor, at: Reply) -> AppResult<()> {
    let flags = ctx.services.system.flags(actor).await?;
    let states = keyboard::flag_states(&flags);
    ctx.show(
        at,
        render::flags(&states),
        Some(keyboard::system_panel(&states, actor)),
    )
    .await
}

/// Flip one flag and redraw the panel.
pub async fn toggle(ctx: &BotContext, actor: &Actor, at: Reply, key: &str) -> AppResult<()> {
    ctx.services.system.toggle(actor, key).await?;
    panel(ctx, actor, at).await
}

pub async fn users(ctx: &BotContext, actor: &Actor, at: Reply) -> AppResult<()> {
    let counts = ctx.services.system.users_count(actor).await?;
    ctx.show(at, render::counts(&counts), None).await
}
