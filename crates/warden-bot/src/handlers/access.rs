//! Staff list and role changes.

use warden_core::error::AppError;
use warden_core::result::AppResult;
use warden_entity::operator::Role;
use warden_service::{Actor, Capability};

use super::Reply;
use crate::keyboard;
use crate::render;
use crate::router::BotContext;

const USAGE: &str = "Usage: /grant <@username|id> <role> or /revoke <@username|id> <role>";

pub async fn menu(ctx: &BotContext, actor: &Actor, at: Reply) -> AppResult<()> {
    actor.require(Capability::ManageRoles)?;
    ctx.show(at, USAGE, Some(keyboard::access_panel())).await
}

pub async fn list(ctx: &BotContext, actor: &Actor, at: Reply) -> AppResult<()> {
    let staff = ctx.services.access.list_staff(actor).await?;
    ctx.show(
        at,
        render::staff_list(&staff),
        Some(keyboard::staff_actions(&staff, actor)),
    )
    .await
}

/// Grant or revoke from a button.
pub async fn change(
    ctx: &BotContext,
    actor: &Actor,
    at: Reply,
    target: i64,
    role: Role,
    grant: bool,
) -> AppResult<()> {
    let change = if grant {
        ctx.services.access.grant(actor, target, role).await?
    } else {
        ctx.services.access.revoke(actor, target, role).await?
    };
    ctx.send(at.chat_id, render::role_change(&change, grant), None)
        .await
}

/// `/grant <ref> <role>` and `/revoke <ref> <role>`.
pub async fn command(
    ctx: &BotContext,
    actor: &Actor,
    at: Reply,
    args: &str,
    grant: bool,
) -> AppResult<()> {
    actor.require(Capability::ManageRoles)?;
    let mut parts = args.split_whitespace();
    let (Some(reference), Some(role), None) = (parts.next(), parts.next(), parts.next()) else {
        return Err(AppError::invalid_input(USAGE));
    };
    let role: Role = role.parse()?;
    let target = ctx.services.access.resolve_target(reference).await?;
    change(ctx, actor, at, target, role, grant).await
}
