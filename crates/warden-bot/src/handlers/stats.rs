//! Work stats.

use warden_core::result::AppResult;
use warden_service::Actor;

use super::Reply;
use crate::keyboard;
use crate::render;
use crate::router::BotContext;

pub async fn show(ctx: &BotContext, actor: &Actor, at: Reply) -> AppResult<()> {
    let report = ctx.services.stats.report(actor).await?;
    ctx.show(at, render::work_report(&report), Some(keyboard::stats_refresh()))
        .await
}
