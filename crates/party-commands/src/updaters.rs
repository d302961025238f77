//! Manual sync trigger command

use crate::framework::{Context, Error};
use tracing::info;

/// Run the roster and name-change sync now instead of waiting for the
/// next interval. Staff only.
#[poise::command(
    slash_command,
    guild_only,
    required_permissions = "MANAGE_GUILD",
    default_member_permissions = "MANAGE_GUILD"
)]
pub async fn runupdaters(ctx: Context<'_>) -> Result<(), Error> {
    info!("Manual sync requested by {}", ctx.author().id);
    ctx.data().sync_trigger.notify_one();
    ctx.say("Sync pass triggered. Results land in the logs shortly.")
        .await?;
    Ok(())
}
