//! Staff command for the rank ladder and bot settings

use crate::framework::{Context, Error};
use party_db::VERIFIED_ROLE_KEY;
use poise::serenity_prelude as serenity;
use tracing::info;

/// Configure a rank's position and weekly award budget. Staff only.
#[poise::command(
    slash_command,
    guild_only,
    required_permissions = "MANAGE_GUILD",
    default_member_permissions = "MANAGE_GUILD",
    subcommands("rank", "list", "verifiedrole", "temprank")
)]
pub async fn config(_ctx: Context<'_>) -> Result<(), Error> {
    Ok(())
}

/// Add or update a rank in the progression.
#[poise::command(slash_command, guild_only)]
pub async fn rank(
    ctx: Context<'_>,
    #[description = "Rank name as it appears on the roster"] rank: String,
    #[description = "Position in the progression (lowest first)"]
    #[min = 1]
    order: i32,
    #[description = "Points members of this rank may award per week"]
    #[min = 0]
    budget: i64,
) -> Result<(), Error> {
    let data = ctx.data();

    data.db.upsert_rank_config(&rank, order, budget).await?;
    info!("Rank '{}' configured at order {} with budget {}", rank, order, budget);

    ctx.say(format!(
        "**{}** is now rank #{} with a weekly budget of {} points.",
        rank, order, budget
    ))
    .await?;
    Ok(())
}

/// Show the configured rank progression.
#[poise::command(slash_command, guild_only)]
pub async fn list(ctx: Context<'_>) -> Result<(), Error> {
    let data = ctx.data();

    let ranks = data.db.all_ranks().await?;
    if ranks.is_empty() {
        ctx.say("No ranks configured yet. Add one with `/config rank`.")
            .await?;
        return Ok(());
    }

    let lines = ranks
        .iter()
        .map(|r| format!("`{}` **{}** — budget {}/week", r.rank_order, r.rank, r.total_points))
        .collect::<Vec<_>>()
        .join("\n");

    let embed = serenity::CreateEmbed::new()
        .title("Rank progression")
        .description(lines)
        .color(serenity::Color::BLITZ_BLUE);

    ctx.send(poise::CreateReply::default().embed(embed)).await?;
    Ok(())
}

/// Shield a member's current rank from the roster sync for 30 days, for event ranks given in-game.
#[poise::command(slash_command, guild_only)]
pub async fn temprank(
    ctx: Context<'_>,
    #[description = "OSRS name of the member holding the temporary rank"] user: String,
) -> Result<(), Error> {
    let data = ctx.data();

    let Some(member) = data.db.find_member(&user).await? else {
        ctx.say(format!("**{}** is not in the clan roster.", user))
            .await?;
        return Ok(());
    };

    data.db.set_temporary_rank(&member.username).await?;
    info!("Temporary rank recorded for {}", member.username);

    ctx.say(format!(
        "**{}** keeps **{}** through the next 30 days of roster syncs.",
        member.username, member.rank
    ))
    .await?;
    Ok(())
}

/// Change which role is granted on verification.
#[poise::command(slash_command, guild_only)]
pub async fn verifiedrole(
    ctx: Context<'_>,
    #[description = "Exact name of the role to grant"] role: String,
) -> Result<(), Error> {
    let data = ctx.data();

    data.db.set_setting(VERIFIED_ROLE_KEY, &role).await?;
    info!("Verified role set to '{}'", role);

    ctx.say(format!("Verified members will now receive the **{}** role.", role))
        .await?;
    Ok(())
}
