//! Member lookup command

use crate::cooldown::CooldownConfig;
use crate::framework::{pass_cooldown, settle_cooldown, Context, Error};
use chrono::Utc;
use poise::serenity_prelude as serenity;

/// Look up a clan member's rank, points, and history.
#[poise::command(slash_command, guild_only)]
pub async fn name(
    ctx: Context<'_>,
    #[description = "OSRS name to look up (defaults to your linked character)"] user: Option<
        String,
    >,
) -> Result<(), Error> {
    let cooldown = CooldownConfig::user_secs(5);
    if !pass_cooldown(&ctx, "name", &cooldown).await? {
        return Ok(());
    }

    let data = ctx.data();

    let character = match user {
        Some(name) => name,
        None => match data.db.find_link_by_uid(ctx.author().id.get()).await? {
            Some(link) => link.character_name,
            None => {
                ctx.say("Provide a name, or `/verify` to link your own character.")
                    .await?;
                return Ok(());
            }
        },
    };

    let Some(member) = data.db.find_member(&character).await? else {
        ctx.say(format!("**{}** is not in the clan roster.", character))
            .await?;
        return Ok(());
    };

    let now = Utc::now();
    let joined = member
        .join_date
        .map(|d| format!("{} ({} days ago)", d.format("%Y-%m-%d"), (now - d).num_days()))
        .unwrap_or_else(|| "unknown".to_string());
    let at_rank = member
        .last_rank_update
        .map(|d| party_common::format_days((now - d).num_days()))
        .unwrap_or_else(|| "unknown".to_string());

    let recent = data.db.recent_transactions(&member.username, 3).await?;
    let history = if recent.is_empty() {
        "No point history yet.".to_string()
    } else {
        recent
            .iter()
            .map(|t| {
                format!(
                    "{} {} — {}",
                    if t.points_change >= 0 { "+" } else { "" },
                    t.points_change,
                    t.reason
                )
            })
            .collect::<Vec<_>>()
            .join("\n")
    };

    let embed = serenity::CreateEmbed::new()
        .title(member.username.clone())
        .field("Rank", member.rank.clone(), true)
        .field("Points", member.points.to_string(), true)
        .field("Points given", member.given_points.to_string(), true)
        .field("Joined", joined, true)
        .field("Time at rank", at_rank, true)
        .field("Recent points", history, false)
        .color(serenity::Color::BLITZ_BLUE);

    ctx.send(poise::CreateReply::default().embed(embed)).await?;

    settle_cooldown(&ctx, "name", &cooldown);
    Ok(())
}
