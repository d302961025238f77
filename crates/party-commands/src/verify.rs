//! Account verification commands

use crate::cooldown::CooldownConfig;
use crate::framework::{pass_cooldown, settle_cooldown, Context, Error};
use poise::serenity_prelude as serenity;
use tracing::{info, warn};

/// Roster roles that are never auto-verified
const RESTRICTED_ROLES: [&str; 2] = ["owner", "deputy_owner"];

/// Link your Discord account to your OSRS character.
#[poise::command(slash_command, guild_only)]
pub async fn verify(
    ctx: Context<'_>,
    #[description = "Your OSRS character name"] character: String,
) -> Result<(), Error> {
    let cooldown = CooldownConfig::user_secs(30);
    if !pass_cooldown(&ctx, "verify", &cooldown).await? {
        return Ok(());
    }

    let data = ctx.data();

    let Some(member) = data.db.find_member(&character).await? else {
        ctx.say(format!(
            "**{}** is not in the clan roster. Rosters sync periodically; try again later if you joined recently.",
            character
        ))
        .await?;
        return Ok(());
    };

    if RESTRICTED_ROLES.contains(&member.rank.as_str()) {
        ctx.say("Owner accounts are verified manually by staff.")
            .await?;
        return Ok(());
    }

    if let Some(existing) = data.db.find_link_by_character(&member.username).await? {
        if existing.discord_uid != ctx.author().id.get() {
            ctx.say(format!(
                "**{}** is already claimed by another Discord account. Contact staff if this is your character.",
                member.username
            ))
            .await?;
            return Ok(());
        }
    }

    data.db
        .link_user(ctx.author().id.get(), &member.username, Some(&member.rank))
        .await?;

    let guild_id = serenity::GuildId::new(data.config.discord.guild_id);
    let role_name = data.db.verified_role_name().await?;

    // Cache guard must not be held across an await
    let role_id = ctx
        .guild()
        .and_then(|guild| guild.role_by_name(&role_name).map(|role| role.id));

    let mut notes = Vec::new();

    match role_id {
        Some(role_id) => {
            if let Err(e) = ctx
                .http()
                .add_member_role(guild_id, ctx.author().id, role_id, Some("Verified clan member"))
                .await
            {
                warn!("Failed to grant '{}' to {}: {}", role_name, ctx.author().id, e);
                notes.push(format!("Could not grant the **{}** role.", role_name));
            }
        }
        None => {
            warn!("Verified role '{}' does not exist in the guild", role_name);
            notes.push(format!("The **{}** role does not exist yet.", role_name));
        }
    }

    if let Err(e) = guild_id
        .edit_member(
            ctx.http(),
            ctx.author().id,
            serenity::EditMember::new().nickname(&member.username),
        )
        .await
    {
        warn!("Failed to set nickname for {}: {}", ctx.author().id, e);
        notes.push("Could not update your nickname.".to_string());
    }

    info!(
        "Verified Discord user {} as {}",
        ctx.author().id, member.username
    );

    let mut description = format!(
        "You are verified as **{}** ({}).",
        member.username, member.rank
    );
    if !notes.is_empty() {
        description.push_str("\n\n");
        description.push_str(&notes.join("\n"));
    }

    let embed = serenity::CreateEmbed::new()
        .title("Verification complete")
        .description(description)
        .color(serenity::Color::DARK_GREEN);

    ctx.send(poise::CreateReply::default().embed(embed)).await?;

    settle_cooldown(&ctx, "verify", &cooldown);
    Ok(())
}

/// Remove the link between your Discord account and your OSRS character.
#[poise::command(slash_command, guild_only)]
pub async fn unlink(ctx: Context<'_>) -> Result<(), Error> {
    let data = ctx.data();

    if data.db.unlink_user(ctx.author().id.get()).await? {
        info!("Unlinked Discord user {}", ctx.author().id);
        ctx.say("Your account link has been removed.").await?;
    } else {
        ctx.say("You have no linked character.").await?;
    }
    Ok(())
}
