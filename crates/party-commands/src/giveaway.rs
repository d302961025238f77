//! Giveaway commands and the entry button handler

use crate::framework::{Context, Data, Error};
use chrono::{Duration, Utc};
use party_common::parse_time_requirement;
use poise::serenity_prelude as serenity;
use tracing::{info, warn};

/// Component custom id on giveaway entry buttons
pub const ENTRY_BUTTON_ID: &str = "giveaway_enter";

fn entry_button_row() -> serenity::CreateActionRow {
    serenity::CreateActionRow::Buttons(vec![serenity::CreateButton::new(ENTRY_BUTTON_ID)
        .label("Enter")
        .emoji('🎉')
        .style(serenity::ButtonStyle::Primary)])
}

/// Run and manage giveaways.
#[poise::command(slash_command, guild_only, subcommands("start", "end", "claim"))]
pub async fn giveaway(_ctx: Context<'_>) -> Result<(), Error> {
    Ok(())
}

/// Start a giveaway in this channel. Staff only.
#[poise::command(
    slash_command,
    guild_only,
    required_permissions = "MANAGE_GUILD",
    default_member_permissions = "MANAGE_GUILD"
)]
pub async fn start(
    ctx: Context<'_>,
    #[description = "What is being given away"] prize: String,
    #[description = "How long the giveaway runs, e.g. '2 days' or '1 week'"] duration: String,
    #[description = "Number of winners to draw"]
    #[min = 1]
    #[max = 25]
    winners: Option<i32>,
) -> Result<(), Error> {
    let data = ctx.data();
    let channel_id = ctx.channel_id();

    if data.db.active_giveaway(channel_id.get()).await?.is_some() {
        ctx.say("There is already an active giveaway in this channel. End it first.")
            .await?;
        return Ok(());
    }

    let days = match parse_time_requirement(&duration) {
        Ok(days) if days > 0 => days,
        _ => {
            ctx.say("Could not read that duration. Try something like `3 days` or `1 week`.")
                .await?;
            return Ok(());
        }
    };

    let winner_count = winners.unwrap_or(1);
    let ends_at = Utc::now() + Duration::days(days);

    let id = data
        .db
        .create_giveaway(&prize, winner_count, channel_id.get(), ends_at)
        .await?;

    let embed = serenity::CreateEmbed::new()
        .title("🎉 Giveaway!")
        .description(format!(
            "**{}**\n\nPress the button to enter. Ends <t:{}:R>.",
            prize,
            ends_at.timestamp()
        ))
        .field("Winners", winner_count.to_string(), true)
        .color(serenity::Color::FOOYOO);

    let reply = ctx
        .send(
            poise::CreateReply::default()
                .embed(embed)
                .components(vec![entry_button_row()]),
        )
        .await?;

    let message = reply.message().await?;
    data.db.set_giveaway_message(id, message.id.get()).await?;

    info!(
        "Giveaway #{} started in channel {} ({} winners, ends {})",
        id, channel_id, winner_count, ends_at
    );
    Ok(())
}

/// End the active giveaway in this channel and draw winners. Staff only.
#[poise::command(
    slash_command,
    guild_only,
    required_permissions = "MANAGE_GUILD",
    default_member_permissions = "MANAGE_GUILD"
)]
pub async fn end(ctx: Context<'_>) -> Result<(), Error> {
    let data = ctx.data();
    let channel_id = ctx.channel_id();

    let Some(giveaway) = data.db.active_giveaway(channel_id.get()).await? else {
        ctx.say("There is no active giveaway in this channel.")
            .await?;
        return Ok(());
    };

    let entries = data.db.giveaway_entries(giveaway.id).await?;
    let winners = party_db::draw_winners(&entries, giveaway.winner_count as usize);
    data.db.close_giveaway(giveaway.id, &winners).await?;

    info!(
        "Giveaway #{} ended with {} entries and {} winners",
        giveaway.id,
        entries.len(),
        winners.len()
    );

    if winners.is_empty() {
        ctx.say(format!(
            "The giveaway for **{}** ended with no entries. 😔",
            giveaway.prize
        ))
        .await?;
        return Ok(());
    }

    let mentions = winners
        .iter()
        .map(|uid| format!("<@{}>", uid))
        .collect::<Vec<_>>()
        .join(", ");

    let embed = serenity::CreateEmbed::new()
        .title("🎉 Giveaway ended!")
        .description(format!(
            "**{}**\n\nWinner{}: {}\n\nUse `/giveaway claim` in this channel to claim your prize.",
            giveaway.prize,
            if winners.len() == 1 { "" } else { "s" },
            mentions
        ))
        .color(serenity::Color::GOLD);

    ctx.send(poise::CreateReply::default().embed(embed)).await?;
    Ok(())
}

/// Claim a prize you won in this channel.
#[poise::command(slash_command, guild_only)]
pub async fn claim(ctx: Context<'_>) -> Result<(), Error> {
    let data = ctx.data();

    let Some((giveaway, _winner)) = data
        .db
        .unclaimed_win(ctx.channel_id().get(), ctx.author().id.get())
        .await?
    else {
        ctx.say("You have no unclaimed prize in this channel.")
            .await?;
        return Ok(());
    };

    if data
        .db
        .claim_giveaway_prize(giveaway.id, ctx.author().id.get())
        .await?
    {
        info!(
            "User {} claimed giveaway #{} ({})",
            ctx.author().id, giveaway.id, giveaway.prize
        );
        ctx.say(format!(
            "🎉 Claimed! Staff will get **{}** to you shortly.",
            giveaway.prize
        ))
        .await?;
    } else {
        ctx.say("You have no unclaimed prize in this channel.")
            .await?;
    }
    Ok(())
}

/// Handles presses of the entry button. Called from the bot's event handler.
pub async fn handle_entry_button(
    ctx: &serenity::Context,
    interaction: &serenity::ComponentInteraction,
    data: &Data,
) -> Result<(), Error> {
    let Some(giveaway) = data.db.giveaway_by_message(interaction.message.id.get()).await? else {
        warn!(
            "Entry button pressed on unknown message {}",
            interaction.message.id
        );
        return Ok(());
    };

    let content = if !giveaway.active {
        "This giveaway has already ended.".to_string()
    } else if data
        .db
        .add_giveaway_entry(giveaway.id, interaction.user.id.get())
        .await?
    {
        info!(
            "User {} entered giveaway #{}",
            interaction.user.id, giveaway.id
        );
        format!("You are entered for **{}**. Good luck! 🍀", giveaway.prize)
    } else {
        "You are already entered.".to_string()
    };

    interaction
        .create_response(
            &ctx.http,
            serenity::CreateInteractionResponse::Message(
                serenity::CreateInteractionResponseMessage::new()
                    .content(content)
                    .ephemeral(true),
            ),
        )
        .await?;
    Ok(())
}
