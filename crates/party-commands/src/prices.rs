//! Grand Exchange price commands

use crate::cooldown::CooldownConfig;
use crate::framework::{pass_cooldown, settle_cooldown, Context, Error};
use party_common::GeTrackerClient;
use poise::serenity_prelude as serenity;
use std::sync::Arc;
use tracing::warn;

/// Format a gp amount with thousands separators, e.g. `1,234,567 gp`
pub(crate) fn format_gp(amount: i64) -> String {
    let negative = amount < 0;
    let digits = amount.unsigned_abs().to_string();

    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }

    if negative {
        format!("-{} gp", grouped)
    } else {
        format!("{} gp", grouped)
    }
}

fn format_optional_gp(amount: Option<i64>) -> String {
    amount.map(format_gp).unwrap_or_else(|| "unknown".to_string())
}

/// Fetch the data's GE client, or tell the user the feature is off.
async fn ge_client(ctx: &Context<'_>) -> Result<Option<Arc<GeTrackerClient>>, Error> {
    match &ctx.data().ge_tracker {
        Some(client) => Ok(Some(Arc::clone(client))),
        None => {
            ctx.say("Price lookups are not configured on this bot.").await?;
            Ok(None)
        }
    }
}

/// Item-name autocomplete backed by the search endpoint. Errors degrade
/// to an empty suggestion list rather than failing the interaction.
async fn autocomplete_item(ctx: Context<'_>, partial: &str) -> Vec<String> {
    let Some(client) = &ctx.data().ge_tracker else {
        return Vec::new();
    };
    if partial.len() < 2 {
        return Vec::new();
    }

    match client.search_items(partial).await {
        Ok(items) => items.into_iter().map(|i| i.name).take(25).collect(),
        Err(e) => {
            warn!("Item autocomplete failed for '{}': {}", partial, e);
            Vec::new()
        }
    }
}

/// Look up an item's Grand Exchange price.
#[poise::command(slash_command, guild_only)]
pub async fn itemprice(
    ctx: Context<'_>,
    #[description = "Item name"]
    #[autocomplete = "autocomplete_item"]
    item: String,
) -> Result<(), Error> {
    let cooldown = CooldownConfig::user_secs(5);
    if !pass_cooldown(&ctx, "itemprice", &cooldown).await? {
        return Ok(());
    }

    let Some(client) = ge_client(&ctx).await? else {
        return Ok(());
    };

    let matches = client.search_items(&item).await?;
    let Some(best) = matches
        .iter()
        .find(|m| m.name.eq_ignore_ascii_case(&item))
        .or_else(|| matches.first())
    else {
        ctx.say(format!("No item found matching **{}**.", item))
            .await?;
        return Ok(());
    };

    let detail = client.item(best.item_id).await?;

    let embed = serenity::CreateEmbed::new()
        .title(detail.name.clone())
        .field("Buy", format_optional_gp(detail.buying), true)
        .field("Sell", format_optional_gp(detail.selling), true)
        .field("Margin", format_optional_gp(detail.margin()), true)
        .field("Guide price", format_optional_gp(detail.overall), true)
        .field(
            "Buy limit",
            detail
                .buy_limit
                .map(|l| l.to_string())
                .unwrap_or_else(|| "unknown".to_string()),
            true,
        )
        .field("Tax", format_optional_gp(detail.tax), true)
        .color(serenity::Color::ORANGE);

    ctx.send(poise::CreateReply::default().embed(embed)).await?;

    settle_cooldown(&ctx, "itemprice", &cooldown);
    Ok(())
}

/// Show the current best flipping margins.
#[poise::command(slash_command, guild_only)]
pub async fn flip(ctx: Context<'_>) -> Result<(), Error> {
    let cooldown = CooldownConfig::user_secs(15);
    if !pass_cooldown(&ctx, "flip", &cooldown).await? {
        return Ok(());
    }

    let Some(client) = ge_client(&ctx).await? else {
        return Ok(());
    };

    let items = client.highest_margins().await?;
    if items.is_empty() {
        ctx.say("No flip candidates right now.").await?;
        return Ok(());
    }

    let lines = items
        .iter()
        .take(10)
        .map(|item| {
            format!(
                "**{}** — margin {}, profit {}",
                item.name,
                format_optional_gp(item.margin()),
                format_optional_gp(item.approx_profit)
            )
        })
        .collect::<Vec<_>>()
        .join("\n");

    let embed = serenity::CreateEmbed::new()
        .title("Top flips")
        .description(lines)
        .color(serenity::Color::ORANGE);

    ctx.send(poise::CreateReply::default().embed(embed)).await?;

    settle_cooldown(&ctx, "flip", &cooldown);
    Ok(())
}

/// Money-making method lookups.
#[poise::command(slash_command, guild_only, subcommands("blastfurnace"))]
pub async fn moneymake(_ctx: Context<'_>) -> Result<(), Error> {
    Ok(())
}

/// Current blast furnace profit per bar.
#[poise::command(slash_command, guild_only)]
pub async fn blastfurnace(ctx: Context<'_>) -> Result<(), Error> {
    let cooldown = CooldownConfig::user_secs(15);
    if !pass_cooldown(&ctx, "blastfurnace", &cooldown).await? {
        return Ok(());
    }

    let Some(client) = ge_client(&ctx).await? else {
        return Ok(());
    };

    let methods = client.blast_furnace().await?;
    if methods.is_empty() {
        ctx.say("No blast furnace data right now.").await?;
        return Ok(());
    }

    let lines = methods
        .iter()
        .map(|m| {
            format!(
                "**{}** — {}/bar, {}/hr",
                m.name,
                format_optional_gp(m.profit),
                format_optional_gp(m.hourly_profit)
            )
        })
        .collect::<Vec<_>>()
        .join("\n");

    let embed = serenity::CreateEmbed::new()
        .title("Blast furnace")
        .description(lines)
        .color(serenity::Color::ORANGE);

    ctx.send(poise::CreateReply::default().embed(embed)).await?;

    settle_cooldown(&ctx, "blastfurnace", &cooldown);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_gp_groups_thousands() {
        assert_eq!(format_gp(0), "0 gp");
        assert_eq!(format_gp(950), "950 gp");
        assert_eq!(format_gp(1500), "1,500 gp");
        assert_eq!(format_gp(1234567), "1,234,567 gp");
    }

    #[test]
    fn test_format_gp_negative() {
        assert_eq!(format_gp(-2500), "-2,500 gp");
    }

    #[test]
    fn test_format_optional_gp() {
        assert_eq!(format_optional_gp(Some(100)), "100 gp");
        assert_eq!(format_optional_gp(None), "unknown");
    }
}
