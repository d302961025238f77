//! Clan points commands

use crate::cooldown::CooldownConfig;
use crate::framework::{is_staff, pass_cooldown, settle_cooldown, Context, Error};
use poise::serenity_prelude as serenity;
use tracing::info;

/// Most points one member may award to the same recipient per rolling week
pub const WEEKLY_RECIPIENT_CAP: i64 = 15;

/// Everything needed to decide whether an award is allowed
#[derive(Debug, Clone, Copy)]
pub(crate) struct AwardCheck {
    pub amount: i64,
    pub is_staff: bool,
    pub is_self_award: bool,
    /// Points already given to this recipient by this awarder, this week
    pub weekly_to_recipient: i64,
    /// Points the awarder handed out to everyone, this week
    pub weekly_given: i64,
    /// The awarder rank's weekly budget
    pub budget: i64,
}

/// Apply the points economy rules; returns the rejection message on failure
pub(crate) fn validate_award(check: &AwardCheck) -> Result<(), String> {
    if check.amount == 0 {
        return Err("Zero points is not an award.".to_string());
    }
    if check.is_self_award {
        return Err("You cannot award points to yourself.".to_string());
    }
    if check.amount < 0 && !check.is_staff {
        return Err("Only staff may deduct points.".to_string());
    }
    if check.amount > 0 {
        if check.weekly_to_recipient + check.amount > WEEKLY_RECIPIENT_CAP {
            let remaining = (WEEKLY_RECIPIENT_CAP - check.weekly_to_recipient).max(0);
            return Err(format!(
                "That would exceed the weekly cap of {} points per recipient ({} remaining for this member).",
                WEEKLY_RECIPIENT_CAP, remaining
            ));
        }
        if check.weekly_given + check.amount > check.budget {
            let remaining = (check.budget - check.weekly_given).max(0);
            return Err(format!(
                "Your rank can award {} more points this week.",
                remaining
            ));
        }
    }
    Ok(())
}

/// Award clan points to another member.
#[poise::command(slash_command, guild_only)]
pub async fn points(
    ctx: Context<'_>,
    #[description = "OSRS name of the member receiving points"] user: String,
    #[description = "Points to award (staff may use negatives to deduct)"] points: i64,
    #[description = "Reason for the award"] reason: String,
) -> Result<(), Error> {
    let cooldown = CooldownConfig::user_secs(10);
    if !pass_cooldown(&ctx, "points", &cooldown).await? {
        return Ok(());
    }

    let data = ctx.data();

    let Some(link) = data.db.find_link_by_uid(ctx.author().id.get()).await? else {
        ctx.say("You need to `/verify` your OSRS character before awarding points.")
            .await?;
        return Ok(());
    };

    let Some(awarder) = data.db.find_member(&link.character_name).await? else {
        ctx.say(format!(
            "Your linked character **{}** is no longer in the clan roster.",
            link.character_name
        ))
        .await?;
        return Ok(());
    };

    let Some(recipient) = data.db.find_member(&user).await? else {
        ctx.say(format!("**{}** is not in the clan roster.", user))
            .await?;
        return Ok(());
    };

    let budget = data
        .db
        .rank_config(&awarder.rank)
        .await?
        .map(|c| c.total_points)
        .unwrap_or(0);

    let check = AwardCheck {
        amount: points,
        is_staff: is_staff(&ctx).await,
        is_self_award: awarder
            .username
            .eq_ignore_ascii_case(&recipient.username),
        weekly_to_recipient: data
            .db
            .weekly_points_to(&recipient.username, &awarder.username)
            .await?,
        weekly_given: data.db.weekly_points_given(&awarder.username).await?,
        budget,
    };

    if let Err(message) = validate_award(&check) {
        ctx.say(message).await?;
        return Ok(());
    }

    let award = data
        .db
        .award_points(&recipient.username, Some(&awarder.username), points, &reason)
        .await?;

    info!(
        "{} awarded {} points to {} ({})",
        awarder.username, points, recipient.username, reason
    );

    let embed = serenity::CreateEmbed::new()
        .title("Clan Points")
        .description(format!(
            "**{}** {} **{}** point{} from **{}**\n*{}*",
            recipient.username,
            if points >= 0 { "received" } else { "lost" },
            points.abs(),
            if points.abs() == 1 { "" } else { "s" },
            awarder.username,
            reason
        ))
        .field("Previous", award.previous_points.to_string(), true)
        .field("New total", award.new_points.to_string(), true)
        .color(serenity::Color::DARK_GREEN);

    ctx.send(poise::CreateReply::default().embed(embed)).await?;

    settle_cooldown(&ctx, "points", &cooldown);
    Ok(())
}

/// Award points without cap or budget checks. Administrators only.
#[poise::command(
    slash_command,
    guild_only,
    required_permissions = "ADMINISTRATOR",
    default_member_permissions = "ADMINISTRATOR"
)]
pub async fn ownerpoints(
    ctx: Context<'_>,
    #[description = "OSRS name of the member receiving points"] user: String,
    #[description = "Points to award (negatives deduct)"] points: i64,
    #[description = "Reason for the award"] reason: String,
) -> Result<(), Error> {
    let data = ctx.data();

    let Some(recipient) = data.db.find_member(&user).await? else {
        ctx.say(format!("**{}** is not in the clan roster.", user))
            .await?;
        return Ok(());
    };

    if points == 0 {
        ctx.say("Zero points is not an award.").await?;
        return Ok(());
    }

    let award = data
        .db
        .award_points(&recipient.username, None, points, &reason)
        .await?;

    info!(
        "Owner award: {} points to {} ({})",
        points, recipient.username, reason
    );

    let embed = serenity::CreateEmbed::new()
        .title("Clan Points (staff award)")
        .description(format!(
            "**{}** {} **{}** point{}\n*{}*",
            recipient.username,
            if points >= 0 { "received" } else { "lost" },
            points.abs(),
            if points.abs() == 1 { "" } else { "s" },
            reason
        ))
        .field("Previous", award.previous_points.to_string(), true)
        .field("New total", award.new_points.to_string(), true)
        .color(serenity::Color::GOLD);

    ctx.send(poise::CreateReply::default().embed(embed)).await?;
    Ok(())
}
