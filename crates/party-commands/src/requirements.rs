//! Staff commands for managing rank-up requirements

use crate::framework::{Context, Error};
use party_common::parse_time_requirement;
use party_db::{RankRequirement, RequirementType};
use poise::serenity_prelude as serenity;
use tracing::info;

/// Checks that a requirement's stored value parses for its type.
pub(crate) fn validate_requirement_value(req: &RankRequirement) -> Result<(), String> {
    let kind = req.kind().map_err(|e| e.to_string())?;

    match kind {
        RequirementType::Points
        | RequirementType::PointsFromDifferentPlayers
        | RequirementType::PointsFromDifferentRanks => {
            let value: i64 = req
                .required_value
                .trim()
                .parse()
                .map_err(|_| format!("'{}' is not a number", req.required_value))?;
            if value <= 0 {
                return Err(format!("'{}' must be positive", req.required_value));
            }
        }
        RequirementType::TimeInClan | RequirementType::TimeAtCurrentRank => {
            parse_time_requirement(&req.required_value).map_err(|e| e.to_string())?;
        }
        RequirementType::Other => {}
    }
    Ok(())
}

/// Add a requirement for promotion into a rank. Staff only.
#[poise::command(
    slash_command,
    guild_only,
    required_permissions = "MANAGE_GUILD",
    default_member_permissions = "MANAGE_GUILD"
)]
pub async fn setrankrequirement(
    ctx: Context<'_>,
    #[description = "Rank the requirement applies to"] rank: String,
    #[description = "Requirement type"]
    #[rename = "type"]
    requirement_type: String,
    #[description = "Required value (a number, or e.g. '2 weeks' for time types)"] value: String,
    #[description = "Specific rank points must come from, for rank-source requirements"]
    specific_rank: Option<String>,
) -> Result<(), Error> {
    let data = ctx.data();

    let kind: RequirementType = match requirement_type.parse() {
        Ok(kind) => kind,
        Err(_) => {
            let valid = RequirementType::ALL
                .iter()
                .map(|k| format!("`{}`", k.as_str()))
                .collect::<Vec<_>>()
                .join(", ");
            ctx.say(format!(
                "Unknown requirement type **{}**. Valid types: {}",
                requirement_type, valid
            ))
            .await?;
            return Ok(());
        }
    };

    if data.db.rank_config(&rank).await?.is_none() {
        ctx.say(format!(
            "**{}** is not a configured rank. Add it with `/config` first.",
            rank
        ))
        .await?;
        return Ok(());
    }

    let candidate = RankRequirement {
        id: 0,
        rank: rank.clone(),
        requirement_type: kind.as_str().to_string(),
        required_value: value.clone(),
        specific_rank: specific_rank.clone(),
    };
    if let Err(problem) = validate_requirement_value(&candidate) {
        ctx.say(format!("Invalid value for **{}**: {}", kind, problem))
            .await?;
        return Ok(());
    }

    let id = data
        .db
        .add_rank_requirement(&rank, kind.as_str(), &value, specific_rank.as_deref())
        .await?;

    info!("Added requirement #{} to rank '{}': {} = {}", id, rank, kind, value);

    ctx.say(format!(
        "Added requirement **#{}** to **{}**: {} — {}",
        id, rank, kind, value
    ))
    .await?;
    Ok(())
}

/// List the requirements configured for a rank. Staff only.
#[poise::command(
    slash_command,
    guild_only,
    required_permissions = "MANAGE_GUILD",
    default_member_permissions = "MANAGE_GUILD"
)]
pub async fn viewrankrequirements(
    ctx: Context<'_>,
    #[description = "Rank to inspect (omit to list every rank)"] rank: Option<String>,
) -> Result<(), Error> {
    let data = ctx.data();

    let requirements = match &rank {
        Some(rank) => data.db.rank_requirements(rank).await?,
        None => data.db.all_rank_requirements().await?,
    };

    if requirements.is_empty() {
        ctx.say(match rank {
            Some(rank) => format!("No requirements configured for **{}**.", rank),
            None => "No rank requirements configured.".to_string(),
        })
        .await?;
        return Ok(());
    }

    let lines = requirements
        .iter()
        .map(|req| {
            let source = req
                .specific_rank
                .as_deref()
                .map(|r| format!(" (from {})", r))
                .unwrap_or_default();
            format!(
                "`#{}` **{}**: {} — {}{}",
                req.id, req.rank, req.requirement_type, req.required_value, source
            )
        })
        .collect::<Vec<_>>()
        .join("\n");

    let embed = serenity::CreateEmbed::new()
        .title("Rank requirements")
        .description(lines)
        .color(serenity::Color::BLITZ_BLUE);

    ctx.send(poise::CreateReply::default().embed(embed)).await?;
    Ok(())
}

/// Delete a requirement by its id. Staff only.
#[poise::command(
    slash_command,
    guild_only,
    required_permissions = "MANAGE_GUILD",
    default_member_permissions = "MANAGE_GUILD"
)]
pub async fn deleterankrequirement(
    ctx: Context<'_>,
    #[description = "Requirement id shown by /viewrankrequirements"] id: i64,
) -> Result<(), Error> {
    let data = ctx.data();

    if data.db.delete_rank_requirement(id).await? {
        info!("Deleted rank requirement #{}", id);
        ctx.say(format!("Deleted requirement **#{}**.", id)).await?;
    } else {
        ctx.say(format!("No requirement with id **#{}** exists.", id))
            .await?;
    }
    Ok(())
}

/// Check every stored requirement for parse errors. Staff only.
#[poise::command(
    slash_command,
    guild_only,
    required_permissions = "MANAGE_GUILD",
    default_member_permissions = "MANAGE_GUILD"
)]
pub async fn validaterankrequirements(ctx: Context<'_>) -> Result<(), Error> {
    let data = ctx.data();

    let requirements = data.db.all_rank_requirements().await?;
    if requirements.is_empty() {
        ctx.say("No rank requirements configured.").await?;
        return Ok(());
    }

    let mut problems = Vec::new();
    for req in &requirements {
        if let Err(problem) = validate_requirement_value(req) {
            problems.push(format!("`#{}` **{}**: {}", req.id, req.rank, problem));
        }
    }

    if problems.is_empty() {
        ctx.say(format!(
            "All {} requirements are valid. ✅",
            requirements.len()
        ))
        .await?;
    } else {
        let embed = serenity::CreateEmbed::new()
            .title("Invalid rank requirements")
            .description(problems.join("\n"))
            .color(serenity::Color::RED);
        ctx.send(poise::CreateReply::default().embed(embed)).await?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn req(kind: RequirementType, value: &str) -> RankRequirement {
        RankRequirement {
            id: 1,
            rank: "corporal".to_string(),
            requirement_type: kind.as_str().to_string(),
            required_value: value.to_string(),
            specific_rank: None,
        }
    }

    #[test]
    fn test_numeric_values_validated() {
        assert!(validate_requirement_value(&req(RequirementType::Points, "50")).is_ok());
        assert!(validate_requirement_value(&req(RequirementType::Points, "fifty")).is_err());
        assert!(validate_requirement_value(&req(RequirementType::Points, "0")).is_err());
        assert!(validate_requirement_value(&req(RequirementType::Points, "-5")).is_err());
    }

    #[test]
    fn test_time_values_validated() {
        assert!(validate_requirement_value(&req(RequirementType::TimeInClan, "2 weeks")).is_ok());
        assert!(
            validate_requirement_value(&req(RequirementType::TimeAtCurrentRank, "30")).is_ok()
        );
        assert!(
            validate_requirement_value(&req(RequirementType::TimeInClan, "2 fortnights")).is_err()
        );
    }

    #[test]
    fn test_other_accepts_anything() {
        assert!(validate_requirement_value(&req(RequirementType::Other, "ask staff")).is_ok());
    }

    #[test]
    fn test_unknown_type_rejected() {
        let mut bad = req(RequirementType::Points, "10");
        bad.requirement_type = "vibes".to_string();
        assert!(validate_requirement_value(&bad).is_err());
    }
}
