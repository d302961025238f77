//! Rank-up eligibility command

use crate::cooldown::CooldownConfig;
use crate::framework::{pass_cooldown, settle_cooldown, Context, Error};
use chrono::Utc;
use party_common::{parse_time_requirement, PartyError};
use party_db::{Member, RankRequirement, RequirementType};
use poise::serenity_prelude as serenity;

/// Ledger-derived numbers a requirement can be checked against
#[derive(Debug, Clone, Copy)]
pub(crate) struct MemberStats {
    pub points: i64,
    pub distinct_sources: i64,
    pub distinct_source_ranks: i64,
    pub days_in_clan: Option<i64>,
    pub days_at_rank: Option<i64>,
}

/// Outcome of evaluating one requirement
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum RequirementStatus {
    /// Requirement satisfied
    Met,
    /// Requirement not satisfied; carries a progress note
    Unmet(String),
    /// Checked by staff, not by the bot
    Manual,
}

/// Evaluate a single requirement against a member's stats
pub(crate) fn evaluate_requirement(
    req: &RankRequirement,
    stats: &MemberStats,
) -> Result<RequirementStatus, PartyError> {
    let kind = req.kind()?;

    let status = match kind {
        RequirementType::Points => {
            let required: i64 = parse_numeric(&req.required_value)?;
            if stats.points >= required {
                RequirementStatus::Met
            } else {
                RequirementStatus::Unmet(format!("{}/{} points", stats.points, required))
            }
        }
        RequirementType::PointsFromDifferentPlayers => {
            let required: i64 = parse_numeric(&req.required_value)?;
            if stats.distinct_sources >= required {
                RequirementStatus::Met
            } else {
                RequirementStatus::Unmet(format!(
                    "{}/{} different awarders",
                    stats.distinct_sources, required
                ))
            }
        }
        RequirementType::PointsFromDifferentRanks => {
            let required: i64 = parse_numeric(&req.required_value)?;
            if stats.distinct_source_ranks >= required {
                RequirementStatus::Met
            } else {
                RequirementStatus::Unmet(format!(
                    "{}/{} different ranks",
                    stats.distinct_source_ranks, required
                ))
            }
        }
        RequirementType::TimeInClan => {
            let required_days = parse_time_requirement(&req.required_value)?;
            match stats.days_in_clan {
                Some(days) if days >= required_days => RequirementStatus::Met,
                Some(days) => {
                    RequirementStatus::Unmet(format!("{}/{} days in clan", days, required_days))
                }
                None => RequirementStatus::Unmet("join date unknown".to_string()),
            }
        }
        RequirementType::TimeAtCurrentRank => {
            let required_days = parse_time_requirement(&req.required_value)?;
            match stats.days_at_rank {
                Some(days) if days >= required_days => RequirementStatus::Met,
                Some(days) => {
                    RequirementStatus::Unmet(format!("{}/{} days at rank", days, required_days))
                }
                None => RequirementStatus::Unmet("rank date unknown".to_string()),
            }
        }
        RequirementType::Other => RequirementStatus::Manual,
    };

    Ok(status)
}

fn parse_numeric(value: &str) -> Result<i64, PartyError> {
    value.trim().parse().map_err(|_| {
        PartyError::validation_field(
            format!("Requirement value is not a number: '{}'", value),
            "required_value",
        )
    })
}

async fn gather_stats(ctx: &Context<'_>, member: &Member) -> Result<MemberStats, Error> {
    let data = ctx.data();
    let now = Utc::now();

    Ok(MemberStats {
        points: member.points,
        distinct_sources: data.db.distinct_award_sources(&member.username).await?,
        distinct_source_ranks: data.db.distinct_source_ranks(&member.username).await?,
        days_in_clan: member.join_date.map(|d| (now - d).num_days()),
        days_at_rank: member.last_rank_update.map(|d| (now - d).num_days()),
    })
}

/// Check a member's progress towards the next rank.
#[poise::command(slash_command, guild_only)]
pub async fn checkrankup(
    ctx: Context<'_>,
    #[description = "OSRS name to check (defaults to your linked character)"] user: Option<String>,
) -> Result<(), Error> {
    let cooldown = CooldownConfig::user_secs(10);
    if !pass_cooldown(&ctx, "checkrankup", &cooldown).await? {
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

    let Some(next) = data.db.next_rank(&member.rank).await? else {
        ctx.say(format!(
            "**{}** already holds the highest configured rank ({}).",
            member.username, member.rank
        ))
        .await?;
        return Ok(());
    };

    let requirements = data.db.rank_requirements(&next.rank).await?;
    if requirements.is_empty() {
        ctx.say(format!(
            "No requirements are configured for **{}**; rank-ups to it are manual.",
            next.rank
        ))
        .await?;
        return Ok(());
    }

    let stats = gather_stats(&ctx, &member).await?;

    let mut lines = Vec::new();
    let mut all_met = true;
    for req in &requirements {
        let line = match evaluate_requirement(req, &stats) {
            Ok(RequirementStatus::Met) => format!("✅ {} ({})", req.requirement_type, req.required_value),
            Ok(RequirementStatus::Unmet(progress)) => {
                all_met = false;
                format!("❌ {} — {}", req.requirement_type, progress)
            }
            Ok(RequirementStatus::Manual) => {
                all_met = false;
                format!("📋 {} — reviewed by staff", req.requirement_type)
            }
            Err(e) => {
                all_met = false;
                format!("⚠️ {} — misconfigured ({})", req.requirement_type, e)
            }
        };
        lines.push(line);
    }

    let verdict = if all_met {
        format!("**{}** is eligible for **{}**! 🎉", member.username, next.rank)
    } else {
        format!("**{}** is not yet eligible for **{}**.", member.username, next.rank)
    };

    let embed = serenity::CreateEmbed::new()
        .title(format!("Rank-up check: {} → {}", member.rank, next.rank))
        .description(format!("{}\n\n{}", verdict, lines.join("\n")))
        .color(if all_met {
            serenity::Color::DARK_GREEN
        } else {
            serenity::Color::ORANGE
        });

    ctx.send(poise::CreateReply::default().embed(embed)).await?;

    settle_cooldown(&ctx, "checkrankup", &cooldown);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stats() -> MemberStats {
        MemberStats {
            points: 120,
            distinct_sources: 4,
            distinct_source_ranks: 2,
            days_in_clan: Some(100),
            days_at_rank: Some(20),
        }
    }

    fn req(kind: RequirementType, value: &str) -> RankRequirement {
        RankRequirement {
            id: 1,
            rank: "sergeant".to_string(),
            requirement_type: kind.as_str().to_string(),
            required_value: value.to_string(),
            specific_rank: None,
        }
    }

    #[test]
    fn test_points_requirement() {
        let met = evaluate_requirement(&req(RequirementType::Points, "100"), &stats()).unwrap();
        assert_eq!(met, RequirementStatus::Met);

        let unmet = evaluate_requirement(&req(RequirementType::Points, "200"), &stats()).unwrap();
        assert!(matches!(unmet, RequirementStatus::Unmet(_)));
    }

    #[test]
    fn test_distinct_players_requirement() {
        let met = evaluate_requirement(
            &req(RequirementType::PointsFromDifferentPlayers, "3"),
            &stats(),
        )
        .unwrap();
        assert_eq!(met, RequirementStatus::Met);

        let unmet = evaluate_requirement(
            &req(RequirementType::PointsFromDifferentPlayers, "5"),
            &stats(),
        )
        .unwrap();
        assert!(matches!(unmet, RequirementStatus::Unmet(_)));
    }

    #[test]
    fn test_time_requirements_parse_units() {
        let met =
            evaluate_requirement(&req(RequirementType::TimeInClan, "3 months"), &stats()).unwrap();
        assert_eq!(met, RequirementStatus::Met);

        let unmet =
            evaluate_requirement(&req(RequirementType::TimeAtCurrentRank, "6 weeks"), &stats())
                .unwrap();
        assert!(matches!(unmet, RequirementStatus::Unmet(_)));
    }

    #[test]
    fn test_missing_dates_are_unmet() {
        let mut s = stats();
        s.days_in_clan = None;
        let status =
            evaluate_requirement(&req(RequirementType::TimeInClan, "1 week"), &s).unwrap();
        assert!(matches!(status, RequirementStatus::Unmet(_)));
    }

    #[test]
    fn test_other_is_manual() {
        let status = evaluate_requirement(&req(RequirementType::Other, "n/a"), &stats()).unwrap();
        assert_eq!(status, RequirementStatus::Manual);
    }

    #[test]
    fn test_bad_value_errors() {
        let result = evaluate_requirement(&req(RequirementType::Points, "lots"), &stats());
        assert!(result.is_err());
    }
}
