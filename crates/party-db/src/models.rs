//! Row types shared by the repository modules

use chrono::{DateTime, Utc};
use party_common::PartyError;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;

/// A clan member mirrored from the WOM roster
#[derive(Debug, Clone, FromRow)]
pub struct Member {
    /// WOM player ID, stable across name changes
    pub wom_id: u64,
    /// Current OSRS username
    pub username: String,
    /// Current clan rank
    pub rank: String,
    /// Clan points balance
    pub points: i64,
    /// Lifetime points this member has awarded to others
    pub given_points: i64,
    /// When the member first appeared in the roster
    pub join_date: Option<DateTime<Utc>>,
    /// Last time the rank changed
    pub last_rank_update: Option<DateTime<Utc>>,
    /// False once the member leaves the clan
    pub active: bool,
}

/// A Discord account linked to an OSRS character
#[derive(Debug, Clone, FromRow)]
pub struct DiscordLink {
    /// Discord user ID
    pub discord_uid: u64,
    /// Linked OSRS character
    pub character_name: String,
    /// Rank recorded at link time, refreshed by the verification sweep
    pub rank: Option<String>,
    /// When the link was created
    pub linked_at: Option<DateTime<Utc>>,
}

/// One row of the points ledger
#[derive(Debug, Clone, FromRow)]
pub struct PointsTransaction {
    /// Ledger row ID
    pub id: i64,
    /// Member receiving the change
    pub character_name: String,
    /// Signed point delta
    pub points_change: i64,
    /// Reason supplied by the awarder
    pub reason: String,
    /// Username of the awarder, if any
    pub related_user: Option<String>,
    /// Balance before the change
    pub previous_points: i64,
    /// Balance after the change
    pub new_points: i64,
    /// When the change happened
    pub created_at: Option<DateTime<Utc>>,
}

/// Outcome of a points award, returned to the command layer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PointsAward {
    /// Balance before the award
    pub previous_points: i64,
    /// Balance after the award
    pub new_points: i64,
}

/// Per-rank ordering and award budget
#[derive(Debug, Clone, FromRow)]
pub struct RankConfig {
    /// Rank name as it appears in WOM
    pub rank: String,
    /// Position in the progression, lowest first
    pub rank_order: i32,
    /// Points this rank may award per rolling week
    pub total_points: i64,
}

/// One requirement a member must meet to reach a rank
#[derive(Debug, Clone, FromRow)]
pub struct RankRequirement {
    /// Requirement ID
    pub id: i64,
    /// Rank the requirement applies to
    pub rank: String,
    /// Requirement type, stored as its display string
    pub requirement_type: String,
    /// Threshold: a point count, a distinct count, or a time span
    pub required_value: String,
    /// For rank-scoped requirements, the rank the points must come from
    pub specific_rank: Option<String>,
}

impl RankRequirement {
    /// Parse the stored requirement type
    pub fn kind(&self) -> Result<RequirementType, PartyError> {
        self.requirement_type.parse()
    }
}

/// A giveaway with its lifecycle state
#[derive(Debug, Clone, FromRow)]
pub struct Giveaway {
    /// Giveaway ID
    pub id: i64,
    /// Prize description
    pub prize: String,
    /// How many winners to draw
    pub winner_count: i32,
    /// Channel the giveaway runs in
    pub channel_id: u64,
    /// Message carrying the entry button, once posted
    pub message_id: Option<u64>,
    /// When entries close
    pub ends_at: DateTime<Utc>,
    /// False once the giveaway has ended
    pub active: bool,
}

/// A drawn giveaway winner
#[derive(Debug, Clone, FromRow)]
pub struct GiveawayWinner {
    /// Giveaway the win belongs to
    pub giveaway_id: i64,
    /// Winning Discord user
    pub discord_uid: u64,
    /// Whether the prize has been claimed
    pub claimed: bool,
}

/// The kinds of rank requirements the bot can evaluate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RequirementType {
    /// Total points threshold
    Points,
    /// Points received from at least N distinct players
    PointsFromDifferentPlayers,
    /// Points received from players of at least N distinct ranks
    PointsFromDifferentRanks,
    /// Time since joining the clan
    TimeInClan,
    /// Time since the last rank change
    TimeAtCurrentRank,
    /// Checked manually by staff
    Other,
}

impl RequirementType {
    /// All variants, in display order
    pub const ALL: [RequirementType; 6] = [
        RequirementType::Points,
        RequirementType::PointsFromDifferentPlayers,
        RequirementType::PointsFromDifferentRanks,
        RequirementType::TimeInClan,
        RequirementType::TimeAtCurrentRank,
        RequirementType::Other,
    ];

    /// The display string, also used as the stored value
    pub fn as_str(&self) -> &'static str {
        match self {
            RequirementType::Points => "Points",
            RequirementType::PointsFromDifferentPlayers => "Points from X different players",
            RequirementType::PointsFromDifferentRanks => "Points from X different ranks",
            RequirementType::TimeInClan => "Time in Clan",
            RequirementType::TimeAtCurrentRank => "Time at Current Rank",
            RequirementType::Other => "Other",
        }
    }
}

impl fmt::Display for RequirementType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for RequirementType {
    type Err = PartyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        RequirementType::ALL
            .into_iter()
            .find(|t| t.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| {
                PartyError::validation_field(
                    format!("Unknown requirement type: '{}'", s),
                    "requirement_type",
                )
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_requirement_type_round_trip() {
        for kind in RequirementType::ALL {
            let parsed: RequirementType = kind.as_str().parse().unwrap();
            assert_eq!(parsed, kind);
        }
    }

    #[test]
    fn test_requirement_type_case_insensitive() {
        let parsed: RequirementType = "time in clan".parse().unwrap();
        assert_eq!(parsed, RequirementType::TimeInClan);
    }

    #[test]
    fn test_requirement_type_unknown() {
        let result: Result<RequirementType, _> = "Skill total".parse();
        assert!(result.is_err());
    }

    #[test]
    fn test_requirement_kind_accessor() {
        let req = RankRequirement {
            id: 1,
            rank: "corporal".to_string(),
            requirement_type: "Points".to_string(),
            required_value: "100".to_string(),
            specific_rank: None,
        };
        assert_eq!(req.kind().unwrap(), RequirementType::Points);
    }
}
