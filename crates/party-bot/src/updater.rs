//! Background sync between the Wise Old Man group and the local roster
//!
//! Runs on an interval and on demand via the `/runupdaters` trigger. A pass
//! has independent stages; a failure in one is logged and the rest still run.

use chrono::{DateTime, Utc};
use party_common::WomClient;
use party_config::Config;
use party_db::{Database, Member};
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Notify;
use tracing::{debug, error, info, instrument, warn};

/// Days a temporary rank shields a member from the roster sync
const TEMPORARY_RANK_MAX_AGE_DAYS: i64 = 30;

/// What the roster sync should do for one WOM membership
#[derive(Debug, Clone, PartialEq, Eq)]
enum RosterAction {
    /// Player not seen before, insert with join date now
    Insert,
    /// Member rejoined or was renamed; rank untouched
    Reactivate,
    /// Rank differs from the roster, record the change
    UpdateRank,
    /// Rank differs but a fresh temporary rank shields it
    KeepTemporary,
    /// Nothing changed
    NoChange,
}

fn plan_roster_action(
    existing: Option<&Member>,
    wom_role: &str,
    temporary_since: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
) -> RosterAction {
    let Some(member) = existing else {
        return RosterAction::Insert;
    };

    let shielded = temporary_since
        .map(|since| (now - since).num_days() < TEMPORARY_RANK_MAX_AGE_DAYS)
        .unwrap_or(false);
    let rank_changed = !member.rank.eq_ignore_ascii_case(wom_role) && !shielded;

    match (rank_changed, member.active) {
        (true, _) => RosterAction::UpdateRank,
        (false, false) => RosterAction::Reactivate,
        (false, true) if shielded && !member.rank.eq_ignore_ascii_case(wom_role) => {
            RosterAction::KeepTemporary
        }
        (false, true) => RosterAction::NoChange,
    }
}

/// Spawn the periodic sync loop. Returns immediately; the loop runs until
/// the process exits.
pub fn start_update_loop(
    db: Database,
    wom: Arc<WomClient>,
    config: Arc<Config>,
    trigger: Arc<Notify>,
) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(config.updater.interval_secs));
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = interval.tick() => {
                    debug!("Scheduled sync pass starting");
                }
                _ = trigger.notified() => {
                    info!("Manually triggered sync pass starting");
                }
            }

            run_sync_pass(&db, &wom, &config).await;
        }
    });
}

/// One full sync pass. Stage failures are logged, not propagated, so a WOM
/// outage cannot stop temporary-rank expiry.
#[instrument(skip_all)]
pub async fn run_sync_pass(db: &Database, wom: &WomClient, config: &Config) {
    let group_id = config.wom.group_id;

    if let Err(e) = sync_name_changes(db, wom, group_id).await {
        error!("Name change sync failed: {}", e);
    }

    if let Err(e) = sync_roster(db, wom, group_id).await {
        error!("Roster sync failed: {}", e);
    }

    match db.expire_temporary_ranks(TEMPORARY_RANK_MAX_AGE_DAYS).await {
        Ok(0) => {}
        Ok(expired) => info!("Expired {} temporary ranks", expired),
        Err(e) => error!("Temporary rank expiry failed: {}", e),
    }

    if let Err(e) = sync_verified_ranks(db).await {
        error!("Verification sweep failed: {}", e);
    }

    info!("Sync pass complete");
}

/// Apply approved WOM name changes to the roster and account links
async fn sync_name_changes(
    db: &Database,
    wom: &WomClient,
    group_id: u64,
) -> party_common::Result<()> {
    let changes = wom.group_name_changes(group_id).await?;

    let mut applied = 0;
    for change in changes.iter().filter(|c| c.is_approved()) {
        // record_name_change is idempotent; false means already processed
        if !db
            .record_name_change(change.id, &change.old_name, &change.new_name)
            .await?
        {
            continue;
        }

        if db.rename_member(&change.old_name, &change.new_name).await? {
            db.rename_linked_character(&change.old_name, &change.new_name)
                .await?;
            info!("Renamed {} to {}", change.old_name, change.new_name);
            applied += 1;
        } else {
            warn!(
                "Name change {} -> {} does not match a roster member",
                change.old_name, change.new_name
            );
        }
    }

    if applied > 0 {
        info!("Applied {} name changes", applied);
    }
    Ok(())
}

/// Mirror WOM group membership into the members table
async fn sync_roster(db: &Database, wom: &WomClient, group_id: u64) -> party_common::Result<()> {
    let group = wom.group_details(group_id).await?;
    info!(
        "Syncing roster for '{}' ({} members)",
        group.name,
        group.memberships.len()
    );

    let now = Utc::now();
    let mut seen: HashSet<u64> = HashSet::with_capacity(group.memberships.len());

    for membership in &group.memberships {
        let player = &membership.player;
        seen.insert(player.id);

        let existing = db.find_member_by_wom_id(player.id).await?;
        let temporary_since = match &existing {
            Some(member) => db.temporary_rank_assigned_at(&member.username).await?,
            None => None,
        };

        match plan_roster_action(existing.as_ref(), &membership.role, temporary_since, now) {
            RosterAction::Insert => {
                info!("New member: {} ({})", player.display_name, membership.role);
                db.insert_member(player.id, &player.display_name, &membership.role)
                    .await?;
            }
            RosterAction::Reactivate => {
                info!("Member rejoined: {}", player.display_name);
                db.reactivate_member(player.id, &player.display_name)
                    .await?;
            }
            RosterAction::UpdateRank => {
                info!(
                    "Rank change: {} is now {}",
                    player.display_name, membership.role
                );
                db.reactivate_member(player.id, &player.display_name)
                    .await?;
                db.update_member_rank(player.id, &membership.role).await?;
            }
            RosterAction::KeepTemporary => {
                debug!(
                    "Skipping rank update for {}; temporary rank still active",
                    player.display_name
                );
            }
            RosterAction::NoChange => {}
        }
    }

    for member in db.list_active_members().await? {
        if !seen.contains(&member.wom_id) {
            info!("Member left the clan: {}", member.username);
            db.deactivate_member(member.wom_id).await?;
        }
    }

    Ok(())
}

/// Refresh the rank stored on each Discord link
async fn sync_verified_ranks(db: &Database) -> party_common::Result<()> {
    for link in db.list_links().await? {
        let Some(member) = db.find_member(&link.character_name).await? else {
            continue;
        };

        let stale = link
            .rank
            .as_deref()
            .map(|rank| !rank.eq_ignore_ascii_case(&member.rank))
            .unwrap_or(true);

        if stale {
            debug!(
                "Refreshing link rank for {}: {}",
                link.character_name, member.rank
            );
            db.update_link_rank(link.discord_uid, &member.rank).await?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration as ChronoDuration;

    fn member(rank: &str, active: bool) -> Member {
        Member {
            wom_id: 1,
            username: "tester".to_string(),
            rank: rank.to_string(),
            points: 0,
            given_points: 0,
            join_date: None,
            last_rank_update: None,
            active,
        }
    }

    #[test]
    fn test_unknown_player_is_inserted() {
        let action = plan_roster_action(None, "recruit", None, Utc::now());
        assert_eq!(action, RosterAction::Insert);
    }

    #[test]
    fn test_same_rank_is_no_change() {
        let m = member("Corporal", true);
        let action = plan_roster_action(Some(&m), "corporal", None, Utc::now());
        assert_eq!(action, RosterAction::NoChange);
    }

    #[test]
    fn test_rank_difference_updates() {
        let m = member("recruit", true);
        let action = plan_roster_action(Some(&m), "corporal", None, Utc::now());
        assert_eq!(action, RosterAction::UpdateRank);
    }

    #[test]
    fn test_fresh_temporary_rank_shields() {
        let m = member("sergeant", true);
        let now = Utc::now();
        let since = now - ChronoDuration::days(5);
        let action = plan_roster_action(Some(&m), "corporal", Some(since), now);
        assert_eq!(action, RosterAction::KeepTemporary);
    }

    #[test]
    fn test_expired_temporary_rank_updates() {
        let m = member("sergeant", true);
        let now = Utc::now();
        let since = now - ChronoDuration::days(TEMPORARY_RANK_MAX_AGE_DAYS + 1);
        let action = plan_roster_action(Some(&m), "corporal", Some(since), now);
        assert_eq!(action, RosterAction::UpdateRank);
    }

    #[test]
    fn test_rejoin_with_same_rank_only_reactivates() {
        let m = member("corporal", false);
        let action = plan_roster_action(Some(&m), "corporal", None, Utc::now());
        assert_eq!(action, RosterAction::Reactivate);
    }

    #[test]
    fn test_rejoin_with_new_rank_updates() {
        let m = member("recruit", false);
        let action = plan_roster_action(Some(&m), "corporal", None, Utc::now());
        assert_eq!(action, RosterAction::UpdateRank);
    }

    #[test]
    fn test_rejoin_under_temporary_rank_keeps_it() {
        let m = member("sergeant", false);
        let now = Utc::now();
        let since = now - ChronoDuration::days(3);
        let action = plan_roster_action(Some(&m), "corporal", Some(since), now);
        assert_eq!(action, RosterAction::Reactivate);
    }
}
