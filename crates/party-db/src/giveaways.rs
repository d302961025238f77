//! Giveaway lifecycle queries

use crate::{Database, Giveaway, GiveawayWinner};
use chrono::{DateTime, Utc};
use party_common::Result;
use rand::seq::SliceRandom;
use tracing::info;

/// Draw up to `count` unique winners from the entry list
pub fn draw_winners(entries: &[u64], count: usize) -> Vec<u64> {
    let mut pool: Vec<u64> = entries.to_vec();
    let mut rng = rand::thread_rng();
    pool.shuffle(&mut rng);
    pool.truncate(count);
    pool
}

impl Database {
    /// Create a giveaway and return its ID
    pub async fn create_giveaway(
        &self,
        prize: &str,
        winner_count: i32,
        channel_id: u64,
        ends_at: DateTime<Utc>,
    ) -> Result<i64> {
        info!("Creating giveaway for '{}' ({} winners)", prize, winner_count);
        let result = sqlx::query(
            r#"
            INSERT INTO giveaways (prize, winner_count, channel_id, ends_at)
            VALUES (?, ?, ?, ?)
            "#,
        )
        .bind(prize)
        .bind(winner_count)
        .bind(channel_id)
        .bind(ends_at)
        .execute(self.pool())
        .await?;
        Ok(result.last_insert_id() as i64)
    }

    /// Store the message carrying the entry button
    pub async fn set_giveaway_message(&self, id: i64, message_id: u64) -> Result<()> {
        sqlx::query("UPDATE giveaways SET message_id = ? WHERE id = ?")
            .bind(message_id)
            .bind(id)
            .execute(self.pool())
            .await?;
        Ok(())
    }

    /// The active giveaway in a channel, if any
    pub async fn active_giveaway(&self, channel_id: u64) -> Result<Option<Giveaway>> {
        let giveaway = sqlx::query_as::<_, Giveaway>(
            "SELECT * FROM giveaways WHERE channel_id = ? AND active = TRUE ORDER BY id DESC LIMIT 1",
        )
        .bind(channel_id)
        .fetch_optional(self.pool())
        .await?;
        Ok(giveaway)
    }

    /// Find a giveaway by the message carrying its entry button
    pub async fn giveaway_by_message(&self, message_id: u64) -> Result<Option<Giveaway>> {
        let giveaway =
            sqlx::query_as::<_, Giveaway>("SELECT * FROM giveaways WHERE message_id = ?")
                .bind(message_id)
                .fetch_optional(self.pool())
                .await?;
        Ok(giveaway)
    }

    /// Record an entry; returns false if the user already entered
    pub async fn add_giveaway_entry(&self, giveaway_id: i64, discord_uid: u64) -> Result<bool> {
        let result = sqlx::query(
            "INSERT IGNORE INTO giveaway_entries (giveaway_id, discord_uid) VALUES (?, ?)",
        )
        .bind(giveaway_id)
        .bind(discord_uid)
        .execute(self.pool())
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// All entrants of a giveaway
    pub async fn giveaway_entries(&self, giveaway_id: i64) -> Result<Vec<u64>> {
        let entries: Vec<u64> =
            sqlx::query_scalar("SELECT discord_uid FROM giveaway_entries WHERE giveaway_id = ?")
                .bind(giveaway_id)
                .fetch_all(self.pool())
                .await?;
        Ok(entries)
    }

    /// Close a giveaway and persist its drawn winners
    pub async fn close_giveaway(&self, giveaway_id: i64, winners: &[u64]) -> Result<()> {
        info!("Closing giveaway {} with {} winners", giveaway_id, winners.len());
        let mut tx = self.pool().begin().await?;

        sqlx::query("UPDATE giveaways SET active = FALSE WHERE id = ?")
            .bind(giveaway_id)
            .execute(&mut *tx)
            .await?;

        for uid in winners {
            sqlx::query(
                "INSERT IGNORE INTO giveaway_winners (giveaway_id, discord_uid) VALUES (?, ?)",
            )
            .bind(giveaway_id)
            .bind(uid)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    /// Winners drawn for a giveaway
    pub async fn giveaway_winners(&self, giveaway_id: i64) -> Result<Vec<GiveawayWinner>> {
        let winners = sqlx::query_as::<_, GiveawayWinner>(
            "SELECT * FROM giveaway_winners WHERE giveaway_id = ?",
        )
        .bind(giveaway_id)
        .fetch_all(self.pool())
        .await?;
        Ok(winners)
    }

    /// Mark a win as claimed; returns false if the user is not a winner
    /// or already claimed
    pub async fn claim_giveaway_prize(&self, giveaway_id: i64, discord_uid: u64) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE giveaway_winners SET claimed = TRUE
            WHERE giveaway_id = ? AND discord_uid = ? AND claimed = FALSE
            "#,
        )
        .bind(giveaway_id)
        .bind(discord_uid)
        .execute(self.pool())
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// The most recent ended giveaway a user won in this channel,
    /// used by the claim command
    pub async fn unclaimed_win(
        &self,
        channel_id: u64,
        discord_uid: u64,
    ) -> Result<Option<(Giveaway, GiveawayWinner)>> {
        let giveaway = sqlx::query_as::<_, Giveaway>(
            r#"
            SELECT g.* FROM giveaways g
            JOIN giveaway_winners w ON w.giveaway_id = g.id
            WHERE g.channel_id = ? AND w.discord_uid = ? AND w.claimed = FALSE
            ORDER BY g.id DESC
            LIMIT 1
            "#,
        )
        .bind(channel_id)
        .bind(discord_uid)
        .fetch_optional(self.pool())
        .await?;

        let Some(giveaway) = giveaway else {
            return Ok(None);
        };

        let winner = sqlx::query_as::<_, GiveawayWinner>(
            "SELECT * FROM giveaway_winners WHERE giveaway_id = ? AND discord_uid = ?",
        )
        .bind(giveaway.id)
        .bind(discord_uid)
        .fetch_one(self.pool())
        .await?;

        Ok(Some((giveaway, winner)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_draw_winners_unique() {
        let entries = vec![1, 2, 3, 4, 5];
        let winners = draw_winners(&entries, 3);
        assert_eq!(winners.len(), 3);

        let unique: HashSet<u64> = winners.iter().copied().collect();
        assert_eq!(unique.len(), 3);
        assert!(winners.iter().all(|w| entries.contains(w)));
    }

    #[test]
    fn test_draw_winners_fewer_entries_than_slots() {
        let entries = vec![7, 8];
        let winners = draw_winners(&entries, 5);
        assert_eq!(winners.len(), 2);
    }

    #[test]
    fn test_draw_winners_no_entries() {
        assert!(draw_winners(&[], 3).is_empty());
    }
}
