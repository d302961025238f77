//! Clan roster queries

use crate::{Database, Member};
use party_common::Result;
use tracing::{debug, info};

impl Database {
    /// Look up an active member by username, case-insensitively
    pub async fn find_member(&self, username: &str) -> Result<Option<Member>> {
        let member = sqlx::query_as::<_, Member>(
            "SELECT * FROM members WHERE LOWER(username) = LOWER(?) AND active = TRUE",
        )
        .bind(username)
        .fetch_optional(self.pool())
        .await?;
        Ok(member)
    }

    /// Look up a member by WOM player ID, active or not
    pub async fn find_member_by_wom_id(&self, wom_id: u64) -> Result<Option<Member>> {
        let member = sqlx::query_as::<_, Member>("SELECT * FROM members WHERE wom_id = ?")
            .bind(wom_id)
            .fetch_optional(self.pool())
            .await?;
        Ok(member)
    }

    /// All active members
    pub async fn list_active_members(&self) -> Result<Vec<Member>> {
        let members =
            sqlx::query_as::<_, Member>("SELECT * FROM members WHERE active = TRUE ORDER BY username")
                .fetch_all(self.pool())
                .await?;
        Ok(members)
    }

    /// Insert a member first seen in the roster, with join date now
    pub async fn insert_member(&self, wom_id: u64, username: &str, rank: &str) -> Result<()> {
        info!("New clan member: {} ({})", username, rank);
        sqlx::query(
            r#"
            INSERT INTO members (wom_id, username, `rank`, join_date, last_rank_update)
            VALUES (?, ?, ?, NOW(), NOW())
            ON DUPLICATE KEY UPDATE username = VALUES(username), active = TRUE
            "#,
        )
        .bind(wom_id)
        .bind(username)
        .bind(rank)
        .execute(self.pool())
        .await?;
        Ok(())
    }

    /// Mark a returning member active again and refresh their username.
    ///
    /// Rank and `last_rank_update` are left alone; a rejoin is not a
    /// rank change.
    pub async fn reactivate_member(&self, wom_id: u64, username: &str) -> Result<()> {
        debug!("Reactivating member {} (wom_id {})", username, wom_id);
        sqlx::query("UPDATE members SET username = ?, active = TRUE WHERE wom_id = ?")
            .bind(username)
            .bind(wom_id)
            .execute(self.pool())
            .await?;
        Ok(())
    }

    /// Record a rank change from the roster sync
    pub async fn update_member_rank(&self, wom_id: u64, rank: &str) -> Result<()> {
        debug!("Updating rank for wom_id {} to {}", wom_id, rank);
        sqlx::query("UPDATE members SET `rank` = ?, last_rank_update = NOW() WHERE wom_id = ?")
            .bind(rank)
            .bind(wom_id)
            .execute(self.pool())
            .await?;
        Ok(())
    }

    /// Apply an approved name change
    pub async fn rename_member(&self, old_name: &str, new_name: &str) -> Result<bool> {
        let result = sqlx::query("UPDATE members SET username = ? WHERE LOWER(username) = LOWER(?)")
            .bind(new_name)
            .bind(old_name)
            .execute(self.pool())
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Mark a member who left the clan as inactive.
    ///
    /// Their points ledger stays untouched so history survives a rejoin.
    pub async fn deactivate_member(&self, wom_id: u64) -> Result<()> {
        info!("Deactivating member with wom_id {}", wom_id);
        sqlx::query("UPDATE members SET active = FALSE WHERE wom_id = ?")
            .bind(wom_id)
            .execute(self.pool())
            .await?;
        Ok(())
    }
}
