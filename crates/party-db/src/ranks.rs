//! Rank configuration, requirements, and temporary rank bookkeeping

use crate::{Database, RankConfig, RankRequirement};
use chrono::{DateTime, Utc};
use party_common::Result;
use tracing::info;

impl Database {
    /// Insert or update a rank's position and award budget
    pub async fn upsert_rank_config(
        &self,
        rank: &str,
        rank_order: i32,
        total_points: i64,
    ) -> Result<()> {
        info!(
            "Configuring rank {} (order {}, budget {})",
            rank, rank_order, total_points
        );
        sqlx::query(
            r#"
            INSERT INTO rank_config (`rank`, rank_order, total_points)
            VALUES (?, ?, ?)
            ON DUPLICATE KEY UPDATE rank_order = VALUES(rank_order),
                                    total_points = VALUES(total_points)
            "#,
        )
        .bind(rank)
        .bind(rank_order)
        .bind(total_points)
        .execute(self.pool())
        .await?;
        Ok(())
    }

    /// Configuration for a single rank
    pub async fn rank_config(&self, rank: &str) -> Result<Option<RankConfig>> {
        let config = sqlx::query_as::<_, RankConfig>(
            "SELECT * FROM rank_config WHERE LOWER(`rank`) = LOWER(?)",
        )
        .bind(rank)
        .fetch_optional(self.pool())
        .await?;
        Ok(config)
    }

    /// All configured ranks, lowest order first
    pub async fn all_ranks(&self) -> Result<Vec<RankConfig>> {
        let ranks =
            sqlx::query_as::<_, RankConfig>("SELECT * FROM rank_config ORDER BY rank_order")
                .fetch_all(self.pool())
                .await?;
        Ok(ranks)
    }

    /// The rank directly above the given one in the progression
    pub async fn next_rank(&self, current: &str) -> Result<Option<RankConfig>> {
        let next = sqlx::query_as::<_, RankConfig>(
            r#"
            SELECT * FROM rank_config
            WHERE rank_order > (SELECT rank_order FROM rank_config WHERE LOWER(`rank`) = LOWER(?))
            ORDER BY rank_order
            LIMIT 1
            "#,
        )
        .bind(current)
        .fetch_optional(self.pool())
        .await?;
        Ok(next)
    }

    /// Add a requirement for reaching a rank, returning its ID
    pub async fn add_rank_requirement(
        &self,
        rank: &str,
        requirement_type: &str,
        required_value: &str,
        specific_rank: Option<&str>,
    ) -> Result<i64> {
        let result = sqlx::query(
            r#"
            INSERT INTO rank_requirements (`rank`, requirement_type, required_value, specific_rank)
            VALUES (?, ?, ?, ?)
            "#,
        )
        .bind(rank)
        .bind(requirement_type)
        .bind(required_value)
        .bind(specific_rank)
        .execute(self.pool())
        .await?;
        Ok(result.last_insert_id() as i64)
    }

    /// Requirements for one rank
    pub async fn rank_requirements(&self, rank: &str) -> Result<Vec<RankRequirement>> {
        let requirements = sqlx::query_as::<_, RankRequirement>(
            "SELECT * FROM rank_requirements WHERE LOWER(`rank`) = LOWER(?) ORDER BY id",
        )
        .bind(rank)
        .fetch_all(self.pool())
        .await?;
        Ok(requirements)
    }

    /// Every stored requirement, for validation sweeps
    pub async fn all_rank_requirements(&self) -> Result<Vec<RankRequirement>> {
        let requirements = sqlx::query_as::<_, RankRequirement>(
            "SELECT * FROM rank_requirements ORDER BY `rank`, id",
        )
        .fetch_all(self.pool())
        .await?;
        Ok(requirements)
    }

    /// Delete a requirement by ID, returning whether it existed
    pub async fn delete_rank_requirement(&self, id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM rank_requirements WHERE id = ?")
            .bind(id)
            .execute(self.pool())
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Shield a member's rank from the roster sync
    pub async fn set_temporary_rank(&self, username: &str) -> Result<()> {
        info!("Recording temporary rank for {}", username);
        sqlx::query(
            r#"
            INSERT INTO temporary_ranks (username, assigned_at)
            VALUES (?, NOW())
            ON DUPLICATE KEY UPDATE assigned_at = NOW()
            "#,
        )
        .bind(username)
        .execute(self.pool())
        .await?;
        Ok(())
    }

    /// When the member's temporary rank was assigned, if they hold one
    pub async fn temporary_rank_assigned_at(
        &self,
        username: &str,
    ) -> Result<Option<DateTime<Utc>>> {
        let assigned: Option<DateTime<Utc>> = sqlx::query_scalar(
            "SELECT assigned_at FROM temporary_ranks WHERE LOWER(username) = LOWER(?)",
        )
        .bind(username)
        .fetch_optional(self.pool())
        .await?;
        Ok(assigned)
    }

    /// Drop temporary ranks older than the given number of days
    pub async fn expire_temporary_ranks(&self, max_age_days: i64) -> Result<u64> {
        let result =
            sqlx::query("DELETE FROM temporary_ranks WHERE assigned_at < NOW() - INTERVAL ? DAY")
                .bind(max_age_days)
                .execute(self.pool())
                .await?;
        if result.rows_affected() > 0 {
            info!("Expired {} temporary ranks", result.rows_affected());
        }
        Ok(result.rows_affected())
    }

    /// Record an applied WOM name change; returns false if already recorded
    pub async fn record_name_change(
        &self,
        wom_change_id: u64,
        old_name: &str,
        new_name: &str,
    ) -> Result<bool> {
        let result = sqlx::query(
            r#"
            INSERT IGNORE INTO name_changes (wom_change_id, old_name, new_name)
            VALUES (?, ?, ?)
            "#,
        )
        .bind(wom_change_id)
        .bind(old_name)
        .bind(new_name)
        .execute(self.pool())
        .await?;
        Ok(result.rows_affected() > 0)
    }
}
