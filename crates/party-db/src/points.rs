//! Points economy queries
//!
//! Every award writes one ledger row and both balance updates inside a single
//! transaction, so `members.points` can always be reconciled against the
//! ledger.

use crate::{Database, PointsAward, PointsTransaction};
use party_common::{PartyError, Result};
use tracing::info;

impl Database {
    /// Award (or deduct, for negative amounts) clan points.
    ///
    /// `awarder` is recorded on the ledger row and has their `given_points`
    /// counter bumped; owner-level awards pass `None` and touch no budget.
    pub async fn award_points(
        &self,
        recipient: &str,
        awarder: Option<&str>,
        amount: i64,
        reason: &str,
    ) -> Result<PointsAward> {
        let mut tx = self.pool().begin().await?;

        let previous: Option<i64> = sqlx::query_scalar(
            "SELECT points FROM members WHERE LOWER(username) = LOWER(?) AND active = TRUE FOR UPDATE",
        )
        .bind(recipient)
        .fetch_optional(&mut *tx)
        .await?;

        let previous = previous
            .ok_or_else(|| PartyError::not_found(format!("member '{}'", recipient)))?;
        let new_points = previous + amount;

        sqlx::query("UPDATE members SET points = ? WHERE LOWER(username) = LOWER(?)")
            .bind(new_points)
            .bind(recipient)
            .execute(&mut *tx)
            .await?;

        sqlx::query(
            r#"
            INSERT INTO points_transactions
                (character_name, points_change, reason, related_user, previous_points, new_points)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(recipient)
        .bind(amount)
        .bind(reason)
        .bind(awarder)
        .bind(previous)
        .bind(new_points)
        .execute(&mut *tx)
        .await?;

        if let Some(awarder) = awarder {
            sqlx::query(
                "UPDATE members SET given_points = given_points + ? WHERE LOWER(username) = LOWER(?)",
            )
            .bind(amount.max(0))
            .bind(awarder)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        info!(
            "Awarded {} points to {} ({} -> {})",
            amount, recipient, previous, new_points
        );
        Ok(PointsAward {
            previous_points: previous,
            new_points,
        })
    }

    /// Points `awarder` gave to `recipient` within the rolling 7-day window
    pub async fn weekly_points_to(&self, recipient: &str, awarder: &str) -> Result<i64> {
        let total: i64 = sqlx::query_scalar(
            r#"
            SELECT COALESCE(SUM(points_change), 0) FROM points_transactions
            WHERE LOWER(character_name) = LOWER(?)
              AND LOWER(related_user) = LOWER(?)
              AND points_change > 0
              AND created_at > NOW() - INTERVAL 7 DAY
            "#,
        )
        .bind(recipient)
        .bind(awarder)
        .fetch_one(self.pool())
        .await?;
        Ok(total)
    }

    /// Total points `awarder` handed out within the rolling 7-day window
    pub async fn weekly_points_given(&self, awarder: &str) -> Result<i64> {
        let total: i64 = sqlx::query_scalar(
            r#"
            SELECT COALESCE(SUM(points_change), 0) FROM points_transactions
            WHERE LOWER(related_user) = LOWER(?)
              AND points_change > 0
              AND created_at > NOW() - INTERVAL 7 DAY
            "#,
        )
        .bind(awarder)
        .fetch_one(self.pool())
        .await?;
        Ok(total)
    }

    /// How many distinct players have awarded points to `recipient`
    pub async fn distinct_award_sources(&self, recipient: &str) -> Result<i64> {
        let count: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(DISTINCT LOWER(related_user)) FROM points_transactions
            WHERE LOWER(character_name) = LOWER(?)
              AND points_change > 0
              AND related_user IS NOT NULL
            "#,
        )
        .bind(recipient)
        .fetch_one(self.pool())
        .await?;
        Ok(count)
    }

    /// How many distinct ranks the awarders of `recipient` currently hold
    pub async fn distinct_source_ranks(&self, recipient: &str) -> Result<i64> {
        let count: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(DISTINCT m.`rank`) FROM points_transactions t
            JOIN members m ON LOWER(m.username) = LOWER(t.related_user)
            WHERE LOWER(t.character_name) = LOWER(?)
              AND t.points_change > 0
            "#,
        )
        .bind(recipient)
        .fetch_one(self.pool())
        .await?;
        Ok(count)
    }

    /// Most recent ledger rows for a member, newest first
    pub async fn recent_transactions(
        &self,
        character: &str,
        limit: i64,
    ) -> Result<Vec<PointsTransaction>> {
        let rows = sqlx::query_as::<_, PointsTransaction>(
            r#"
            SELECT * FROM points_transactions
            WHERE LOWER(character_name) = LOWER(?)
            ORDER BY created_at DESC, id DESC
            LIMIT ?
            "#,
        )
        .bind(character)
        .bind(limit)
        .fetch_all(self.pool())
        .await?;
        Ok(rows)
    }
}
