//! Discord account link queries

use crate::{Database, DiscordLink};
use party_common::Result;
use tracing::info;

impl Database {
    /// Link a Discord account to an OSRS character, replacing any prior link
    pub async fn link_user(
        &self,
        discord_uid: u64,
        character_name: &str,
        rank: Option<&str>,
    ) -> Result<()> {
        info!("Linking Discord user {} to {}", discord_uid, character_name);
        sqlx::query(
            r#"
            INSERT INTO discord_users (discord_uid, character_name, `rank`)
            VALUES (?, ?, ?)
            ON DUPLICATE KEY UPDATE character_name = VALUES(character_name),
                                    `rank` = VALUES(`rank`),
                                    linked_at = NOW()
            "#,
        )
        .bind(discord_uid)
        .bind(character_name)
        .bind(rank)
        .execute(self.pool())
        .await?;
        Ok(())
    }

    /// The link for a Discord user, if one exists
    pub async fn find_link_by_uid(&self, discord_uid: u64) -> Result<Option<DiscordLink>> {
        let link =
            sqlx::query_as::<_, DiscordLink>("SELECT * FROM discord_users WHERE discord_uid = ?")
                .bind(discord_uid)
                .fetch_optional(self.pool())
                .await?;
        Ok(link)
    }

    /// The link holding a character, if any Discord user has claimed it
    pub async fn find_link_by_character(&self, character_name: &str) -> Result<Option<DiscordLink>> {
        let link = sqlx::query_as::<_, DiscordLink>(
            "SELECT * FROM discord_users WHERE LOWER(character_name) = LOWER(?)",
        )
        .bind(character_name)
        .fetch_optional(self.pool())
        .await?;
        Ok(link)
    }

    /// All account links, for the verification sweep
    pub async fn list_links(&self) -> Result<Vec<DiscordLink>> {
        let links =
            sqlx::query_as::<_, DiscordLink>("SELECT * FROM discord_users ORDER BY linked_at")
                .fetch_all(self.pool())
                .await?;
        Ok(links)
    }

    /// Refresh the rank stored on a link
    pub async fn update_link_rank(&self, discord_uid: u64, rank: &str) -> Result<()> {
        sqlx::query("UPDATE discord_users SET `rank` = ? WHERE discord_uid = ?")
            .bind(rank)
            .bind(discord_uid)
            .execute(self.pool())
            .await?;
        Ok(())
    }

    /// Rename the character on any link pointing at `old_name`
    pub async fn rename_linked_character(&self, old_name: &str, new_name: &str) -> Result<()> {
        sqlx::query(
            "UPDATE discord_users SET character_name = ? WHERE LOWER(character_name) = LOWER(?)",
        )
        .bind(new_name)
        .bind(old_name)
        .execute(self.pool())
        .await?;
        Ok(())
    }

    /// Remove a link
    pub async fn unlink_user(&self, discord_uid: u64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM discord_users WHERE discord_uid = ?")
            .bind(discord_uid)
            .execute(self.pool())
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
