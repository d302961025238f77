//! Free-form key/value bot settings

use crate::Database;
use party_common::Result;

/// Setting key for the verified member role name
pub const VERIFIED_ROLE_KEY: &str = "verified_role";

/// Default role granted to verified members
pub const DEFAULT_VERIFIED_ROLE: &str = "Green Party Hats";

impl Database {
    /// Read a setting value
    pub async fn get_setting(&self, key: &str) -> Result<Option<String>> {
        let value: Option<String> =
            sqlx::query_scalar("SELECT value FROM bot_settings WHERE key_name = ?")
                .bind(key)
                .fetch_optional(self.pool())
                .await?;
        Ok(value)
    }

    /// Write a setting value, replacing any previous one
    pub async fn set_setting(&self, key: &str, value: &str) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO bot_settings (key_name, value)
            VALUES (?, ?)
            ON DUPLICATE KEY UPDATE value = VALUES(value)
            "#,
        )
        .bind(key)
        .bind(value)
        .execute(self.pool())
        .await?;
        Ok(())
    }

    /// The role name granted to verified members
    pub async fn verified_role_name(&self) -> Result<String> {
        Ok(self
            .get_setting(VERIFIED_ROLE_KEY)
            .await?
            .unwrap_or_else(|| DEFAULT_VERIFIED_ROLE.to_string()))
    }
}
