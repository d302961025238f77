//! Application configuration structures

use serde::{Deserialize, Serialize};

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Discord-related configuration
    pub discord: DiscordConfig,

    /// MySQL connection settings
    pub database: DatabaseConfig,

    /// Wise Old Man API settings
    pub wom: WomSettings,

    /// GE Tracker API settings
    pub ge_tracker: GeTrackerSettings,

    /// Background updater settings
    pub updater: UpdaterConfig,
}

/// Discord bot configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiscordConfig {
    /// Discord bot token
    pub token: String,

    /// The single guild the bot serves
    pub guild_id: u64,
}

/// MySQL connection settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Database host, optionally with a port ("db.example.com:3307")
    pub host: String,

    /// Database name
    pub name: String,

    /// Database user
    pub user: String,

    /// Database password
    pub password: String,

    /// Maximum number of pooled connections
    pub max_connections: u32,
}

/// Wise Old Man API settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WomSettings {
    /// API key for the group
    pub api_key: String,

    /// WOM group ID to mirror
    pub group_id: u64,

    /// Discord handle sent as the User-Agent, per WOM's API guidelines
    pub discord_name: String,
}

/// GE Tracker API settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeTrackerSettings {
    /// Bearer token; price commands are unavailable when unset
    pub api_key: Option<String>,
}

/// Background updater settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdaterConfig {
    /// Seconds between sync passes (default: 3600)
    pub interval_secs: u64,
}

impl Default for UpdaterConfig {
    fn default() -> Self {
        Self {
            interval_secs: 3600,
        }
    }
}

impl Config {
    /// Validate required fields that env loading cannot catch by itself
    pub fn validate(&self) -> Result<(), String> {
        if self.discord.token.is_empty() {
            return Err("Discord token cannot be empty".to_string());
        }
        if self.discord.guild_id == 0 {
            return Err("Guild ID cannot be zero".to_string());
        }
        if self.database.host.is_empty() || self.database.name.is_empty() {
            return Err("Database host and name are required".to_string());
        }
        if self.wom.group_id == 0 {
            return Err("WOM group ID cannot be zero".to_string());
        }
        if self.updater.interval_secs < 60 {
            return Err("Updater interval must be at least 60 seconds".to_string());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_config() -> Config {
        Config {
            discord: DiscordConfig {
                token: "token".to_string(),
                guild_id: 123,
            },
            database: DatabaseConfig {
                host: "localhost".to_string(),
                name: "party".to_string(),
                user: "bot".to_string(),
                password: "secret".to_string(),
                max_connections: 10,
            },
            wom: WomSettings {
                api_key: "wom-key".to_string(),
                group_id: 141,
                discord_name: "tester".to_string(),
            },
            ge_tracker: GeTrackerSettings { api_key: None },
            updater: UpdaterConfig::default(),
        }
    }

    #[test]
    fn test_updater_default_interval() {
        assert_eq!(UpdaterConfig::default().interval_secs, 3600);
    }

    #[test]
    fn test_validate_accepts_valid_config() {
        assert!(valid_config().validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_empty_token() {
        let mut config = valid_config();
        config.discord.token = String::new();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_zero_guild() {
        let mut config = valid_config();
        config.discord.guild_id = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_short_interval() {
        let mut config = valid_config();
        config.updater.interval_secs = 10;
        assert!(config.validate().is_err());
    }
}
