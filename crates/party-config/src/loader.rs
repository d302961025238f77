//! Configuration loading from the environment
//!
//! The bot is configured entirely through environment variables, typically
//! supplied by a `.env` file loaded with dotenvy.

use crate::settings::{
    Config, DatabaseConfig, DiscordConfig, GeTrackerSettings, UpdaterConfig, WomSettings,
};
use party_common::PartyError;
use std::env;
use thiserror::Error;
use tracing::debug;

/// Configuration loading errors
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A required environment variable is missing or empty
    #[error("Missing required environment variable: {0}")]
    MissingVar(String),

    /// An environment variable could not be parsed
    #[error("Failed to parse environment variable '{var}': {source}")]
    EnvParseError {
        var: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Configuration failed validation after loading
    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}

impl From<ConfigError> for PartyError {
    fn from(err: ConfigError) -> Self {
        PartyError::config(err.to_string())
    }
}

/// Configuration loader for the application
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration from the environment.
    ///
    /// Loads a `.env` file first if one exists; real environment variables
    /// take precedence over it.
    pub fn load() -> Result<Config, ConfigError> {
        if let Ok(path) = dotenvy::dotenv() {
            debug!("Loaded environment from {}", path.display());
        }
        Self::from_env()
    }

    /// Build the configuration from already-set environment variables
    pub fn from_env() -> Result<Config, ConfigError> {
        let config = Config {
            discord: DiscordConfig {
                token: Self::required("DISCORD_BOT_TOKEN")?,
                guild_id: Self::required_parsed("GUILD_ID")?,
            },
            database: DatabaseConfig {
                host: Self::required("DB_HOST")?,
                name: Self::required("DB_NAME")?,
                user: Self::required("DB_USER")?,
                password: Self::required("DB_PASS")?,
                max_connections: Self::optional_parsed("DB_MAX_CONNECTIONS")?.unwrap_or(10),
            },
            wom: WomSettings {
                api_key: Self::required("WOM_API_KEY")?,
                group_id: Self::required_parsed("GROUP_ID")?,
                discord_name: Self::required("DISCORD_NAME")?,
            },
            ge_tracker: GeTrackerSettings {
                api_key: Self::optional("GE_TRACKER_API_KEY"),
            },
            updater: UpdaterConfig {
                interval_secs: Self::optional_parsed("UPDATE_INTERVAL")?
                    .unwrap_or_else(|| UpdaterConfig::default().interval_secs),
            },
        };

        config.validate().map_err(ConfigError::ValidationError)?;
        Ok(config)
    }

    fn required(var: &str) -> Result<String, ConfigError> {
        match env::var(var) {
            Ok(value) if !value.trim().is_empty() => Ok(value),
            _ => Err(ConfigError::MissingVar(var.to_string())),
        }
    }

    fn optional(var: &str) -> Option<String> {
        env::var(var).ok().filter(|v| !v.trim().is_empty())
    }

    fn required_parsed<T>(var: &str) -> Result<T, ConfigError>
    where
        T: std::str::FromStr,
        T::Err: std::error::Error + Send + Sync + 'static,
    {
        let value = Self::required(var)?;
        value.parse().map_err(|e| ConfigError::EnvParseError {
            var: var.to_string(),
            source: Box::new(e),
        })
    }

    fn optional_parsed<T>(var: &str) -> Result<Option<T>, ConfigError>
    where
        T: std::str::FromStr,
        T::Err: std::error::Error + Send + Sync + 'static,
    {
        match Self::optional(var) {
            Some(value) => value
                .parse()
                .map(Some)
                .map_err(|e| ConfigError::EnvParseError {
                    var: var.to_string(),
                    source: Box::new(e),
                }),
            None => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Mutex, MutexGuard};

    // Environment variables are process-global; serialize the tests that touch them.
    static ENV_LOCK: Mutex<()> = Mutex::new(());

    fn lock_env() -> MutexGuard<'static, ()> {
        ENV_LOCK.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn set_valid_env() {
        env::set_var("DISCORD_BOT_TOKEN", "test-token");
        env::set_var("GUILD_ID", "123456789");
        env::set_var("DB_HOST", "localhost");
        env::set_var("DB_NAME", "party");
        env::set_var("DB_USER", "bot");
        env::set_var("DB_PASS", "secret");
        env::set_var("WOM_API_KEY", "wom-key");
        env::set_var("GROUP_ID", "141");
        env::set_var("DISCORD_NAME", "tester#0001");
    }

    fn clear_env() {
        for var in [
            "DISCORD_BOT_TOKEN",
            "GUILD_ID",
            "DB_HOST",
            "DB_NAME",
            "DB_USER",
            "DB_PASS",
            "DB_MAX_CONNECTIONS",
            "WOM_API_KEY",
            "GROUP_ID",
            "DISCORD_NAME",
            "GE_TRACKER_API_KEY",
            "UPDATE_INTERVAL",
        ] {
            env::remove_var(var);
        }
    }

    #[test]
    fn test_from_env_full() {
        let _guard = lock_env();
        clear_env();
        set_valid_env();
        env::set_var("GE_TRACKER_API_KEY", "ge-token");
        env::set_var("UPDATE_INTERVAL", "1800");

        let config = ConfigLoader::from_env().expect("config should load");
        assert_eq!(config.discord.token, "test-token");
        assert_eq!(config.discord.guild_id, 123456789);
        assert_eq!(config.wom.group_id, 141);
        assert_eq!(config.ge_tracker.api_key.as_deref(), Some("ge-token"));
        assert_eq!(config.updater.interval_secs, 1800);

        clear_env();
    }

    #[test]
    fn test_from_env_defaults() {
        let _guard = lock_env();
        clear_env();
        set_valid_env();

        let config = ConfigLoader::from_env().expect("config should load");
        assert!(config.ge_tracker.api_key.is_none());
        assert_eq!(config.updater.interval_secs, 3600);
        assert_eq!(config.database.max_connections, 10);

        clear_env();
    }

    #[test]
    fn test_missing_required_var() {
        let _guard = lock_env();
        clear_env();
        set_valid_env();
        env::remove_var("DISCORD_BOT_TOKEN");

        let result = ConfigLoader::from_env();
        assert!(matches!(result, Err(ConfigError::MissingVar(ref v)) if v == "DISCORD_BOT_TOKEN"));

        clear_env();
    }

    #[test]
    fn test_unparsable_guild_id() {
        let _guard = lock_env();
        clear_env();
        set_valid_env();
        env::set_var("GUILD_ID", "not-a-number");

        let result = ConfigLoader::from_env();
        assert!(matches!(
            result,
            Err(ConfigError::EnvParseError { ref var, .. }) if var == "GUILD_ID"
        ));

        clear_env();
    }

    #[test]
    fn test_empty_var_treated_as_missing() {
        let _guard = lock_env();
        clear_env();
        set_valid_env();
        env::set_var("WOM_API_KEY", "   ");

        let result = ConfigLoader::from_env();
        assert!(matches!(result, Err(ConfigError::MissingVar(ref v)) if v == "WOM_API_KEY"));

        clear_env();
    }
}
