//! Cooldown system for rate limiting command usage

use dashmap::DashMap;
use poise::serenity_prelude::{ChannelId, UserId};
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::debug;

/// Errors that can occur during cooldown operations
#[derive(Error, Debug)]
pub enum CooldownError {
    #[error("You are on cooldown for '/{command}' (remaining: {remaining_seconds}s)")]
    UserOnCooldown {
        user_id: u64,
        command: String,
        remaining_seconds: u64,
    },
    #[error("This channel is on cooldown for '/{command}' (remaining: {remaining_seconds}s)")]
    ChannelOnCooldown {
        channel_id: u64,
        command: String,
        remaining_seconds: u64,
    },
}

/// Cooldown key for tracking different types of cooldowns
#[derive(Debug, Clone, Hash, PartialEq, Eq)]
enum CooldownKey {
    /// Per-user cooldown: (command_name, user_id)
    User(String, u64),
    /// Per-channel cooldown: (command_name, channel_id)
    Channel(String, u64),
}

/// Cooldown configuration for a command
#[derive(Debug, Clone)]
pub struct CooldownConfig {
    /// Per-user cooldown duration
    pub user: Option<Duration>,
    /// Per-channel cooldown duration
    pub channel: Option<Duration>,
}

impl Default for CooldownConfig {
    fn default() -> Self {
        Self {
            user: Some(Duration::from_secs(3)),
            channel: None,
        }
    }
}

impl CooldownConfig {
    /// Per-user cooldown of the given length, no channel cooldown
    pub fn user_secs(secs: u64) -> Self {
        Self {
            user: Some(Duration::from_secs(secs)),
            channel: None,
        }
    }
}

/// Manager for handling command cooldowns
#[derive(Debug, Default)]
pub struct CooldownManager {
    /// Storage for cooldown timestamps
    cooldowns: DashMap<CooldownKey, Instant>,
}

impl CooldownManager {
    /// Create a new cooldown manager
    pub fn new() -> Self {
        Self {
            cooldowns: DashMap::new(),
        }
    }

    /// Check if a command is on cooldown and return an error if it is
    pub fn check_cooldown(
        &self,
        command: &str,
        user_id: UserId,
        channel_id: Option<ChannelId>,
        config: &CooldownConfig,
    ) -> Result<(), CooldownError> {
        let now = Instant::now();

        if let (Some(channel_duration), Some(channel_id)) = (config.channel, channel_id) {
            let key = CooldownKey::Channel(command.to_string(), channel_id.get());
            if let Some(last_used) = self.cooldowns.get(&key) {
                let elapsed = now.duration_since(*last_used);
                if elapsed < channel_duration {
                    let remaining = channel_duration - elapsed;
                    return Err(CooldownError::ChannelOnCooldown {
                        channel_id: channel_id.get(),
                        command: command.to_string(),
                        remaining_seconds: remaining.as_secs(),
                    });
                }
            }
        }

        if let Some(user_duration) = config.user {
            let key = CooldownKey::User(command.to_string(), user_id.get());
            if let Some(last_used) = self.cooldowns.get(&key) {
                let elapsed = now.duration_since(*last_used);
                if elapsed < user_duration {
                    let remaining = user_duration - elapsed;
                    return Err(CooldownError::UserOnCooldown {
                        user_id: user_id.get(),
                        command: command.to_string(),
                        remaining_seconds: remaining.as_secs(),
                    });
                }
            }
        }

        Ok(())
    }

    /// Apply cooldowns after successful command execution
    pub fn apply_cooldown(
        &self,
        command: &str,
        user_id: UserId,
        channel_id: Option<ChannelId>,
        config: &CooldownConfig,
    ) {
        let now = Instant::now();

        debug!(
            "Applying cooldowns for command '{}' (user: {})",
            command, user_id
        );

        if let (Some(_), Some(channel_id)) = (config.channel, channel_id) {
            let key = CooldownKey::Channel(command.to_string(), channel_id.get());
            self.cooldowns.insert(key, now);
        }

        if config.user.is_some() {
            let key = CooldownKey::User(command.to_string(), user_id.get());
            self.cooldowns.insert(key, now);
        }
    }

    /// Get the number of active cooldowns
    pub fn active_cooldowns(&self) -> usize {
        self.cooldowns.len()
    }

    /// Clean up stale entries (anything older than an hour)
    pub fn cleanup_expired(&self) {
        let now = Instant::now();
        let mut expired_keys = Vec::new();

        for entry in self.cooldowns.iter() {
            if now.duration_since(*entry.value()) > Duration::from_secs(3600) {
                expired_keys.push(entry.key().clone());
            }
        }

        for key in expired_keys {
            self.cooldowns.remove(&key);
        }

        debug!("Cleaned up expired cooldowns");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_use_passes() {
        let manager = CooldownManager::new();
        let config = CooldownConfig::default();
        let result = manager.check_cooldown("points", UserId::new(1), None, &config);
        assert!(result.is_ok());
    }

    #[test]
    fn test_user_cooldown_blocks_second_use() {
        let manager = CooldownManager::new();
        let config = CooldownConfig::user_secs(60);
        let user = UserId::new(1);

        manager.apply_cooldown("points", user, None, &config);
        let result = manager.check_cooldown("points", user, None, &config);
        assert!(matches!(result, Err(CooldownError::UserOnCooldown { .. })));
    }

    #[test]
    fn test_cooldown_is_per_command() {
        let manager = CooldownManager::new();
        let config = CooldownConfig::user_secs(60);
        let user = UserId::new(1);

        manager.apply_cooldown("points", user, None, &config);
        assert!(manager.check_cooldown("name", user, None, &config).is_ok());
    }

    #[test]
    fn test_cooldown_is_per_user() {
        let manager = CooldownManager::new();
        let config = CooldownConfig::user_secs(60);

        manager.apply_cooldown("points", UserId::new(1), None, &config);
        assert!(manager
            .check_cooldown("points", UserId::new(2), None, &config)
            .is_ok());
    }

    #[test]
    fn test_channel_cooldown() {
        let manager = CooldownManager::new();
        let config = CooldownConfig {
            user: None,
            channel: Some(Duration::from_secs(60)),
        };
        let channel = Some(ChannelId::new(5));

        manager.apply_cooldown("flip", UserId::new(1), channel, &config);
        let result = manager.check_cooldown("flip", UserId::new(2), channel, &config);
        assert!(matches!(
            result,
            Err(CooldownError::ChannelOnCooldown { .. })
        ));
    }

    #[test]
    fn test_active_cooldowns_count() {
        let manager = CooldownManager::new();
        let config = CooldownConfig::user_secs(60);
        assert_eq!(manager.active_cooldowns(), 0);

        manager.apply_cooldown("points", UserId::new(1), None, &config);
        manager.apply_cooldown("points", UserId::new(2), None, &config);
        assert_eq!(manager.active_cooldowns(), 2);
    }
}
