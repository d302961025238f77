//! Environment-based configuration for Party Bot

pub mod loader;
pub mod settings;

pub use loader::{ConfigError, ConfigLoader};
pub use settings::{
    Config, DatabaseConfig, DiscordConfig, GeTrackerSettings, UpdaterConfig, WomSettings,
};
