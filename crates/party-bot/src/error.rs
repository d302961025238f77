//! Application-wide error types using thiserror.

use poise::serenity_prelude as serenity;

/// Main application error type.
#[derive(thiserror::Error, Debug)]
pub enum BotError {
    /// Error from one of the workspace crates.
    #[error("Application error: {0}")]
    Party(#[from] party_common::PartyError),

    /// Configuration loading error.
    #[error("Configuration error: {0}")]
    Config(#[from] party_config::ConfigError),

    /// Discord/Serenity error.
    #[error("Discord error: {0}")]
    Discord(#[from] serenity::Error),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for the bot application.
pub type BotResult<T> = Result<T, BotError>;
