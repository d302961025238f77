//! Error types and utilities for Party Bot

use thiserror::Error;

/// Result type alias for Party Bot operations
pub type Result<T> = std::result::Result<T, PartyError>;

/// Main error type for Party Bot operations
#[derive(Error, Debug)]
pub enum PartyError {
    /// Configuration related errors
    #[error("Configuration error: {message}")]
    Config {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// I/O related errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Network related errors (HTTP requests, etc.)
    #[error("Network error: {message}")]
    Network {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Discord API related errors
    #[error("Discord API error: {message}")]
    Discord {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Wise Old Man API related errors
    #[error("Wise Old Man API error: {message}")]
    Wom {
        message: String,
        status_code: Option<u16>,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// GE Tracker API related errors
    #[error("GE Tracker API error: {message}")]
    GeTracker {
        message: String,
        status_code: Option<u16>,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Database related errors
    #[error("Database error: {message}")]
    Database {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Validation errors for user input or data
    #[error("Validation error: {message}")]
    Validation {
        message: String,
        field: Option<String>,
    },

    /// Lookup failures (unknown member, rank, item, ...)
    #[error("Not found: {message}")]
    NotFound { message: String },

    /// Generic error with custom message
    #[error("{message}")]
    Generic {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },
}

impl PartyError {
    /// Create a new generic error with a custom message
    pub fn new(msg: impl Into<String>) -> Self {
        Self::Generic {
            message: msg.into(),
            source: None,
        }
    }

    /// Create a new generic error with a custom message and source
    pub fn with_source(
        msg: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Generic {
            message: msg.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create a new configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
            source: None,
        }
    }

    /// Create a new configuration error with source
    pub fn config_with_source(
        msg: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Config {
            message: msg.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create a new network error
    pub fn network(msg: impl Into<String>) -> Self {
        Self::Network {
            message: msg.into(),
            source: None,
        }
    }

    /// Create a new network error with source
    pub fn network_with_source(
        msg: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Network {
            message: msg.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create a new Discord API error
    pub fn discord(msg: impl Into<String>) -> Self {
        Self::Discord {
            message: msg.into(),
            source: None,
        }
    }

    /// Create a new Discord API error with source
    pub fn discord_with_source(
        msg: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Discord {
            message: msg.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create a new Wise Old Man API error
    pub fn wom(msg: impl Into<String>) -> Self {
        Self::Wom {
            message: msg.into(),
            status_code: None,
            source: None,
        }
    }

    /// Create a new Wise Old Man API error with status code
    pub fn wom_with_status(msg: impl Into<String>, status: u16) -> Self {
        Self::Wom {
            message: msg.into(),
            status_code: Some(status),
            source: None,
        }
    }

    /// Create a new GE Tracker API error
    pub fn ge_tracker(msg: impl Into<String>) -> Self {
        Self::GeTracker {
            message: msg.into(),
            status_code: None,
            source: None,
        }
    }

    /// Create a new GE Tracker API error with status code
    pub fn ge_tracker_with_status(msg: impl Into<String>, status: u16) -> Self {
        Self::GeTracker {
            message: msg.into(),
            status_code: Some(status),
            source: None,
        }
    }

    /// Create a new database error
    pub fn database(msg: impl Into<String>) -> Self {
        Self::Database {
            message: msg.into(),
            source: None,
        }
    }

    /// Create a new database error with source
    pub fn database_with_source(
        msg: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Database {
            message: msg.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create a new validation error
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation {
            message: msg.into(),
            field: None,
        }
    }

    /// Create a new validation error with field name
    pub fn validation_field(msg: impl Into<String>, field: impl Into<String>) -> Self {
        Self::Validation {
            message: msg.into(),
            field: Some(field.into()),
        }
    }

    /// Create a new not-found error
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound {
            message: msg.into(),
        }
    }

    /// Whether the request that produced this error is safe to retry.
    ///
    /// Client errors (4xx) are deterministic; repeating them only burns
    /// rate-limited calls. Server errors, timeouts, and connection
    /// failures may be transient.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Wom {
                status_code: Some(code),
                ..
            }
            | Self::GeTracker {
                status_code: Some(code),
                ..
            } => !(400..500).contains(code),
            _ => true,
        }
    }
}

// Error conversion implementations for external types

/// Convert from reqwest::Error to PartyError
impl From<reqwest::Error> for PartyError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::network_with_source("Request timeout", err)
        } else if err.is_connect() {
            Self::network_with_source("Connection failed", err)
        } else if err.is_status() {
            let status_code = err.status().map(|s| s.as_u16()).unwrap_or(0);
            Self::network_with_source(format!("HTTP error: {}", status_code), err)
        } else {
            Self::network_with_source("Network request failed", err)
        }
    }
}

/// Convert from sqlx::Error to PartyError
impl From<sqlx::Error> for PartyError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => Self::not_found("No matching database row"),
            sqlx::Error::PoolTimedOut => {
                Self::database_with_source("Connection pool timed out", err)
            }
            other => Self::database_with_source("Query failed", other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::{error::Error, io};

    #[test]
    fn test_error_creation() {
        let error = PartyError::new("test message");
        assert!(error.to_string().contains("test message"));

        let config_error = PartyError::config("config issue");
        assert!(config_error.to_string().contains("Configuration error"));
        assert!(config_error.to_string().contains("config issue"));

        let wom_error = PartyError::wom_with_status("Server error", 500);
        assert!(wom_error.to_string().contains("Wise Old Man API error"));
        assert!(wom_error.to_string().contains("Server error"));

        let ge_error = PartyError::ge_tracker_with_status("Unauthorized", 401);
        assert!(ge_error.to_string().contains("GE Tracker API error"));
        assert!(ge_error.to_string().contains("Unauthorized"));

        let validation_error = PartyError::validation_field("Invalid input", "username");
        assert!(validation_error.to_string().contains("Validation error"));
        assert!(validation_error.to_string().contains("Invalid input"));

        let not_found = PartyError::not_found("member 'Zezima'");
        assert!(not_found.to_string().contains("Not found"));
        assert!(not_found.to_string().contains("Zezima"));
    }

    #[test]
    fn test_error_with_source() {
        let io_error = io::Error::new(io::ErrorKind::NotFound, "File not found");
        let wrapped_error = PartyError::with_source("Failed to read file", io_error);

        assert!(wrapped_error.to_string().contains("Failed to read file"));
        assert!(wrapped_error.source().is_some());

        let db_source_error = PartyError::database_with_source(
            "Insert failed",
            io::Error::new(io::ErrorKind::PermissionDenied, "Access denied"),
        );

        assert!(db_source_error.to_string().contains("Database error"));
        assert!(db_source_error.to_string().contains("Insert failed"));
        assert!(db_source_error.source().is_some());
    }

    #[test]
    fn test_io_error_conversion() {
        let io_error = io::Error::new(io::ErrorKind::NotFound, "File not found");
        let party_error: PartyError = io_error.into();

        assert!(party_error.to_string().contains("I/O error"));
        assert!(party_error.source().is_some());
    }

    #[test]
    fn test_serde_error_conversion() {
        let invalid_json = r#"{"invalid": json}"#;
        let serde_error = serde_json::from_str::<serde_json::Value>(invalid_json).unwrap_err();
        let party_error: PartyError = serde_error.into();

        assert!(party_error.to_string().contains("Serialization error"));
    }

    #[test]
    fn test_sqlx_error_conversion() {
        let row_not_found: PartyError = sqlx::Error::RowNotFound.into();
        assert!(row_not_found.to_string().contains("Not found"));

        let pool_timeout: PartyError = sqlx::Error::PoolTimedOut.into();
        assert!(pool_timeout.to_string().contains("Database error"));
        assert!(pool_timeout.to_string().contains("pool timed out"));
    }

    #[test]
    fn test_error_display_formatting() {
        let error = PartyError::new("test error");
        let display_str = format!("{}", error);
        assert_eq!(display_str, "test error");

        let config_error = PartyError::config("missing field");
        let config_display = format!("{}", config_error);
        assert_eq!(config_display, "Configuration error: missing field");

        let wom_error = PartyError::wom_with_status("rate limited", 429);
        let wom_display = format!("{}", wom_error);
        assert_eq!(wom_display, "Wise Old Man API error: rate limited");
    }

    #[test]
    fn test_result_type_alias() {
        fn returns_result() -> Result<String> {
            Ok("success".to_string())
        }

        fn returns_error() -> Result<String> {
            Err(PartyError::new("failure"))
        }

        assert!(returns_result().is_ok());
        assert!(returns_error().is_err());

        let error = returns_error().unwrap_err();
        assert!(error.to_string().contains("failure"));
    }

    #[test]
    fn test_client_errors_are_not_retryable() {
        assert!(!PartyError::wom_with_status("Not found", 404).is_retryable());
        assert!(!PartyError::wom_with_status("Rate limited", 429).is_retryable());
        assert!(!PartyError::ge_tracker_with_status("Unauthorized", 401).is_retryable());
    }

    #[test]
    fn test_server_and_network_errors_are_retryable() {
        assert!(PartyError::wom_with_status("Bad gateway", 502).is_retryable());
        assert!(PartyError::ge_tracker_with_status("Server error", 500).is_retryable());
        assert!(PartyError::network("Request timeout").is_retryable());
        assert!(PartyError::wom("No status attached").is_retryable());
    }

    #[test]
    fn test_error_chain_preservation() {
        let root_error = io::Error::new(io::ErrorKind::NotFound, "Root cause");
        let middle_error = PartyError::config_with_source("Middle layer", root_error);
        let top_error = PartyError::with_source("Top layer", middle_error);

        assert!(top_error.to_string().contains("Top layer"));

        let mut current_error: &dyn std::error::Error = &top_error;
        let mut error_count = 0;

        while let Some(source) = current_error.source() {
            current_error = source;
            error_count += 1;
        }

        assert!(error_count >= 2);
    }
}
