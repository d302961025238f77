//! MySQL persistence layer for Party Bot
//!
//! Holds the clan roster, the points ledger, rank configuration and
//! requirements, Discord account links, giveaways, and free-form bot
//! settings. The schema is created idempotently on startup and tracked
//! with a version row.

use party_common::Result;
use party_config::DatabaseConfig;
use sqlx::mysql::{MySqlConnectOptions, MySqlPool, MySqlPoolOptions};
use tracing::{debug, info};

pub mod giveaways;
pub mod members;
pub mod models;
pub mod points;
pub mod ranks;
pub mod settings;
pub mod users;

pub use giveaways::draw_winners;
pub use models::{
    DiscordLink, Giveaway, GiveawayWinner, Member, PointsAward, PointsTransaction, RankConfig,
    RankRequirement, RequirementType,
};
pub use settings::VERIFIED_ROLE_KEY;

/// Database schema version for migrations
const SCHEMA_VERSION: i32 = 1;

/// Build connection options field by field, so credentials never pass
/// through a DSN string. The host may carry an optional `:port` suffix.
fn connect_options(config: &DatabaseConfig) -> MySqlConnectOptions {
    let (host, port) = match config.host.rsplit_once(':') {
        Some((host, port)) => match port.parse::<u16>() {
            Ok(port) => (host, Some(port)),
            Err(_) => (config.host.as_str(), None),
        },
        None => (config.host.as_str(), None),
    };

    let mut options = MySqlConnectOptions::new()
        .host(host)
        .username(&config.user)
        .password(&config.password)
        .database(&config.name);
    if let Some(port) = port {
        options = options.port(port);
    }
    options
}

/// Handle to the bot's MySQL database
#[derive(Debug, Clone)]
pub struct Database {
    pool: MySqlPool,
}

impl Database {
    /// Connect to MySQL and initialize the schema
    pub async fn connect(config: &DatabaseConfig) -> Result<Self> {
        info!(
            "Connecting to MySQL at {} (database '{}')",
            config.host, config.name
        );

        let pool = MySqlPoolOptions::new()
            .max_connections(config.max_connections)
            .connect_with(connect_options(config))
            .await?;

        let db = Self { pool };
        db.initialize_schema().await?;

        info!("Database initialized");
        Ok(db)
    }

    /// Wrap an existing pool, used by integration tests
    pub fn from_pool(pool: MySqlPool) -> Self {
        Self { pool }
    }

    /// Access the underlying pool
    pub(crate) fn pool(&self) -> &MySqlPool {
        &self.pool
    }

    /// Initialize the database schema
    async fn initialize_schema(&self) -> Result<()> {
        info!("Initializing database schema");

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS schema_version (
                version INT PRIMARY KEY,
                applied_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        let current_version: Option<i32> =
            sqlx::query_scalar("SELECT version FROM schema_version ORDER BY version DESC LIMIT 1")
                .fetch_optional(&self.pool)
                .await?;

        match current_version {
            Some(version) if version >= SCHEMA_VERSION => {
                debug!("Database schema is up to date (version {})", version);
                return Ok(());
            }
            Some(version) => {
                info!(
                    "Upgrading database schema from version {} to {}",
                    version, SCHEMA_VERSION
                );
            }
            None => {
                info!("Creating initial database schema (version {})", SCHEMA_VERSION);
            }
        }

        // Clan roster mirrored from WOM. `rank` is reserved in MySQL 8, hence
        // the backticks throughout.
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS members (
                wom_id BIGINT UNSIGNED PRIMARY KEY,
                username VARCHAR(12) NOT NULL UNIQUE,
                `rank` VARCHAR(64) NOT NULL,
                points BIGINT NOT NULL DEFAULT 0,
                given_points BIGINT NOT NULL DEFAULT 0,
                join_date TIMESTAMP NULL,
                last_rank_update TIMESTAMP NULL,
                active BOOLEAN NOT NULL DEFAULT TRUE
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        // Discord account links
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS discord_users (
                discord_uid BIGINT UNSIGNED PRIMARY KEY,
                character_name VARCHAR(12) NOT NULL,
                `rank` VARCHAR(64) NULL,
                linked_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        // Append-only points ledger
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS points_transactions (
                id BIGINT AUTO_INCREMENT PRIMARY KEY,
                character_name VARCHAR(12) NOT NULL,
                points_change BIGINT NOT NULL,
                reason VARCHAR(255) NOT NULL,
                related_user VARCHAR(12) NULL,
                previous_points BIGINT NOT NULL,
                new_points BIGINT NOT NULL,
                created_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP,
                INDEX idx_transactions_character (character_name),
                INDEX idx_transactions_created (created_at)
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        // Per-rank ordering and weekly award budget
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS rank_config (
                `rank` VARCHAR(64) PRIMARY KEY,
                rank_order INT NOT NULL,
                total_points BIGINT NOT NULL DEFAULT 0
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        // Requirements a member must meet to reach a rank
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS rank_requirements (
                id BIGINT AUTO_INCREMENT PRIMARY KEY,
                `rank` VARCHAR(64) NOT NULL,
                requirement_type VARCHAR(64) NOT NULL,
                required_value VARCHAR(64) NOT NULL,
                specific_rank VARCHAR(64) NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        // Event ranks that shield members from roster sync for a month
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS temporary_ranks (
                username VARCHAR(12) PRIMARY KEY,
                assigned_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        // Name changes already applied, keyed by WOM's change ID
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS name_changes (
                id BIGINT AUTO_INCREMENT PRIMARY KEY,
                wom_change_id BIGINT UNSIGNED NOT NULL UNIQUE,
                old_name VARCHAR(12) NOT NULL,
                new_name VARCHAR(12) NOT NULL,
                applied_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS giveaways (
                id BIGINT AUTO_INCREMENT PRIMARY KEY,
                prize VARCHAR(255) NOT NULL,
                winner_count INT NOT NULL DEFAULT 1,
                channel_id BIGINT UNSIGNED NOT NULL,
                message_id BIGINT UNSIGNED NULL,
                ends_at TIMESTAMP NOT NULL,
                active BOOLEAN NOT NULL DEFAULT TRUE
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS giveaway_entries (
                giveaway_id BIGINT NOT NULL,
                discord_uid BIGINT UNSIGNED NOT NULL,
                entered_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP,
                PRIMARY KEY (giveaway_id, discord_uid)
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS giveaway_winners (
                giveaway_id BIGINT NOT NULL,
                discord_uid BIGINT UNSIGNED NOT NULL,
                claimed BOOLEAN NOT NULL DEFAULT FALSE,
                PRIMARY KEY (giveaway_id, discord_uid)
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        // Free-form key/value settings (verified role name, etc.)
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS bot_settings (
                key_name VARCHAR(64) PRIMARY KEY,
                value TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query("INSERT IGNORE INTO schema_version (version) VALUES (?)")
            .bind(SCHEMA_VERSION)
            .execute(&self.pool)
            .await?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::ConnectOptions;

    fn database_config(host: &str, password: &str) -> DatabaseConfig {
        DatabaseConfig {
            host: host.to_string(),
            name: "party".to_string(),
            user: "bot".to_string(),
            password: password.to_string(),
            max_connections: 5,
        }
    }

    #[test]
    fn test_connect_options_basic() {
        let config = database_config("localhost", "secret");
        let url = connect_options(&config).to_url_lossy();
        assert_eq!(url.host_str(), Some("localhost"));
        assert_eq!(url.username(), "bot");
        assert_eq!(url.path(), "/party");
    }

    #[test]
    fn test_connect_options_split_host_port() {
        let config = database_config("db.example.com:3307", "secret");
        let url = connect_options(&config).to_url_lossy();
        assert_eq!(url.host_str(), Some("db.example.com"));
        assert_eq!(url.port(), Some(3307));
    }

    #[test]
    fn test_connect_options_survive_hostile_password() {
        // A password full of URL metacharacters must not leak into the
        // host or database parts
        let config = database_config("db.example.com", "p@ss/w:rd#1");
        let url = connect_options(&config).to_url_lossy();
        assert_eq!(url.host_str(), Some("db.example.com"));
        assert_eq!(url.username(), "bot");
        assert_eq!(url.path(), "/party");
        assert_eq!(url.fragment(), None);
    }
}
