//! Poise framework setup and shared command state

use crate::cooldown::{CooldownConfig, CooldownManager};
use party_common::{GeTrackerClient, WomClient};
use party_config::Config;
use party_db::Database;
use std::sync::Arc;
use tokio::sync::Notify;

/// Application data accessible in all commands.
pub struct Data {
    /// Application configuration.
    pub config: Arc<Config>,
    /// MySQL database handle.
    pub db: Database,
    /// Wise Old Man API client.
    pub wom: Arc<WomClient>,
    /// GE Tracker API client; absent when no API key is configured.
    pub ge_tracker: Option<Arc<GeTrackerClient>>,
    /// Cooldown manager.
    pub cooldown: Arc<CooldownManager>,
    /// Wakes the background updater for an immediate sync pass.
    pub sync_trigger: Arc<Notify>,
}

impl std::fmt::Debug for Data {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Data")
            .field("config", &"<Config>")
            .field("db", &"<Database>")
            .field("wom", &"<WomClient>")
            .field("ge_tracker", &self.ge_tracker.is_some())
            .finish()
    }
}

/// Application error type for commands.
pub type Error = Box<dyn std::error::Error + Send + Sync>;

/// Command context type.
pub type Context<'a> = poise::Context<'a, Data, Error>;

/// Check a command's cooldown; replies and returns false when blocked.
///
/// Call `apply_cooldown` on the manager after the command succeeds.
pub(crate) async fn pass_cooldown(
    ctx: &Context<'_>,
    command: &str,
    config: &CooldownConfig,
) -> Result<bool, Error> {
    if let Err(cooldown_err) = ctx.data().cooldown.check_cooldown(
        command,
        ctx.author().id,
        Some(ctx.channel_id()),
        config,
    ) {
        ctx.say(format!("⏰ {}", cooldown_err)).await?;
        return Ok(false);
    }
    Ok(true)
}

/// Record a command's cooldown after successful execution.
pub(crate) fn settle_cooldown(ctx: &Context<'_>, command: &str, config: &CooldownConfig) {
    ctx.data()
        .cooldown
        .apply_cooldown(command, ctx.author().id, Some(ctx.channel_id()), config);
}

/// Whether the invoking user holds Manage Server in this guild.
pub(crate) async fn is_staff(ctx: &Context<'_>) -> bool {
    ctx.author_member()
        .await
        .and_then(|member| member.permissions)
        .map(|perms| perms.manage_guild())
        .unwrap_or(false)
}

/// Creates a new Poise framework with every command registered.
pub fn create_framework_options() -> poise::FrameworkOptions<Data, Error> {
    poise::FrameworkOptions {
        commands: vec![
            crate::points::points(),
            crate::points::ownerpoints(),
            crate::name::name(),
            crate::verify::verify(),
            crate::verify::unlink(),
            crate::ranks::checkrankup(),
            crate::requirements::setrankrequirement(),
            crate::requirements::viewrankrequirements(),
            crate::requirements::deleterankrequirement(),
            crate::requirements::validaterankrequirements(),
            crate::config_cmd::config(),
            crate::giveaway::giveaway(),
            crate::prices::itemprice(),
            crate::prices::flip(),
            crate::prices::moneymake(),
            crate::updaters::runupdaters(),
        ],
        ..Default::default()
    }
}
