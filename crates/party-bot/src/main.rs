//! 302 Party clan bot - main entry point

mod error;
mod updater;

use anyhow::Result;
use party_commands::{CooldownManager, Data, Error, ENTRY_BUTTON_ID};
use party_common::{GeTrackerClient, GeTrackerConfig, WomClient, WomConfig};
use party_config::ConfigLoader;
use party_db::Database;
use poise::serenity_prelude::{self as serenity, GatewayIntents};
use std::sync::Arc;
use tokio::sync::Notify;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

/// Setup function for the Poise framework - builds shared data and starts
/// the background updater once the gateway is ready
async fn setup(
    ctx: &serenity::Context,
    ready: &serenity::Ready,
    framework: &poise::Framework<Data, Error>,
    data: Data,
) -> Result<Data, Error> {
    info!("Bot connected as: {}", ready.user.name);
    info!("Connected to {} guilds", ready.guilds.len());

    // Guild-scoped registration applies instantly, unlike global commands
    let guild_id = serenity::GuildId::new(data.config.discord.guild_id);
    poise::builtins::register_in_guild(ctx, &framework.options().commands, guild_id).await?;
    info!(
        "Registered {} slash commands in guild {}",
        framework.options().commands.len(),
        guild_id
    );

    updater::start_update_loop(
        data.db.clone(),
        Arc::clone(&data.wom),
        Arc::clone(&data.config),
        Arc::clone(&data.sync_trigger),
    );
    info!(
        "Roster sync running every {} seconds",
        data.config.updater.interval_secs
    );

    let cooldown = Arc::clone(&data.cooldown);
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(std::time::Duration::from_secs(3600));
        loop {
            interval.tick().await;
            cooldown.cleanup_expired();
        }
    });

    Ok(data)
}

/// Global error handler for the framework
async fn on_error(error: poise::FrameworkError<'_, Data, Error>) {
    match error {
        poise::FrameworkError::Setup { error, .. } => {
            error!("Failed to start bot: {:?}", error);
        }
        poise::FrameworkError::Command { error, ctx, .. } => {
            error!("Error in command '{}': {:?}", ctx.command().name, error);
            let _ = ctx
                .say("Something went wrong running that command. Staff have been notified.")
                .await;
        }
        poise::FrameworkError::EventHandler { error, event, .. } => {
            error!(
                "Error in event handler for {:?}: {:?}",
                event.snake_case_name(),
                error
            );
        }
        error => {
            error!("Other error: {:?}", error);
        }
    }
}

/// Central event handler for Discord events
async fn event_handler(
    ctx: &serenity::Context,
    event: &serenity::FullEvent,
    _framework: poise::FrameworkContext<'_, Data, Error>,
    data: &Data,
) -> Result<(), Error> {
    match event {
        serenity::FullEvent::InteractionCreate {
            interaction: serenity::Interaction::Component(component),
        } if component.data.custom_id == ENTRY_BUTTON_ID => {
            party_commands::handle_entry_button(ctx, component, data).await?;
        }
        serenity::FullEvent::Ready { data_about_bot } => {
            info!("Ready event received for: {}", data_about_bot.user.name);
        }
        _ => {}
    }
    Ok(())
}

/// Load configuration and build the shared command state
async fn build_data() -> error::BotResult<Data> {
    let config = Arc::new(ConfigLoader::load()?);
    info!("Configuration loaded");

    let db = Database::connect(&config.database).await?;
    info!("Database ready");

    let wom = Arc::new(WomClient::new(WomConfig::new(
        config.wom.api_key.clone(),
        config.wom.discord_name.clone(),
    ))?);

    let ge_tracker = match &config.ge_tracker.api_key {
        Some(key) => Some(Arc::new(GeTrackerClient::new(GeTrackerConfig::new(
            key.clone(),
        ))?)),
        None => {
            warn!("GE_TRACKER_API_KEY not set; price commands are disabled");
            None
        }
    };

    Ok(Data {
        config,
        db,
        wom,
        ge_tracker,
        cooldown: Arc::new(CooldownManager::new()),
        sync_trigger: Arc::new(Notify::new()),
    })
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new("party_bot=info,party_commands=info,party_db=info,party_common=info")
        }))
        .init();

    info!("Starting 302 Party clan bot");

    let data = build_data().await?;
    let token = data.config.discord.token.clone();

    let mut options = party_commands::create_framework_options();
    options.on_error = |error| Box::pin(on_error(error));
    options.event_handler =
        |ctx, event, framework, data| Box::pin(event_handler(ctx, event, framework, data));

    let framework = poise::Framework::builder()
        .options(options)
        .setup(move |ctx, ready, framework| Box::pin(setup(ctx, ready, framework, data)))
        .build();

    let intents = GatewayIntents::GUILDS;

    let mut client = serenity::ClientBuilder::new(&token, intents)
        .framework(framework)
        .await?;

    let shard_manager = client.shard_manager.clone();
    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to listen for shutdown signal: {:?}", e);
            return;
        }
        info!("Received shutdown signal, starting graceful shutdown");
        shard_manager.shutdown_all().await;
    });

    if let Err(why) = client.start().await {
        error!("Client error: {:?}", why);
        return Err(why.into());
    }

    info!("302 Party clan bot has shut down");
    Ok(())
}
