//! Bot layer - Discord-specific interface and command handlers
//!
//! This module wires the core store and trade operations to Discord: slash
//! commands, component interactions, rendering and the client lifecycle.

/// Discord command implementations (store, trade, help, changelog)
pub mod commands;
/// Discord interaction handlers (buttons, select menus)
pub mod handlers;
/// Typed component custom ids
pub mod ids;
/// Embed and component rendering
pub mod view;

use crate::{
    api::EconomyApi,
    config::settings::Settings,
    core::{store::StoreState, trade::TradeDesk, wallet::Wallets},
    errors::{Error, Result},
};
use poise::serenity_prelude as serenity;
use std::sync::Arc;
use tracing::{debug, error, info, instrument, warn};

/// Shared data available to all bot commands and interaction handlers.
pub struct BotData {
    /// Economy service client
    pub api: Arc<dyn EconomyApi>,
    /// Current catalogue, kept fresh by the store refresher
    pub store: Arc<StoreState>,
    /// Items whose trades are currently settling
    pub trades: TradeDesk,
    /// Users with a payment in flight
    pub wallets: Wallets,
    /// Settings loaded at startup
    pub settings: Arc<Settings>,
}

impl BotData {
    /// Creates a new `BotData` instance.
    #[must_use]
    pub fn new(api: Arc<dyn EconomyApi>, store: Arc<StoreState>, settings: Arc<Settings>) -> Self {
        Self {
            api,
            store,
            trades: TradeDesk::new(),
            wallets: Wallets::new(),
            settings,
        }
    }

    /// Embed colour for every message the bot sends.
    #[must_use]
    pub fn color(&self) -> u32 {
        self.settings.bot.display_color
    }
}

async fn on_error(error: poise::FrameworkError<'_, BotData, Error>) {
    match error {
        poise::FrameworkError::Setup { error, .. } => {
            error!("Failed to start bot: {error}");
        }
        poise::FrameworkError::Command { error, ctx, .. } => {
            let Some(message) = error.user_message() else {
                debug!("Silent error in command `{}`: {error}", ctx.command().name);
                return;
            };
            if message.status.is_some() {
                warn!("Error in command `{}`: {error}", ctx.command().name);
            } else {
                info!("Command `{}` rejected: {error}", ctx.command().name);
            }

            let embed = view::error_embed(&message, ctx.data().color());
            if let Err(e) = ctx.send(poise::CreateReply::default().embed(embed)).await {
                error!("Failed to send error message: {e}");
            }
        }
        error => {
            if let Err(e) = poise::builtins::on_error(error).await {
                error!("Error while handling error: {e}");
            }
        }
    }
}

async fn event_handler(
    ctx: &serenity::Context,
    event: &serenity::FullEvent,
    _framework: poise::FrameworkContext<'_, BotData, Error>,
    data: &BotData,
) -> Result<()> {
    if let serenity::FullEvent::InteractionCreate { interaction } = event {
        if let Some(component) = interaction.as_message_component() {
            handlers::components::handle(ctx, component, data).await;
        }
    }
    Ok(())
}

/// Connects to Discord and runs until the gateway shuts down.
///
/// Commands are registered in the configured guild on every start, replacing
/// whatever was registered before. Ctrl-C shuts all shards down gracefully.
#[instrument(skip(token, data))]
pub async fn run_bot(token: String, data: BotData) -> Result<()> {
    let guild_id = serenity::GuildId::new(data.settings.bot.guild_id);
    let activity = data.settings.bot.activity.clone();

    let framework = poise::Framework::builder()
        .options(poise::FrameworkOptions {
            commands: vec![
                commands::store(),
                commands::trade(),
                commands::help(),
                commands::changelog(),
            ],
            on_error: |error| Box::pin(on_error(error)),
            event_handler: |ctx, event, framework, data| {
                Box::pin(event_handler(ctx, event, framework, data))
            },
            ..Default::default()
        })
        .setup(move |ctx, ready, framework| {
            Box::pin(async move {
                info!("Logged in as {}", ready.user.name);
                poise::builtins::register_in_guild(ctx, &framework.options().commands, guild_id)
                    .await?;
                info!(%guild_id, "Registered commands in guild");

                ctx.set_presence(
                    Some(serenity::ActivityData::playing(activity)),
                    serenity::OnlineStatus::Online,
                );
                Ok(data)
            })
        })
        .build();

    let intents = serenity::GatewayIntents::GUILDS;

    info!("Setting up Serenity client for Poise framework...");
    let mut client = serenity::ClientBuilder::new(token, intents)
        .framework(framework)
        .await
        .inspect_err(|e| error!("Error creating client: {e}"))?;

    let shard_manager = Arc::clone(&client.shard_manager);
    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to listen for shutdown signal: {e}");
            return;
        }
        info!("Shutdown requested, stopping shards");
        shard_manager.shutdown_all().await;
    });

    info!("Starting bot client...");
    client
        .start()
        .await
        .inspect_err(|e| error!("Client error: {e}"))?;
    Ok(())
}
