use bruh_united::{
    api::{EconomyApi, HttpEconomyClient},
    bot::{self, BotData},
    config,
    core::{
        catalogue::CatalogueGenerator,
        store::{RefreshSchedule, StoreRefresher, StoreState},
    },
    errors::{Error, Result},
};
use dotenvy::dotenv;
use std::{env, sync::Arc};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // 1. Initialize tracing (as early as possible)
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // 2. Load .env file; variables may also be set externally
    dotenv().ok();
    info!("Attempted to load .env file.");

    // 3. Load settings and item data
    let app_config = config::load_app_configuration()?;
    let settings = Arc::new(app_config.settings);

    // 4. Economy service client; the key is read here, directly before use
    let pass_key = env::var("ECONOMY_API_KEY")
        .inspect_err(|e| error!("ECONOMY_API_KEY not found: {e}"))
        .map_err(Error::EnvVar)?;
    let api: Arc<dyn EconomyApi> =
        Arc::new(HttpEconomyClient::new(settings.api.base_url(), pass_key));
    info!(base_url = settings.api.base_url(), "Economy service client ready");

    // 5. Start restocking the store in the background
    let store = Arc::new(StoreState::new());
    let generator = Arc::new(CatalogueGenerator::new(Arc::new(app_config.items)));
    let refresher = StoreRefresher::spawn(
        Arc::clone(&store),
        generator,
        Arc::clone(&api),
        RefreshSchedule::from(&settings.store),
    );

    // 6. Run the bot until the gateway shuts down
    let token = env::var("DISCORD_BOT_TOKEN")
        .inspect_err(|e| error!("DISCORD_BOT_TOKEN not found: {e}"))
        .map_err(Error::EnvVar)?;

    let result = bot::run_bot(token, BotData::new(api, store, settings)).await;

    refresher.shutdown().await;
    info!("Bot stopped");
    result
}
