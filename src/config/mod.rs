/// Static item templates and category stat tables
pub mod items;

/// Bot runtime settings from config.toml
pub mod settings;

use crate::errors::Result;
use items::ItemData;
use settings::Settings;
use tracing::{error, info};

const DEFAULT_CONFIG_PATH: &str = "config.toml";
const DEFAULT_ITEMS_PATH: &str = "data/items.toml";
const DEFAULT_ATTRIBUTES_PATH: &str = "data/attributes.toml";

/// Everything loaded from disk at startup.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub settings: Settings,
    pub items: ItemData,
}

/// Loads settings and item data, honouring `CONFIG_PATH`, `ITEMS_PATH` and
/// `ATTRIBUTES_PATH` overrides from the environment.
pub fn load_app_configuration() -> Result<AppConfig> {
    let config_path = env_or("CONFIG_PATH", DEFAULT_CONFIG_PATH);
    let items_path = env_or("ITEMS_PATH", DEFAULT_ITEMS_PATH);
    let attributes_path = env_or("ATTRIBUTES_PATH", DEFAULT_ATTRIBUTES_PATH);

    let settings = settings::load_settings(&config_path)
        .inspect_err(|e| error!("Failed to load settings from {config_path}: {e}"))?;
    let items = ItemData::load(&items_path, &attributes_path)
        .inspect_err(|e| error!("Failed to load item data: {e}"))?;

    info!(
        config = %config_path,
        items = %items_path,
        attributes = %attributes_path,
        "Loaded application configuration"
    );
    Ok(AppConfig { settings, items })
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}
