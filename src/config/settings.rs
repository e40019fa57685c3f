//! Bot runtime settings loaded from `config.toml`.
//!
//! Secrets (the Discord token and the economy service key) never live here;
//! they are read from the environment right before use.

use crate::errors::{Error, Result};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

/// Configuration structure representing the entire config.toml file
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub bot: BotSettings,
    pub store: StoreSettings,
    pub api: ApiSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BotSettings {
    /// Guild the slash commands are registered in.
    pub guild_id: u64,
    #[serde(default = "default_display_color")]
    pub display_color: u32,
    /// Shown as "Playing ..." in the bot's presence.
    #[serde(default = "default_activity")]
    pub activity: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StoreSettings {
    /// Seconds between catalogue refreshes.
    pub refresh_secs: u64,
    /// Seconds to wait before retrying a refresh that failed.
    #[serde(default = "default_retry_secs")]
    pub retry_secs: u64,
}

impl StoreSettings {
    #[must_use]
    pub const fn refresh_interval(&self) -> Duration {
        Duration::from_secs(self.refresh_secs)
    }

    #[must_use]
    pub const fn retry_delay(&self) -> Duration {
        Duration::from_secs(self.retry_secs)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiSettings {
    /// Selects the production domain when true, the development domain otherwise.
    pub production: bool,
    pub production_domain: String,
    pub development_domain: String,
}

impl ApiSettings {
    /// Base URL of the economy service in use.
    #[must_use]
    pub fn base_url(&self) -> &str {
        if self.production {
            &self.production_domain
        } else {
            &self.development_domain
        }
    }
}

const fn default_display_color() -> u32 {
    0x0058_65F2
}

fn default_activity() -> String {
    "Bruh United".to_string()
}

const fn default_retry_secs() -> u64 {
    60
}

/// Parses and validates settings from a TOML string.
pub fn parse_settings(contents: &str) -> Result<Settings> {
    let settings: Settings = toml::from_str(contents).map_err(|e| Error::Config {
        message: format!("Failed to parse config.toml: {e}"),
    })?;

    if settings.bot.guild_id == 0 {
        return Err(Error::Config {
            message: "bot.guild_id must be set".to_string(),
        });
    }
    if settings.store.refresh_secs == 0 {
        return Err(Error::Config {
            message: "store.refresh_secs must be greater than zero".to_string(),
        });
    }
    if settings.store.retry_secs == 0 {
        return Err(Error::Config {
            message: "store.retry_secs must be greater than zero".to_string(),
        });
    }
    if settings.api.base_url().trim().is_empty() {
        return Err(Error::Config {
            message: "The selected API domain is empty".to_string(),
        });
    }

    Ok(settings)
}

/// Loads settings from a TOML file
///
/// # Errors
/// Returns an error if the file cannot be read, the TOML is invalid, or a
/// value fails validation.
pub fn load_settings<P: AsRef<Path>>(path: P) -> Result<Settings> {
    let path_ref = path.as_ref();
    tracing::debug!("Attempting to load settings from: {:?}", path_ref);
    let contents = std::fs::read_to_string(path_ref).map_err(|e| Error::Config {
        message: format!("Failed to read config file {}: {e}", path_ref.display()),
    })?;
    parse_settings(&contents)
}
