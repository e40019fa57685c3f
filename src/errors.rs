//! Unified error type for the store bot.
//!
//! Every fallible operation returns [`Result`]. Errors fall into four groups:
//! not-found answers from the economy service, other remote failures, validation
//! failures caused by the user, and malformed interactions. [`Error::user_message`]
//! turns an error into the embed text shown to the user, or `None` when the
//! error should only be logged.

use thiserror::Error;

/// Currency symbol used by the economy service.
pub const CURRENCY: &str = "ඞ";

#[derive(Debug, Error)]
pub enum Error {
    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Environment variable error: {0}")]
    EnvVar(#[from] std::env::VarError),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Economy service returned status {status}")]
    Remote { status: u16 },

    #[error("User {user_id} has no economy account")]
    AccountNotFound { user_id: u64 },

    #[error("Item '{item_id}' not found")]
    ItemNotFound { item_id: String },

    #[error("Unknown item category: {category}")]
    UnknownCategory { category: String },

    #[error("Insufficient funds: balance {balance}, required {required}")]
    InsufficientFunds { balance: i64, required: i64 },

    #[error("Invalid trade price: {price:?}")]
    InvalidPrice { price: Option<i64> },

    #[error("Inventory is empty")]
    EmptyInventory,

    #[error("Item '{item_id}' is no longer owned by the seller")]
    ItemNotOwned { item_id: String },

    #[error("Store slot {slot} is already sold")]
    SlotSold { slot: usize },

    #[error("Store slot {slot} is being purchased by someone else")]
    SlotReserved { slot: usize },

    #[error("Store slot {slot} does not exist")]
    SlotOutOfRange { slot: usize },

    #[error("Catalogue version {requested} was replaced by version {current}")]
    CatalogueExpired { requested: u64, current: u64 },

    #[error("The store has not been stocked yet")]
    StoreNotReady,

    #[error("A seller cannot accept their own trade")]
    SelfTrade,

    #[error("User {user_id} is not allowed to use this component")]
    Unauthorized { user_id: u64 },

    #[error("Trade for item '{item_id}' is already being settled")]
    TradeInProgress { item_id: String },

    #[error("Trade offer for item '{item_id}' was retracted")]
    OfferRetracted { item_id: String },

    #[error("User {user_id} already has a payment in progress")]
    PaymentInProgress { user_id: u64 },

    #[error("Invalid component id: {token}")]
    InvalidToken { token: String },

    #[error("Serenity/Poise framework error: {0}")]
    #[allow(clippy::enum_variant_names)]
    FrameworkError(Box<poise::serenity_prelude::Error>),
}

impl From<poise::serenity_prelude::Error> for Error {
    fn from(value: poise::serenity_prelude::Error) -> Self {
        Self::FrameworkError(Box::new(value))
    }
}

/// Text of the embed shown to a user when an operation fails.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserMessage {
    pub title: String,
    pub description: Option<String>,
    /// Remote status code, shown in the footer for support triage.
    pub status: Option<u16>,
}

impl UserMessage {
    fn new(title: impl Into<String>, description: Option<String>) -> Self {
        Self {
            title: title.into(),
            description,
            status: None,
        }
    }
}

impl Error {
    /// Returns true for errors that are logged but never shown to the user.
    #[must_use]
    pub const fn is_silent(&self) -> bool {
        matches!(self, Self::Unauthorized { .. } | Self::InvalidToken { .. })
    }

    /// Maps the error to a user-facing message. Silent errors map to `None`.
    #[must_use]
    pub fn user_message(&self) -> Option<UserMessage> {
        let message = match self {
            Self::Unauthorized { .. } | Self::InvalidToken { .. } => return None,
            Self::AccountNotFound { .. } => UserMessage::new(
                "You don't have a Mingleton RPG account",
                Some("You can create one with `/account create`.".to_string()),
            ),
            Self::ItemNotFound { .. } => UserMessage::new("This item doesn't exist", None),
            Self::Remote { status } => UserMessage {
                title: "Something went wrong".to_string(),
                description: None,
                status: Some(*status),
            },
            Self::InsufficientFunds { balance, required } => UserMessage::new(
                format!("You don't have enough {CURRENCY}dollars!"),
                Some(format!(
                    "You need another {} {CURRENCY}dollars to complete this.",
                    required - balance
                )),
            ),
            Self::InvalidPrice { price: None } => {
                UserMessage::new("Missing required fields!", None)
            }
            Self::InvalidPrice { price: Some(_) } => {
                UserMessage::new("Yes, I thought of this too 😩", None)
            }
            Self::EmptyInventory => UserMessage::new(
                "You have no items in your inventory!",
                Some("You need to have something to trade!".to_string()),
            ),
            Self::ItemNotOwned { .. } => UserMessage::new(
                "This item is no longer available",
                Some("It may have been deleted or sold already!".to_string()),
            ),
            Self::SlotSold { .. } => UserMessage::new("This item has already been sold", None),
            Self::SlotReserved { .. } => UserMessage::new(
                "Someone else is buying this item",
                Some("Try again in a moment.".to_string()),
            ),
            Self::SlotOutOfRange { .. } => {
                UserMessage::new("That item isn't in the store", None)
            }
            Self::CatalogueExpired { .. } => UserMessage::new(
                "The store has restocked",
                Some("Open `/store` again to see the new catalogue.".to_string()),
            ),
            Self::StoreNotReady => UserMessage::new(
                "The store is restocking",
                Some("Try again in a moment.".to_string()),
            ),
            Self::SelfTrade => UserMessage::new("You can't accept your own trade", None),
            Self::TradeInProgress { .. } => UserMessage::new(
                "This trade is already being settled",
                Some("Someone has just accepted it.".to_string()),
            ),
            Self::OfferRetracted { .. } => {
                UserMessage::new("This trade has been retracted", None)
            }
            Self::PaymentInProgress { .. } => UserMessage::new(
                "You already have a payment going through",
                Some("Wait for it to finish, then try again.".to_string()),
            ),
            Self::Config { .. }
            | Self::Io(_)
            | Self::EnvVar(_)
            | Self::Http(_)
            | Self::Json(_)
            | Self::UnknownCategory { .. }
            | Self::FrameworkError(_) => UserMessage::new("Something went wrong", None),
        };
        Some(message)
    }
}

// Convenience `Result` type
pub type Result<T> = std::result::Result<T, Error>;
