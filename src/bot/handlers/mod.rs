//! Discord interaction handlers
//!
//! Slash commands are dispatched by poise; everything else arrives through
//! the framework event handler and is routed from here.

/// Button and select menu handlers for the store and trades
pub mod components;
