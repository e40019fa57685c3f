//! Core business logic - framework-agnostic store and trade operations.
//!
//! Nothing in here knows about Discord. Operations take an [`EconomyApi`] and
//! plain ids and return domain results, which the bot layer renders.
//!
//! [`EconomyApi`]: crate::api::EconomyApi

/// Catalogue generation from item templates
pub mod catalogue;
/// Buying store slots
pub mod purchase;
/// Current catalogue and its refresh task
pub mod store;
/// Player-to-player trades
pub mod trade;
/// One payment at a time per user
pub mod wallet;

use crate::errors::{Error, Result};

/// Checks that the user acting on a component is the one it was issued for.
pub const fn ensure_actor(expected: u64, actor: u64) -> Result<()> {
    if expected == actor {
        Ok(())
    } else {
        Err(Error::Unauthorized { user_id: actor })
    }
}
