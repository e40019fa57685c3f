//! Remote economy service - accounts, balances, items and attribute metadata.
//!
//! The service owns all durable state. [`EconomyApi`] is the seam the rest of the
//! crate talks to; [`HttpEconomyClient`] is the production implementation and
//! tests use an in-memory recording mock.

mod http;
mod models;

pub use http::HttpEconomyClient;
pub use models::{Account, AttributeKind, AttributeRecord, InventoryItem, NewItem, Stat};

use crate::errors::Result;
use async_trait::async_trait;

/// Calls offered by the economy service.
///
/// Every call is fire-once: no retries, no idempotency keys. Callers branch on
/// success, not-found ([`crate::errors::Error::AccountNotFound`],
/// [`crate::errors::Error::ItemNotFound`]) and any other failure
/// ([`crate::errors::Error::Remote`]).
#[async_trait]
pub trait EconomyApi: Send + Sync {
    /// Fetches a fresh account snapshot.
    async fn get_account(&self, user_id: u64) -> Result<Account>;

    /// Adds `delta` (negative to debit) to the balance and returns the updated account.
    async fn adjust_balance(&self, user_id: u64, delta: i64) -> Result<Account>;

    /// Creates a new item stack owned by `item.owner_id`.
    async fn create_item(&self, item: &NewItem) -> Result<()>;

    /// Looks up a single item stack.
    async fn get_item(&self, item_id: &str) -> Result<InventoryItem>;

    /// Moves a whole item stack to a new owner.
    async fn transfer_item(&self, item_id: &str, new_owner: u64) -> Result<()>;

    /// Resolves rarity or type metadata by id.
    async fn get_attribute(&self, kind: AttributeKind, id: i64) -> Result<AttributeRecord>;
}
