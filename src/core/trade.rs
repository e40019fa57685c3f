//! Player-to-player trades.
//!
//! An offer lives only in the Discord message that shows it: the component ids
//! carry the seller, the item id and the price. Lifecycle:
//!
//! ```text
//! /trade -> select item -> OFFER_CREATED -> retract  -> CLOSED_RETRACTED
//!                                        -> accept   -> SETTLING -> CLOSED_SETTLED
//! ```
//!
//! Settlement runs transfer, debit buyer, credit seller in that order. A failed
//! step unwinds the completed ones in reverse. [`TradeDesk`] keeps one item from
//! settling twice at the same time and remembers retracted offers, so an accept
//! that arrives after the retract cannot settle.

use super::{ensure_actor, wallet::Wallets};
use crate::{
    api::{EconomyApi, InventoryItem},
    errors::{Error, Result},
};
use std::{
    collections::HashSet,
    sync::{Mutex, MutexGuard, PoisonError},
};
use tracing::{error, info, instrument, warn};

/// Discord's limit on select menu options.
pub const MAX_SELECT_OPTIONS: usize = 25;

/// An open offer as decoded from the message components.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TradeOffer {
    pub seller: u64,
    pub item_id: String,
    pub price: i64,
}

/// A seller's inventory, ready to pick the item to sell.
#[derive(Debug, Clone)]
pub struct OfferDraft {
    pub seller: u64,
    pub price: i64,
    /// At most [`MAX_SELECT_OPTIONS`] items, in inventory order.
    pub items: Vec<InventoryItem>,
}

/// Result of a completed trade.
#[derive(Debug, Clone)]
pub struct TradeSettlement {
    pub offer: TradeOffer,
    pub buyer: u64,
    pub item: InventoryItem,
    pub buyer_balance: i64,
}

/// Trade price must be given and non-negative. Zero is a gift.
pub fn validate_price(price: Option<i64>) -> Result<i64> {
    match price {
        Some(price) if price >= 0 => Ok(price),
        other => Err(Error::InvalidPrice { price: other }),
    }
}

/// Starts a trade: validates the price and lists the seller's items.
#[instrument(skip(api))]
pub async fn open_offer(api: &dyn EconomyApi, seller: u64, price: Option<i64>) -> Result<OfferDraft> {
    let price = validate_price(price)?;
    let account = api.get_account(seller).await?;
    if account.inventory.is_empty() {
        return Err(Error::EmptyInventory);
    }

    let mut items = account.inventory;
    items.truncate(MAX_SELECT_OPTIONS);
    Ok(OfferDraft {
        seller,
        price,
        items,
    })
}

/// Turns the seller's selection into an offer.
///
/// The item is checked against a fresh account snapshot, since the select
/// menu may have been rendered long ago. Offering the same terms again
/// reopens an offer that was retracted earlier.
#[instrument(skip(api, desk))]
pub async fn select_item(
    api: &dyn EconomyApi,
    desk: &TradeDesk,
    seller: u64,
    actor: u64,
    item_id: &str,
    price: i64,
) -> Result<(TradeOffer, InventoryItem)> {
    ensure_actor(seller, actor)?;
    validate_price(Some(price))?;

    let account = api.get_account(seller).await?;
    let item = account
        .item(item_id)
        .cloned()
        .ok_or_else(|| Error::ItemNotOwned {
            item_id: item_id.to_string(),
        })?;

    let offer = TradeOffer {
        seller,
        item_id: item.id.clone(),
        price,
    };
    desk.reopen(&offer);
    Ok((offer, item))
}

#[derive(Debug, Default)]
struct DeskState {
    settling: HashSet<String>,
    retracted: HashSet<TradeOffer>,
}

/// Tracks items whose trade is currently settling and offers that were retracted.
#[derive(Debug, Default)]
pub struct TradeDesk {
    state: Mutex<DeskState>,
}

impl TradeDesk {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, DeskState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Claims the offer's item for settlement until the returned guard is dropped.
    pub fn begin(&self, offer: &TradeOffer) -> Result<SettlementGuard<'_>> {
        let mut state = self.lock();
        if state.retracted.contains(offer) {
            return Err(Error::OfferRetracted {
                item_id: offer.item_id.clone(),
            });
        }
        if !state.settling.insert(offer.item_id.clone()) {
            return Err(Error::TradeInProgress {
                item_id: offer.item_id.clone(),
            });
        }
        Ok(SettlementGuard {
            desk: self,
            item_id: offer.item_id.clone(),
        })
    }

    #[must_use]
    pub fn is_settling(&self, item_id: &str) -> bool {
        self.lock().settling.contains(item_id)
    }

    fn reopen(&self, offer: &TradeOffer) {
        self.lock().retracted.remove(offer);
    }
}

/// Releases the item on drop.
#[derive(Debug)]
pub struct SettlementGuard<'a> {
    desk: &'a TradeDesk,
    item_id: String,
}

impl Drop for SettlementGuard<'_> {
    fn drop(&mut self) {
        self.desk.lock().settling.remove(&self.item_id);
    }
}

/// Withdraws an offer. Only the seller may retract, and not mid-settlement.
///
/// Once retracted, the offer can no longer be accepted, even by a click that
/// was already on its way.
pub fn retract(desk: &TradeDesk, offer: &TradeOffer, actor: u64) -> Result<()> {
    ensure_actor(offer.seller, actor)?;
    let mut state = desk.lock();
    if state.settling.contains(&offer.item_id) {
        return Err(Error::TradeInProgress {
            item_id: offer.item_id.clone(),
        });
    }
    state.retracted.insert(offer.clone());
    drop(state);
    info!(seller = offer.seller, item = %offer.item_id, "Trade offer retracted");
    Ok(())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SettlementStep {
    Transferred,
    BuyerDebited,
}

/// Settles `offer` in favour of `buyer`.
///
/// The buyer's payment lock is held for the whole settlement.
#[instrument(skip(api, desk, wallets))]
pub async fn accept(
    api: &dyn EconomyApi,
    desk: &TradeDesk,
    wallets: &Wallets,
    offer: &TradeOffer,
    buyer: u64,
) -> Result<TradeSettlement> {
    if offer.seller == buyer {
        return Err(Error::SelfTrade);
    }
    let _guard = desk.begin(offer)?;
    let _paying = wallets.begin(buyer)?;

    let account = api.get_account(buyer).await?;

    let item = match api.get_item(&offer.item_id).await {
        Ok(item) => item,
        Err(Error::ItemNotFound { item_id }) => return Err(Error::ItemNotOwned { item_id }),
        Err(e) => return Err(e),
    };
    if !item.is_owned_by(offer.seller) {
        return Err(Error::ItemNotOwned {
            item_id: offer.item_id.clone(),
        });
    }

    if account.dollars < offer.price {
        return Err(Error::InsufficientFunds {
            balance: account.dollars,
            required: offer.price,
        });
    }

    let mut completed = Vec::with_capacity(2);

    api.transfer_item(&offer.item_id, buyer).await?;
    completed.push(SettlementStep::Transferred);

    let debited = match api.adjust_balance(buyer, -offer.price).await {
        Ok(account) => account,
        Err(e) => {
            warn!(buyer, item = %offer.item_id, "Debit failed, unwinding trade: {e}");
            unwind(api, offer, buyer, &completed).await;
            return Err(e);
        }
    };
    completed.push(SettlementStep::BuyerDebited);

    if let Err(e) = api.adjust_balance(offer.seller, offer.price).await {
        warn!(seller = offer.seller, item = %offer.item_id, "Credit failed, unwinding trade: {e}");
        unwind(api, offer, buyer, &completed).await;
        return Err(e);
    }

    info!(
        seller = offer.seller,
        buyer,
        item = %offer.item_id,
        price = offer.price,
        "Trade settled"
    );
    Ok(TradeSettlement {
        offer: offer.clone(),
        buyer,
        item,
        buyer_balance: debited.dollars,
    })
}

async fn unwind(api: &dyn EconomyApi, offer: &TradeOffer, buyer: u64, completed: &[SettlementStep]) {
    for step in completed.iter().rev() {
        let result = match step {
            SettlementStep::BuyerDebited => api.adjust_balance(buyer, offer.price).await.map(|_| ()),
            SettlementStep::Transferred => api.transfer_item(&offer.item_id, offer.seller).await,
        };
        if let Err(e) = result {
            error!(
                ?step,
                buyer,
                seller = offer.seller,
                item = %offer.item_id,
                "Compensation failed, trade left partially settled: {e}"
            );
        }
    }
}
