//! Store purchases - viewing the catalogue and buying a slot.
//!
//! A purchase reserves the slot before touching the economy service, so two
//! buyers racing on the same slot cannot both pay for it. The remote steps run
//! as a small saga: debit the buyer, then create the item. If item creation
//! fails the debit is refunded and the reservation released. The buyer's
//! [`Wallets`] lock is held from the balance check until the saga ends.

use super::{
    catalogue::GeneratedItem,
    ensure_actor,
    store::{Catalogue, Slot, StoreState},
    wallet::Wallets,
};
use crate::{
    api::EconomyApi,
    errors::{Error, Result},
};
use std::sync::Arc;
use tracing::{error, info, instrument, warn};

/// The catalogue as seen by one user, with their current balance.
#[derive(Debug, Clone)]
pub struct StoreView {
    pub catalogue: Arc<Catalogue>,
    pub balance: i64,
}

impl StoreView {
    /// Whether the purchase button for `slot` should be enabled.
    #[must_use]
    pub fn can_buy(&self, slot: &Slot) -> bool {
        slot.is_available() && slot.item.price <= self.balance
    }
}

/// A store purchase request decoded from a button click.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PurchaseRequest {
    /// User who opened the store message.
    pub owner: u64,
    /// User who clicked.
    pub buyer: u64,
    /// Catalogue version the button was rendered from.
    pub version: u64,
    pub slot: usize,
}

/// Outcome of a successful purchase.
#[derive(Debug, Clone)]
pub struct PurchaseReceipt {
    pub item: GeneratedItem,
    pub new_balance: i64,
    pub view: StoreView,
}

/// Fetches the caller's account and pairs it with the current catalogue.
#[instrument(skip(api, store))]
pub async fn view_store(api: &dyn EconomyApi, store: &StoreState, user_id: u64) -> Result<StoreView> {
    let account = api.get_account(user_id).await?;
    let catalogue = store.snapshot().await?;
    Ok(StoreView {
        catalogue,
        balance: account.dollars,
    })
}

/// Buys one catalogue slot for `request.buyer`.
///
/// Nothing is sent to the economy service unless the clicker owns the store
/// message, the catalogue version still matches, the slot is unsold and the
/// buyer can afford it.
#[instrument(skip(api, store, wallets))]
pub async fn purchase(
    api: &dyn EconomyApi,
    store: &StoreState,
    wallets: &Wallets,
    request: PurchaseRequest,
) -> Result<PurchaseReceipt> {
    ensure_actor(request.owner, request.buyer)?;

    let catalogue = store.snapshot().await?;
    if catalogue.version != request.version {
        return Err(Error::CatalogueExpired {
            requested: request.version,
            current: catalogue.version,
        });
    }

    let slot = catalogue.slot(request.slot)?;
    if slot.is_sold() {
        return Err(Error::SlotSold { slot: request.slot });
    }
    let price = slot.item.price;

    let _paying = wallets.begin(request.buyer)?;
    let account = api.get_account(request.buyer).await?;
    if account.dollars < price {
        return Err(Error::InsufficientFunds {
            balance: account.dollars,
            required: price,
        });
    }

    let reservation = slot.try_reserve(request.slot)?;

    let debited = api.adjust_balance(request.buyer, -price).await?;

    if let Err(e) = api.create_item(&slot.item.to_new_item(request.buyer)).await {
        warn!(buyer = request.buyer, price, "Item creation failed, refunding buyer: {e}");
        if let Err(refund_error) = api.adjust_balance(request.buyer, price).await {
            error!(
                buyer = request.buyer,
                price, "Refund after failed purchase did not go through: {refund_error}"
            );
        }
        return Err(e);
    }

    reservation.complete();
    info!(
        buyer = request.buyer,
        item = %slot.item.name,
        price,
        "Store item purchased"
    );

    let item = slot.item.clone();
    Ok(PurchaseReceipt {
        item,
        new_balance: debited.dollars,
        view: StoreView {
            catalogue: Arc::clone(&catalogue),
            balance: debited.dollars,
        },
    })
}
