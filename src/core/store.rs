//! Store state - the current catalogue snapshot and the task that refreshes it.
//!
//! A [`Catalogue`] is immutable apart from the per-slot sale state. Refreshing
//! builds a complete new catalogue and swaps it in with a single pointer
//! replace, so readers holding an `Arc<Catalogue>` always see one fully formed
//! version. Versions increase by one on every publish.

use super::catalogue::{CatalogueGenerator, GeneratedItem};
use crate::{
    api::EconomyApi,
    config::settings::StoreSettings,
    errors::{Error, Result},
};
use chrono::{DateTime, Utc};
use rand::{SeedableRng, rngs::StdRng};
use std::{
    sync::{
        Arc, Mutex, PoisonError,
        atomic::{AtomicU8, AtomicU64, Ordering},
    },
    time::Duration,
};
use tokio::{
    sync::{RwLock, watch},
    task::JoinHandle,
    time::Instant,
};
use tracing::{error, info, warn};

const AVAILABLE: u8 = 0;
const RESERVED: u8 = 1;
const SOLD: u8 = 2;

/// One purchasable position in the catalogue.
#[derive(Debug)]
pub struct Slot {
    pub item: GeneratedItem,
    state: AtomicU8,
}

impl Slot {
    fn new(item: GeneratedItem) -> Self {
        Self {
            item,
            state: AtomicU8::new(AVAILABLE),
        }
    }

    #[must_use]
    pub fn is_sold(&self) -> bool {
        self.state.load(Ordering::Acquire) == SOLD
    }

    /// Neither sold nor reserved by an in-flight purchase.
    #[must_use]
    pub fn is_available(&self) -> bool {
        self.state.load(Ordering::Acquire) == AVAILABLE
    }

    /// Claims the slot for one purchase. Dropping the reservation without
    /// completing it makes the slot available again.
    pub fn try_reserve(&self, index: usize) -> Result<SlotReservation<'_>> {
        match self
            .state
            .compare_exchange(AVAILABLE, RESERVED, Ordering::AcqRel, Ordering::Acquire)
        {
            Ok(_) => Ok(SlotReservation {
                slot: self,
                completed: false,
            }),
            Err(SOLD) => Err(Error::SlotSold { slot: index }),
            Err(_) => Err(Error::SlotReserved { slot: index }),
        }
    }
}

/// Exclusive claim on a slot while a purchase is settling.
#[derive(Debug)]
pub struct SlotReservation<'a> {
    slot: &'a Slot,
    completed: bool,
}

impl SlotReservation<'_> {
    /// Marks the slot as sold.
    pub fn complete(mut self) {
        self.slot.state.store(SOLD, Ordering::Release);
        self.completed = true;
    }
}

impl Drop for SlotReservation<'_> {
    fn drop(&mut self) {
        if !self.completed {
            self.slot.state.store(AVAILABLE, Ordering::Release);
        }
    }
}

/// A published set of store slots.
#[derive(Debug)]
pub struct Catalogue {
    pub version: u64,
    pub generated_at: DateTime<Utc>,
    refresh_at: Mutex<Instant>,
    slots: Vec<Slot>,
}

impl Catalogue {
    #[must_use]
    pub fn slots(&self) -> &[Slot] {
        &self.slots
    }

    /// Looks up a slot by its zero-based index.
    pub fn slot(&self, index: usize) -> Result<&Slot> {
        self.slots
            .get(index)
            .ok_or(Error::SlotOutOfRange { slot: index })
    }

    #[must_use]
    pub fn time_until_refresh(&self) -> Duration {
        self.refresh_at
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .saturating_duration_since(Instant::now())
    }

    /// Moves the refresh deadline to `delay` from now.
    pub fn postpone_refresh(&self, delay: Duration) {
        *self.refresh_at.lock().unwrap_or_else(PoisonError::into_inner) = Instant::now() + delay;
    }
}

/// Holder of the current catalogue.
#[derive(Debug, Default)]
pub struct StoreState {
    current: RwLock<Option<Arc<Catalogue>>>,
    last_version: AtomicU64,
}

impl StoreState {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The catalogue currently on sale.
    pub async fn snapshot(&self) -> Result<Arc<Catalogue>> {
        self.current
            .read()
            .await
            .as_ref()
            .map(Arc::clone)
            .ok_or(Error::StoreNotReady)
    }

    /// Replaces the current catalogue with `items`, due for refresh after `refresh_in`.
    pub async fn publish(&self, items: Vec<GeneratedItem>, refresh_in: Duration) -> Arc<Catalogue> {
        let version = self.last_version.fetch_add(1, Ordering::AcqRel) + 1;
        let catalogue = Arc::new(Catalogue {
            version,
            generated_at: Utc::now(),
            refresh_at: Mutex::new(Instant::now() + refresh_in),
            slots: items.into_iter().map(Slot::new).collect(),
        });

        *self.current.write().await = Some(Arc::clone(&catalogue));
        catalogue
    }
}

/// Timing of the refresh loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RefreshSchedule {
    pub interval: Duration,
    pub retry: Duration,
}

impl From<&StoreSettings> for RefreshSchedule {
    fn from(settings: &StoreSettings) -> Self {
        Self {
            interval: settings.refresh_interval(),
            retry: settings.retry_delay(),
        }
    }
}

/// Generates a full catalogue and publishes it.
///
/// On failure nothing is published and the previous catalogue stays on sale.
pub async fn refresh_once(
    store: &StoreState,
    generator: &CatalogueGenerator,
    api: &dyn EconomyApi,
    rng: &mut StdRng,
    refresh_in: Duration,
) -> Result<Arc<Catalogue>> {
    let items = generator.generate_catalogue(api, rng).await?;
    let catalogue = store.publish(items, refresh_in).await;
    info!(
        version = catalogue.version,
        generated_at = %catalogue.generated_at.format("%H:%M:%S"),
        "Store restocked"
    );
    Ok(catalogue)
}

/// Background task that restocks the store on a fixed schedule.
///
/// The first catalogue is generated immediately. A failed cycle is retried
/// after `RefreshSchedule::retry`.
pub struct StoreRefresher {
    shutdown: watch::Sender<bool>,
    handle: JoinHandle<()>,
}

impl StoreRefresher {
    pub fn spawn(
        store: Arc<StoreState>,
        generator: Arc<CatalogueGenerator>,
        api: Arc<dyn EconomyApi>,
        schedule: RefreshSchedule,
    ) -> Self {
        let (shutdown, mut shutdown_rx) = watch::channel(false);

        let handle = tokio::spawn(async move {
            let mut rng = StdRng::from_entropy();
            loop {
                let delay = match refresh_once(
                    &store,
                    &generator,
                    api.as_ref(),
                    &mut rng,
                    schedule.interval,
                )
                .await
                {
                    Ok(_) => schedule.interval,
                    Err(e) => {
                        warn!("Store refresh failed, retrying in {:?}: {e}", schedule.retry);
                        if let Ok(current) = store.snapshot().await {
                            current.postpone_refresh(schedule.retry);
                        }
                        schedule.retry
                    }
                };

                tokio::select! {
                    () = tokio::time::sleep(delay) => {}
                    _ = shutdown_rx.changed() => break,
                }
            }
            info!("Store refresher stopped");
        });

        Self { shutdown, handle }
    }

    /// Stops the refresh loop and waits for it to exit.
    pub async fn shutdown(self) {
        // The receiver only disappears once the loop has already exited.
        let _ = self.shutdown.send(true);
        if let Err(e) = self.handle.await {
            error!("Store refresher task failed: {e}");
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::test_utils::{MockEconomy, sample_generated_item, sample_item_data, sample_items};
    use crate::core::catalogue::Category;

    #[tokio::test]
    async fn test_snapshot_before_first_publish() {
        let store = StoreState::new();
        assert!(matches!(store.snapshot().await, Err(Error::StoreNotReady)));
    }

    #[tokio::test]
    async fn test_publish_replaces_whole_catalogue() {
        let store = StoreState::new();
        let first = store
            .publish(sample_items([10, 20, 30, 40, 50]), Duration::from_secs(60))
            .await;
        first.slot(0).unwrap().try_reserve(0).unwrap().complete();

        let second = store
            .publish(sample_items([11, 21, 31, 41, 51]), Duration::from_secs(60))
            .await;

        assert_eq!(first.version, 1);
        assert_eq!(second.version, 2);
        let current = store.snapshot().await.unwrap();
        assert!(Arc::ptr_eq(&current, &second));
        // The new catalogue starts fresh; the old one is untouched.
        assert!(!current.slot(0).unwrap().is_sold());
        assert!(first.slot(0).unwrap().is_sold());
        assert_eq!(first.slots().len(), 5);
        assert_eq!(
            current.slots().iter().map(|s| s.item.price).collect::<Vec<_>>(),
            vec![11, 21, 31, 41, 51]
        );
    }

    #[test]
    fn test_reservation_is_exclusive_and_released_on_drop() {
        let slot = Slot::new(sample_generated_item(Category::Food, 10));

        let reservation = slot.try_reserve(3).unwrap();
        assert!(!slot.is_available());
        assert!(matches!(
            slot.try_reserve(3),
            Err(Error::SlotReserved { slot: 3 })
        ));
        drop(reservation);

        assert!(slot.is_available());
        slot.try_reserve(3).unwrap().complete();
        assert!(slot.is_sold());
        assert!(matches!(slot.try_reserve(3), Err(Error::SlotSold { slot: 3 })));
    }

    #[tokio::test]
    async fn test_slot_out_of_range() {
        let store = StoreState::new();
        let catalogue = store
            .publish(sample_items([1, 2, 3, 4, 5]), Duration::from_secs(1))
            .await;
        assert!(matches!(
            catalogue.slot(5),
            Err(Error::SlotOutOfRange { slot: 5 })
        ));
    }

    #[tokio::test]
    async fn test_failed_refresh_keeps_previous_catalogue() {
        let store = StoreState::new();
        let generator = CatalogueGenerator::new(Arc::new(sample_item_data()));
        let api = MockEconomy::new();
        let mut rng = StdRng::seed_from_u64(4);

        let first = refresh_once(&store, &generator, &api, &mut rng, Duration::from_secs(60))
            .await
            .unwrap();

        api.fail_attributes(502);
        let err = refresh_once(&store, &generator, &api, &mut rng, Duration::from_secs(60))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Remote { status: 502 }));

        let current = store.snapshot().await.unwrap();
        assert!(Arc::ptr_eq(&current, &first));
    }

    async fn wait_for_version(store: &StoreState, version: u64) -> Arc<Catalogue> {
        loop {
            if let Ok(catalogue) = store.snapshot().await {
                if catalogue.version >= version {
                    return catalogue;
                }
            }
            tokio::time::sleep(Duration::from_millis(1)).await;
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_refresher_restocks_after_interval() {
        let store = Arc::new(StoreState::new());
        let generator = Arc::new(CatalogueGenerator::new(Arc::new(sample_item_data())));
        let api: Arc<dyn EconomyApi> = Arc::new(MockEconomy::new());
        let schedule = RefreshSchedule {
            interval: Duration::from_secs(3600),
            retry: Duration::from_secs(30),
        };

        let refresher = StoreRefresher::spawn(Arc::clone(&store), generator, api, schedule);

        let first = wait_for_version(&store, 1).await;
        assert_eq!(first.slots().len(), 5);
        assert!(first.time_until_refresh() <= schedule.interval);

        tokio::time::sleep(Duration::from_secs(1800)).await;
        assert_eq!(store.snapshot().await.unwrap().version, 1);

        tokio::time::sleep(Duration::from_secs(1801)).await;
        let second = wait_for_version(&store, 2).await;
        assert_eq!(second.slots().len(), 5);
        assert!(!Arc::ptr_eq(&first, &second));
        // Readers of the old snapshot still see all five of its slots.
        assert_eq!(first.slots().len(), 5);

        refresher.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_refresher_retries_sooner_after_failure() {
        let store = Arc::new(StoreState::new());
        let generator = Arc::new(CatalogueGenerator::new(Arc::new(sample_item_data())));
        let mock = Arc::new(MockEconomy::new());
        mock.fail_attributes(500);
        let api: Arc<dyn EconomyApi> = Arc::clone(&mock) as Arc<dyn EconomyApi>;
        let schedule = RefreshSchedule {
            interval: Duration::from_secs(3600),
            retry: Duration::from_secs(30),
        };

        let refresher = StoreRefresher::spawn(Arc::clone(&store), generator, api, schedule);
        tokio::time::sleep(Duration::from_secs(1)).await;
        assert!(matches!(store.snapshot().await, Err(Error::StoreNotReady)));

        mock.clear_failures();
        tokio::time::sleep(Duration::from_secs(31)).await;
        let catalogue = wait_for_version(&store, 1).await;
        assert_eq!(catalogue.version, 1);
        assert!(catalogue.time_until_refresh() > Duration::from_secs(3000));

        refresher.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_refresh_moves_countdown_to_retry() {
        let store = Arc::new(StoreState::new());
        let generator = Arc::new(CatalogueGenerator::new(Arc::new(sample_item_data())));
        let mock = Arc::new(MockEconomy::new());
        let api: Arc<dyn EconomyApi> = Arc::clone(&mock) as Arc<dyn EconomyApi>;
        let schedule = RefreshSchedule {
            interval: Duration::from_secs(60),
            retry: Duration::from_secs(30),
        };

        let refresher = StoreRefresher::spawn(Arc::clone(&store), generator, api, schedule);
        let first = wait_for_version(&store, 1).await;

        mock.fail_attributes(500);
        tokio::time::sleep(Duration::from_secs(61)).await;

        let current = store.snapshot().await.unwrap();
        assert!(Arc::ptr_eq(&current, &first));
        let remaining = current.time_until_refresh();
        assert!(remaining > Duration::ZERO);
        assert!(remaining <= schedule.retry);

        refresher.shutdown().await;
    }
}
