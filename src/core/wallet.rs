//! Per-user payment lock.
//!
//! Balance checks run against a snapshot fetched from the economy service, so
//! two payments by the same user must not overlap: both would pass the check
//! and both debits would go through. Store purchases and trade acceptances
//! take the payer's lock before reading the balance and hold it until the
//! debit is settled or compensated.

use crate::errors::{Error, Result};
use std::{
    collections::HashSet,
    sync::{Mutex, PoisonError},
};

/// Users with a payment currently in flight.
#[derive(Debug, Default)]
pub struct Wallets {
    paying: Mutex<HashSet<u64>>,
}

impl Wallets {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Locks `user_id` for one payment until the returned guard is dropped.
    pub fn begin(&self, user_id: u64) -> Result<PaymentGuard<'_>> {
        let mut paying = self.paying.lock().unwrap_or_else(PoisonError::into_inner);
        if !paying.insert(user_id) {
            return Err(Error::PaymentInProgress { user_id });
        }
        Ok(PaymentGuard {
            wallets: self,
            user_id,
        })
    }

    #[must_use]
    pub fn is_paying(&self, user_id: u64) -> bool {
        self.paying
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(&user_id)
    }
}

/// Releases the user's payment lock on drop.
#[derive(Debug)]
pub struct PaymentGuard<'a> {
    wallets: &'a Wallets,
    user_id: u64,
}

impl Drop for PaymentGuard<'_> {
    fn drop(&mut self) {
        self.wallets
            .paying
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&self.user_id);
    }
}
