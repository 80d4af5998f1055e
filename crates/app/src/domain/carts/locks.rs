//! Per-cart write locks.

use std::sync::{Arc, Mutex, PoisonError};

use rustc_hash::FxHashMap;
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

use crate::domain::carts::records::CartUuid;

/// Entries beyond this count trigger a sweep of locks nobody is holding.
const SWEEP_THRESHOLD: usize = 1_024;

/// Held for the duration of a cart mutation or checkout.
pub type CartGuard = OwnedMutexGuard<()>;

/// Lazily creates one async mutex per cart so every writer to a cart is
/// serialized while writers to different carts run concurrently.
///
/// Clones share the same registry.
#[derive(Debug, Clone, Default)]
pub struct CartLocks {
    locks: Arc<Mutex<FxHashMap<CartUuid, Arc<AsyncMutex<()>>>>>,
}

impl CartLocks {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for exclusive access to `cart`.
    pub async fn lock(&self, cart: CartUuid) -> CartGuard {
        self.entry(cart).lock_owned().await
    }

    /// Take exclusive access to `cart` only if nobody else holds it.
    #[cfg(test)]
    fn try_lock(&self, cart: CartUuid) -> Option<CartGuard> {
        self.entry(cart).try_lock_owned().ok()
    }

    fn entry(&self, cart: CartUuid) -> Arc<AsyncMutex<()>> {
        // The map only holds `Arc`s, so a poisoned guard still has consistent data.
        let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);

        if locks.len() > SWEEP_THRESHOLD {
            locks.retain(|_, lock| Arc::strong_count(lock) > 1);
        }

        Arc::clone(locks.entry(cart).or_default())
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.locks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}
