//! In-process account store with optimistic transactions
//!
//! `MemoryStore` keeps balances in a `DashMap` next to a per-key version
//! counter. Watching a key records its version; a commit succeeds only if
//! every watched version is unchanged. Every write bumps the version, even
//! one that stores the same value, which matches the way a Redis `WATCH` is
//! tripped by any write to the key.
//!
//! # Thread Safety
//!
//! Reads go straight to the `DashMap`. Writes (both `set` and `commit`) pass
//! through a short commit gate so that version validation and the writes it
//! guards happen as one step, the same way a single-threaded store executes
//! `EXEC`. The gate is never held across an `.await`.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use dashmap::DashMap;

use crate::core::traits::{AccountStore, OptimisticTransaction, WatchSet, WriteSet};
use crate::types::ChargeError;

/// Stored value plus the number of writes it has seen
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Slot {
    value: u64,
    version: u64,
}

#[derive(Debug, Default)]
struct Shared {
    slots: DashMap<String, Slot>,
    commit_gate: Mutex<()>,
}

impl Shared {
    fn lock_gate(&self) -> MutexGuard<'_, ()> {
        // The gate guards no data, so a poisoned lock is still usable
        self.commit_gate
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Version of `key`, zero if it has never been written
    fn version(&self, key: &str) -> u64 {
        self.slots.get(key).map(|slot| slot.version).unwrap_or(0)
    }

    fn value(&self, key: &str) -> Option<u64> {
        self.slots.get(key).map(|slot| slot.value)
    }

    /// Write a value and bump its version; callers must hold the gate
    fn write(&self, key: &str, value: u64) {
        self.slots
            .entry(key.to_string())
            .and_modify(|slot| {
                slot.value = value;
                slot.version += 1;
            })
            .or_insert(Slot { value, version: 1 });
    }
}

/// Thread-safe in-memory account store
///
/// Cloning is cheap and every clone shares the same data, the way several
/// clients share one external store.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    shared: Arc<Shared>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl AccountStore for MemoryStore {
    type Transaction = MemoryTransaction;

    async fn get(&self, key: &str) -> Result<Option<u64>, ChargeError> {
        Ok(self.shared.value(key))
    }

    async fn set(&self, key: &str, value: u64) -> Result<(), ChargeError> {
        let _gate = self.shared.lock_gate();
        self.shared.write(key, value);
        Ok(())
    }

    async fn begin(&self, watched: WatchSet) -> Result<MemoryTransaction, ChargeError> {
        let observed = watched
            .keys()
            .map(|key| (key.to_string(), self.shared.version(key)))
            .collect();

        Ok(MemoryTransaction {
            shared: Arc::clone(&self.shared),
            watched,
            observed,
        })
    }
}

/// Optimistic transaction over a [`MemoryStore`]
#[derive(Debug)]
pub struct MemoryTransaction {
    shared: Arc<Shared>,
    watched: WatchSet,
    /// Version of each watched key when the watch began
    observed: Vec<(String, u64)>,
}

#[async_trait]
impl OptimisticTransaction for MemoryTransaction {
    async fn get(&mut self, key: &str) -> Result<Option<u64>, ChargeError> {
        Ok(self.shared.value(key))
    }

    async fn commit(self, writes: WriteSet) -> Result<(), ChargeError> {
        let _gate = self.shared.lock_gate();

        let modified = self
            .observed
            .iter()
            .any(|(key, version)| self.shared.version(key) != *version);
        if modified {
            return Err(ChargeError::conflict(self.watched.describe()));
        }

        for (key, value) in writes.iter() {
            self.shared.write(key, value);
        }
        Ok(())
    }

    async fn release(self) -> Result<(), ChargeError> {
        Ok(())
    }
}
