//! Store wrapper that simulates a competing writer
//!
//! Before a commit, `ContendedStore` rewrites every watched key with its
//! current value, which trips the watch exactly as a concurrent client would.
//! It does this for the first `n` commits, or for every commit when built with
//! [`ContendedStore::forever`].

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use async_trait::async_trait;

use crate::core::traits::{AccountStore, OptimisticTransaction, WatchSet, WriteSet};
use crate::store::{MemoryStore, MemoryTransaction};
use crate::types::ChargeError;

const FOREVER: u32 = u32::MAX;

#[derive(Debug, Clone)]
pub(crate) struct ContendedStore {
    inner: MemoryStore,
    interference: Arc<AtomicU32>,
    commits: Arc<AtomicU32>,
}

impl ContendedStore {
    /// Interfere with the first `conflicts` commits
    pub(crate) fn new(inner: MemoryStore, conflicts: u32) -> Self {
        Self {
            inner,
            interference: Arc::new(AtomicU32::new(conflicts)),
            commits: Arc::new(AtomicU32::new(0)),
        }
    }

    /// Interfere with every commit
    pub(crate) fn forever(inner: MemoryStore) -> Self {
        Self::new(inner, FOREVER)
    }

    /// Number of commits attempted so far
    pub(crate) fn commits(&self) -> u32 {
        self.commits.load(Ordering::SeqCst)
    }

    fn take_interference(&self) -> bool {
        self.interference
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |left| match left {
                0 => None,
                FOREVER => Some(FOREVER),
                n => Some(n - 1),
            })
            .is_ok()
    }
}

#[async_trait]
impl AccountStore for ContendedStore {
    type Transaction = ContendedTransaction;

    async fn get(&self, key: &str) -> Result<Option<u64>, ChargeError> {
        self.inner.get(key).await
    }

    async fn set(&self, key: &str, value: u64) -> Result<(), ChargeError> {
        self.inner.set(key, value).await
    }

    async fn begin(&self, watched: WatchSet) -> Result<ContendedTransaction, ChargeError> {
        Ok(ContendedTransaction {
            inner: self.inner.begin(watched.clone()).await?,
            store: self.clone(),
            watched,
        })
    }
}

#[derive(Debug)]
pub(crate) struct ContendedTransaction {
    inner: MemoryTransaction,
    store: ContendedStore,
    watched: WatchSet,
}

#[async_trait]
impl OptimisticTransaction for ContendedTransaction {
    async fn get(&mut self, key: &str) -> Result<Option<u64>, ChargeError> {
        self.inner.get(key).await
    }

    async fn commit(self, writes: WriteSet) -> Result<(), ChargeError> {
        self.store.commits.fetch_add(1, Ordering::SeqCst);

        if self.store.take_interference() {
            for key in self.watched.keys() {
                let current = self.store.inner.get(key).await?.unwrap_or(0);
                self.store.inner.set(key, current).await?;
            }
        }

        self.inner.commit(writes).await
    }

    async fn release(self) -> Result<(), ChargeError> {
        self.inner.release().await
    }
}
