//! Core traits for the account store and its optimistic transactions
//!
//! This module defines the store abstraction the charge protocol is written
//! against. The Redis backend and the in-memory backend both implement it, so
//! the engine and retry policy are exercised identically by tests and in
//! production.

use std::collections::{BTreeMap, BTreeSet};

use async_trait::async_trait;

use crate::types::ChargeError;

/// Keys a transaction watches for concurrent modification
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WatchSet {
    keys: BTreeSet<String>,
}

impl WatchSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Watch set containing a single key
    pub fn single(key: impl Into<String>) -> Self {
        Self::new().watch(key)
    }

    /// Add a key to the watch set
    pub fn watch(mut self, key: impl Into<String>) -> Self {
        self.keys.insert(key.into());
        self
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.keys.iter().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Human-readable list of the watched keys, used in conflict errors
    pub fn describe(&self) -> String {
        self.keys().collect::<Vec<_>>().join(", ")
    }
}

/// Writes applied atomically by a successful commit
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WriteSet {
    writes: BTreeMap<String, u64>,
}

impl WriteSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Write set containing a single write
    pub fn single(key: impl Into<String>, value: u64) -> Self {
        let mut writes = Self::new();
        writes.set(key, value);
        writes
    }

    /// Stage a write; a later write to the same key replaces the earlier one
    pub fn set(&mut self, key: impl Into<String>, value: u64) {
        self.writes.insert(key.into(), value);
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, u64)> {
        self.writes.iter().map(|(key, value)| (key.as_str(), *value))
    }

    pub fn len(&self) -> usize {
        self.writes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.writes.is_empty()
    }
}

/// Trait for a networked key-value store holding account balances
///
/// Every method may fail with `ChargeError::Connection`. Values are balances
/// in integer units.
#[async_trait]
pub trait AccountStore: Send + Sync {
    /// Transaction type produced by [`AccountStore::begin`]
    type Transaction: OptimisticTransaction;

    /// Read a value, `None` if the key has never been written
    async fn get(&self, key: &str) -> Result<Option<u64>, ChargeError>;

    /// Unconditionally overwrite a value
    async fn set(&self, key: &str, value: u64) -> Result<(), ChargeError>;

    /// Open an isolated session and start watching `watched`
    ///
    /// Any modification of a watched key by another party between this call
    /// and [`OptimisticTransaction::commit`] makes the commit fail. The
    /// session belongs to the returned transaction alone, so watch state
    /// never leaks between concurrent attempts.
    async fn begin(&self, watched: WatchSet) -> Result<Self::Transaction, ChargeError>;
}

/// An optimistic transaction: a watch set bound to its own session
///
/// A transaction ends with exactly one of `commit` or `release`. Dropping it
/// without either is allowed on error paths; implementations must then make
/// sure no watch state survives into another transaction.
#[async_trait]
pub trait OptimisticTransaction: Send {
    /// Read a value through this transaction's session
    async fn get(&mut self, key: &str) -> Result<Option<u64>, ChargeError>;

    /// Apply `writes` atomically if no watched key changed since the watch began
    ///
    /// # Errors
    ///
    /// - `ChargeError::Conflict` if a watched key was modified; nothing is written
    /// - `ChargeError::Connection` on transport failure
    async fn commit(self, writes: WriteSet) -> Result<(), ChargeError>;

    /// End the transaction without writing anything
    async fn release(self) -> Result<(), ChargeError>;
}
