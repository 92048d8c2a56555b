//! Single-attempt charge protocol
//!
//! This module provides the `ChargeEngine` struct, which performs one
//! check-then-debit attempt against an [`AccountStore`] using an optimistic
//! transaction. It never retries; conflicts are reported to the caller.
//!
//! # Protocol
//!
//! ```text
//! begin(watch balance key) ─► read balance b
//!     ├── b <  amount ─► release ─► Declined(b)
//!     └── b >= amount ─► commit(b - amount)
//!             ├── ok       ─► Authorized(amount, b - amount)
//!             └── conflict ─► Err(Conflict)
//! ```
//!
//! A successful attempt makes exactly one durable mutation; declines and
//! conflicts make none.

use std::sync::Arc;

use tracing::debug;

use super::traits::{AccountStore, OptimisticTransaction, WatchSet, WriteSet};
use crate::types::{AccountId, ChargeError, ChargeResult};

/// Performs single charge attempts against a shared store
///
/// The engine is cheap to clone and can be shared across tasks; each attempt
/// opens its own transaction.
pub struct ChargeEngine<S> {
    store: Arc<S>,
}

impl<S> Clone for ChargeEngine<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
        }
    }
}

impl<S: AccountStore> ChargeEngine<S> {
    /// Create a new ChargeEngine over `store`
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// Attempt to debit `amount` from `account` once
    ///
    /// A missing balance is treated as zero.
    ///
    /// # Returns
    ///
    /// * `Ok(ChargeResult)` - authorized, or declined for insufficient funds
    /// * `Err(ChargeError::Conflict)` - the balance changed concurrently; nothing was written
    /// * `Err(ChargeError::Connection)` - the store failed
    /// * `Err(ChargeError::CorruptBalance)` - the stored balance is not a valid amount
    pub async fn attempt_charge(
        &self,
        account: &AccountId,
        amount: u64,
    ) -> Result<ChargeResult, ChargeError> {
        let key = account.balance_key();
        let mut tx = self.store.begin(WatchSet::single(key.as_str())).await?;

        let balance = tx.get(&key).await?.unwrap_or(0);

        if balance < amount {
            tx.release().await?;
            debug!(%account, balance, amount, "Declined charge for insufficient funds");
            return Ok(ChargeResult::declined(balance));
        }

        let remaining = balance - amount;
        tx.commit(WriteSet::single(key, remaining)).await?;
        debug!(%account, amount, remaining, "Committed charge");

        Ok(ChargeResult::authorized(amount, remaining))
    }
}
