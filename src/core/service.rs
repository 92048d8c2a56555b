//! Account operations exposed to the HTTP boundary
//!
//! `AccountService` bundles the store, the retry policy and the charge
//! deadline. Charges go through the retry policy; resets are a plain
//! unconditional write, since overwriting a balance has no read to validate.

use std::sync::Arc;
use std::time::Duration;

use tracing::info;

use super::engine::ChargeEngine;
use super::retry::{RetryConfig, RetryPolicy};
use super::traits::AccountStore;
use crate::types::{AccountId, ChargeError, ChargeRequest, ChargeResult, DEFAULT_BALANCE};

/// Charge and reset operations over a shared store
pub struct AccountService<S> {
    store: Arc<S>,
    policy: RetryPolicy<S>,
}

impl<S: AccountStore> AccountService<S> {
    pub fn new(store: Arc<S>, retry: RetryConfig) -> Self {
        let policy = RetryPolicy::new(ChargeEngine::new(Arc::clone(&store)), retry);
        Self { store, policy }
    }

    /// Deadline applied to every charge
    pub fn charge_deadline(&self) -> Duration {
        self.policy.config().deadline
    }

    /// Debit the requested amount, retrying conflicts until the deadline
    pub async fn charge(&self, request: &ChargeRequest) -> Result<ChargeResult, ChargeError> {
        let result = self
            .policy
            .charge_safe(&request.account, request.amount, self.charge_deadline())
            .await?;

        info!(
            account = %request.account,
            authorized = result.authorized,
            charged = result.charged,
            remaining = result.remaining_balance,
            "Successfully charged account"
        );
        Ok(result)
    }

    /// Overwrite the balance with [`DEFAULT_BALANCE`]
    pub async fn reset(&self, account: &AccountId) -> Result<(), ChargeError> {
        self.store
            .set(&account.balance_key(), DEFAULT_BALANCE)
            .await?;
        info!(%account, balance = DEFAULT_BALANCE, "Successfully reset account");
        Ok(())
    }

    /// Current balance, `None` if the account was never reset
    pub async fn balance(&self, account: &AccountId) -> Result<Option<u64>, ChargeError> {
        self.store.get(&account.balance_key()).await
    }
}
