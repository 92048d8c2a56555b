//! Charge request and result types

use serde::{Deserialize, Serialize};

use super::account::AccountId;

/// A request to debit `amount` units from `account`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChargeRequest {
    /// The account to debit
    pub account: AccountId,

    /// Requested debit in integer units
    pub amount: u64,
}

impl ChargeRequest {
    pub fn new(account: AccountId, amount: u64) -> Self {
        ChargeRequest { account, amount }
    }
}

/// Outcome of a charge that reached a consistent decision
///
/// Both authorized charges and declines are represented here. A decline is a
/// normal business outcome, not an error.
///
/// # Invariants
///
/// - authorized: `charged` equals the requested amount and
///   `remaining_balance` equals the prior balance minus `charged`
/// - declined: `charged` is zero and `remaining_balance` is the balance
///   observed when the decline was decided
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChargeResult {
    /// Whether the debit was committed
    pub authorized: bool,

    /// Balance left after the charge (or observed at decline time)
    pub remaining_balance: u64,

    /// Amount actually debited
    pub charged: u64,
}

impl ChargeResult {
    /// Result of a committed debit
    pub fn authorized(charged: u64, remaining_balance: u64) -> Self {
        ChargeResult {
            authorized: true,
            remaining_balance,
            charged,
        }
    }

    /// Result of a charge refused for insufficient funds
    pub fn declined(observed_balance: u64) -> Self {
        ChargeResult {
            authorized: false,
            remaining_balance: observed_balance,
            charged: 0,
        }
    }
}
