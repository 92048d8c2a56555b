//! Account-related types
//!
//! An account has no metadata besides its balance. The balance lives in the
//! external store under a key derived from the account identifier.

use std::fmt;

use super::error::ChargeError;

/// Balance written by a reset
pub const DEFAULT_BALANCE: u64 = 100;

/// Account used when a request does not name one
pub const DEFAULT_ACCOUNT: &str = "account";

/// Opaque account identifier
///
/// Any non-empty string is a valid identifier. The identifier is never
/// interpreted beyond deriving the store key of its balance.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AccountId(String);

impl AccountId {
    /// Create an account identifier
    ///
    /// # Errors
    ///
    /// Returns `ChargeError::InvalidRequest` if the identifier is empty.
    pub fn new(id: impl Into<String>) -> Result<Self, ChargeError> {
        let id = id.into();
        if id.is_empty() {
            return Err(ChargeError::invalid_request("account must not be empty"));
        }
        Ok(AccountId(id))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Store key holding this account's balance (`"<account>/balance"`)
    pub fn balance_key(&self) -> String {
        format!("{}/balance", self.0)
    }
}

impl Default for AccountId {
    fn default() -> Self {
        AccountId(DEFAULT_ACCOUNT.to_string())
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
