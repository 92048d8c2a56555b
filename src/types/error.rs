//! Error types for the charge protocol
//!
//! This module defines every error a charge or reset can produce. Declines
//! for insufficient funds are deliberately absent: they are ordinary
//! [`ChargeResult`](super::ChargeResult) values, not errors.
//!
//! # Error Categories
//!
//! - **Transport Errors**: store unreachable, pool exhausted, protocol failures
//! - **Concurrency Errors**: optimistic lock conflicts and contention exhaustion
//! - **Data Errors**: stored balances that are not non-negative integers
//! - **Request Errors**: malformed input at the HTTP boundary

use std::time::Duration;

use deadpool_redis::redis::RedisError;
use deadpool_redis::PoolError;
use thiserror::Error;

/// Main error type for charges and resets
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ChargeError {
    /// The store could not be reached or the request failed at the transport level
    ///
    /// Never retried. Reported to callers as a server error.
    #[error("Store connection error: {message}")]
    Connection {
        /// Description of the transport failure
        message: String,
    },

    /// A watched key was modified between watch and commit
    ///
    /// The attempt made no durable change. The retry policy absorbs this
    /// error; callers only ever see it from a single attempt.
    #[error("Concurrent modification of {key}")]
    Conflict {
        /// The watched key(s)
        key: String,
    },

    /// The retry deadline passed while attempts kept conflicting
    ///
    /// The true balance is unknown, so this is never reported as a decline.
    #[error("Gave up charging account {account} after {attempts} conflicting attempts in {elapsed_ms}ms")]
    ContentionExhausted {
        /// Account being charged
        account: String,
        /// Number of attempts issued, all of which conflicted
        attempts: u32,
        /// Wall-clock time spent before giving up
        elapsed_ms: u64,
    },

    /// The stored balance is not a non-negative integer
    #[error("Corrupt balance '{value}' stored under {key}")]
    CorruptBalance {
        /// Store key holding the value
        key: String,
        /// The raw stored value
        value: String,
    },

    /// The request could not be understood
    #[error("Invalid request: {message}")]
    InvalidRequest {
        /// What was wrong with the request
        message: String,
    },
}

impl From<RedisError> for ChargeError {
    fn from(error: RedisError) -> Self {
        ChargeError::Connection {
            message: error.to_string(),
        }
    }
}

impl From<PoolError> for ChargeError {
    fn from(error: PoolError) -> Self {
        ChargeError::Connection {
            message: error.to_string(),
        }
    }
}

// Helper functions for creating common errors

impl ChargeError {
    /// Create a Connection error
    pub fn connection(message: impl Into<String>) -> Self {
        ChargeError::Connection {
            message: message.into(),
        }
    }

    /// Create a Conflict error
    pub fn conflict(key: impl Into<String>) -> Self {
        ChargeError::Conflict { key: key.into() }
    }

    /// Create a ContentionExhausted error
    pub fn contention_exhausted(account: &str, attempts: u32, elapsed: Duration) -> Self {
        ChargeError::ContentionExhausted {
            account: account.to_string(),
            attempts,
            elapsed_ms: u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX),
        }
    }

    /// Create a CorruptBalance error
    pub fn corrupt_balance(key: &str, value: &str) -> Self {
        ChargeError::CorruptBalance {
            key: key.to_string(),
            value: value.to_string(),
        }
    }

    /// Create an InvalidRequest error
    pub fn invalid_request(message: impl Into<String>) -> Self {
        ChargeError::InvalidRequest {
            message: message.into(),
        }
    }

    /// Whether another attempt may succeed where this one failed
    pub fn is_conflict(&self) -> bool {
        matches!(self, ChargeError::Conflict { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use deadpool_redis::redis::ErrorKind;
    use rstest::rstest;

    #[rstest]
    #[case::connection(
        ChargeError::Connection { message: "Connection refused".to_string() },
        "Store connection error: Connection refused"
    )]
    #[case::conflict(
        ChargeError::Conflict { key: "account/balance".to_string() },
        "Concurrent modification of account/balance"
    )]
    #[case::contention_exhausted(
        ChargeError::ContentionExhausted { account: "account".to_string(), attempts: 9, elapsed_ms: 2004 },
        "Gave up charging account account after 9 conflicting attempts in 2004ms"
    )]
    #[case::corrupt_balance(
        ChargeError::CorruptBalance { key: "account/balance".to_string(), value: "abc".to_string() },
        "Corrupt balance 'abc' stored under account/balance"
    )]
    #[case::invalid_request(
        ChargeError::InvalidRequest { message: "bad json".to_string() },
        "Invalid request: bad json"
    )]
    fn test_error_display(#[case] error: ChargeError, #[case] expected: &str) {
        assert_eq!(error.to_string(), expected);
    }

    #[rstest]
    #[case::connection(
        ChargeError::connection("down"),
        ChargeError::Connection { message: "down".to_string() }
    )]
    #[case::conflict(
        ChargeError::conflict("a/balance"),
        ChargeError::Conflict { key: "a/balance".to_string() }
    )]
    #[case::contention_exhausted(
        ChargeError::contention_exhausted("a", 3, Duration::from_millis(2100)),
        ChargeError::ContentionExhausted { account: "a".to_string(), attempts: 3, elapsed_ms: 2100 }
    )]
    #[case::corrupt_balance(
        ChargeError::corrupt_balance("a/balance", "-4"),
        ChargeError::CorruptBalance { key: "a/balance".to_string(), value: "-4".to_string() }
    )]
    fn test_helper_functions(#[case] result: ChargeError, #[case] expected: ChargeError) {
        assert_eq!(result, expected);
    }

    #[rstest]
    #[case::conflict(ChargeError::conflict("k"), true)]
    #[case::connection(ChargeError::connection("down"), false)]
    #[case::exhausted(ChargeError::contention_exhausted("a", 1, Duration::ZERO), false)]
    #[case::corrupt(ChargeError::corrupt_balance("k", "x"), false)]
    fn test_only_conflicts_are_retryable(#[case] error: ChargeError, #[case] expected: bool) {
        assert_eq!(error.is_conflict(), expected);
    }

    #[test]
    fn test_redis_error_conversion() {
        let redis_error = RedisError::from((ErrorKind::IoError, "connection reset"));
        let error: ChargeError = redis_error.into();
        assert!(matches!(error, ChargeError::Connection { .. }));
        assert!(error.to_string().contains("connection reset"));
    }
}
