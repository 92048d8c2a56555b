//! Balance Guard Library
//! # Overview
//!
//! This library debits per-account balances held in a shared key-value store
//! without ever letting a balance go negative, even under concurrent charges.
//! Conflicting debits are serialized by the store's optimistic transactions
//! (watch + conditional commit) rather than by any lock.
//!
//! # Architecture
//!
//! The system is organized into several key components:
//!
//! - [`types`] - Core data types (AccountId, ChargeResult, ChargeError)
//! - [`core`] - Charge protocol:
//!   - [`core::traits`] - Store and optimistic transaction abstractions
//!   - [`core::engine`] - A single check-then-debit attempt
//!   - [`core::retry`] - Deadline-bounded exponential backoff on conflicts
//!   - [`core::service`] - Charge and reset operations
//! - [`store`] - Redis and in-memory store backends
//! - [`http`] - `POST /reset` and `POST /charge`
//! - [`cli`] - CLI arguments parsing
//!
//! # Charge Outcomes
//!
//! - **Authorized**: the debit was committed
//! - **Declined**: the balance was insufficient at a consistent read; nothing changed
//! - **Contention exhausted**: the deadline passed while attempts kept
//!   conflicting; reported as an error because the outcome is unknown

// Module declarations
pub mod cli;
pub mod core;
pub mod http;
pub mod store;
pub mod types;

pub use crate::core::{AccountService, AccountStore, ChargeEngine, RetryConfig, RetryPolicy};
pub use http::build_app;
pub use store::{MemoryStore, RedisStore};
pub use types::{AccountId, ChargeError, ChargeRequest, ChargeResult, DEFAULT_BALANCE};
