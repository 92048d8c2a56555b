//! Core business logic module
//!
//! This module contains the charge protocol components:
//! - `traits` - Store and optimistic transaction abstractions
//! - `engine` - A single check-then-debit attempt
//! - `retry` - Deadline-bounded exponential backoff around the engine
//! - `service` - Charge and reset operations used by the HTTP boundary

pub mod engine;
pub mod retry;
pub mod service;
pub mod traits;

pub use engine::ChargeEngine;
pub use retry::{RetryConfig, RetryPolicy};
pub use service::AccountService;
pub use traits::{AccountStore, OptimisticTransaction, WatchSet, WriteSet};
