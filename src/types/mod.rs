//! Types module
//!
//! Contains core data structures used throughout the application.
//! This module organizes types into logical submodules:
//! - `account`: Account identifiers and balance defaults
//! - `charge`: Charge requests and results
//! - `error`: Error types for the charge protocol

pub mod account;
pub mod charge;
pub mod error;

pub use account::{AccountId, DEFAULT_ACCOUNT, DEFAULT_BALANCE};
pub use charge::{ChargeRequest, ChargeResult};
pub use error::ChargeError;
