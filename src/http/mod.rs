//! HTTP boundary
//!
//! ```text
//! POST /reset   {account?}           -> 204 | 400 | 500 {error}
//! POST /charge  {account?, charges?} -> 200 ChargeResult | 400 | 500 {error}
//! ```
//!
//! Declines are successful responses (`200` with `authorized: false`).
//! Contention exhaustion is a server error, never a decline.

pub mod handlers;
pub mod response;

use std::sync::Arc;

use axum::routing::post;
use axum::Router;

use crate::core::{AccountService, AccountStore};

pub use handlers::{ChargeBody, ResetBody, DEFAULT_CHARGE};
pub use response::ErrorBody;

/// Build the application router over `service`
pub fn build_app<S: AccountStore + 'static>(service: Arc<AccountService<S>>) -> Router {
    Router::new()
        .route("/reset", post(handlers::reset::<S>))
        .route("/charge", post(handlers::charge::<S>))
        .with_state(service)
}
