//! Request handlers for `/reset` and `/charge`
//!
//! Both endpoints accept an optional JSON body. A missing or blank body means
//! "all defaults", so a bare `POST /charge` charges 10 units from `account`.

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::error;

use crate::core::{AccountService, AccountStore};
use crate::types::{AccountId, ChargeError, ChargeRequest, ChargeResult};

/// Amount charged when a request does not specify one
pub const DEFAULT_CHARGE: u64 = 10;

/// Body of `POST /reset`
#[derive(Debug, Default, Deserialize)]
pub struct ResetBody {
    #[serde(default)]
    pub account: Option<String>,
}

/// Body of `POST /charge`
#[derive(Debug, Default, Deserialize)]
pub struct ChargeBody {
    #[serde(default)]
    pub account: Option<String>,
    #[serde(default)]
    pub charges: Option<u64>,
}

impl ChargeBody {
    fn into_request(self) -> Result<ChargeRequest, ChargeError> {
        Ok(ChargeRequest::new(
            account_or_default(self.account)?,
            self.charges.unwrap_or(DEFAULT_CHARGE),
        ))
    }
}

fn account_or_default(account: Option<String>) -> Result<AccountId, ChargeError> {
    account
        .map(AccountId::new)
        .transpose()
        .map(Option::unwrap_or_default)
}

fn parse_body<T: DeserializeOwned + Default>(body: &[u8]) -> Result<T, ChargeError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(T::default());
    }
    serde_json::from_slice(body)
        .map_err(|e| ChargeError::invalid_request(format!("malformed JSON body: {}", e)))
}

async fn reset_account<S: AccountStore>(
    service: &AccountService<S>,
    body: &[u8],
) -> Result<(), ChargeError> {
    let account = account_or_default(parse_body::<ResetBody>(body)?.account)?;
    service.reset(&account).await
}

async fn charge_account<S: AccountStore>(
    service: &AccountService<S>,
    body: &[u8],
) -> Result<ChargeResult, ChargeError> {
    let request = parse_body::<ChargeBody>(body)?.into_request()?;
    service.charge(&request).await
}

/// `POST /reset` - 204 on success
pub async fn reset<S: AccountStore + 'static>(
    State(service): State<Arc<AccountService<S>>>,
    body: Bytes,
) -> Response {
    match reset_account(&service, &body).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => {
            error!(error = %e, "Error while resetting account");
            e.into_response()
        }
    }
}

/// `POST /charge` - 200 with the charge result, declines included
pub async fn charge<S: AccountStore + 'static>(
    State(service): State<Arc<AccountService<S>>>,
    body: Bytes,
) -> Response {
    match charge_account(&service, &body).await {
        Ok(result) => (StatusCode::OK, Json(result)).into_response(),
        Err(e) => {
            error!(error = %e, "Error while charging account");
            e.into_response()
        }
    }
}
