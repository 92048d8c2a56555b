//! HTTP rendering of charge errors

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::types::ChargeError;

/// JSON body returned with every error response
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

impl ChargeError {
    /// Returns the HTTP status code for this error.
    ///
    /// - Invalid request: 400 Bad Request
    /// - Everything else: 500 Internal Server Error, including contention
    ///   exhaustion, whose outcome is unknown rather than declined
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidRequest { .. } => StatusCode::BAD_REQUEST,
            Self::Connection { .. }
            | Self::Conflict { .. }
            | Self::ContentionExhausted { .. }
            | Self::CorruptBalance { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ChargeError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: self.to_string(),
        };
        (self.status_code(), Json(body)).into_response()
    }
}
