//! API error taxonomy and HTTP mappings.
//!
//! Every failure kind carries a stable `type` tag and maps to one status
//! code. Content-shape and validation faults resolve at the router/decoder
//! boundary; bridge faults surface as `api_error`; nothing propagates as a
//! raw fault.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

use lmbridge_core::services::BridgeError;
use lmbridge_media::DecodeError;

use crate::api::ErrorResponse;

/// Failures surfaced to API clients.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Malformed body, missing fields, or content over its limits.
    #[error("{0}")]
    InvalidRequest(String),

    /// The request named a model other than the configured one.
    #[error("model '{0}' not found")]
    UnknownModel(String),

    /// A completion is already in flight.
    #[error("server is busy processing another request")]
    Busy,

    /// No inference runtime attached yet.
    #[error("model is not initialized")]
    ModelNotInitialized,

    /// Unmatched route.
    #[error("Endpoint not found: {0}")]
    NotFound(String),

    /// Uncaught internal fault, inference error, or inference timeout.
    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    /// HTTP status for this error.
    #[must_use]
    pub fn status(&self) -> StatusCode {
        match self {
            Self::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            Self::UnknownModel(_) | Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Busy | Self::ModelNotInitialized => StatusCode::SERVICE_UNAVAILABLE,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Stable `type` tag for this error.
    ///
    /// A model mismatch answers 404 but keeps the `invalid_request` tag:
    /// the route existed, the request named the wrong model.
    #[must_use]
    pub fn error_type(&self) -> &'static str {
        match self {
            Self::InvalidRequest(_) | Self::UnknownModel(_) => "invalid_request",
            Self::Busy => "server_busy",
            Self::ModelNotInitialized => "model_not_initialized",
            Self::NotFound(_) => "not_found",
            Self::Internal(_) => "api_error",
        }
    }

    /// Whether this is a server-side fault (logged at error severity).
    #[must_use]
    pub fn is_server_fault(&self) -> bool {
        matches!(self, Self::Internal(_))
    }
}

impl From<DecodeError> for ApiError {
    fn from(err: DecodeError) -> Self {
        Self::InvalidRequest(err.to_string())
    }
}

impl From<BridgeError> for ApiError {
    fn from(err: BridgeError) -> Self {
        Self::Internal(err.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = ErrorResponse::new(self.to_string(), self.error_type(), status.as_u16());
        (status, Json(body)).into_response()
    }
}
