//! Error types for the cache handle
//!
//! Provides unified error handling using thiserror.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

use crate::models::ErrorResponse;

// == Cache Error Enum ==
/// Unified error type for the cache handle and its HTTP surface.
///
/// Only programming and configuration mistakes travel through this type.
/// Absent keys and rejected transforms are reported as
/// [`UpdateOutcome`](crate::cache::UpdateOutcome) values instead.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CacheError {
    /// Expiration settings that can never be honoured
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Invalid request data (empty key, empty region, bad input)
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Key not found in cache
    #[error("Key not found: {0}")]
    NotFound(String),

    /// Update could not be applied (non-numeric value)
    #[error("Update rejected: {0}")]
    UpdateRejected(String),

    /// Concurrent writers won every attempt
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Internal server error
    #[error("Internal error: {0}")]
    Internal(String),
}

// == IntoResponse Implementation ==
impl IntoResponse for CacheError {
    fn into_response(self) -> Response {
        let status = match &self {
            CacheError::Configuration(_) => StatusCode::BAD_REQUEST,
            CacheError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            CacheError::NotFound(_) => StatusCode::NOT_FOUND,
            CacheError::UpdateRejected(_) => StatusCode::UNPROCESSABLE_ENTITY,
            CacheError::Conflict(_) => StatusCode::CONFLICT,
            CacheError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = Json(ErrorResponse::new(self.to_string()));

        (status, body).into_response()
    }
}

// == Result Type Alias ==
/// Convenience Result type for the cache handle.
pub type Result<T> = std::result::Result<T, CacheError>;
