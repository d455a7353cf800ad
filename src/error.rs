//! Error types for the service
//!
//! Provides unified error handling using thiserror. Every variant renders
//! as a JSON body with a machine-readable `error` kind and a `message`.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use tracing::error;

use crate::catalog::CatalogError;
use crate::store::StoreError;

// == App Error Enum ==
/// Unified error type for the request pipeline.
#[derive(Error, Debug)]
pub enum AppError {
    /// Caller exceeded the fixed-window allowance for an endpoint
    #[error("Too many requests. Please try again after {reset_secs} seconds")]
    RateLimitExceeded {
        limit: u64,
        current: u64,
        reset_secs: u64,
    },

    /// Requested resource does not exist
    #[error("{0}")]
    NotFound(String),

    /// Shared store was unreachable or rejected a command
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Data source failed for a reason other than not-found
    #[error("Upstream fetch failed: {0}")]
    Upstream(String),

    /// A cached value could not be read back as JSON
    #[error("Cached snapshot for `{key}` is unreadable: {source}")]
    CorruptSnapshot {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    /// Internal server error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Machine-readable error kind used in response bodies.
    pub fn kind(&self) -> &'static str {
        match self {
            AppError::RateLimitExceeded { .. } => "rate_limit_exceeded",
            AppError::NotFound(_) => "not_found",
            AppError::Store(_) => "store_error",
            AppError::Upstream(_) => "upstream_error",
            AppError::CorruptSnapshot { .. } => "corrupt_snapshot",
            AppError::Internal(_) => "internal_error",
        }
    }

    /// HTTP status for this error.
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::RateLimitExceeded { .. } => StatusCode::TOO_MANY_REQUESTS,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Store(_)
            | AppError::Upstream(_)
            | AppError::CorruptSnapshot { .. }
            | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<CatalogError> for AppError {
    fn from(err: CatalogError) -> Self {
        match err {
            CatalogError::NotFound(_) => AppError::NotFound(err.to_string()),
            CatalogError::Unavailable(_) => AppError::Upstream(err.to_string()),
        }
    }
}

// == IntoResponse Implementation ==
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = self.to_string();

        if status.is_server_error() {
            match &self {
                AppError::Store(err) => error!(
                    operation = err.operation,
                    key = %err.key,
                    "Store error: {}",
                    err.message
                ),
                other => error!(kind = other.kind(), "{}", message),
            }
        }

        let body = match &self {
            AppError::RateLimitExceeded {
                limit,
                current,
                reset_secs,
            } => json!({
                "error": self.kind(),
                "status": status.as_u16(),
                "message": message,
                "details": {
                    "limit": limit,
                    "current": current,
                    "reset_seconds": reset_secs,
                }
            }),
            _ => json!({
                "error": self.kind(),
                "message": message,
            }),
        };

        (status, Json(body)).into_response()
    }
}

// == Result Type Alias ==
/// Convenience Result type for the request pipeline.
pub type Result<T> = std::result::Result<T, AppError>;
