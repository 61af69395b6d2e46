//! Error types for the gateway cache
//!
//! A plain cache miss is never an error; lookups return `Option`.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

// == Cache Error Enum ==
/// Unified error type for the cache and its HTTP surface.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CacheError {
    /// Operation attempted after `close()`
    #[error("Cache is closed")]
    Closed,

    /// Malformed app key, app id, timestamp or path segment
    #[error("Invalid key: {0}")]
    InvalidKey(String),

    /// Rejected TTL or eviction bound
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// The gateway transport failed to produce a decision
    #[error("Transport error: {0}")]
    Transport(String),

    /// Lookup missed; only raised at the HTTP boundary
    #[error("Not found: {0}")]
    NotFound(String),
}

// == IntoResponse Implementation ==
impl IntoResponse for CacheError {
    fn into_response(self) -> Response {
        let status = match &self {
            CacheError::NotFound(_) => StatusCode::NOT_FOUND,
            CacheError::InvalidKey(_) | CacheError::InvalidConfig(_) => StatusCode::BAD_REQUEST,
            CacheError::Closed => StatusCode::SERVICE_UNAVAILABLE,
            CacheError::Transport(_) => StatusCode::BAD_GATEWAY,
        };

        let body = Json(json!({
            "error": self.to_string()
        }));

        (status, body).into_response()
    }
}

// == Result Type Alias ==
/// Convenience Result type for the cache.
pub type Result<T> = std::result::Result<T, CacheError>;
