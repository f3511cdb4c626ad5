//! Error types for the cache-aside accessor
//!
//! Cache-side faults degrade to a miss and are never returned from a fetch.
//! Only authoritative store failures are visible to callers.

use std::time::Duration;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

use crate::models::ErrorResponse;

// == Cache Store Error ==
/// Errors raised by the in-memory TTL store behind [`crate::backend::MemoryBackend`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CacheError {
    /// Key not found in cache
    #[error("Key not found: {0}")]
    NotFound(String),

    /// Key has expired
    #[error("Key expired: {0}")]
    Expired(String),

    /// Invalid key or payload
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Cache is full and eviction failed
    #[error("Cache full: {0}")]
    CacheFull(String),
}

// == Authoritative Store Error ==
/// Failure reported by an [`crate::store::AuthoritativeStore`] implementation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// The queried row does not exist
    #[error("not found: {0}")]
    NotFound(String),

    /// Any other store failure (connection, query, ...)
    #[error("store error: {0}")]
    Backend(String),
}

// == Store Fetch Error ==
/// Sub-kind of a [`StoreFetchError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreFailureKind {
    NotFound,
    Store,
    Timeout,
}

/// The failure of a cache-aside fetch.
///
/// Cloned to every caller that was waiting on the same in-flight fetch, so
/// all of them observe the same outcome.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreFetchError {
    #[error("store fetch for '{key}' failed: not found")]
    NotFound { key: String },

    #[error("store fetch for '{key}' failed: {message}")]
    Store { key: String, message: String },

    #[error("store fetch for '{key}' timed out after {after:?}")]
    Timeout { key: String, after: Duration },
}

impl StoreFetchError {
    /// Wraps a store failure with the key it was fetched for.
    pub fn from_store(key: &str, err: StoreError) -> Self {
        match err {
            StoreError::NotFound(_) => Self::NotFound {
                key: key.to_string(),
            },
            StoreError::Backend(message) => Self::Store {
                key: key.to_string(),
                message,
            },
        }
    }

    pub fn kind(&self) -> StoreFailureKind {
        match self {
            Self::NotFound { .. } => StoreFailureKind::NotFound,
            Self::Store { .. } => StoreFailureKind::Store,
            Self::Timeout { .. } => StoreFailureKind::Timeout,
        }
    }

    /// The cache key whose fetch failed.
    pub fn key(&self) -> &str {
        match self {
            Self::NotFound { key } | Self::Store { key, .. } | Self::Timeout { key, .. } => key,
        }
    }
}

// == Cache Fault ==
/// Cache-side problems. Logged and counted, then treated as a miss.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CacheFault {
    #[error("cache unavailable")]
    Unavailable,

    #[error("cache call timed out after {after:?}")]
    Timeout { after: Duration },

    #[error("cached payload could not be decoded: {0}")]
    Decode(String),

    #[error("cache population failed: {0}")]
    Populate(String),

    #[error("cache backend error: {0}")]
    Backend(String),
}

impl From<CacheError> for CacheFault {
    fn from(err: CacheError) -> Self {
        CacheFault::Backend(err.to_string())
    }
}

// == Codec Error ==
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CodecError {
    #[error("encode failed: {0}")]
    Encode(String),

    #[error("decode failed: {0}")]
    Decode(String),
}

// == API Error ==
/// Errors surfaced by the demo HTTP layer.
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Upstream(String),

    #[error("{0}")]
    Timeout(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

impl From<StoreFetchError> for ApiError {
    fn from(err: StoreFetchError) -> Self {
        match err.kind() {
            StoreFailureKind::NotFound => ApiError::NotFound(err.to_string()),
            StoreFailureKind::Store => ApiError::Upstream(err.to_string()),
            StoreFailureKind::Timeout => ApiError::Timeout(err.to_string()),
        }
    }
}

// == IntoResponse Implementation ==
impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Upstream(_) => StatusCode::BAD_GATEWAY,
            ApiError::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
            ApiError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
        };

        let body = Json(ErrorResponse::new(self.to_string()));

        (status, body).into_response()
    }
}

// == Result Type Aliases ==
/// Result type for in-memory cache store operations.
pub type Result<T> = std::result::Result<T, CacheError>;

/// Result type for the HTTP handlers.
pub type ApiResult<T> = std::result::Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_error_maps_to_fetch_error() {
        let err = StoreFetchError::from_store("hello:1", StoreError::NotFound("row 1".into()));
        assert_eq!(err.kind(), StoreFailureKind::NotFound);
        assert_eq!(err.key(), "hello:1");

        let err = StoreFetchError::from_store("hello:1", StoreError::Backend("conn reset".into()));
        assert_eq!(
            err,
            StoreFetchError::Store {
                key: "hello:1".into(),
                message: "conn reset".into()
            }
        );
    }

    #[test]
    fn test_api_error_status_codes() {
        let cases = [
            (
                StoreFetchError::NotFound { key: "k".into() },
                StatusCode::NOT_FOUND,
            ),
            (
                StoreFetchError::Store {
                    key: "k".into(),
                    message: "boom".into(),
                },
                StatusCode::BAD_GATEWAY,
            ),
            (
                StoreFetchError::Timeout {
                    key: "k".into(),
                    after: Duration::from_millis(10),
                },
                StatusCode::GATEWAY_TIMEOUT,
            ),
        ];

        for (err, status) in cases {
            let response = ApiError::from(err).into_response();
            assert_eq!(response.status(), status);
        }
    }

    #[test]
    fn test_cache_error_into_fault() {
        assert_eq!(
            CacheFault::from(CacheError::CacheFull("no room".into())),
            CacheFault::Backend("Cache full: no room".into())
        );
    }
}
