//! Response DTOs for the demo API

use serde::Serialize;

use crate::accessor::{FetchSource, Fetched};
use crate::cache::StatsSnapshot;
use crate::models::Greeting;

/// Response body for `GET /helloget/:id`
#[derive(Debug, Clone, Serialize)]
pub struct GreetingResponse {
    pub id: u64,
    pub message: String,
    /// "cache", "store" or "coalesced"
    pub source: &'static str,
}

impl GreetingResponse {
    pub fn new(greeting: Greeting, source: FetchSource) -> Self {
        Self {
            id: greeting.id,
            message: greeting.message,
            source: source.as_str(),
        }
    }
}

impl From<Fetched<Greeting>> for GreetingResponse {
    fn from(fetched: Fetched<Greeting>) -> Self {
        Self::new(fetched.value, fetched.source)
    }
}

/// Response body for `GET /stats`
#[derive(Debug, Clone, Serialize)]
pub struct StatsResponse {
    #[serde(flatten)]
    pub counters: StatsSnapshot,
    /// hits / (hits + misses)
    pub hit_rate: f64,
    /// Store fetches running right now
    pub in_flight: usize,
}

impl StatsResponse {
    pub fn new(counters: StatsSnapshot, in_flight: usize) -> Self {
        Self {
            hit_rate: counters.hit_rate(),
            counters,
            in_flight,
        }
    }
}

/// Response body for `GET /health`
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// Always "healthy"; the store is the source of truth and cache outages only degrade
    pub status: String,
    pub cache_available: bool,
    /// Current timestamp in ISO 8601 format
    pub timestamp: String,
}

impl HealthResponse {
    pub fn healthy(cache_available: bool) -> Self {
        Self {
            status: "healthy".to_string(),
            cache_available,
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

/// Error response body for all error conditions
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}
