//! API Handlers
//!
//! HTTP request handlers for each demo endpoint.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    Json,
};

use crate::accessor::CacheAsideAccessor;
use crate::backend::{CacheBackend, MemoryBackend};
use crate::config::Config;
use crate::error::{ApiError, ApiResult};
use crate::models::{Greeting, GreetingPath, GreetingResponse, HealthResponse, StatsResponse};
use crate::store::MemoryStore;

/// Application state shared across all handlers.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Cache-aside reads of greeting rows
    pub accessor: Arc<CacheAsideAccessor<Greeting>>,
    /// In-memory cache the accessor populates
    pub backend: Arc<MemoryBackend>,
    /// Authoritative greeting rows
    pub store: Arc<MemoryStore<Greeting>>,
}

impl AppState {
    /// Wires an accessor over the given backend and store.
    pub fn new(backend: Arc<MemoryBackend>, store: Arc<MemoryStore<Greeting>>, config: &Config) -> Self {
        let accessor = CacheAsideAccessor::new(
            backend.clone(),
            config.key_codec(),
            config.accessor_options(),
        );

        Self {
            accessor: Arc::new(accessor),
            backend,
            store,
        }
    }

    /// Creates a new AppState from configuration with an empty store.
    ///
    /// `CACHE_ENABLED=false` starts the cache switched off, so every read
    /// goes to the store.
    pub fn from_config(config: &Config) -> Self {
        let backend = Arc::new(MemoryBackend::new(config.max_entries));
        backend.set_available(config.cache_enabled);
        Self::new(backend, Arc::new(MemoryStore::new()), config)
    }
}

/// Handler for GET /helloget/:id
///
/// Reads the greeting row through the cache.
pub async fn greeting_handler(
    State(state): State<AppState>,
    Path(path): Path<GreetingPath>,
) -> ApiResult<Json<GreetingResponse>> {
    let query = path.to_query().map_err(ApiError::InvalidRequest)?;
    let fetched = state.accessor.load(&state.store, &query).await?;

    Ok(Json(fetched.into()))
}

/// Handler for GET /stats
pub async fn stats_handler(State(state): State<AppState>) -> Json<StatsResponse> {
    Json(StatsResponse::new(
        state.accessor.stats(),
        state.accessor.in_flight(),
    ))
}

/// Handler for GET /health
///
/// Reports healthy even when the cache is down.
pub async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse::healthy(state.backend.is_available().await))
}
