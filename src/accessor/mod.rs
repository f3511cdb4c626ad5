//! Cache-Aside Accessor Module
//!
//! Reads go to the cache first. On a miss, an unavailable cache or an
//! undecodable payload, the value is fetched from the authoritative store,
//! written back to the cache with a TTL, and returned.
//!
//! Concurrent misses for the same key share one store fetch. Cache problems
//! only ever cost latency: they are logged, counted and treated as a miss.
//! Store failures are returned to the caller and to everyone who was waiting
//! on the same fetch.

mod inflight;

use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use futures::future::BoxFuture;
use futures::FutureExt;
use serde::{de::DeserializeOwned, Serialize};
use tokio::time::timeout;
use tracing::{debug, warn};

use crate::backend::CacheBackend;
use crate::cache::{AccessStats, StatsSnapshot};
use crate::codec::{CacheKey, KeyCodec};
use crate::error::{CacheFault, StoreError, StoreFetchError};
use crate::store::AuthoritativeStore;

use inflight::{FetchResult, InFlightRegistry, Role};

// == Options ==
/// Expiry and deadline settings applied by the accessor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AccessorOptions {
    /// TTL used when the caller does not pass one
    pub default_ttl: Duration,
    /// Deadline for each cache call (health check, get, set)
    pub cache_timeout: Duration,
    /// Deadline for each authoritative fetch
    pub store_timeout: Duration,
}

impl Default for AccessorOptions {
    fn default() -> Self {
        Self {
            default_ttl: Duration::from_secs(3600),
            cache_timeout: Duration::from_millis(250),
            store_timeout: Duration::from_secs(5),
        }
    }
}

// == Fetch Source ==
/// Where a returned value came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchSource {
    /// Decoded from the cache; the store was not touched
    CacheHit,
    /// This caller ran the store fetch
    Store,
    /// This caller waited on a fetch another caller started
    Coalesced,
}

impl FetchSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            FetchSource::CacheHit => "cache",
            FetchSource::Store => "store",
            FetchSource::Coalesced => "coalesced",
        }
    }
}

/// A value together with its [`FetchSource`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fetched<V> {
    pub value: V,
    pub source: FetchSource,
}

// == Accessor ==
/// Cache-aside reads for values of type `V`.
///
/// The accessor owns its in-flight registry; the cache backend and the store
/// are injected and keep their own state.
pub struct CacheAsideAccessor<V> {
    backend: Arc<dyn CacheBackend>,
    codec: KeyCodec,
    options: AccessorOptions,
    registry: InFlightRegistry<V>,
    stats: Arc<AccessStats>,
}

impl<V> std::fmt::Debug for CacheAsideAccessor<V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CacheAsideAccessor")
            .field("codec", &self.codec)
            .field("options", &self.options)
            .field("registry", &self.registry)
            .finish_non_exhaustive()
    }
}

impl<V> CacheAsideAccessor<V>
where
    V: Serialize + DeserializeOwned + Clone + Send + Sync + 'static,
{
    // == Constructor ==
    pub fn new(backend: Arc<dyn CacheBackend>, codec: KeyCodec, options: AccessorOptions) -> Self {
        Self {
            backend,
            codec,
            options,
            registry: InFlightRegistry::default(),
            stats: Arc::new(AccessStats::new()),
        }
    }

    pub fn codec(&self) -> &KeyCodec {
        &self.codec
    }

    pub fn options(&self) -> &AccessorOptions {
        &self.options
    }

    pub fn stats(&self) -> StatsSnapshot {
        self.stats.snapshot()
    }

    /// Number of store fetches currently running.
    pub fn in_flight(&self) -> usize {
        self.registry.len()
    }

    pub fn is_in_flight(&self, key: &CacheKey) -> bool {
        self.registry.contains(key)
    }

    // == Fetch ==
    /// Returns the value for `key`, calling `fetch` on a miss and caching the
    /// result for `ttl`.
    ///
    /// `fetch` runs at most once per outstanding miss for `key`; concurrent
    /// callers for the same key wait on it instead of calling their own.
    pub async fn fetch<F, Fut>(&self, key: &CacheKey, fetch: F, ttl: Duration) -> Result<V, StoreFetchError>
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = Result<V, StoreError>> + Send + 'static,
    {
        self.fetch_traced(key, fetch, ttl).await.map(|fetched| fetched.value)
    }

    /// [`fetch`](Self::fetch) with the configured default TTL.
    pub async fn fetch_with_default_ttl<F, Fut>(&self, key: &CacheKey, fetch: F) -> Result<V, StoreFetchError>
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = Result<V, StoreError>> + Send + 'static,
    {
        self.fetch(key, fetch, self.options.default_ttl).await
    }

    /// Reads `query` through the cache from `store`, keyed by the accessor's codec.
    pub async fn load<S>(&self, store: &Arc<S>, query: &S::Query) -> Result<Fetched<V>, StoreFetchError>
    where
        S: AuthoritativeStore<Value = V> + 'static,
        S::Query: Clone + 'static,
    {
        let key = self.codec.make_key(query);
        let store = Arc::clone(store);
        let query = query.clone();

        self.fetch_traced(
            &key,
            move || async move { store.fetch(&query).await },
            self.options.default_ttl,
        )
        .await
    }

    /// [`fetch`](Self::fetch), also reporting where the value came from.
    pub async fn fetch_traced<F, Fut>(
        &self,
        key: &CacheKey,
        fetch: F,
        ttl: Duration,
    ) -> Result<Fetched<V>, StoreFetchError>
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = Result<V, StoreError>> + Send + 'static,
    {
        let cache_available = self.probe_cache().await;

        if cache_available {
            if let Some(value) = self.read_cache(key).await {
                self.stats.record_hit();
                debug!(key = %key, "cache hit");
                return Ok(Fetched {
                    value,
                    source: FetchSource::CacheHit,
                });
            }
        }

        self.stats.record_miss();
        debug!(key = %key, cache_available, "cache miss");

        let (shared, role) = self
            .registry
            .join_or_start(key, || self.start_fetch(key.clone(), fetch, ttl, cache_available));

        let source = match role {
            Role::Leader => FetchSource::Store,
            Role::Follower => {
                self.stats.record_coalesced();
                debug!(key = %key, "joining in-flight fetch");
                FetchSource::Coalesced
            }
        };

        shared.await.map(|value| Fetched { value, source })
    }

    // == Cache Side ==
    async fn probe_cache(&self) -> bool {
        match timeout(self.options.cache_timeout, self.backend.is_available()).await {
            Ok(true) => true,
            Ok(false) => {
                self.stats.record_cache_fault();
                debug!(fault = %CacheFault::Unavailable, "skipping cache");
                false
            }
            Err(_) => {
                self.stats.record_cache_fault();
                let fault = CacheFault::Timeout {
                    after: self.options.cache_timeout,
                };
                warn!(%fault, "cache health check timed out, skipping cache");
                false
            }
        }
    }

    async fn read_cache(&self, key: &CacheKey) -> Option<V> {
        let bytes = match timeout(self.options.cache_timeout, self.backend.get(key)).await {
            Ok(Ok(Some(bytes))) => bytes,
            Ok(Ok(None)) => return None,
            Ok(Err(fault)) => {
                self.stats.record_cache_fault();
                warn!(key = %key, %fault, "cache get failed, treating as miss");
                return None;
            }
            Err(_) => {
                self.stats.record_cache_fault();
                let fault = CacheFault::Timeout {
                    after: self.options.cache_timeout,
                };
                warn!(key = %key, %fault, "cache get timed out, treating as miss");
                return None;
            }
        };

        match self.codec.decode(&bytes) {
            Ok(value) => Some(value),
            Err(e) => {
                // Overwritten by the fetch that follows
                self.stats.record_decode_failure();
                let fault = CacheFault::Decode(e.to_string());
                warn!(key = %key, %fault, "discarding cached payload");
                None
            }
        }
    }

    // == Store Side ==
    /// Builds the shared fetch future: store fetch, best-effort population,
    /// then registry cleanup, in that order.
    ///
    /// The work runs on its own task, so it finishes and clears its registry
    /// entry even when every caller awaiting it has been dropped.
    fn start_fetch<F, Fut>(
        &self,
        key: CacheKey,
        fetch: F,
        ttl: Duration,
        populate: bool,
    ) -> BoxFuture<'static, FetchResult<V>>
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = Result<V, StoreError>> + Send + 'static,
    {
        let backend = Arc::clone(&self.backend);
        let codec = self.codec.clone();
        let stats = Arc::clone(&self.stats);
        let guard = self.registry.guard(key.clone());
        let options = self.options;
        let task_key = key.clone();

        let task = tokio::spawn(async move {
            let key = task_key;
            stats.record_store_fetch();

            // `fetch()` itself may panic before it yields a future
            let attempt = AssertUnwindSafe(async move { timeout(options.store_timeout, fetch()).await }).catch_unwind();
            let result = match attempt.await {
                Ok(Ok(Ok(value))) => Ok(value),
                Ok(Ok(Err(e))) => Err(StoreFetchError::from_store(key.as_str(), e)),
                Ok(Err(_)) => Err(StoreFetchError::Timeout {
                    key: key.to_string(),
                    after: options.store_timeout,
                }),
                Err(_) => Err(StoreFetchError::Store {
                    key: key.to_string(),
                    message: "store fetch panicked".to_string(),
                }),
            };

            match &result {
                Ok(value) if populate => {
                    if let Err(fault) = populate_cache(&*backend, &codec, &key, value, ttl, options.cache_timeout).await {
                        stats.record_populate_failure();
                        warn!(key = %key, %fault, "cache population failed, returning fetched value");
                    }
                }
                Ok(_) => {}
                Err(e) => {
                    stats.record_store_failure();
                    warn!(key = %key, error = %e, "store fetch failed");
                }
            }

            drop(guard);
            result
        });

        async move {
            task.await.unwrap_or_else(|e| {
                Err(StoreFetchError::Store {
                    key: key.to_string(),
                    message: format!("store fetch task failed: {}", e),
                })
            })
        }
        .boxed()
    }
}

async fn populate_cache<V: Serialize>(
    backend: &dyn CacheBackend,
    codec: &KeyCodec,
    key: &CacheKey,
    value: &V,
    ttl: Duration,
    deadline: Duration,
) -> Result<(), CacheFault> {
    let bytes = codec
        .encode(value)
        .map_err(|e| CacheFault::Populate(e.to_string()))?;

    match timeout(deadline, backend.set(key, bytes, ttl)).await {
        Ok(Ok(())) => Ok(()),
        Ok(Err(fault @ CacheFault::Populate(_))) => Err(fault),
        Ok(Err(fault)) => Err(CacheFault::Populate(fault.to_string())),
        Err(_) => Err(CacheFault::Timeout { after: deadline }),
    }
}
