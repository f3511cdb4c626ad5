//! In-memory cache backend
//!
//! Wraps [`CacheStore`] behind an async lock with a switch for simulating outages.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::debug;

use super::CacheBackend;
use crate::cache::{CacheStore, Clock, SystemClock};
use crate::codec::CacheKey;
use crate::error::{CacheError, CacheFault};

/// Process-local [`CacheBackend`] with TTL expiry and a capacity bound.
#[derive(Debug)]
pub struct MemoryBackend {
    store: RwLock<CacheStore>,
    available: AtomicBool,
}

impl MemoryBackend {
    /// Creates a backend on the system clock.
    pub fn new(max_entries: usize) -> Self {
        Self::with_clock(max_entries, Arc::new(SystemClock))
    }

    pub fn with_clock(max_entries: usize, clock: Arc<dyn Clock>) -> Self {
        Self {
            store: RwLock::new(CacheStore::new(max_entries, clock)),
            available: AtomicBool::new(true),
        }
    }

    /// Turns the backend on or off. While off every call fails with
    /// [`CacheFault::Unavailable`].
    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    fn check_available(&self) -> Result<(), CacheFault> {
        if self.available.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(CacheFault::Unavailable)
        }
    }

    /// Reads a live payload regardless of the availability switch.
    pub async fn raw_get(&self, key: &str) -> Option<Vec<u8>> {
        self.store.write().await.get(key).ok()
    }

    /// Drops every expired entry, returning how many were removed.
    pub async fn purge_expired(&self) -> usize {
        self.store.write().await.cleanup_expired()
    }

    pub async fn len(&self) -> usize {
        self.store.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.store.read().await.is_empty()
    }
}

#[async_trait]
impl CacheBackend for MemoryBackend {
    async fn is_available(&self) -> bool {
        self.available.load(Ordering::SeqCst)
    }

    async fn get(&self, key: &CacheKey) -> Result<Option<Vec<u8>>, CacheFault> {
        self.check_available()?;

        // Write lock: expired entries are removed on read
        let mut store = self.store.write().await;
        match store.get(key.as_str()) {
            Ok(value) => Ok(Some(value)),
            Err(CacheError::NotFound(_)) => Ok(None),
            Err(CacheError::Expired(_)) => {
                debug!(key = %key, "cache entry expired");
                Ok(None)
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn set(&self, key: &CacheKey, value: Vec<u8>, ttl: Duration) -> Result<(), CacheFault> {
        self.check_available()?;

        let mut store = self.store.write().await;
        store
            .set(key.to_string(), value, ttl)
            .map_err(|e| CacheFault::Populate(e.to_string()))
    }
}
