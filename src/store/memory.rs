//! In-memory authoritative store
//!
//! Rows keyed by table and id, with knobs for latency and failure so callers
//! can observe how the accessor behaves against a slow or broken database.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::RwLock;
use tracing::debug;

use super::AuthoritativeStore;
use crate::codec::{QueryIdentity, RowQuery};
use crate::error::StoreError;

/// Table-of-rows store that counts every fetch it serves.
#[derive(Debug)]
pub struct MemoryStore<V> {
    rows: RwLock<HashMap<(String, String), V>>,
    latency: RwLock<Option<Duration>>,
    failure: RwLock<Option<StoreError>>,
    invocations: AtomicUsize,
}

impl<V> Default for MemoryStore<V> {
    fn default() -> Self {
        Self {
            rows: RwLock::new(HashMap::new()),
            latency: RwLock::new(None),
            failure: RwLock::new(None),
            invocations: AtomicUsize::new(0),
        }
    }
}

impl<V: Clone> MemoryStore<V> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or replaces a row.
    pub fn insert(&self, table: impl Into<String>, id: impl ToString, value: V) {
        self.rows.write().insert((table.into(), id.to_string()), value);
    }

    /// Delays every fetch by `latency`.
    pub fn set_latency(&self, latency: Option<Duration>) {
        *self.latency.write() = latency;
    }

    /// Makes every fetch fail with `failure` until cleared.
    pub fn set_failure(&self, failure: Option<StoreError>) {
        *self.failure.write() = failure;
    }

    /// Number of fetches served so far, failed ones included.
    pub fn invocations(&self) -> usize {
        self.invocations.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl<V: Clone + Send + Sync> AuthoritativeStore for MemoryStore<V> {
    type Query = RowQuery;
    type Value = V;

    async fn fetch(&self, query: &RowQuery) -> Result<V, StoreError> {
        self.invocations.fetch_add(1, Ordering::SeqCst);
        debug!(table = query.table(), id = %query.id, "store fetch");

        let latency = *self.latency.read();
        if let Some(latency) = latency {
            tokio::time::sleep(latency).await;
        }

        let failure = self.failure.read().clone();
        if let Some(failure) = failure {
            return Err(failure);
        }

        self.rows
            .read()
            .get(&(query.table.clone(), query.id.clone()))
            .cloned()
            .ok_or_else(|| StoreError::NotFound(format!("{}/{}", query.table, query.id)))
    }
}
