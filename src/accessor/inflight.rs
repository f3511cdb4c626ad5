//! In-flight fetch registry
//!
//! Maps a cache key to the one authoritative fetch currently running for it.
//! The first caller for a key registers the fetch and every later caller
//! clones the same [`Shared`] future, so all of them observe one outcome.

use std::collections::HashMap;
use std::sync::Arc;

use futures::future::{BoxFuture, FutureExt, Shared};
use parking_lot::Mutex;

use crate::codec::CacheKey;
use crate::error::StoreFetchError;

pub(crate) type FetchResult<V> = Result<V, StoreFetchError>;
pub(crate) type SharedFetch<V> = Shared<BoxFuture<'static, FetchResult<V>>>;

/// Whether a caller started the fetch or attached to one already running.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Role {
    Leader,
    Follower,
}

/// Registry of running fetches. Cloning shares the same map.
pub(crate) struct InFlightRegistry<V> {
    entries: Arc<Mutex<HashMap<CacheKey, SharedFetch<V>>>>,
}

impl<V> Clone for InFlightRegistry<V> {
    fn clone(&self) -> Self {
        Self {
            entries: Arc::clone(&self.entries),
        }
    }
}

impl<V> Default for InFlightRegistry<V> {
    fn default() -> Self {
        Self {
            entries: Arc::default(),
        }
    }
}

impl<V> std::fmt::Debug for InFlightRegistry<V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InFlightRegistry")
            .field("in_flight", &self.entries.lock().len())
            .finish()
    }
}

impl<V: Clone + Send + Sync + 'static> InFlightRegistry<V> {
    /// Attaches to the running fetch for `key`, or registers the future built
    /// by `start` if there is none.
    ///
    /// Check and insert happen under one lock acquisition. `start` may spawn
    /// the fetch but never awaits it; a fetch that finishes early blocks on
    /// this lock in its guard until the entry is inserted.
    pub(crate) fn join_or_start<F>(&self, key: &CacheKey, start: F) -> (SharedFetch<V>, Role)
    where
        F: FnOnce() -> BoxFuture<'static, FetchResult<V>>,
    {
        let mut entries = self.entries.lock();

        if let Some(running) = entries.get(key) {
            return (running.clone(), Role::Follower);
        }

        let shared = start().shared();
        entries.insert(key.clone(), shared.clone());
        (shared, Role::Leader)
    }

    /// Returns a guard that clears the entry for `key` when dropped. The fetch
    /// holds it until it finishes, so a later caller starts a fresh fetch.
    pub(crate) fn guard(&self, key: CacheKey) -> FetchGuard<V> {
        FetchGuard {
            registry: self.clone(),
            key,
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub(crate) fn contains(&self, key: &CacheKey) -> bool {
        self.entries.lock().contains_key(key)
    }
}

/// Removes one registry entry on drop.
pub(crate) struct FetchGuard<V> {
    registry: InFlightRegistry<V>,
    key: CacheKey,
}

impl<V> Drop for FetchGuard<V> {
    fn drop(&mut self) {
        self.registry.entries.lock().remove(&self.key);
    }
}
