//! Cache Backend Module
//!
//! The narrow interface the accessor needs from a key/value cache, plus an
//! in-memory implementation.

mod memory;

use std::time::Duration;

use async_trait::async_trait;

use crate::codec::CacheKey;
use crate::error::CacheFault;

pub use memory::MemoryBackend;

/// A key/value cache with expiring entries.
///
/// Implementations may block on I/O; the accessor bounds every call with its
/// cache timeout, so a hung backend reads as unavailable.
#[async_trait]
pub trait CacheBackend: Send + Sync {
    /// Health check. `false` sends reads straight to the store and skips population.
    async fn is_available(&self) -> bool;

    /// Returns the stored payload, or `None` on a miss.
    async fn get(&self, key: &CacheKey) -> Result<Option<Vec<u8>>, CacheFault>;

    /// Stores `value` under `key`, expiring after `ttl`.
    async fn set(&self, key: &CacheKey, value: Vec<u8>, ttl: Duration) -> Result<(), CacheFault>;
}
