//! Cache Store Module
//!
//! Capacity-bounded HashMap storage with TTL expiration against an injectable clock.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use crate::cache::{CacheEntry, Clock, MAX_KEY_LENGTH, MAX_VALUE_SIZE};
use crate::error::{CacheError, Result};

// == Cache Store ==
/// In-memory key/value storage with per-entry expiry.
///
/// When full, inserting a new key first drops expired entries and then evicts
/// the live entry closest to its deadline.
#[derive(Debug)]
pub struct CacheStore {
    /// Key-value storage
    entries: HashMap<String, CacheEntry>,
    /// Time source for expiry checks
    clock: Arc<dyn Clock>,
    /// Maximum number of entries allowed
    max_entries: usize,
}

impl CacheStore {
    // == Constructor ==
    /// Creates a new CacheStore holding at most `max_entries` entries.
    pub fn new(max_entries: usize, clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: HashMap::new(),
            clock,
            max_entries,
        }
    }

    // == Set ==
    /// Stores a payload under `key` for `ttl`.
    ///
    /// Overwrites reset the deadline. A zero TTL stores nothing and clears any
    /// previous entry, since such an entry would already be expired.
    pub fn set(&mut self, key: String, value: Vec<u8>, ttl: Duration) -> Result<()> {
        if key.is_empty() {
            return Err(CacheError::InvalidRequest("Key cannot be empty".to_string()));
        }

        if key.len() > MAX_KEY_LENGTH {
            return Err(CacheError::InvalidRequest(format!(
                "Key exceeds maximum length of {} bytes",
                MAX_KEY_LENGTH
            )));
        }

        if value.len() > MAX_VALUE_SIZE {
            return Err(CacheError::InvalidRequest(format!(
                "Value exceeds maximum size of {} bytes",
                MAX_VALUE_SIZE
            )));
        }

        if ttl.is_zero() {
            self.entries.remove(&key);
            return Ok(());
        }

        let is_overwrite = self.entries.contains_key(&key);
        if !is_overwrite && self.entries.len() >= self.max_entries {
            self.make_room()?;
        }

        let entry = CacheEntry::new(value, ttl, self.clock.now_ms());
        self.entries.insert(key, entry);

        Ok(())
    }

    // == Get ==
    /// Retrieves a payload by key.
    ///
    /// Expired entries are removed on read and reported as [`CacheError::Expired`].
    pub fn get(&mut self, key: &str) -> Result<Vec<u8>> {
        let now = self.clock.now_ms();

        match self.entries.get(key) {
            Some(entry) if entry.is_expired_at(now) => {
                self.entries.remove(key);
                Err(CacheError::Expired(key.to_string()))
            }
            Some(entry) => Ok(entry.value.clone()),
            None => Err(CacheError::NotFound(key.to_string())),
        }
    }

    // == Cleanup Expired ==
    /// Removes all expired entries and returns how many were dropped.
    pub fn cleanup_expired(&mut self) -> usize {
        let now = self.clock.now_ms();
        let before = self.entries.len();
        self.entries.retain(|_, entry| !entry.is_expired_at(now));
        before - self.entries.len()
    }

    // == Make Room ==
    fn make_room(&mut self) -> Result<()> {
        if self.cleanup_expired() > 0 {
            return Ok(());
        }

        let victim = self
            .entries
            .iter()
            .min_by_key(|(_, entry)| entry.expires_at)
            .map(|(key, _)| key.clone());

        match victim {
            Some(key) => {
                self.entries.remove(&key);
                Ok(())
            }
            None => Err(CacheError::CacheFull(
                "Cache is full and eviction failed".to_string(),
            )),
        }
    }

    // == Length ==
    /// Returns the current number of entries, expired or not.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
