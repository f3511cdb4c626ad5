//! Cache Aside - read-through caching with fetch coalescing
//!
//! Reads check a key/value cache first and fall back to an authoritative
//! store on a miss, populating the cache with a TTL. Concurrent misses for
//! the same key share a single store fetch, and cache outages only degrade
//! latency, never correctness.

pub mod accessor;
pub mod api;
pub mod backend;
pub mod cache;
pub mod codec;
pub mod config;
pub mod error;
pub mod models;
pub mod store;
pub mod tasks;

pub use accessor::{AccessorOptions, CacheAsideAccessor, FetchSource, Fetched};
pub use api::AppState;
pub use backend::{CacheBackend, MemoryBackend};
pub use codec::{CacheKey, KeyCodec, QueryIdentity, RowQuery};
pub use config::Config;
pub use error::{CacheFault, StoreError, StoreFetchError};
pub use store::{AuthoritativeStore, MemoryStore};
pub use tasks::spawn_cleanup_task;
