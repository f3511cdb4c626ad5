//! Authoritative Store Module
//!
//! The source of truth behind the cache. The accessor only ever sees it as an
//! opaque fetch; query language and connection handling stay here.

mod memory;

use async_trait::async_trait;

use crate::codec::QueryIdentity;
use crate::error::StoreError;

pub use memory::MemoryStore;

#[async_trait]
pub trait AuthoritativeStore: Send + Sync {
    /// Logical query the store understands.
    type Query: QueryIdentity + Send + Sync;
    /// Domain value produced for a query.
    type Value: Send;

    /// Produces the value for `query`, or fails with
    /// [`StoreError::NotFound`] / [`StoreError::Backend`].
    async fn fetch(&self, query: &Self::Query) -> Result<Self::Value, StoreError>;
}
