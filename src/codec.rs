//! Key Codec Module
//!
//! Maps logical queries to cache keys and domain values to cached bytes.
//!
//! # Key format
//! `<table>:<id>`, or `<namespace>:<table>:<id>` when a namespace is set.
//! Inside a segment `%` is written as `%25` and `:` as `%3A`, so segment
//! boundaries are unambiguous.
//! Changing the format orphans every entry written under the old one; bump
//! the namespace to do that deliberately.

use std::borrow::Cow;
use std::fmt;

use serde::{de::DeserializeOwned, Serialize};

use crate::error::CodecError;

// == Cache Key ==
/// Canonical cache key for one logical query.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CacheKey(String);

impl CacheKey {
    /// Wraps an already formatted key.
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for CacheKey {
    fn from(key: &str) -> Self {
        Self::new(key)
    }
}

impl From<String> for CacheKey {
    fn from(key: String) -> Self {
        Self(key)
    }
}

// == Query Identity ==
/// Identifies one logical read against the authoritative store.
pub trait QueryIdentity {
    /// Table or collection the read targets.
    fn table(&self) -> &str;

    /// Primary key of the row, rendered as text.
    fn id(&self) -> String;
}

/// A primary-key lookup in a named table.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RowQuery {
    pub table: String,
    pub id: String,
}

impl RowQuery {
    pub fn new(table: impl Into<String>, id: impl ToString) -> Self {
        Self {
            table: table.into(),
            id: id.to_string(),
        }
    }
}

impl QueryIdentity for RowQuery {
    fn table(&self) -> &str {
        &self.table
    }

    fn id(&self) -> String {
        self.id.clone()
    }
}

// == Key Codec ==
/// Key formatting plus JSON encoding of cached values.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeyCodec {
    namespace: Option<String>,
}

impl KeyCodec {
    pub fn new() -> Self {
        Self::default()
    }

    /// Prefixes every key with `namespace:`.
    pub fn with_namespace(namespace: impl Into<String>) -> Self {
        Self {
            namespace: Some(namespace.into()),
        }
    }

    pub fn namespace(&self) -> Option<&str> {
        self.namespace.as_deref()
    }

    // == Make Key ==
    /// Deterministically formats the cache key for `query`.
    pub fn make_key<Q: QueryIdentity + ?Sized>(&self, query: &Q) -> CacheKey {
        let table = escape_segment(query.table());
        let id = query.id();
        let id = escape_segment(&id);

        match &self.namespace {
            Some(ns) => CacheKey(format!("{}:{}:{}", escape_segment(ns), table, id)),
            None => CacheKey(format!("{}:{}", table, id)),
        }
    }

    // == Encode ==
    pub fn encode<V: Serialize>(&self, value: &V) -> Result<Vec<u8>, CodecError> {
        serde_json::to_vec(value).map_err(|e| CodecError::Encode(e.to_string()))
    }

    // == Decode ==
    /// Parses cached bytes. Corrupt or schema-mismatched payloads fail here
    /// and the accessor treats that as a miss.
    pub fn decode<V: DeserializeOwned>(&self, bytes: &[u8]) -> Result<V, CodecError> {
        serde_json::from_slice(bytes).map_err(|e| CodecError::Decode(e.to_string()))
    }
}

fn escape_segment(segment: &str) -> Cow<'_, str> {
    if segment.contains(['%', ':']) {
        Cow::Owned(segment.replace('%', "%25").replace(':', "%3A"))
    } else {
        Cow::Borrowed(segment)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Row {
        id: u64,
        name: String,
    }

    #[test]
    fn test_make_key_format() {
        let codec = KeyCodec::new();
        assert_eq!(codec.make_key(&RowQuery::new("hello", 7)).as_str(), "hello:7");
    }

    #[test]
    fn test_make_key_with_namespace() {
        let codec = KeyCodec::with_namespace("v2");
        assert_eq!(codec.namespace(), Some("v2"));
        assert_eq!(codec.make_key(&RowQuery::new("hello", "7")).as_str(), "v2:hello:7");
    }

    #[test]
    fn test_distinct_queries_get_distinct_keys() {
        let codec = KeyCodec::new();
        let a = codec.make_key(&RowQuery::new("hello", 1));
        let b = codec.make_key(&RowQuery::new("hello", 2));
        let c = codec.make_key(&RowQuery::new("users", 1));

        assert_ne!(a, b);
        assert_ne!(a, c);
        assert_eq!(a, codec.make_key(&RowQuery::new("hello", "1")));
    }

    #[test]
    fn test_separator_inside_segment_is_escaped() {
        let codec = KeyCodec::new();
        let a = codec.make_key(&RowQuery::new("a:b", "c"));
        let b = codec.make_key(&RowQuery::new("a", "b:c"));

        assert_eq!(a.as_str(), "a%3Ab:c");
        assert_eq!(b.as_str(), "a:b%3Ac");
        assert_ne!(a, b);

        // A literal escape sequence does not collide with an escaped separator
        assert_ne!(
            codec.make_key(&RowQuery::new("a%3Ab", "c")),
            codec.make_key(&RowQuery::new("a:b", "c"))
        );
        assert_eq!(
            KeyCodec::with_namespace("v:2").make_key(&RowQuery::new("hello", 1)).as_str(),
            "v%3A2:hello:1"
        );
    }

    #[test]
    fn test_roundtrip() {
        let codec = KeyCodec::new();
        let row = Row {
            id: 1,
            name: "world".into(),
        };

        let bytes = codec.encode(&row).unwrap();
        assert_eq!(codec.decode::<Row>(&bytes).unwrap(), row);
    }

    #[test]
    fn test_decode_corrupt_payload() {
        let codec = KeyCodec::new();
        assert!(matches!(
            codec.decode::<Row>(b"\x00not json"),
            Err(CodecError::Decode(_))
        ));
    }

    #[test]
    fn test_decode_schema_mismatch() {
        let codec = KeyCodec::new();
        let bytes = codec.encode(&"just a string").unwrap();
        assert!(matches!(codec.decode::<Row>(&bytes), Err(CodecError::Decode(_))));
    }

    #[test]
    fn test_cache_key_display() {
        let key = CacheKey::from("hello:1");
        assert_eq!(key.to_string(), "hello:1");
        assert_eq!(CacheKey::from("hello:1".to_string()), key);
    }
}
