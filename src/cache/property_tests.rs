//! Property-Based Tests for the cache store and key codec
//!
//! TTL properties run against a manual clock, so no case sleeps.

use proptest::prelude::*;
use std::sync::Arc;
use std::time::Duration;

use crate::cache::{CacheStore, ManualClock};
use crate::codec::{KeyCodec, RowQuery};
use crate::error::CacheError;
use crate::models::Greeting;

// == Test Configuration ==
const TEST_MAX_ENTRIES: usize = 100;
const HOUR: Duration = Duration::from_secs(3600);

// == Strategies ==
/// Generates valid cache keys (non-empty, within length limit)
fn valid_key_strategy() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9_:]{1,64}"
}

/// Generates arbitrary payloads, including non-UTF-8 bytes
fn payload_strategy() -> impl Strategy<Value = Vec<u8>> {
    prop::collection::vec(any::<u8>(), 0..256)
}

fn greeting_strategy() -> impl Strategy<Value = Greeting> {
    (any::<u64>(), any::<String>()).prop_map(|(id, message)| Greeting::new(id, message))
}

fn table_strategy() -> impl Strategy<Value = String> {
    "[a-z_]{1,16}"
}

fn fresh_store(max_entries: usize) -> (CacheStore, Arc<ManualClock>) {
    let clock = Arc::new(ManualClock::new(1_700_000_000_000));
    (CacheStore::new(max_entries, clock.clone()), clock)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    // Decoding an encoded value yields the original value.
    #[test]
    fn prop_codec_roundtrip(greeting in greeting_strategy()) {
        let codec = KeyCodec::new();
        let bytes = codec.encode(&greeting).unwrap();
        prop_assert_eq!(codec.decode::<Greeting>(&bytes).unwrap(), greeting);
    }

    // Identical queries map to identical keys; a different id or table changes the key.
    #[test]
    fn prop_key_determinism(
        table in table_strategy(),
        id in any::<u64>(),
        other_id in any::<u64>(),
        other_table in table_strategy(),
    ) {
        let codec = KeyCodec::new();
        let key = codec.make_key(&RowQuery::new(table.clone(), id));

        prop_assert_eq!(&key, &codec.make_key(&RowQuery::new(table.clone(), id)));
        prop_assert_eq!(key.as_str(), format!("{}:{}", table, id));

        if other_id != id {
            prop_assert_ne!(&key, &codec.make_key(&RowQuery::new(table.clone(), other_id)));
        }
        if other_table != table {
            prop_assert_ne!(&key, &codec.make_key(&RowQuery::new(other_table, id)));
        }
    }

    // Separator and escape characters inside segments never make two queries share a key.
    #[test]
    fn prop_key_injective_with_separators(
        a in ("[a:%]{0,6}", "[a:%]{0,6}"),
        b in ("[a:%]{0,6}", "[a:%]{0,6}"),
    ) {
        let codec = KeyCodec::new();
        let key_a = codec.make_key(&RowQuery::new(a.0.clone(), a.1.clone()));
        let key_b = codec.make_key(&RowQuery::new(b.0.clone(), b.1.clone()));

        prop_assert_eq!(a == b, key_a == key_b);
    }

    // Storing a payload and reading it back before expiry returns the same bytes.
    #[test]
    fn prop_roundtrip_storage(key in valid_key_strategy(), value in payload_strategy()) {
        let (mut store, _) = fresh_store(TEST_MAX_ENTRIES);

        store.set(key.clone(), value.clone(), HOUR).unwrap();

        prop_assert_eq!(store.get(&key).unwrap(), value);
    }

    // An entry set with ttl=T is present just before T and absent from T on.
    #[test]
    fn prop_ttl_respected(
        key in valid_key_strategy(),
        value in payload_strategy(),
        ttl_ms in 1u64..86_400_000,
    ) {
        let (mut store, clock) = fresh_store(TEST_MAX_ENTRIES);
        store.set(key.clone(), value, Duration::from_millis(ttl_ms)).unwrap();

        clock.advance(Duration::from_millis(ttl_ms - 1));
        prop_assert!(store.get(&key).is_ok(), "entry should live until its deadline");

        clock.advance(Duration::from_millis(1));
        prop_assert_eq!(store.get(&key), Err(CacheError::Expired(key.clone())));
    }

    // The store never holds more than its capacity.
    #[test]
    fn prop_capacity_bound(
        entries in prop::collection::vec((valid_key_strategy(), payload_strategy(), 1u64..10_000), 1..200)
    ) {
        let max_entries = 50;
        let (mut store, _) = fresh_store(max_entries);

        for (key, value, ttl_secs) in entries {
            store.set(key, value, Duration::from_secs(ttl_secs)).unwrap();
            prop_assert!(
                store.len() <= max_entries,
                "Cache size {} exceeds max {}",
                store.len(),
                max_entries
            );
        }
    }

    // Sweeping leaves exactly the entries whose deadline is still ahead.
    #[test]
    fn prop_cleanup_keeps_live_entries(
        entries in prop::collection::hash_map(valid_key_strategy(), 1u64..100, 1..50),
        elapsed in 0u64..100,
    ) {
        let (mut store, clock) = fresh_store(TEST_MAX_ENTRIES);
        for (key, ttl_secs) in &entries {
            store.set(key.clone(), b"v".to_vec(), Duration::from_secs(*ttl_secs)).unwrap();
        }

        clock.advance(Duration::from_secs(elapsed));
        store.cleanup_expired();

        let live = entries.values().filter(|ttl| **ttl > elapsed).count();
        prop_assert_eq!(store.len(), live);
    }
}
