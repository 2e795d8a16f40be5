use assert_matches::assert_matches;
use client_cache::caching::{CacheConfig, CacheManager, Lookup, ShardedLRU, ENTRY_MIN_SIZE};
use client_cache::{PushKind, Value};
use quickcheck::{quickcheck, TestResult};
use rstest::{fixture, rstest};
use std::num::NonZeroUsize;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

const TTL: Duration = Duration::from_millis(100);
const ENTRIES: usize = 3;

fn simple(s: &str) -> Value {
    Value::SimpleString(s.to_string())
}

fn new_lru(entries: usize) -> ShardedLRU {
    ShardedLRU::new(
        NonZeroUsize::new(ENTRY_MIN_SIZE * entries).unwrap(),
        NonZeroUsize::new(ENTRY_MIN_SIZE).unwrap(),
    )
}

/// A cache sized for three minimal entries, holding key "0".
#[fixture]
fn lru() -> ShardedLRU {
    let lru = new_lru(ENTRIES);
    assert_eq!(
        lru.get_or_prepare(b"0", TTL),
        None,
        "got unexpected value from the first get_or_prepare"
    );
    lru.update(b"0", simple("0"));
    lru
}

#[rstest]
fn test_cache_hit_and_expire(lru: ShardedLRU) {
    assert_eq!(lru.get_or_prepare(b"0", TTL), Some(simple("0")));
    thread::sleep(TTL);
    assert_eq!(
        lru.get_or_prepare(b"0", TTL),
        None,
        "got unexpected value from the get_or_prepare after ttl"
    );
}

#[rstest]
fn test_cache_miss(lru: ShardedLRU) {
    assert_eq!(lru.get_or_prepare(b"1", TTL), None);
}

#[rstest]
fn test_cache_evict(lru: ShardedLRU) {
    for i in 1..=ENTRIES {
        let key = i.to_string();
        lru.get_or_prepare(key.as_bytes(), TTL);
        lru.update(key.as_bytes(), simple(&key));
        assert!(lru.used_size() <= lru.capacity());
        assert!(lru.len() <= ENTRIES);
    }

    let latest = ENTRIES.to_string();
    assert_eq!(
        lru.get_or_prepare(latest.as_bytes(), TTL),
        Some(simple(&latest)),
        "did not get the latest value from the get_or_prepare"
    );
    let evicted = [b"0", b"1"]
        .iter()
        .any(|key| lru.get_or_prepare(*key, TTL).is_none());
    assert!(evicted, "one of the oldest keys must have been evicted");
    assert!(lru.statistics().evict >= 1);
}

#[rstest]
fn test_cache_delete(lru: ShardedLRU) {
    lru.delete([b"0"]);
    assert_eq!(lru.get_or_prepare(b"0", TTL), None);
}

#[rstest]
fn test_cache_delete_all(lru: ShardedLRU) {
    lru.delete_all();
    assert_eq!(lru.get_or_prepare(b"0", TTL), None);
}

#[rstest]
#[case::absent_key(vec![b"missing".to_vec()])]
#[case::no_keys(vec![])]
#[case::repeated_key(vec![b"0".to_vec(), b"0".to_vec()])]
fn test_delete_is_idempotent(lru: ShardedLRU, #[case] keys: Vec<Vec<u8>>) {
    lru.delete(&keys);
    lru.delete(&keys);
    lru.delete_all();
    lru.delete_all();
    assert!(lru.is_empty());
    assert_eq!(lru.used_size(), 0);
}

#[rstest]
fn test_expiry_is_fixed_at_reservation(
    #[values(Duration::from_millis(40), Duration::from_millis(80))] ttl: Duration,
) {
    let lru = new_lru(64);
    assert_eq!(lru.get_or_prepare(b"key", ttl), None);
    thread::sleep(ttl / 2);
    lru.update(b"key", Value::Int(1));
    // A longer ttl passed on later lookups does not push the deadline out.
    assert_eq!(lru.get_or_prepare(b"key", ttl * 10), Some(Value::Int(1)));
    thread::sleep(ttl / 2 + Duration::from_millis(5));
    assert_eq!(lru.get_or_prepare(b"key", ttl * 10), None);
}

#[test]
fn test_delete_removes_exactly_named_keys() {
    let lru = new_lru(1_000);
    for i in 0..10 {
        let key = format!("key_{i}");
        lru.get_or_prepare(key.as_bytes(), TTL);
        lru.update(key.as_bytes(), Value::Int(i));
    }

    lru.delete(["key_1", "key_2"]);

    for i in 0..10 {
        let key = format!("key_{i}");
        let cached = lru.get_or_prepare(key.as_bytes(), TTL);
        if i == 1 || i == 2 {
            assert_eq!(cached, None, "{key} must be deleted");
        } else {
            assert_eq!(cached, Some(Value::Int(i)), "{key} must survive");
        }
    }
}

#[test]
fn test_capacity_bound_with_minimal_entries() {
    let entries = 64;
    let lru = new_lru(entries);
    for i in 0..=entries {
        let key = i.to_string();
        lru.get_or_prepare(key.as_bytes(), TTL);
        lru.update(key.as_bytes(), Value::Okay);
    }

    assert!(lru.used_size() <= ENTRY_MIN_SIZE * entries);
    assert!(lru.len() <= entries);
    let missing = (0..=entries)
        .filter(|i| lru.get_or_prepare(i.to_string().as_bytes(), TTL).is_none())
        .count();
    assert!(missing >= 1);
}

#[test]
fn test_concurrent_readers() {
    let cache = CacheManager::new(
        CacheConfig::new().set_size(NonZeroUsize::new(ENTRY_MIN_SIZE * 512).unwrap()),
    );
    let handles: Vec<_> = (0..16)
        .map(|t| {
            let cache = cache.clone();
            thread::spawn(move || {
                for i in 0..2_000 {
                    let key = format!("key_{}", (i * 31 + t) % 1_024);
                    match cache.get_or_prepare(key.as_bytes(), Duration::from_secs(10)) {
                        Some(value) => assert_eq!(value, Value::BulkString(key.into_bytes())),
                        None => cache.update(key.as_bytes(), Value::BulkString(key.clone().into_bytes())),
                    }
                    if i % 250 == 0 {
                        cache.handle_push_value(
                            &PushKind::Invalidate,
                            &[Value::Array(vec![Value::BulkString(b"key_0".to_vec())])],
                        );
                    }
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    let statistics = cache.statistics();
    assert_eq!(statistics.hit + statistics.miss, 16 * 2_000);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_misses_share_one_fetch() {
    let cache = Arc::new(new_lru(64));
    let ttl = Duration::from_secs(10);

    assert_matches!(cache.get_or_subscribe(b"shared", ttl), Lookup::Miss);

    let waiters: Vec<_> = (0..8)
        .map(|_| {
            let cache = cache.clone();
            tokio::spawn(async move {
                match cache.get_or_subscribe(b"shared", ttl) {
                    Lookup::Hit(value) => Some(value),
                    Lookup::Pending(pending) => pending.await,
                    Lookup::Miss => panic!("the slot is already reserved"),
                }
            })
        })
        .collect();

    tokio::time::sleep(Duration::from_millis(10)).await;
    cache.update(b"shared", Value::Int(42));

    for waiter in waiters {
        assert_eq!(waiter.await.unwrap(), Some(Value::Int(42)));
    }
    assert_eq!(cache.statistics().miss, 9 - cache.statistics().hit);
}

#[tokio::test]
async fn test_waiters_released_when_slot_is_flushed() {
    let cache = CacheManager::new(CacheConfig::new());
    let ttl = Duration::from_secs(10);

    assert_matches!(cache.get_or_subscribe(b"key", ttl), Lookup::Miss);
    let pending = assert_matches!(
        cache.get_or_subscribe(b"key", ttl),
        Lookup::Pending(pending) => pending
    );

    cache.handle_push_value(&PushKind::Invalidate, &[Value::Nil]);
    assert_eq!(pending.await, None);

    // The caller now fetches itself, and its reply is cached as usual.
    assert_matches!(cache.get_or_subscribe(b"key", ttl), Lookup::Miss);
    cache.update(b"key", Value::Okay);
    assert_matches!(cache.get_or_subscribe(b"key", ttl), Lookup::Hit(Value::Okay));
}

quickcheck! {
    fn prop_capacity_bound(keys: Vec<u16>, entries: u8) -> TestResult {
        if entries == 0 || keys.is_empty() {
            return TestResult::discard();
        }
        let lru = new_lru(entries as usize);
        for key in &keys {
            let redis_key = key.to_string();
            if lru.get_or_prepare(redis_key.as_bytes(), TTL).is_none() {
                lru.update(redis_key.as_bytes(), Value::Int(*key as i64));
            }
        }

        let last = keys[keys.len() - 1];
        let last_is_cached = lru.get_or_prepare(last.to_string().as_bytes(), TTL)
            == Some(Value::Int(last as i64));
        TestResult::from_bool(
            lru.used_size() <= lru.capacity()
                && lru.len() <= entries as usize
                && last_is_cached,
        )
    }
}
