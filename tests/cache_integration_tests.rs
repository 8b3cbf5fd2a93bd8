//! Integration Tests for the TTL cache
//!
//! Exercises the public API on the real clock and under concurrent access.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::{self, sleep};
use std::time::Duration;

use lazy_ttl_cache::{CacheConfig, ManualClock, TtlCache};

// == Helper Functions ==

fn collect_evictions<V: Send + 'static>(
    cache: &TtlCache<String, V>,
) -> Arc<Mutex<Vec<(String, V)>>> {
    let evicted = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&evicted);
    cache.on_evicted(move |key, value| sink.lock().unwrap().push((key, value)));
    evicted
}

// == Wall Clock Behaviour ==

#[test]
fn test_miss_on_empty_cache_returns_zero_value() {
    let cache: TtlCache<String, i64> = TtlCache::new();
    assert_eq!(cache.get("absent"), 0);

    let cache: TtlCache<String, Option<String>> = TtlCache::new();
    assert_eq!(cache.get("absent"), None);
}

#[test]
fn test_ttl_expiry_on_wall_clock() {
    let cache: TtlCache<String, i32> = TtlCache::new();
    let evicted = collect_evictions(&cache);

    cache.put("a".to_string(), 1, Duration::from_millis(10));
    assert_eq!(cache.get("a"), 1);

    sleep(Duration::from_millis(40));

    assert_eq!(cache.get("a"), 0);
    assert!(cache.is_empty());
    assert_eq!(*evicted.lock().unwrap(), vec![("a".to_string(), 1)]);
}

#[test]
fn test_refresh_on_read_on_wall_clock() {
    let cache: TtlCache<String, i32> = TtlCache::new();

    cache.put("a".to_string(), 1, Duration::from_millis(200));
    sleep(Duration::from_millis(120));
    assert_eq!(cache.get("a"), 1);

    // Past the original deadline, well inside the refreshed one
    sleep(Duration::from_millis(120));
    assert_eq!(cache.get("a"), 1);
}

#[test]
fn test_no_refresh_on_wall_clock() {
    let cache: TtlCache<String, i32> =
        TtlCache::with_config(CacheConfig::new().refresh_on_read(false));
    assert!(!cache.refresh_on_read());

    cache.put("a".to_string(), 1, Duration::from_millis(200));
    sleep(Duration::from_millis(120));
    assert_eq!(cache.get("a"), 1);

    sleep(Duration::from_millis(120));
    assert_eq!(cache.get("a"), 0);
}

#[test]
fn test_expired_entry_lingers_until_some_read() {
    let cache: TtlCache<String, i32> = TtlCache::new();
    let evicted = collect_evictions(&cache);

    cache.put("a".to_string(), 1, Duration::from_millis(1));
    sleep(Duration::from_millis(10));
    cache.put("b".to_string(), 2, Duration::from_secs(5));

    assert_eq!(cache.len(), 2);
    assert!(evicted.lock().unwrap().is_empty());

    assert_eq!(cache.get("b"), 2);
    assert_eq!(cache.len(), 1);
    assert_eq!(*evicted.lock().unwrap(), vec![("a".to_string(), 1)]);
}

// == Manual Clock Behaviour ==

#[test]
fn test_overwrite_is_silent() {
    let clock = ManualClock::new();
    let cache: TtlCache<String, i32> =
        TtlCache::with_config(CacheConfig::new().with_clock(clock.clone()));
    let evicted = collect_evictions(&cache);

    cache.put("a".to_string(), 1, Duration::from_secs(1));
    cache.put("a".to_string(), 2, Duration::from_secs(1));
    assert_eq!(cache.get("a"), 2);

    clock.advance(Duration::from_secs(3));
    cache.get("anything");

    let values: Vec<i32> = evicted.lock().unwrap().iter().map(|(_, v)| *v).collect();
    assert_eq!(values, vec![2]);
}

#[test]
fn test_simultaneous_expiry_follows_insertion_order() {
    let clock = ManualClock::new();
    let cache: TtlCache<String, i32> =
        TtlCache::with_config(CacheConfig::new().with_clock(clock.clone()));
    let evicted = collect_evictions(&cache);

    cache.put("second-ttl".to_string(), 0, Duration::from_millis(20));
    for (i, key) in ["k1", "k2", "k3", "k4"].iter().enumerate() {
        cache.put(key.to_string(), i as i32, Duration::from_millis(10));
    }

    clock.advance(Duration::from_millis(15));
    cache.get("none");

    let order: Vec<String> = evicted.lock().unwrap().iter().map(|(k, _)| k.clone()).collect();
    assert_eq!(order, vec!["k1", "k2", "k3", "k4"]);
    assert_eq!(cache.len(), 1);
}

#[test]
fn test_stats_track_operations() {
    let clock = ManualClock::new();
    let cache: TtlCache<String, i32> =
        TtlCache::with_config(CacheConfig::new().with_clock(clock.clone()));

    cache.put("a".to_string(), 1, Duration::from_millis(5));
    cache.put("a".to_string(), 2, Duration::from_millis(5));
    cache.get("a");
    clock.advance(Duration::from_millis(10));
    cache.get("a");

    let stats = cache.stats();
    assert_eq!(stats.hits, 1);
    assert_eq!(stats.misses, 1);
    assert_eq!(stats.evictions, 1);
    assert_eq!(stats.overwrites, 1);
    assert_eq!(stats.total_entries, 0);
    assert_eq!(stats.hit_rate(), 0.5);
}

// == Concurrency ==

#[test]
fn test_concurrent_threads_share_one_cache() {
    let cache: Arc<TtlCache<String, usize>> = Arc::new(TtlCache::new());
    let evictions = Arc::new(AtomicUsize::new(0));
    {
        let evictions = Arc::clone(&evictions);
        cache.on_evicted(move |_, _| {
            evictions.fetch_add(1, Ordering::SeqCst);
        });
    }

    let handles: Vec<_> = (0..8)
        .map(|t| {
            let cache = Arc::clone(&cache);
            thread::spawn(move || {
                for i in 0..500 {
                    let key = format!("k{}", (t * 31 + i) % 40);
                    if i % 2 == 0 {
                        cache.put(key, i, Duration::from_millis((i % 5) as u64));
                    } else {
                        cache.get(&key);
                    }
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }

    sleep(Duration::from_millis(20));
    cache.get("final-sweep");

    assert!(cache.is_empty());
    let stats = cache.stats();
    assert_eq!(stats.evictions as usize, evictions.load(Ordering::SeqCst));
    assert_eq!(stats.hits + stats.misses, 8 * 250 + 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_tasks_keep_long_lived_entries() {
    let cache: Arc<TtlCache<String, u64>> = Arc::new(TtlCache::new());
    cache.put("stable".to_string(), 7, Duration::from_secs(60));

    let mut handles = Vec::new();
    for task in 0..4u64 {
        let cache = Arc::clone(&cache);
        handles.push(tokio::spawn(async move {
            for i in 0..100u64 {
                cache.put(format!("t{task}-{i}"), i, Duration::from_millis(1));
                assert_eq!(cache.get("stable"), 7);
                if i % 10 == 0 {
                    tokio::time::sleep(Duration::from_millis(1)).await;
                }
            }
        }));
    }

    for handle in handles {
        handle.await.unwrap();
    }

    tokio::time::sleep(Duration::from_millis(10)).await;
    assert_eq!(cache.get("stable"), 7);
    assert_eq!(cache.len(), 1);
}
