//! Integration Tests for the cache lifecycle
//!
//! Exercises fetch, handle release, grace periods, maximum age and the
//! sweep loop through the public API.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Barrier};
use std::time::Duration;

use weak_cache::{CacheError, WeakCache};

// == Helper Functions ==

const GC_INTERVAL: Duration = Duration::from_millis(10);

fn new_cache() -> WeakCache<String> {
    WeakCache::new(GC_INTERVAL).unwrap()
}

fn value(s: &str) -> impl FnOnce() -> Result<String, String> + '_ {
    move || Ok(s.to_string())
}

fn unexpected() -> Result<String, String> {
    panic!("unexpected producer call")
}

/// Polls `len` until it reaches `expected` or a second has passed.
async fn eventually_len(cache: &WeakCache<String>, expected: usize) -> bool {
    for _ in 0..100 {
        if cache.len() == expected {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    cache.len() == expected
}

// == Fetch Tests ==

#[tokio::test]
async fn test_miss_invokes_producer_once() {
    let cache = new_cache();
    let calls = AtomicUsize::new(0);

    let handle = cache
        .fetch("key", Duration::ZERO, Duration::ZERO, || {
            calls.fetch_add(1, Ordering::SeqCst);
            Ok::<_, String>("value".to_string())
        })
        .unwrap();

    assert_eq!(*handle, "value");
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(cache.len(), 1);
}

#[tokio::test]
async fn test_hit_skips_producer_while_handle_alive() {
    let cache = new_cache();

    let first = cache
        .fetch("key", Duration::ZERO, Duration::ZERO, value("value"))
        .unwrap();
    let second = cache
        .fetch("key", Duration::ZERO, Duration::ZERO, unexpected)
        .unwrap();

    assert_eq!(first, second);
    assert_eq!(cache.len(), 1);
    assert_eq!(cache.stats().hits, 1);
}

#[tokio::test]
async fn test_distinct_keys_get_distinct_records() {
    let cache = new_cache();

    let a = cache
        .fetch("a", Duration::ZERO, Duration::ZERO, value("a"))
        .unwrap();
    let b = cache
        .fetch("b", Duration::ZERO, Duration::ZERO, value("b"))
        .unwrap();

    assert_eq!(*a, "a");
    assert_eq!(*b, "b");
    assert_eq!(cache.len(), 2);
}

#[tokio::test]
async fn test_producer_error_is_returned_unchanged() {
    let cache = new_cache();

    let result = cache.fetch("key", Duration::ZERO, Duration::ZERO, || {
        Err::<String, _>("boom".to_string())
    });

    assert_eq!(result.unwrap_err(), "boom");
    assert_eq!(cache.len(), 0);
    assert_eq!(cache.stats().producer_errors, 1);

    // A later fetch of the same key calls the producer again.
    let handle = cache
        .fetch("key", Duration::ZERO, Duration::ZERO, value("value"))
        .unwrap();
    assert_eq!(*handle, "value");
}

// == Eviction Tests ==

#[tokio::test]
async fn test_unreferenced_record_is_swept() {
    let cache = new_cache();

    let handle = cache
        .fetch("key", Duration::ZERO, Duration::ZERO, value("value"))
        .unwrap();
    assert_eq!(cache.len(), 1);

    drop(handle);

    assert!(eventually_len(&cache, 0).await, "Record should be swept");
    assert_eq!(cache.stats().evictions, 1);
}

#[tokio::test]
async fn test_min_ttl_grace_period() {
    let cache = new_cache();
    let min_ttl = Duration::from_millis(100);

    let first = cache
        .fetch("key", min_ttl, Duration::ZERO, value("value"))
        .unwrap();
    drop(first);

    // Unreferenced but still within the grace period.
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(cache.len(), 1);

    // Reactivates the existing record and restarts the grace period.
    let second = cache.fetch("key", min_ttl, Duration::ZERO, unexpected).unwrap();
    assert_eq!(*second, "value");
    assert_eq!(cache.stats().reactivations, 1);
    drop(second);

    tokio::time::sleep(Duration::from_millis(60)).await;
    assert_eq!(cache.len(), 1);

    assert!(eventually_len(&cache, 0).await, "Record should expire after grace period");
}

#[tokio::test]
async fn test_max_ttl_replaces_record_on_fetch() {
    let cache = new_cache();

    let old = cache
        .fetch("key", Duration::ZERO, Duration::from_millis(100), value("value"))
        .unwrap();
    assert_eq!(cache.len(), 1);

    tokio::time::sleep(Duration::from_millis(120)).await;

    let mut produced = false;
    let new = cache
        .fetch("key", Duration::ZERO, Duration::ZERO, || {
            produced = true;
            Ok::<_, String>("new value".to_string())
        })
        .unwrap();

    assert!(produced);
    assert_eq!(*new, "new value");
    assert_eq!(*old, "value");
    assert_eq!(cache.len(), 1);

    // Releasing the replaced handle leaves the new record referenced.
    drop(old);
    let stats = cache.stats();
    assert_eq!(stats.reachable_entries, 1);
    assert_eq!(stats.unreachable_entries, 0);
}

#[tokio::test]
async fn test_referenced_record_is_never_swept() {
    let cache = new_cache();

    let handle = cache
        .fetch("key", Duration::ZERO, Duration::from_millis(20), value("value"))
        .unwrap();

    tokio::time::sleep(Duration::from_millis(80)).await;

    // Past its maximum age, but only a fetch may replace it.
    assert_eq!(cache.len(), 1);
    assert_eq!(*handle, "value");
}

#[tokio::test]
async fn test_record_survives_until_all_handles_released() {
    let cache = new_cache();
    let min_ttl = Duration::from_millis(50);

    let mut handles: Vec<_> = (0..5)
        .map(|_| {
            cache
                .fetch("key", min_ttl, Duration::ZERO, value("value"))
                .unwrap()
        })
        .collect();
    handles.push(handles[0].clone());

    while handles.len() > 1 {
        handles.pop();
        tokio::time::sleep(Duration::from_millis(30)).await;
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.stats().reachable_entries, 1);
    }

    handles.clear();
    tokio::time::sleep(Duration::from_millis(20)).await;
    assert_eq!(cache.len(), 1, "Grace period starts at the last release");

    assert!(eventually_len(&cache, 0).await);
}

// == Lifecycle Tests ==

#[tokio::test]
async fn test_zero_interval_is_rejected() {
    let result = WeakCache::<String>::new(Duration::ZERO);
    assert!(matches!(result, Err(CacheError::InvalidInterval)));
}

#[tokio::test]
async fn test_cache_usable_after_close() {
    let cache = new_cache();
    cache.close();
    cache.close();

    let handle = cache
        .fetch("key", Duration::ZERO, Duration::ZERO, value("value"))
        .unwrap();
    assert_eq!(cache.len(), 1);
    drop(handle);

    // The sweep loop is stopped, so the unreferenced record stays.
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(cache.len(), 1);
    assert_eq!(cache.stats().unreachable_entries, 1);
}

// == Concurrency Tests ==

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_concurrent_fetches_share_one_record() {
    const THREADS: usize = 8;

    let cache = Arc::new(new_cache());
    let calls = Arc::new(AtomicUsize::new(0));
    let barrier = Arc::new(Barrier::new(THREADS));

    let workers: Vec<_> = (0..THREADS)
        .map(|_| {
            let cache = Arc::clone(&cache);
            let calls = Arc::clone(&calls);
            let barrier = Arc::clone(&barrier);
            std::thread::spawn(move || {
                barrier.wait();
                cache
                    .fetch("shared", Duration::from_secs(60), Duration::ZERO, || {
                        calls.fetch_add(1, Ordering::SeqCst);
                        Ok::<_, String>("value".to_string())
                    })
                    .unwrap()
            })
        })
        .collect();

    let handles: Vec<_> = workers.into_iter().map(|w| w.join().unwrap()).collect();

    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(cache.len(), 1);
    assert!(handles.iter().all(|h| **h == "value"));

    drop(handles);
    let stats = cache.stats();
    assert_eq!(stats.reachable_entries, 0);
    assert_eq!(stats.unreachable_entries, 1);
}
