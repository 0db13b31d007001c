//! Integration tests for prefetch.
//!
//! These tests verify the full engine lifecycle including:
//! - Order preservation across capacities
//! - Failure delivered once, then exhaustion
//! - Backpressure bound
//! - Unbounded mode with a slow consumer
//! - Async pulls

use std::{
    sync::atomic::Ordering,
    thread,
    time::{Duration, Instant},
};

use prefetch::testing::{CountingSource, DiskError, PanickingSource, VecSource};
use prefetch::{Capacity, Prefetch, PrefetchConfig, PullError, SequenceSource, prefetch};
use prefetch_test_utils::{Xorshift64, debug_tracing_setup, tracing_setup};
use rstest::*;

fn wait_until(mut cond: impl FnMut() -> bool, timeout: Duration) -> bool {
    let deadline = Instant::now() + timeout;
    while !cond() {
        if Instant::now() >= deadline {
            return false;
        }
        thread::sleep(Duration::from_millis(2));
    }
    true
}

/// Values come out in production order regardless of capacity.
#[rstest]
#[case(1, 0)]
#[case(1, 1)]
#[case(1, 50)]
#[case(4, 50)]
#[case(64, 50)]
#[case(0, 50)]
#[case(-5, 50)]
#[timeout(Duration::from_secs(5))]
fn test_order_preserved(_tracing_setup: (), #[case] max_prefetch: isize, #[case] count: usize) {
    let items: Vec<usize> = (0..count).collect();
    let engine = Prefetch::new(VecSource::new(items.clone()), max_prefetch);

    let received: Vec<usize> = engine.map(Result::unwrap).collect();
    assert_eq!(received, items);
}

#[rstest]
#[case(1)]
#[case(2)]
#[case(0)]
#[timeout(Duration::from_secs(5))]
fn test_exhaustion_is_idempotent(#[case] max_prefetch: isize) {
    let mut engine = Prefetch::new(VecSource::new(vec!['a']), max_prefetch);

    assert_eq!(engine.next().unwrap().unwrap(), 'a');
    for _ in 0..10 {
        assert!(engine.next().is_none());
    }
    assert!(engine.is_finished());
    assert_eq!(engine.buffered(), 0);
}

/// Values before the failure are delivered, then the failure once, then nothing.
#[rstest]
#[case(1, 0)]
#[case(1, 2)]
#[case(3, 5)]
#[case(0, 5)]
#[timeout(Duration::from_secs(5))]
fn test_error_delivered_once(#[case] max_prefetch: isize, #[case] fail_at: usize) {
    let source = VecSource::new((0..10).collect::<Vec<u32>>()).failing_at(fail_at);
    let mut engine = Prefetch::new(source, max_prefetch);

    for expected in 0..fail_at as u32 {
        assert_eq!(engine.next().unwrap().unwrap(), expected);
    }
    match engine.next() {
        Some(Err(PullError::Source(err))) => assert_eq!(err, DiskError { position: fail_at }),
        other => panic!("expected source failure, got {other:?}"),
    }
    for _ in 0..5 {
        assert!(engine.next().is_none());
    }
}

#[rstest]
#[timeout(Duration::from_secs(5))]
fn test_scenario_b_disk_error() {
    let source = VecSource::new(vec![1, 2, 3]).failing_at(2);
    let mut engine = Prefetch::new(source, 1);

    assert_eq!(engine.next().unwrap().unwrap(), 1);
    assert_eq!(engine.next().unwrap().unwrap(), 2);
    let err = engine.next().unwrap().unwrap_err();
    assert_eq!(err.to_string(), "sequence source failed: disk error at position 2");
    assert!(engine.next().is_none());
}

#[rstest]
#[timeout(Duration::from_secs(5))]
fn test_panicking_source_fails_once(_tracing_setup: ()) {
    let mut engine = Prefetch::new(PanickingSource::new(2), 1);

    assert_eq!(engine.next().unwrap().unwrap(), 0);
    assert_eq!(engine.next().unwrap().unwrap(), 1);
    let err = engine.next().unwrap().unwrap_err();
    assert!(err.is_panic());
    assert!(err.to_string().contains("source exploded after 2 values"));
    assert!(engine.next().is_none());
    assert!(engine.next().is_none());
}

/// The worker cannot run more than `n` values ahead of an idle consumer.
#[rstest]
#[case(1)]
#[case(3)]
#[case(8)]
#[timeout(Duration::from_secs(5))]
fn test_capacity_bound(#[case] max_prefetch: isize) {
    let source = CountingSource::new();
    let pulls = source.pulls();
    let mut engine = Prefetch::new(source, max_prefetch);
    let n = max_prefetch as usize;

    // n buffered plus one held by the worker while it waits for room.
    assert!(wait_until(|| pulls.load(Ordering::SeqCst) == n + 1, Duration::from_secs(2)));
    thread::sleep(Duration::from_millis(50));
    assert_eq!(pulls.load(Ordering::SeqCst), n + 1);
    assert_eq!(engine.capacity(), Capacity::from_max_prefetch(max_prefetch));

    // Each consumed value lets the worker advance by exactly one.
    for consumed in 1..=3 {
        assert_eq!(engine.next().unwrap().unwrap(), consumed - 1);
        assert!(wait_until(
            || pulls.load(Ordering::SeqCst) == n + 1 + consumed,
            Duration::from_secs(2)
        ));
        thread::sleep(Duration::from_millis(20));
        assert_eq!(pulls.load(Ordering::SeqCst), n + 1 + consumed);
    }
}

#[rstest]
#[timeout(Duration::from_secs(5))]
fn test_unbounded_runs_ahead() {
    let source = VecSource::new((0..1000).collect::<Vec<u32>>());
    let engine = Prefetch::new(source, 0);

    // Without a consumer the worker drains the whole source.
    assert!(wait_until(|| engine.buffered() >= 1000, Duration::from_secs(2)));
    assert_eq!(engine.capacity(), Capacity::Unbounded);

    let received: Vec<u32> = engine.map(Result::unwrap).collect();
    assert_eq!(received.len(), 1000);
}

/// Unbounded buffer, 10000 cheap values, slow consumer: everything arrives in order.
#[rstest]
#[timeout(Duration::from_secs(20))]
fn test_scenario_d_unbounded_slow_consumer() {
    let engine = Prefetch::new((0..10_000u32).map(Ok::<_, DiskError>), 0);

    let mut expected = 0;
    for item in engine {
        assert_eq!(item.unwrap(), expected);
        if expected % 1000 == 0 {
            thread::sleep(Duration::from_millis(5));
        }
        expected += 1;
    }
    assert_eq!(expected, 10_000);
}

/// Random timing on both sides never changes what the consumer sees.
#[rstest]
#[case(1, 1)]
#[case(2, 7)]
#[case(5, 13)]
#[case(0, 42)]
#[timeout(Duration::from_secs(10))]
fn test_jittered_timing(#[case] max_prefetch: isize, #[case] seed: u64) {
    let mut producer_rng = Xorshift64::new(seed);
    let mut consumer_rng = Xorshift64::new(seed.wrapping_mul(31));

    let source = (0..200u32).map(move |i| {
        thread::sleep(producer_rng.jitter(300));
        Ok::<_, DiskError>(i)
    });
    let engine = Prefetch::new(source, max_prefetch);

    let mut received = Vec::new();
    for item in engine {
        thread::sleep(consumer_rng.jitter(300));
        received.push(item.unwrap());
    }
    assert_eq!(received, (0..200).collect::<Vec<_>>());
}

/// A slow producer and a slow consumer overlap instead of alternating.
#[rstest]
#[timeout(Duration::from_secs(10))]
fn test_overlap_saves_time() {
    let step = Duration::from_millis(20);
    let count = 10;
    let source = VecSource::new((0..count).collect::<Vec<u32>>()).with_delay(step);

    let start = Instant::now();
    for item in Prefetch::new(source, 1) {
        item.unwrap();
        thread::sleep(step);
    }
    let elapsed = start.elapsed();

    // Strict alternation would take 2 * count * step.
    assert!(elapsed < step * (2 * count) - step * 4, "elapsed {elapsed:?}");
}

#[rstest]
#[timeout(Duration::from_secs(5))]
fn test_dropping_engine_releases_blocked_worker(_debug_tracing_setup: ()) {
    let source = CountingSource::new();
    let pulls = source.pulls();
    let engine = Prefetch::new(source, 1);

    assert!(wait_until(|| pulls.load(Ordering::SeqCst) == 2, Duration::from_secs(2)));
    drop(engine);

    // The pending handoff fails; the worker never pulls again.
    thread::sleep(Duration::from_millis(50));
    assert_eq!(pulls.load(Ordering::SeqCst), 2);
}

#[rstest]
#[timeout(Duration::from_secs(5))]
fn test_map_items_runs_on_worker() {
    let consumer = thread::current().id();
    let source = VecSource::new(vec![1, 2, 3]).map_items(move |v| (v, thread::current().id()));
    let engine = Prefetch::with_config(source, PrefetchConfig::new(2));

    for item in engine {
        let (_, produced_on) = item.unwrap();
        assert_ne!(produced_on, consumer);
    }
}

#[rstest]
#[timeout(Duration::from_secs(5))]
fn test_try_new_spawns() {
    let mut engine = Prefetch::try_new(VecSource::new(vec![9]), 1).expect("spawn worker");
    assert_eq!(engine.next().unwrap().unwrap(), 9);
    assert!(engine.next().is_none());
}

#[rstest]
#[timeout(Duration::from_secs(5))]
fn test_adapter_scenario_c() {
    let generate = prefetch(1, |n: u32| VecSource::new((0..n).collect()));

    let first = generate(3);
    let second = generate(3);

    let a: Vec<u32> = first.map(Result::unwrap).collect();
    let b: Vec<u32> = second.map(Result::unwrap).collect();
    assert_eq!(a, vec![0, 1, 2]);
    assert_eq!(b, vec![0, 1, 2]);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_next_async_matches_sync() {
    let source = VecSource::new(vec![10, 20, 30]).failing_at(3);
    let mut engine = Prefetch::new(source, 1);

    assert_eq!(engine.next_async().await.unwrap().unwrap(), 10);
    assert_eq!(engine.next_async().await.unwrap().unwrap(), 20);
    assert_eq!(engine.next_async().await.unwrap().unwrap(), 30);
    let err = engine.next_async().await.unwrap().unwrap_err();
    assert_eq!(err.into_source(), Some(DiskError { position: 3 }));
    assert!(engine.next_async().await.is_none());
    assert!(engine.next_async().await.is_none());
}

#[tokio::test]
async fn test_next_async_slow_producer() {
    let source = VecSource::new(vec![1, 2]).with_delay(Duration::from_millis(20));
    let mut engine = Prefetch::new(source, 1);

    let first = tokio::time::timeout(Duration::from_secs(2), engine.next_async())
        .await
        .expect("value within timeout");
    assert_eq!(first.unwrap().unwrap(), 1);
    assert_eq!(engine.next_async().await.unwrap().unwrap(), 2);
    assert!(engine.next_async().await.is_none());
}
