// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Integration tests for the segment registry.

use std::{
    sync::{
        Arc,
        atomic::{AtomicBool, AtomicUsize, Ordering},
    },
    time::{Duration, SystemTime},
};

use stratum::{Segment, SegmentRegistry};
use stratum_memory::MemoryTier;
use stratum_tier::{
    CacheEntry, CacheTier, Error, TierOperation,
    testing::{CacheOp, MockCache},
};
use tick::{Clock, ClockControl};
use tokio::sync::Semaphore;

type TestResult = Result<(), Error>;

fn block_on<F: Future>(f: F) -> F::Output {
    futures::executor::block_on(f)
}

fn key(k: &str) -> String {
    k.to_string()
}

fn counting_registry(clock: Clock) -> (SegmentRegistry<String, i32>, Arc<AtomicUsize>) {
    let created = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&created);
    let registry = SegmentRegistry::new(move |name| {
        counter.fetch_add(1, Ordering::SeqCst);
        Segment::builder(clock.clone()).name(name).build()
    });
    (registry, created)
}

#[test]
fn segment_is_created_once_per_name() -> TestResult {
    block_on(async {
        let (registry, created) = counting_registry(Clock::new_frozen());

        registry.segment("edition").put(&key("1"), 1).await?;
        assert!(registry.segment("edition").contains(&key("1")).await?);
        assert_eq!(created.load(Ordering::SeqCst), 1);

        let _ = registry.segment("movie");
        assert_eq!(created.load(Ordering::SeqCst), 2);
        assert_eq!(registry.names(), vec!["edition", "movie"]);
        Ok(())
    })
}

#[test]
fn concurrent_first_access_creates_one_segment() {
    let (registry, created) = counting_registry(Clock::new_frozen());

    std::thread::scope(|scope| {
        for _ in 0..8 {
            scope.spawn(|| {
                let _ = registry.segment("shared");
            });
        }
    });

    assert_eq!(created.load(Ordering::SeqCst), 1);
    assert_eq!(registry.len(), 1);
}

#[test]
fn segments_are_isolated() -> TestResult {
    block_on(async {
        let (registry, _) = counting_registry(Clock::new_frozen());

        registry.segment("edition").put(&key("1"), 1).await?;
        registry.segment("movie").put(&key("1"), 2).await?;

        let edition = registry.segment("edition").get(&key("1")).await?;
        let movie = registry.segment("movie").get(&key("1")).await?;
        assert_eq!(edition.map(CacheEntry::into_value), Some(1));
        assert_eq!(movie.map(CacheEntry::into_value), Some(2));

        registry.segment("movie").remove(&key("1")).await?;
        assert!(registry.segment("edition").contains(&key("1")).await?);
        Ok(())
    })
}

#[test]
fn sweep_all_totals_every_segment() -> TestResult {
    block_on(async {
        let control = ClockControl::new();
        let clock = control.to_clock();
        let registry = SegmentRegistry::<String, i32>::new(move |name| {
            Segment::builder(clock.clone())
                .name(name)
                .volatile_ttl(Duration::from_secs(10))
                .durable_ttl(Duration::from_secs(20))
                .build()
        });

        registry.segment("a").put(&key("1"), 1).await?;
        registry.segment("b").put(&key("1"), 1).await?;

        control.advance(Duration::from_secs(10));
        assert_eq!(registry.sweep_all().await?, 2, "volatile copies only");

        control.advance(Duration::from_secs(10));
        assert_eq!(registry.sweep_all().await?, 2, "durable copies");
        assert_eq!(registry.sweep_all().await?, 0);
        Ok(())
    })
}

#[test]
fn clear_all_empties_tiers_and_forgets_segments() -> TestResult {
    block_on(async {
        let clock = Clock::new_frozen();
        let volatile = MemoryTier::<String, i32>::new();
        let durable = MemoryTier::<String, i32>::new();
        let (v, d) = (volatile.clone(), durable.clone());
        let registry = SegmentRegistry::new(move |name| {
            Segment::builder(clock.clone())
                .name(name)
                .volatile(v.clone())
                .durable(d.clone())
                .build()
        });

        registry.segment("edition").put(&key("1"), 1).await?;
        registry.clear_all().await?;

        assert!(registry.is_empty());
        assert_eq!(volatile.len(), Some(0));
        assert_eq!(durable.len(), Some(0));
        assert!(registry.segment("edition").get(&key("1")).await?.is_none());
        Ok(())
    })
}

/// Memory tier whose `clear` blocks until the gate is opened.
#[derive(Clone)]
struct GatedClear {
    inner: MemoryTier<String, i32>,
    gate: Arc<Semaphore>,
    clearing: Arc<AtomicBool>,
}

impl CacheTier<String, i32> for GatedClear {
    async fn get(&self, key: &String) -> Result<Option<CacheEntry<i32>>, Error> {
        self.inner.get(key).await
    }

    async fn insert(&self, key: &String, entry: CacheEntry<i32>) -> Result<(), Error> {
        self.inner.insert(key, entry).await
    }

    async fn invalidate(&self, key: &String) -> Result<(), Error> {
        self.inner.invalidate(key).await
    }

    async fn clear(&self) -> Result<(), Error> {
        self.clearing.store(true, Ordering::SeqCst);
        let _permit = self.gate.acquire().await;
        self.inner.clear().await
    }

    async fn purge_expired(&self, now: SystemTime, ttl: Option<Duration>) -> Result<u64, Error> {
        self.inner.purge_expired(now, ttl).await
    }
}

#[tokio::test]
async fn writes_racing_clear_all_reach_the_segment_being_cleared() -> TestResult {
    let clock = Clock::new_frozen();
    let durable = GatedClear {
        inner: MemoryTier::new(),
        gate: Arc::new(Semaphore::new(0)),
        clearing: Arc::new(AtomicBool::new(false)),
    };
    let created = Arc::new(AtomicUsize::new(0));
    let (tier, counter) = (durable.clone(), Arc::clone(&created));
    let registry = SegmentRegistry::new(move |name| {
        counter.fetch_add(1, Ordering::SeqCst);
        Segment::builder(clock.clone()).name(name).durable(tier.clone()).build()
    });

    registry.segment("user").put(&key("old"), 1).await?;

    let (cleared, written) = tokio::join!(registry.clear_all(), async {
        while !durable.clearing.load(Ordering::SeqCst) {
            tokio::task::yield_now().await;
        }
        let segment = registry.segment("user");
        durable.gate.add_permits(1);
        segment.put(&key("new"), 2).await
    });
    cleared?;
    written?;

    assert_eq!(created.load(Ordering::SeqCst), 1);
    assert!(registry.is_empty());
    assert!(durable.inner.get(&key("old")).await?.is_none());
    assert_eq!(durable.inner.get(&key("new")).await?.map(CacheEntry::into_value), Some(2));
    Ok(())
}

#[test]
fn clear_all_continues_past_failures() {
    block_on(async {
        let clock = Clock::new_frozen();
        let failing = MockCache::<String, i32>::new();
        failing.fail_when(|op| matches!(op, CacheOp::Clear));
        let healthy = MemoryTier::<String, i32>::new();
        let (f, h) = (failing.clone(), healthy.clone());

        let registry = SegmentRegistry::new(move |name| {
            let builder = Segment::builder(clock.clone()).name(name);
            if name == "failing" {
                builder.durable(f.clone()).build()
            } else {
                builder.durable(h.clone()).build()
            }
        });

        registry.segment("failing").put(&key("1"), 1).await.unwrap();
        registry.segment("healthy").put(&key("1"), 1).await.unwrap();

        let error = registry.clear_all().await.unwrap_err();
        assert_eq!(error.operation(), TierOperation::Clear);
        assert_eq!(healthy.len(), Some(0));
        assert!(registry.is_empty());
    });
}

#[test]
fn debug_lists_segment_names() {
    let (registry, _) = counting_registry(Clock::new_frozen());
    let _ = registry.segment("user");
    assert!(format!("{registry:?}").contains("user"));
}
