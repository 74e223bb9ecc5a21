// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Integration tests for the two-tier segment protocol.

use std::time::Duration;

use stratum::{PromotionPolicy, Segment};
use stratum_memory::MemoryTier;
use stratum_tier::{
    CacheEntry, CacheTier, Error, TierOperation,
    testing::{CacheOp, MockCache},
};
use tick::{Clock, ClockControl};

type TestResult = Result<(), Error>;

const VOLATILE_TTL: Duration = Duration::from_secs(10);
const DURABLE_TTL: Duration = Duration::from_secs(100);

fn block_on<F: Future>(f: F) -> F::Output {
    futures::executor::block_on(f)
}

fn key(k: &str) -> String {
    k.to_string()
}

struct Tiers {
    control: ClockControl,
    volatile: MemoryTier<String, i32>,
    durable: MemoryTier<String, i32>,
}

impl Tiers {
    fn new() -> Self {
        Self {
            control: ClockControl::new(),
            volatile: MemoryTier::with_max_entries(2),
            durable: MemoryTier::new(),
        }
    }

    fn segment(&self, policy: PromotionPolicy<i32>) -> Segment<String, i32> {
        Segment::builder(self.control.to_clock())
            .name("test")
            .volatile(self.volatile.clone())
            .volatile_ttl(VOLATILE_TTL)
            .durable(self.durable.clone())
            .durable_ttl(DURABLE_TTL)
            .promotion_policy(policy)
            .build()
    }
}

#[test]
fn put_then_get_round_trips() -> TestResult {
    block_on(async {
        let tiers = Tiers::new();
        let segment = tiers.segment(PromotionPolicy::always());

        segment.put(&key("a"), 1).await?;

        assert_eq!(segment.get(&key("a")).await?.map(CacheEntry::into_value), Some(1));
        assert_eq!(tiers.volatile.len(), Some(1));
        assert_eq!(tiers.durable.len(), Some(1));
        Ok(())
    })
}

#[test]
fn put_overwrites_and_restarts_ttl() -> TestResult {
    block_on(async {
        let tiers = Tiers::new();
        let segment = tiers.segment(PromotionPolicy::always());

        segment.put(&key("a"), 1).await?;
        tiers.control.advance(Duration::from_secs(8));
        segment.put(&key("a"), 2).await?;
        tiers.control.advance(Duration::from_secs(8));

        let entry = segment.volatile().get(&key("a")).await?;
        assert_eq!(entry.map(CacheEntry::into_value), Some(2));
        Ok(())
    })
}

#[test]
fn missing_key_reads_as_absent() -> TestResult {
    block_on(async {
        let segment = Tiers::new().segment(PromotionPolicy::always());
        assert!(segment.get(&key("missing")).await?.is_none());
        assert!(!segment.contains(&key("missing")).await?);
        Ok(())
    })
}

#[test]
fn each_tier_enforces_its_own_ttl() -> TestResult {
    block_on(async {
        let tiers = Tiers::new();
        let segment = tiers.segment(PromotionPolicy::always());
        segment.put(&key("a"), 1).await?;

        tiers.control.advance(VOLATILE_TTL - Duration::from_millis(1));
        assert!(segment.volatile().get(&key("a")).await?.is_some());

        tiers.control.advance(Duration::from_millis(1));
        assert!(segment.volatile().get(&key("a")).await?.is_none());
        assert!(segment.get(&key("a")).await?.is_some(), "durable tier still live");

        tiers.control.advance(DURABLE_TTL - VOLATILE_TTL - Duration::from_millis(1));
        assert!(segment.get(&key("a")).await?.is_some());

        tiers.control.advance(Duration::from_millis(1));
        assert!(segment.get(&key("a")).await?.is_none());
        assert_eq!(tiers.durable.len(), Some(1), "reads never delete");
        Ok(())
    })
}

#[test]
fn capacity_eviction_falls_back_to_durable_and_promotes() -> TestResult {
    block_on(async {
        let tiers = Tiers::new();
        let segment = tiers.segment(PromotionPolicy::always());

        segment.put(&key("a"), 1).await?;
        segment.put(&key("b"), 2).await?;
        segment.put(&key("c"), 3).await?;
        assert!(tiers.volatile.get(&key("a")).await?.is_none(), "evicted by capacity");

        assert_eq!(segment.get(&key("a")).await?.map(CacheEntry::into_value), Some(1));
        assert!(tiers.volatile.get(&key("a")).await?.is_some(), "promoted");
        Ok(())
    })
}

#[test]
fn promotion_keeps_original_write_time() -> TestResult {
    block_on(async {
        let tiers = Tiers::new();
        let segment = tiers.segment(PromotionPolicy::always());
        let written = tiers.control.to_clock().system_time();

        segment.put(&key("a"), 1).await?;
        tiers.volatile.invalidate(&key("a")).await?;
        tiers.control.advance(Duration::from_secs(5));

        segment.get(&key("a")).await?;
        let promoted = tiers.volatile.get(&key("a")).await?.expect("promoted");
        assert_eq!(promoted.cached_at(), Some(written));

        tiers.control.advance(Duration::from_secs(5));
        assert!(segment.volatile().get(&key("a")).await?.is_none());
        Ok(())
    })
}

#[test]
fn entries_past_volatile_ttl_are_not_promoted() -> TestResult {
    block_on(async {
        let tiers = Tiers::new();
        let segment = tiers.segment(PromotionPolicy::always());

        segment.put(&key("a"), 1).await?;
        tiers.volatile.clear().await?;
        tiers.control.advance(VOLATILE_TTL);

        assert!(segment.get(&key("a")).await?.is_some());
        assert_eq!(tiers.volatile.len(), Some(0));
        Ok(())
    })
}

#[test]
fn never_policy_does_not_promote() -> TestResult {
    block_on(async {
        let tiers = Tiers::new();
        let segment = tiers.segment(PromotionPolicy::never());

        segment.put(&key("a"), 1).await?;
        tiers.volatile.clear().await?;

        assert!(segment.get(&key("a")).await?.is_some());
        assert_eq!(tiers.volatile.len(), Some(0));
        Ok(())
    })
}

#[test]
fn when_policy_promotes_selectively() -> TestResult {
    block_on(async {
        let tiers = Tiers::new();
        let segment = tiers.segment(PromotionPolicy::when(|entry: &CacheEntry<i32>| *entry.value() > 0));

        segment.put(&key("positive"), 1).await?;
        segment.put(&key("negative"), -1).await?;
        tiers.volatile.clear().await?;

        segment.get(&key("positive")).await?;
        segment.get(&key("negative")).await?;

        assert!(tiers.volatile.get(&key("positive")).await?.is_some());
        assert!(tiers.volatile.get(&key("negative")).await?.is_none());
        Ok(())
    })
}

#[test]
fn volatile_read_failure_falls_back_to_durable() -> TestResult {
    block_on(async {
        let volatile = MockCache::<String, i32>::new();
        let durable = MemoryTier::<String, i32>::new();
        let segment = Segment::builder(Clock::new_frozen())
            .volatile(volatile.clone())
            .durable(durable.clone())
            .build();

        segment.put(&key("a"), 1).await?;
        volatile.fail_when(|op| matches!(op, CacheOp::Get(_)));

        assert_eq!(segment.get(&key("a")).await?.map(CacheEntry::into_value), Some(1));
        Ok(())
    })
}

#[test]
fn durable_read_failure_propagates() {
    block_on(async {
        let durable = MockCache::<String, i32>::new();
        durable.fail_when(|op| matches!(op, CacheOp::Get(_)));
        let segment = Segment::builder(Clock::new_frozen()).durable(durable).build();

        let error = segment.get(&key("a")).await.unwrap_err();
        assert_eq!(error.operation(), TierOperation::Get);
    });
}

#[test]
fn promotion_failure_is_ignored() -> TestResult {
    block_on(async {
        let clock = Clock::new_frozen();
        let volatile = MockCache::<String, i32>::new();
        let durable = MemoryTier::<String, i32>::new();
        durable
            .insert(&key("a"), CacheEntry::with_cached_at(1, clock.system_time()))
            .await?;
        volatile.fail_when(|op| matches!(op, CacheOp::Insert { .. }));

        let segment = Segment::builder(clock)
            .volatile(volatile.clone())
            .durable(durable)
            .build();

        assert!(segment.get(&key("a")).await?.is_some());
        assert!(!volatile.contains_key(&key("a")));
        Ok(())
    })
}

#[test]
fn failed_durable_write_keeps_previous_value_readable() -> TestResult {
    block_on(async {
        let volatile = MemoryTier::<String, i32>::new();
        let durable = MockCache::<String, i32>::new();
        let segment = Segment::builder(Clock::new_frozen())
            .volatile(volatile.clone())
            .durable(durable.clone())
            .build();

        segment.put(&key("a"), 1).await?;
        durable.fail_when(|op| matches!(op, CacheOp::Insert { .. }));

        let error = segment.put(&key("a"), 2).await.unwrap_err();
        assert_eq!(error.operation(), TierOperation::Insert);
        assert_eq!(segment.get(&key("a")).await?.map(CacheEntry::into_value), Some(1));
        Ok(())
    })
}

#[test]
fn put_writes_durable_before_volatile() -> TestResult {
    block_on(async {
        let volatile = MockCache::<String, i32>::new();
        let durable = MockCache::<String, i32>::new();
        let segment = Segment::builder(Clock::new_frozen())
            .volatile(volatile.clone())
            .durable(durable.clone())
            .build();

        volatile.fail_when(|op| matches!(op, CacheOp::Insert { .. }));
        assert!(segment.put(&key("a"), 1).await.is_err());

        assert!(durable.contains_key(&key("a")));
        assert!(!volatile.contains_key(&key("a")));
        assert_eq!(
            volatile.operations().first(),
            Some(&CacheOp::Invalidate(key("a"))),
            "stale volatile copy dropped first"
        );
        Ok(())
    })
}

#[test]
fn remove_is_idempotent() -> TestResult {
    block_on(async {
        let tiers = Tiers::new();
        let segment = tiers.segment(PromotionPolicy::always());

        segment.remove(&key("absent")).await?;

        segment.put(&key("a"), 1).await?;
        segment.remove(&key("a")).await?;
        segment.remove(&key("a")).await?;

        assert!(segment.get(&key("a")).await?.is_none());
        assert_eq!(tiers.volatile.len(), Some(0));
        assert_eq!(tiers.durable.len(), Some(0));
        Ok(())
    })
}

#[test]
fn sweep_counts_both_tiers() -> TestResult {
    block_on(async {
        let tiers = Tiers::new();
        let segment = tiers.segment(PromotionPolicy::always());

        segment.put(&key("old"), 1).await?;
        tiers.control.advance(DURABLE_TTL - Duration::from_secs(1));
        segment.put(&key("new"), 2).await?;
        tiers.control.advance(Duration::from_secs(1));

        // "old" leaves both tiers, "new" is still live everywhere.
        assert_eq!(segment.sweep_expired().await?, 2);
        assert_eq!(tiers.volatile.len(), Some(1));
        assert_eq!(tiers.durable.len(), Some(1));
        assert!(segment.get(&key("new")).await?.is_some());

        assert_eq!(segment.sweep_expired().await?, 0);
        Ok(())
    })
}

#[test]
fn sweep_reports_tier_failures() {
    block_on(async {
        let durable = MockCache::<String, i32>::new();
        durable.fail_when(|op| matches!(op, CacheOp::PurgeExpired));
        let segment = Segment::builder(Clock::new_frozen()).durable(durable).build();

        let error = segment.sweep_expired().await.unwrap_err();
        assert_eq!(error.operation(), TierOperation::Purge);
    });
}

#[test]
fn clear_empties_both_tiers() -> TestResult {
    block_on(async {
        let tiers = Tiers::new();
        let segment = tiers.segment(PromotionPolicy::always());

        segment.put(&key("a"), 1).await?;
        segment.put(&key("b"), 2).await?;
        segment.clear().await?;

        assert!(segment.get(&key("a")).await?.is_none());
        assert_eq!(tiers.volatile.len(), Some(0));
        assert_eq!(tiers.durable.len(), Some(0));
        Ok(())
    })
}

#[test]
fn clear_continues_past_volatile_failure() {
    block_on(async {
        let volatile = MockCache::<String, i32>::new();
        let durable = MemoryTier::<String, i32>::new();
        let segment = Segment::builder(Clock::new_frozen())
            .volatile(volatile.clone())
            .durable(durable.clone())
            .build();

        segment.put(&key("a"), 1).await.unwrap();
        volatile.fail_when(|op| matches!(op, CacheOp::Clear));

        assert!(segment.clear().await.is_err());
        assert_eq!(durable.len(), Some(0));
    });
}

#[test]
fn clones_share_tiers() -> TestResult {
    block_on(async {
        let segment = Tiers::new().segment(PromotionPolicy::always());
        let clone = segment.clone();

        segment.put(&key("a"), 1).await?;
        assert!(clone.contains(&key("a")).await?);
        assert_eq!(clone.name(), "test");
        Ok(())
    })
}

#[test]
fn default_tiers_use_default_policies() {
    let segment = Segment::<String, i32>::builder(Clock::new_frozen()).build();

    assert_eq!(segment.name(), "segment");
    assert_eq!(segment.volatile().ttl(), Some(stratum::TierPolicy::volatile().ttl));
    assert_eq!(segment.durable().ttl(), Some(stratum::TierPolicy::durable().ttl));
    assert!(format!("{segment:?}").contains("Segment"));
}
