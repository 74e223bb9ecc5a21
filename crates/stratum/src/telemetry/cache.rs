// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Telemetry recording.

use std::{sync::Arc, time::Duration};

#[cfg(any(feature = "metrics", test))]
use opentelemetry::{
    KeyValue,
    metrics::{Counter, Gauge, Histogram},
};
use tracing::Level;

#[cfg(any(feature = "metrics", test))]
use crate::telemetry::attributes;
use crate::{
    SegmentName,
    telemetry::{CacheActivity, CacheOperation, TelemetryConfig, TierRole},
};

#[derive(Debug)]
pub(crate) struct CacheTelemetryInner {
    pub(crate) logging_enabled: bool,
    #[cfg(any(feature = "metrics", test))]
    pub(crate) event_counter: Option<Counter<u64>>,
    #[cfg(any(feature = "metrics", test))]
    pub(crate) operation_duration: Option<Histogram<f64>>,
    #[cfg(any(feature = "metrics", test))]
    pub(crate) cache_size: Option<Gauge<u64>>,
}

/// Records tier operations as structured logs and, with the `metrics` feature,
/// as OpenTelemetry metrics.
///
/// Clones share the same instruments. The default records logs only; use
/// [`TelemetryConfig`] to attach a meter provider or to silence logging.
#[derive(Clone, Debug)]
pub struct CacheTelemetry {
    inner: Arc<CacheTelemetryInner>,
}

impl Default for CacheTelemetry {
    fn default() -> Self {
        TelemetryConfig::new().with_logs().build()
    }
}

impl CacheTelemetry {
    pub(crate) fn from_inner(inner: CacheTelemetryInner) -> Self {
        Self { inner: Arc::new(inner) }
    }

    /// Creates telemetry that records nothing.
    #[must_use]
    pub fn disabled() -> Self {
        TelemetryConfig::new().build()
    }

    /// Records one operation on one tier of a segment.
    pub(crate) fn record(
        &self,
        name: SegmentName,
        tier: TierRole,
        operation: CacheOperation,
        activity: CacheActivity,
        duration: Option<Duration>,
    ) {
        #[cfg(any(feature = "metrics", test))]
        {
            let attrs = [
                KeyValue::new(attributes::CACHE_NAME, name),
                KeyValue::new(attributes::CACHE_TIER_NAME, tier.as_str()),
                KeyValue::new(attributes::CACHE_OPERATION_NAME, operation.as_str()),
                KeyValue::new(attributes::CACHE_ACTIVITY_NAME, activity.as_str()),
            ];

            if let Some(c) = &self.inner.event_counter {
                c.add(1, &attrs);
            }
            if let (Some(d), Some(h)) = (duration, &self.inner.operation_duration) {
                h.record(d.as_secs_f64(), &attrs);
            }
        }

        if self.inner.logging_enabled {
            Self::emit(name, tier, operation, activity, duration);
        }
    }

    /// Records the number of entries a tier currently holds.
    #[cfg_attr(
        not(any(feature = "metrics", test)),
        expect(unused_variables, reason = "sizes are only reported as metrics")
    )]
    pub(crate) fn record_size(&self, name: SegmentName, tier: TierRole, size: u64) {
        #[cfg(any(feature = "metrics", test))]
        if let Some(g) = &self.inner.cache_size {
            g.record(
                size,
                &[
                    KeyValue::new(attributes::CACHE_NAME, name),
                    KeyValue::new(attributes::CACHE_TIER_NAME, tier.as_str()),
                ],
            );
        }
    }

    fn emit(name: SegmentName, tier: TierRole, operation: CacheOperation, activity: CacheActivity, duration: Option<Duration>) {
        let tier = tier.as_str();
        let op = operation.as_str();
        let ev = activity.as_str();
        let duration_ns = duration.map(|d| d.as_nanos());

        // Field names must match the constants in attributes.rs.
        macro_rules! emit_event {
            ($level:ident) => {
                tracing::$level!(
                    cache.name = name,
                    cache.tier = tier,
                    cache.operation = op,
                    cache.activity = ev,
                    cache.duration_ns = ?duration_ns,
                    "cache.event"
                )
            };
        }

        match activity.level() {
            Level::ERROR => emit_event!(error),
            Level::INFO => emit_event!(info),
            _ => emit_event!(debug),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::telemetry::testing::{LogCapture, MetricTester};

    #[test]
    fn metrics_record_emits_correct_attributes() {
        let tester = MetricTester::new();
        let telemetry = TelemetryConfig::new().with_metrics(tester.meter_provider()).build();

        telemetry.record(
            "edition",
            TierRole::Volatile,
            CacheOperation::Get,
            CacheActivity::Hit,
            Some(Duration::from_millis(5)),
        );

        tester.assert_attributes_contain(&[
            KeyValue::new(attributes::CACHE_NAME, "edition"),
            KeyValue::new(attributes::CACHE_TIER_NAME, "volatile"),
            KeyValue::new(attributes::CACHE_OPERATION_NAME, CacheOperation::Get.as_str()),
            KeyValue::new(attributes::CACHE_ACTIVITY_NAME, CacheActivity::Hit.as_str()),
        ]);
    }

    #[test]
    fn metrics_record_size_emits_cache_name() {
        let tester = MetricTester::new();
        let telemetry = TelemetryConfig::new().with_metrics(tester.meter_provider()).build();

        telemetry.record_size("movie", TierRole::Durable, 42);

        tester.assert_attributes_contain(&[
            KeyValue::new(attributes::CACHE_NAME, "movie"),
            KeyValue::new(attributes::CACHE_TIER_NAME, "durable"),
        ]);
    }

    #[test]
    fn logs_emit_contains_all_fields_and_values() {
        let capture = LogCapture::new();
        let _guard = tracing::subscriber::set_default(capture.subscriber());

        CacheTelemetry::emit(
            "user",
            TierRole::Durable,
            CacheOperation::Invalidate,
            CacheActivity::Error,
            Some(Duration::from_nanos(12345)),
        );

        capture.assert_contains(attributes::CACHE_NAME);
        capture.assert_contains(attributes::CACHE_TIER_NAME);
        capture.assert_contains(attributes::CACHE_OPERATION_NAME);
        capture.assert_contains(attributes::CACHE_ACTIVITY_NAME);
        capture.assert_contains(attributes::CACHE_DURATION_NAME);
        capture.assert_contains(attributes::CACHE_EVENT_NAME);

        capture.assert_contains("user");
        capture.assert_contains("durable");
        capture.assert_contains(CacheOperation::Invalidate.as_str());
        capture.assert_contains(CacheActivity::Error.as_str());
        capture.assert_contains("12345");
    }

    #[test]
    fn logs_emit_at_activity_level() {
        let capture = LogCapture::new();
        let _guard = tracing::subscriber::set_default(capture.subscriber());
        CacheTelemetry::emit("c", TierRole::Volatile, CacheOperation::Get, CacheActivity::Error, None);
        capture.assert_contains("ERROR");

        let capture = LogCapture::new();
        let _guard = tracing::subscriber::set_default(capture.subscriber());
        CacheTelemetry::emit("c", TierRole::Volatile, CacheOperation::Purge, CacheActivity::Purged, None);
        capture.assert_contains("INFO");

        let capture = LogCapture::new();
        let _guard = tracing::subscriber::set_default(capture.subscriber());
        CacheTelemetry::emit("c", TierRole::Volatile, CacheOperation::Get, CacheActivity::Miss, None);
        capture.assert_contains("DEBUG");
    }

    #[test]
    fn disabled_telemetry_emits_nothing() {
        let telemetry = CacheTelemetry::disabled();

        let capture = LogCapture::new();
        let _guard = tracing::subscriber::set_default(capture.subscriber());

        telemetry.record(
            "c",
            TierRole::Volatile,
            CacheOperation::Get,
            CacheActivity::Hit,
            Some(Duration::from_secs(1)),
        );
        telemetry.record_size("c", TierRole::Volatile, 3);

        assert!(capture.output().is_empty());
    }

    #[test]
    fn default_telemetry_logs() {
        let capture = LogCapture::new();
        let _guard = tracing::subscriber::set_default(capture.subscriber());

        CacheTelemetry::default().record("c", TierRole::Durable, CacheOperation::Insert, CacheActivity::Inserted, None);

        capture.assert_contains("cache.inserted");
    }
}
