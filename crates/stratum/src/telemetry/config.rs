// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Telemetry configuration.

#[cfg(any(feature = "metrics", test))]
use opentelemetry::metrics::{Meter, MeterProvider};

use crate::telemetry::cache::{CacheTelemetry, CacheTelemetryInner};

/// Configuration for [`CacheTelemetry`].
///
/// Everything is disabled until turned on.
///
/// # Examples
///
/// ```
/// use stratum::telemetry::TelemetryConfig;
///
/// let telemetry = TelemetryConfig::new().with_logs().build();
/// # let _ = telemetry;
/// ```
#[derive(Clone, Debug, Default)]
pub struct TelemetryConfig {
    logs_enabled: bool,
    #[cfg(any(feature = "metrics", test))]
    meter: Option<Meter>,
}

impl TelemetryConfig {
    /// Creates a configuration with logs and metrics disabled.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Emits a `tracing` event for every tier operation.
    #[must_use]
    pub fn with_logs(self) -> Self {
        Self {
            logs_enabled: true,
            ..self
        }
    }

    /// Records counters, a duration histogram and a size gauge through `provider`.
    #[cfg(any(feature = "metrics", test))]
    #[must_use]
    pub fn with_metrics(mut self, provider: &dyn MeterProvider) -> Self {
        self.meter = Some(crate::telemetry::metrics::create_meter(provider));
        self
    }

    /// Builds the telemetry recorder.
    #[must_use]
    pub fn build(self) -> CacheTelemetry {
        #[cfg(any(feature = "metrics", test))]
        let (event_counter, operation_duration, cache_size) = {
            use crate::telemetry::metrics::{create_cache_size_gauge, create_event_counter, create_operation_duration_histogram};
            (
                self.meter.as_ref().map(create_event_counter),
                self.meter.as_ref().map(create_operation_duration_histogram),
                self.meter.as_ref().map(create_cache_size_gauge),
            )
        };

        CacheTelemetry::from_inner(CacheTelemetryInner {
            logging_enabled: self.logs_enabled,
            #[cfg(any(feature = "metrics", test))]
            event_counter,
            #[cfg(any(feature = "metrics", test))]
            operation_duration,
            #[cfg(any(feature = "metrics", test))]
            cache_size,
        })
    }
}
