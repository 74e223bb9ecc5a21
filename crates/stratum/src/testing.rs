// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Test helpers for code built on stratum segments.
//!
//! Available with the `test-util` feature.

use std::{
    io::{self, Write},
    sync::Arc,
};

use parking_lot::Mutex;
pub use stratum_tier::testing::{CacheOp, MockCache};
use tracing_subscriber::{fmt::MakeWriter, layer::SubscriberExt};

/// Captures formatted `tracing` output in memory.
///
/// Install [`subscriber`](Self::subscriber) with `tracing::subscriber::set_default`,
/// run the code under test, then assert on [`output`](Self::output).
#[derive(Debug, Clone, Default)]
pub struct LogCapture {
    buffer: Arc<Mutex<Vec<u8>>>,
}

impl LogCapture {
    /// Creates an empty capture buffer.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns everything captured so far.
    #[must_use]
    pub fn output(&self) -> String {
        String::from_utf8_lossy(&self.buffer.lock()).into_owned()
    }

    /// Panics unless the captured output contains `expected`.
    #[expect(clippy::panic, reason = "test assertion helper")]
    pub fn assert_contains(&self, expected: &str) {
        let output = self.output();
        if !output.contains(expected) {
            panic!("log output does not contain '{expected}', got:\n{output}");
        }
    }

    /// Creates a subscriber writing every event, down to `TRACE`, into this buffer.
    ///
    /// Install it with `tracing::subscriber::set_default` for thread-local capture.
    #[must_use]
    pub fn subscriber(&self) -> impl tracing::Subscriber + Send + Sync {
        tracing_subscriber::registry().with(tracing_subscriber::fmt::layer().with_writer(self.clone()).with_ansi(false))
    }
}

impl<'a> MakeWriter<'a> for LogCapture {
    type Writer = LogCaptureWriter;

    fn make_writer(&'a self) -> Self::Writer {
        LogCaptureWriter {
            buffer: Arc::clone(&self.buffer),
        }
    }
}

/// Writer appending to a [`LogCapture`] buffer.
#[derive(Debug)]
pub struct LogCaptureWriter {
    buffer: Arc<Mutex<Vec<u8>>>,
}

impl Write for LogCaptureWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.buffer.lock().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
