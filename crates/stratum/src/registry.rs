// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Lazily created segments, one per name.

use std::{collections::HashMap, fmt, sync::Arc};

use parking_lot::Mutex;
use stratum_tier::Error;

use crate::{Segment, SegmentName};

/// Creates the segment for a name on its first use.
pub type SegmentFactory<K, V> = Arc<dyn Fn(SegmentName) -> Segment<K, V> + Send + Sync>;

/// Owns one [`Segment`] per name, creating each on first access.
///
/// The factory runs at most once per name, even under concurrent first access,
/// so every caller asking for a name observes the same segment. Segments live
/// until [`clear_all`](Self::clear_all).
///
/// # Examples
///
/// ```
/// use stratum::{Segment, SegmentRegistry};
/// use tick::Clock;
/// # futures::executor::block_on(async {
///
/// let clock = Clock::new_frozen();
/// let registry = SegmentRegistry::<String, i32>::new(move |name| Segment::builder(clock.clone()).name(name).build());
///
/// registry.segment("scores").put(&"alice".to_string(), 42).await?;
/// assert!(registry.segment("scores").contains(&"alice".to_string()).await?);
/// assert!(!registry.segment("ranks").contains(&"alice".to_string()).await?);
/// assert_eq!(registry.len(), 2);
///
/// registry.clear_all().await?;
/// assert!(registry.is_empty());
/// # Ok::<(), stratum_tier::Error>(())
/// # });
/// ```
pub struct SegmentRegistry<K, V> {
    factory: SegmentFactory<K, V>,
    segments: Mutex<HashMap<SegmentName, Segment<K, V>>>,
}

impl<K, V> fmt::Debug for SegmentRegistry<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SegmentRegistry")
            .field("segments", &self.names())
            .finish_non_exhaustive()
    }
}

impl<K, V> SegmentRegistry<K, V> {
    /// Creates an empty registry building segments with `factory`.
    ///
    /// The factory runs while the registry is locked and must not call back into it.
    pub fn new(factory: impl Fn(SegmentName) -> Segment<K, V> + Send + Sync + 'static) -> Self {
        Self {
            factory: Arc::new(factory),
            segments: Mutex::new(HashMap::new()),
        }
    }

    /// Returns the segment registered under `name`, creating it if needed.
    #[must_use]
    pub fn segment(&self, name: SegmentName) -> Segment<K, V> {
        self.segments
            .lock()
            .entry(name)
            .or_insert_with(|| {
                tracing::debug!(segment = name, "segment created");
                (self.factory)(name)
            })
            .clone()
    }

    /// Returns the number of registered segments.
    #[must_use]
    pub fn len(&self) -> usize {
        self.segments.lock().len()
    }

    /// Returns `true` if no segment is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.segments.lock().is_empty()
    }

    /// Returns the names of the registered segments, sorted.
    #[must_use]
    pub fn names(&self) -> Vec<SegmentName> {
        let mut names: Vec<_> = self.segments.lock().keys().copied().collect();
        names.sort_unstable();
        names
    }

    fn snapshot(&self) -> Vec<Segment<K, V>> {
        self.segments.lock().values().cloned().collect()
    }
}

impl<K, V> SegmentRegistry<K, V>
where
    K: Send + Sync,
    V: Clone + Send + Sync,
{
    /// Sweeps expired entries out of every registered segment, returning the total purged.
    ///
    /// # Errors
    ///
    /// Returns the first failure. Every segment is swept regardless.
    pub async fn sweep_all(&self) -> Result<u64, Error> {
        let mut purged = 0;
        let mut first_error = None;

        for segment in self.snapshot() {
            match segment.sweep_expired().await {
                Ok(count) => purged += count,
                Err(error) => {
                    tracing::warn!(segment = segment.name(), %error, "sweep failed");
                    first_error.get_or_insert(error);
                }
            }
        }

        tracing::info!(purged, "expired entries swept from all segments");
        first_error.map_or(Ok(purged), Err)
    }

    /// Clears every registered segment and then forgets all of them.
    ///
    /// Segments stay registered while they are cleared, so callers racing with
    /// this call reach the segment being cleared and their writes land after the
    /// clear. Segments created after the call started are kept.
    ///
    /// # Errors
    ///
    /// Returns the first failure. Every segment is cleared and dropped regardless.
    pub async fn clear_all(&self) -> Result<(), Error> {
        let segments: Vec<_> = self
            .segments
            .lock()
            .iter()
            .map(|(name, segment)| (*name, segment.clone()))
            .collect();
        let mut first_error = None;

        for (name, segment) in &segments {
            if let Err(error) = segment.clear().await {
                tracing::warn!(segment = *name, %error, "clear failed");
                first_error.get_or_insert(error);
            }
        }

        let mut registered = self.segments.lock();
        for (name, _) in &segments {
            registered.remove(name);
        }
        drop(registered);

        tracing::info!("all segments cleared");
        first_error.map_or(Ok(()), Err)
    }
}

#[cfg(test)]
mod tests {
    use tick::Clock;

    use super::*;
    use crate::testing::LogCapture;

    #[test]
    fn lifecycle_is_logged() {
        futures::executor::block_on(async {
            let capture = LogCapture::new();
            let _guard = tracing::subscriber::set_default(capture.subscriber());

            let clock = Clock::new_frozen();
            let registry = SegmentRegistry::<String, i32>::new(move |name| Segment::builder(clock.clone()).name(name).build());

            let _ = registry.segment("edition");
            capture.assert_contains("segment created");

            assert_eq!(registry.sweep_all().await.unwrap(), 0);
            capture.assert_contains("expired entries swept from all segments");

            registry.clear_all().await.unwrap();
            capture.assert_contains("all segments cleared");
        });
    }
}
