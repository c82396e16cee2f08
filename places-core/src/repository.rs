//! Fetch policy combining the remote source with the local cache.
//!
//! Each call makes exactly one network attempt:
//!
//! 1. On success the list is submitted to the cache under
//!    [`LOCATIONS_CACHE_KEY`] and returned as [`FetchOutcome::Success`]. The
//!    write is detached; its failure cannot change the outcome.
//! 2. On failure the cached list is loaded. A hit, including an empty list,
//!    yields [`FetchOutcome::SuccessWithFallback`]; a miss yields
//!    [`FetchOutcome::Failure`]. Both carry the original network error.
//!
//! Concurrent calls may interleave; the last cache write to land wins.

use tokio::runtime::Handle;

use crate::{LocationSource, NetworkError, PersistentCache, Point};

/// Cache key holding the last successfully fetched list.
pub const LOCATIONS_CACHE_KEY: &str = "Locations";

/// Result of one [`LocationRepository::fetch_locations`] call.
#[derive(Debug, Clone, PartialEq)]
pub enum FetchOutcome {
    /// Fresh data from the network.
    Success(Vec<Point>),
    /// The network failed but a cached list was available.
    SuccessWithFallback {
        /// Error reported by the network attempt.
        cause: NetworkError,
        /// Previously cached list.
        cached: Vec<Point>,
    },
    /// The network failed and nothing was cached.
    Failure(NetworkError),
}

impl FetchOutcome {
    /// Points to display, fresh or cached.
    #[must_use]
    pub fn points(&self) -> Option<&[Point]> {
        match self {
            Self::Success(points) | Self::SuccessWithFallback { cached: points, .. } => {
                Some(points)
            }
            Self::Failure(_) => None,
        }
    }

    /// Network error behind a fallback or failure.
    #[must_use]
    pub const fn error(&self) -> Option<&NetworkError> {
        match self {
            Self::Success(_) => None,
            Self::SuccessWithFallback { cause, .. } | Self::Failure(cause) => Some(cause),
        }
    }

    /// Whether the points came straight from the network.
    #[must_use]
    pub const fn is_fresh(&self) -> bool {
        matches!(self, Self::Success(_))
    }
}

/// Single-attempt fetch with cache refresh and cache fallback.
///
/// # Examples
/// ```
/// use places_core::test_support::{block_on_for_tests, MemoryCache, StubLocationSource};
/// use places_core::{FetchOutcome, LocationRepository, NetworkError, Point, LOCATIONS_CACHE_KEY};
///
/// let cache = MemoryCache::default().with_entry(LOCATIONS_CACHE_KEY, &[Point::new("A", 1.0, 2.0)]);
/// let repository = LocationRepository::new(
///     StubLocationSource::with_error(NetworkError::NoConnection),
///     cache,
/// );
/// let outcome = block_on_for_tests(repository.fetch_locations());
/// assert!(matches!(outcome, FetchOutcome::SuccessWithFallback { .. }));
/// ```
#[derive(Debug)]
pub struct LocationRepository<S, C> {
    source: S,
    cache: C,
    cache_key: String,
}

impl<S, C> LocationRepository<S, C>
where
    S: LocationSource,
    C: PersistentCache,
{
    /// Combine a source and a cache using [`LOCATIONS_CACHE_KEY`].
    pub fn new(source: S, cache: C) -> Self {
        Self {
            source,
            cache,
            cache_key: LOCATIONS_CACHE_KEY.to_owned(),
        }
    }

    /// Store the list under a different key.
    #[must_use]
    pub fn with_cache_key(mut self, key: impl Into<String>) -> Self {
        self.cache_key = key.into();
        self
    }

    /// Key the list is cached under.
    #[must_use]
    pub fn cache_key(&self) -> &str {
        &self.cache_key
    }

    /// Fetch the list once, refreshing or falling back to the cache.
    ///
    /// Never fails; every transport error becomes a fallback or a failure
    /// outcome. Dropping the future before it resolves abandons the network
    /// attempt but never a cache write already submitted.
    pub async fn fetch_locations(&self) -> FetchOutcome {
        match self.source.fetch_locations().await {
            Ok(points) => {
                log::debug!("fetched {} locations", points.len());
                self.persist(&points);
                FetchOutcome::Success(points)
            }
            Err(cause) => self.fall_back(cause).await,
        }
    }

    fn persist(&self, points: &[Point]) {
        let pending = self.cache.save(points, &self.cache_key);
        let count = points.len();
        let key = self.cache_key.clone();
        // The write is already queued; the task only reports when it lands.
        if let Ok(handle) = Handle::try_current() {
            drop(handle.spawn(async move {
                pending.await;
                log::debug!("cache write for {key:?} finished ({count} locations)");
            }));
        }
    }

    async fn fall_back(&self, cause: NetworkError) -> FetchOutcome {
        match self.cache.load::<Vec<Point>>(&self.cache_key).await {
            Some(cached) => {
                log::info!(
                    "serving {} cached locations after fetch failure: {cause}",
                    cached.len()
                );
                FetchOutcome::SuccessWithFallback { cause, cached }
            }
            None => {
                log::warn!("fetch failed and no cached locations exist: {cause}");
                FetchOutcome::Failure(cause)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{MemoryCache, StubLocationSource, block_on_for_tests};
    use rstest::{fixture, rstest};
    use std::io;
    use std::sync::Arc;

    #[fixture]
    fn cache() -> Arc<MemoryCache> {
        Arc::new(MemoryCache::default())
    }

    fn dutch_cities() -> Vec<Point> {
        vec![
            Point::new("Amsterdam", 52.3676, 4.9041),
            Point::new("Rotterdam", 51.9225, 4.47917),
        ]
    }

    #[rstest]
    fn success_returns_points_in_order(cache: Arc<MemoryCache>) {
        let repository =
            LocationRepository::new(StubLocationSource::with_points(dutch_cities()), cache);
        let outcome = block_on_for_tests(repository.fetch_locations());
        assert_eq!(outcome, FetchOutcome::Success(dutch_cities()));
        assert!(outcome.is_fresh());
        assert_eq!(outcome.error(), None);
    }

    #[rstest]
    fn success_saves_to_cache(cache: Arc<MemoryCache>) {
        let points = vec![Point::new("Test", 1.0, 2.0)];
        let repository = LocationRepository::new(
            StubLocationSource::with_points(points.clone()),
            Arc::clone(&cache),
        );
        block_on_for_tests(repository.fetch_locations());

        assert_eq!(cache.saved_keys(), vec![LOCATIONS_CACHE_KEY.to_owned()]);
        let stored: Option<Vec<Point>> = block_on_for_tests(cache.load(LOCATIONS_CACHE_KEY));
        assert_eq!(stored, Some(points));
    }

    #[rstest]
    fn empty_success_is_still_success(cache: Arc<MemoryCache>) {
        let repository = LocationRepository::new(StubLocationSource::with_points(Vec::new()), cache);
        let outcome = block_on_for_tests(repository.fetch_locations());
        assert_eq!(outcome, FetchOutcome::Success(Vec::new()));
    }

    #[rstest]
    fn failed_cache_write_keeps_success() {
        let cache = Arc::new(MemoryCache::rejecting_writes());
        let repository = LocationRepository::new(
            StubLocationSource::with_points(dutch_cities()),
            Arc::clone(&cache),
        );
        let outcome = block_on_for_tests(repository.fetch_locations());
        assert_eq!(outcome, FetchOutcome::Success(dutch_cities()));
        assert!(!cache.contains(LOCATIONS_CACHE_KEY));
    }

    #[rstest]
    fn failure_with_cache_falls_back(cache: Arc<MemoryCache>) {
        let cached = vec![Point::new("Cached Location", 10.0, 20.0)];
        cache.insert(LOCATIONS_CACHE_KEY, &cached);
        let repository = LocationRepository::new(
            StubLocationSource::with_error(NetworkError::NoConnection),
            Arc::clone(&cache),
        );
        let outcome = block_on_for_tests(repository.fetch_locations());
        assert_eq!(
            outcome,
            FetchOutcome::SuccessWithFallback {
                cause: NetworkError::NoConnection,
                cached: cached.clone(),
            }
        );
        assert_eq!(outcome.points(), Some(cached.as_slice()));
        assert_eq!(cache.loaded_keys(), vec![LOCATIONS_CACHE_KEY.to_owned()]);
    }

    #[rstest]
    fn empty_cached_list_is_a_hit(cache: Arc<MemoryCache>) {
        cache.insert(LOCATIONS_CACHE_KEY, &Vec::<Point>::new());
        let repository = LocationRepository::new(
            StubLocationSource::with_error(NetworkError::NoConnection),
            cache,
        );
        let outcome = block_on_for_tests(repository.fetch_locations());
        assert_eq!(
            outcome,
            FetchOutcome::SuccessWithFallback {
                cause: NetworkError::NoConnection,
                cached: Vec::new(),
            }
        );
    }

    #[rstest]
    #[case(NetworkError::NoConnection)]
    #[case(NetworkError::BadUrl("not a url".into()))]
    #[case(NetworkError::request_failed(io::Error::other("connection reset")))]
    #[case(NetworkError::Status(404))]
    #[case(NetworkError::decoding_failed("expected value"))]
    fn failure_without_cache_surfaces_original_error(
        cache: Arc<MemoryCache>,
        #[case] error: NetworkError,
    ) {
        let repository =
            LocationRepository::new(StubLocationSource::with_error(error.clone()), cache);
        let outcome = block_on_for_tests(repository.fetch_locations());
        assert_eq!(outcome, FetchOutcome::Failure(error));
        assert_eq!(outcome.points(), None);
    }

    #[rstest]
    fn corrupt_cache_is_treated_as_miss(cache: Arc<MemoryCache>) {
        cache.insert_raw(LOCATIONS_CACHE_KEY, b"{not json".to_vec());
        let repository = LocationRepository::new(
            StubLocationSource::with_error(NetworkError::Status(500)),
            Arc::clone(&cache),
        );
        let outcome = block_on_for_tests(repository.fetch_locations());
        assert_eq!(outcome, FetchOutcome::Failure(NetworkError::Status(500)));
        assert!(!cache.contains(LOCATIONS_CACHE_KEY));
    }

    #[rstest]
    fn custom_cache_key_is_used_for_both_paths(cache: Arc<MemoryCache>) {
        let repository = LocationRepository::new(
            StubLocationSource::with_points(dutch_cities()),
            Arc::clone(&cache),
        )
        .with_cache_key("Favourites");
        assert_eq!(repository.cache_key(), "Favourites");
        block_on_for_tests(repository.fetch_locations());
        assert_eq!(cache.saved_keys(), vec!["Favourites".to_owned()]);
    }

    #[rstest]
    fn each_call_makes_one_attempt(cache: Arc<MemoryCache>) {
        let source = Arc::new(StubLocationSource::with_error(NetworkError::NoConnection));
        let repository = LocationRepository::new(Arc::clone(&source), cache);
        block_on_for_tests(repository.fetch_locations());
        block_on_for_tests(repository.fetch_locations());
        assert_eq!(source.calls(), 2);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_fetches_leave_one_complete_list() {
        let cache = Arc::new(MemoryCache::default());
        let mut tasks = tokio::task::JoinSet::new();
        for index in 0..10_u32 {
            let cache = Arc::clone(&cache);
            tasks.spawn(async move {
                let points = vec![Point::new(format!("P{index}"), f64::from(index), 0.0)];
                let repository =
                    LocationRepository::new(StubLocationSource::with_points(points), cache);
                repository.fetch_locations().await
            });
        }
        while let Some(joined) = tasks.join_next().await {
            let outcome = joined.expect("fetch task should not panic");
            assert!(outcome.is_fresh());
        }
        let stored: Option<Vec<Point>> = cache.load(LOCATIONS_CACHE_KEY).await;
        let stored = stored.expect("one of the writes should win");
        assert_eq!(stored.len(), 1);
    }
}
