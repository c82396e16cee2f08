//! Behavioural tests for [`LocationRepository`].
//!
//! The source and cache are in-memory doubles so each scenario exercises the
//! fetch policy alone.

use std::cell::RefCell;
use std::sync::Arc;

use places_core::test_support::{MemoryCache, StubLocationSource, block_on_for_tests};
use places_core::{
    FetchOutcome, LOCATIONS_CACHE_KEY, LocationRepository, NetworkError, PersistentCache, Point,
};
use rstest::fixture;
use rstest_bdd_macros::{given, scenario, then, when};

#[derive(Debug, Default)]
struct RepositoryContext {
    source: RefCell<Option<StubLocationSource>>,
    cache: Arc<MemoryCache>,
    outcome: RefCell<Option<FetchOutcome>>,
}

impl RepositoryContext {
    fn outcome(&self) -> FetchOutcome {
        self.outcome
            .borrow()
            .clone()
            .unwrap_or_else(|| panic!("fetch must run before assertions"))
    }
}

#[fixture]
fn context() -> RepositoryContext {
    RepositoryContext::default()
}

fn two_points() -> Vec<Point> {
    vec![
        Point::new("Amsterdam", 52.3676, 4.9041),
        Point::new("Rotterdam", 51.9225, 4.47917),
    ]
}

fn cached_point() -> Point {
    Point::new("Cached Location", 10.0, 20.0)
}

// --- Given steps ---

#[given("a source returning two points")]
fn source_with_points(#[from(context)] ctx: &RepositoryContext) {
    *ctx.source.borrow_mut() = Some(StubLocationSource::with_points(two_points()));
}

#[given("a source failing with no connection")]
fn source_offline(#[from(context)] ctx: &RepositoryContext) {
    *ctx.source.borrow_mut() = Some(StubLocationSource::with_error(NetworkError::NoConnection));
}

#[given("a source failing to decode its payload")]
fn source_undecodable(#[from(context)] ctx: &RepositoryContext) {
    *ctx.source.borrow_mut() = Some(StubLocationSource::with_error(
        NetworkError::decoding_failed("expected value at line 1 column 2"),
    ));
}

#[given("a source answering with status 404")]
fn source_not_found(#[from(context)] ctx: &RepositoryContext) {
    *ctx.source.borrow_mut() = Some(StubLocationSource::with_error(NetworkError::Status(404)));
}

#[given("an empty cache")]
fn empty_cache(#[from(context)] ctx: &RepositoryContext) {
    assert!(!ctx.cache.contains(LOCATIONS_CACHE_KEY));
}

#[given("a cache holding one point")]
fn cache_with_point(#[from(context)] ctx: &RepositoryContext) {
    ctx.cache.insert(LOCATIONS_CACHE_KEY, &[cached_point()]);
}

#[given("a cache holding an empty list")]
fn cache_with_empty_list(#[from(context)] ctx: &RepositoryContext) {
    ctx.cache.insert(LOCATIONS_CACHE_KEY, &Vec::<Point>::new());
}

// --- When steps ---

#[when("I fetch locations")]
fn fetch(#[from(context)] ctx: &RepositoryContext) {
    let source = ctx
        .source
        .borrow_mut()
        .take()
        .unwrap_or_else(|| panic!("source must be configured"));
    let repository = LocationRepository::new(source, Arc::clone(&ctx.cache));
    *ctx.outcome.borrow_mut() = Some(block_on_for_tests(repository.fetch_locations()));
}

// --- Then steps ---

#[then("a fresh outcome with two points is returned")]
fn then_fresh(#[from(context)] ctx: &RepositoryContext) {
    assert_eq!(ctx.outcome(), FetchOutcome::Success(two_points()));
}

#[then("the cache holds the two points")]
fn then_cached(#[from(context)] ctx: &RepositoryContext) {
    let stored: Option<Vec<Point>> = block_on_for_tests(ctx.cache.load(LOCATIONS_CACHE_KEY));
    assert_eq!(stored, Some(two_points()));
}

#[then("a fallback outcome with the cached point is returned")]
fn then_fallback(#[from(context)] ctx: &RepositoryContext) {
    let outcome = ctx.outcome();
    assert!(
        matches!(&outcome, FetchOutcome::SuccessWithFallback { cached, .. } if *cached == vec![cached_point()]),
        "expected fallback with cached point, got {outcome:?}"
    );
}

#[then("a fallback outcome with no points is returned")]
fn then_empty_fallback(#[from(context)] ctx: &RepositoryContext) {
    let outcome = ctx.outcome();
    assert!(
        matches!(&outcome, FetchOutcome::SuccessWithFallback { cached, .. } if cached.is_empty()),
        "expected fallback with empty list, got {outcome:?}"
    );
}

#[then("a failure outcome is returned")]
fn then_failure(#[from(context)] ctx: &RepositoryContext) {
    let outcome = ctx.outcome();
    assert!(
        matches!(outcome, FetchOutcome::Failure(_)),
        "expected failure, got {outcome:?}"
    );
}

#[then("the surfaced error is no connection")]
fn then_no_connection(#[from(context)] ctx: &RepositoryContext) {
    assert_eq!(ctx.outcome().error(), Some(&NetworkError::NoConnection));
}

#[then("the surfaced error is a decoding failure")]
fn then_decoding(#[from(context)] ctx: &RepositoryContext) {
    let outcome = ctx.outcome();
    assert!(
        matches!(outcome.error(), Some(NetworkError::DecodingFailed(_))),
        "expected decoding failure, got {outcome:?}"
    );
}

#[then("the surfaced error is status 404")]
fn then_status(#[from(context)] ctx: &RepositoryContext) {
    assert_eq!(ctx.outcome().error(), Some(&NetworkError::Status(404)));
}

// --- Scenario registrations ---

macro_rules! register_scenario {
    ($fn_name:ident, $title:literal) => {
        #[scenario(path = "tests/features/fetch_locations.feature", name = $title)]
        fn $fn_name(context: RepositoryContext) {
            let _ = context;
        }
    };
}

register_scenario!(fresh_data_refreshes_cache, "fresh data refreshes the cache");
register_scenario!(offline_with_cached_data, "offline with cached data");
register_scenario!(
    undecodable_payload_without_cache,
    "undecodable payload with nothing cached"
);
register_scenario!(
    server_error_without_cache,
    "server error with nothing cached"
);
register_scenario!(
    empty_cached_list_counts,
    "empty cached list counts as cached data"
);
