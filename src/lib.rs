//! Facade crate for the Places location pipeline.
//!
//! This crate re-exports the core domain types and the fetch policy, and
//! exposes the HTTP and file-cache adapters behind feature flags.
//!
//! ```no_run
//! # #[cfg(all(feature = "http", feature = "file-cache"))]
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! use places_engine::{
//!     FileCache, HttpLocationSource, HttpTransport, LocationRepository, MonitoredConnectivity,
//!     PlacesConfig,
//! };
//!
//! let config = PlacesConfig::default();
//! let gate = MonitoredConnectivity::from_config(&config.connectivity)?;
//! let transport = HttpTransport::with_config(gate, config.transport.clone())?;
//! let source = HttpLocationSource::with_endpoint(transport, config.endpoint.clone());
//! let repository = LocationRepository::new(source, FileCache::from_config(&config.cache)?);
//!
//! let outcome = repository.fetch_locations().await;
//! println!("{} points", outcome.points().map_or(0, <[_]>::len));
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]

pub use places_core::{
    CacheFuture, CacheKey, CacheKeyError, ConnectivityGate, FailureCategory, FetchOutcome,
    FetchRequest, HttpMethod, LOCATIONS_CACHE_KEY, LocationRepository, LocationSource,
    LocationsResponse, NetworkError, PersistentCache, Point, Transport, Underlying,
};

#[cfg(feature = "http")]
pub use places_data::{
    ConnectivityConfig, DEFAULT_LOCATIONS_URL, HttpLocationSource, HttpTransport,
    HttpTransportConfig, MonitorError, MonitoredConnectivity, PathProbe, PathStatus,
    TcpPathProbe, TransportBuildError,
};

#[cfg(feature = "file-cache")]
pub use places_data::{CacheBuildError, CacheConfig, FileCache};

#[cfg(any(feature = "http", feature = "file-cache"))]
pub use places_data::{ConfigError, PlacesConfig};

#[cfg(feature = "test-support")]
pub use places_core::test_support;
