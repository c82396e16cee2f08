//! Production adapters for the Places engine.
//!
//! Responsibilities:
//! - Monitor connectivity in the background ([`connectivity`]).
//! - Perform HTTP exchanges and fetch the locations document ([`http`]).
//! - Persist entries as JSON files on a serial I/O thread ([`cache`]).
//! - Load adapter settings ([`config`]).
//!
//! Boundaries:
//! - Fetch and fallback policy lives in `places-core`.
//! - Keep blocking I/O off async executors; file access runs on the cache
//!   worker thread.
//!
//! Invariants:
//! - Adapters are `Send + Sync` and hold no global mutable state.

#![forbid(unsafe_code)]

pub mod cache;
pub mod config;
pub mod connectivity;
pub mod http;

pub use cache::{CacheBuildError, CacheConfig, FileCache};
pub use config::{ConfigError, PlacesConfig};
pub use connectivity::{
    ConnectivityConfig, MonitorError, MonitoredConnectivity, PathProbe, PathStatus, TcpPathProbe,
};
pub use http::{
    DEFAULT_LOCATIONS_URL, HttpLocationSource, HttpTransport, HttpTransportConfig,
    TransportBuildError,
};
