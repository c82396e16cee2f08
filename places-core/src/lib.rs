//! Core domain types and component seams for the Places engine.
//!
//! The crate defines the point model, the closed [`NetworkError`] taxonomy,
//! the traits every adapter implements ([`ConnectivityGate`], [`Transport`],
//! [`PersistentCache`], [`LocationSource`]) and the [`LocationRepository`]
//! policy that composes them. Production adapters live in `places-data`.

#![forbid(unsafe_code)]

mod cache;
mod connectivity;
mod error;
mod point;
mod repository;
mod source;
pub mod transport;

#[doc(hidden)]
pub mod test_support;

pub use cache::{CacheFuture, CacheKey, CacheKeyError, ENTRY_EXTENSION, PersistentCache};
pub use connectivity::ConnectivityGate;
pub use error::{FailureCategory, NetworkError, Underlying};
pub use point::{LocationsResponse, Point};
pub use repository::{FetchOutcome, LOCATIONS_CACHE_KEY, LocationRepository};
pub use source::LocationSource;
pub use transport::{FetchRequest, HttpMethod, Transport};
