//! HTTP adapters over `reqwest`.
//!
//! [`HttpTransport`] implements [`places_core::Transport`] and
//! [`HttpLocationSource`] builds the locations request on top of any
//! transport.
//!
//! # Example
//!
//! ```no_run
//! use std::time::Duration;
//!
//! use places_core::test_support::FixedConnectivity;
//! use places_core::LocationSource;
//! use places_data::http::{HttpLocationSource, HttpTransport, HttpTransportConfig};
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let config = HttpTransportConfig::default()
//!     .with_timeout(Duration::from_secs(10))
//!     .with_user_agent("places-demo/1.0");
//! let transport = HttpTransport::with_config(FixedConnectivity::default(), config)?;
//! let source = HttpLocationSource::new(transport);
//! let points = source.fetch_locations().await?;
//! println!("{} locations", points.len());
//! # Ok(())
//! # }
//! ```

mod source;
mod transport;

pub use source::{DEFAULT_LOCATIONS_URL, HttpLocationSource};
pub use transport::{DEFAULT_USER_AGENT, HttpTransport, HttpTransportConfig, TransportBuildError};
