//! Configuration for the production adapters.
//!
//! Every field has a default, so an empty JSON object is a valid
//! configuration. Durations are written as whole seconds (`*_secs`) or
//! milliseconds (`*_ms`).
//!
//! ```
//! use places_data::config::PlacesConfig;
//!
//! let config = PlacesConfig::from_json_str(r#"{
//!     "endpoint": "https://example.org/locations.json",
//!     "transport": { "timeout_secs": 10 },
//!     "cache": { "namespace": "test_locations" }
//! }"#)?;
//! assert_eq!(config.cache.namespace, "test_locations");
//! # Ok::<(), places_data::config::ConfigError>(())
//! ```

use std::io::BufReader;
use std::time::Duration;

use camino::{Utf8Path, Utf8PathBuf};
use serde::{Deserialize, Deserializer};
use thiserror::Error;

use crate::cache::CacheConfig;
use crate::connectivity::ConnectivityConfig;
use crate::http::{DEFAULT_LOCATIONS_URL, HttpTransportConfig};

/// Errors raised while loading a [`PlacesConfig`].
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The file could not be opened.
    #[error("failed to open config file {path}: {source}")]
    Open {
        /// Path that was opened.
        path: Utf8PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
    /// The file is not a valid configuration document.
    #[error("failed to parse config file {path}: {source}")]
    Parse {
        /// Path that was parsed.
        path: Utf8PathBuf,
        /// Underlying JSON error.
        #[source]
        source: serde_json::Error,
    },
    /// Inline JSON is not a valid configuration document.
    #[error("invalid configuration: {0}")]
    Invalid(#[source] serde_json::Error),
}

/// Settings for every production adapter.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct PlacesConfig {
    /// URL of the locations document.
    pub endpoint: String,
    /// HTTP client settings.
    pub transport: HttpTransportConfig,
    /// Connectivity probing settings.
    pub connectivity: ConnectivityConfig,
    /// Cache location.
    pub cache: CacheConfig,
}

impl Default for PlacesConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_LOCATIONS_URL.to_owned(),
            transport: HttpTransportConfig::default(),
            connectivity: ConnectivityConfig::default(),
            cache: CacheConfig::default(),
        }
    }
}

impl PlacesConfig {
    /// Load a JSON configuration file.
    ///
    /// # Errors
    /// Returns [`ConfigError::Open`] or [`ConfigError::Parse`] carrying
    /// `path`.
    pub fn from_json_file(path: &Utf8Path) -> Result<Self, ConfigError> {
        let file = places_fs::open_utf8_file(path).map_err(|source| ConfigError::Open {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_reader(BufReader::new(file)).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Parse configuration from a JSON string.
    ///
    /// # Errors
    /// Returns [`ConfigError::Invalid`] when `json` does not parse.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(json).map_err(ConfigError::Invalid)
    }

    /// Set the locations endpoint.
    #[must_use]
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    /// Set the HTTP request timeout.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.transport.timeout = timeout;
        self
    }

    /// Set the HTTP user agent.
    #[must_use]
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.transport.user_agent = user_agent.into();
        self
    }

    /// Replace the connectivity settings.
    #[must_use]
    pub fn with_connectivity(mut self, connectivity: ConnectivityConfig) -> Self {
        self.connectivity = connectivity;
        self
    }

    /// Keep cache entries under `directory`.
    #[must_use]
    pub fn with_cache_directory(mut self, directory: impl Into<Utf8PathBuf>) -> Self {
        self.cache.directory = Some(directory.into());
        self
    }

    /// Set the cache namespace.
    #[must_use]
    pub fn with_cache_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.cache.namespace = namespace.into();
        self
    }
}

pub(crate) fn duration_secs<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
    u64::deserialize(deserializer).map(Duration::from_secs)
}

pub(crate) fn duration_ms<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
    u64::deserialize(deserializer).map(Duration::from_millis)
}
