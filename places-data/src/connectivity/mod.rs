//! Background connectivity monitoring.
//!
//! [`MonitoredConnectivity`] answers [`places_core::ConnectivityGate`] from
//! the latest result of a periodic [`PathProbe`], so checking the gate never
//! touches the network. [`TcpPathProbe`] is the production probe.

mod monitor;
mod probe;

use std::time::Duration;

use serde::Deserialize;

use crate::config::duration_ms;

pub use monitor::{MonitorError, MonitoredConnectivity};
pub use probe::{PathProbe, PathStatus, TcpPathProbe};

/// Default probe targets: public DNS resolvers on ports that are rarely
/// filtered.
pub const DEFAULT_PROBE_TARGETS: [&str; 2] = ["1.1.1.1:443", "8.8.8.8:53"];

const DEFAULT_INTERVAL_MS: u64 = 5_000;
const DEFAULT_PROBE_TIMEOUT_MS: u64 = 2_000;

/// Settings for [`MonitoredConnectivity`] and [`TcpPathProbe`].
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ConnectivityConfig {
    /// `host:port` pairs; reaching any one of them satisfies the path.
    pub targets: Vec<String>,
    /// Pause between probes.
    #[serde(rename = "interval_ms", deserialize_with = "duration_ms")]
    pub interval: Duration,
    /// Upper bound on a single connection attempt.
    #[serde(rename = "probe_timeout_ms", deserialize_with = "duration_ms")]
    pub probe_timeout: Duration,
}

impl Default for ConnectivityConfig {
    fn default() -> Self {
        Self {
            targets: DEFAULT_PROBE_TARGETS.iter().map(|&target| target.to_owned()).collect(),
            interval: Duration::from_millis(DEFAULT_INTERVAL_MS),
            probe_timeout: Duration::from_millis(DEFAULT_PROBE_TIMEOUT_MS),
        }
    }
}

impl ConnectivityConfig {
    /// Replace the probe targets.
    #[must_use]
    pub fn with_targets<I, S>(mut self, targets: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.targets = targets.into_iter().map(Into::into).collect();
        self
    }

    /// Set the pause between probes.
    #[must_use]
    pub const fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Set the per-attempt timeout.
    #[must_use]
    pub const fn with_probe_timeout(mut self, timeout: Duration) -> Self {
        self.probe_timeout = timeout;
        self
    }
}
