//! Probe-driven implementation of [`ConnectivityGate`].

use std::time::Duration;

use async_trait::async_trait;
use places_core::ConnectivityGate;
use thiserror::Error;
use tokio::runtime::{Handle, TryCurrentError};
use tokio::sync::watch;
use tokio::task::JoinHandle;

use super::{ConnectivityConfig, PathProbe, TcpPathProbe};

/// Errors raised while starting a [`MonitoredConnectivity`].
#[derive(Debug, Error)]
pub enum MonitorError {
    /// The monitor task needs a Tokio runtime to run on.
    #[error("connectivity monitor must be started inside a Tokio runtime")]
    NoRuntime(#[source] TryCurrentError),
}

/// Connectivity gate fed by a background probe loop.
///
/// The gate starts out optimistic (`true`) so that requests issued before the
/// first probe completes are not refused. Each probe result replaces the
/// published state; [`ConnectivityGate::check_connection`] only reads it.
/// Dropping the gate stops the loop.
#[derive(Debug)]
pub struct MonitoredConnectivity {
    state: watch::Receiver<bool>,
    task: JoinHandle<()>,
}

impl MonitoredConnectivity {
    /// Start probing with `probe` every `interval` on the current runtime.
    ///
    /// # Errors
    /// Returns [`MonitorError::NoRuntime`] when called outside a Tokio
    /// runtime.
    pub fn spawn<P>(probe: P, interval: Duration) -> Result<Self, MonitorError>
    where
        P: PathProbe + 'static,
    {
        let handle = Handle::try_current().map_err(MonitorError::NoRuntime)?;
        let (sender, state) = watch::channel(true);
        let task = handle.spawn(run_monitor(probe, interval, sender));
        Ok(Self { state, task })
    }

    /// Start a [`TcpPathProbe`] loop using `config`.
    ///
    /// # Errors
    /// Returns [`MonitorError::NoRuntime`] when called outside a Tokio
    /// runtime.
    pub fn from_config(config: &ConnectivityConfig) -> Result<Self, MonitorError> {
        Self::spawn(TcpPathProbe::from_config(config), config.interval)
    }

    /// Latest published state.
    #[must_use]
    pub fn is_connected(&self) -> bool {
        *self.state.borrow()
    }

    /// Receiver that observes every published transition.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<bool> {
        self.state.clone()
    }
}

impl Drop for MonitoredConnectivity {
    fn drop(&mut self) {
        self.task.abort();
    }
}

#[async_trait]
impl ConnectivityGate for MonitoredConnectivity {
    async fn check_connection(&self) -> bool {
        self.is_connected()
    }
}

async fn run_monitor<P: PathProbe>(probe: P, interval: Duration, state: watch::Sender<bool>) {
    loop {
        let connected = probe.probe().await.is_satisfied();
        let changed = state.send_if_modified(|current| {
            if *current == connected {
                false
            } else {
                *current = connected;
                true
            }
        });
        if changed {
            if connected {
                log::info!("network path satisfied; connectivity restored");
            } else {
                log::info!("network path unsatisfied; connectivity lost");
            }
        }
        tokio::time::sleep(interval).await;
    }
}
