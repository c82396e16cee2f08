//! Network path probes.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures_util::FutureExt;
use futures_util::future::{BoxFuture, select_ok};
use tokio::net::TcpStream;

use super::ConnectivityConfig;

/// Whether a usable network path exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathStatus {
    /// Traffic can leave the device.
    Satisfied,
    /// No route is currently available.
    Unsatisfied,
}

impl PathStatus {
    /// `true` for [`PathStatus::Satisfied`].
    #[must_use]
    pub const fn is_satisfied(self) -> bool {
        matches!(self, Self::Satisfied)
    }
}

/// A single observation of the network path.
#[async_trait]
pub trait PathProbe: Send + Sync {
    /// Observe the path once.
    async fn probe(&self) -> PathStatus;
}

#[async_trait]
impl<P> PathProbe for Arc<P>
where
    P: PathProbe + ?Sized,
{
    async fn probe(&self) -> PathStatus {
        (**self).probe().await
    }
}

/// Probe that opens TCP connections to well-known hosts.
///
/// The path is satisfied as soon as any target accepts a connection within
/// the timeout. Attempts run concurrently. With no targets configured there is
/// nothing to disprove, so the path is reported as satisfied.
#[derive(Debug, Clone)]
pub struct TcpPathProbe {
    targets: Vec<String>,
    timeout: Duration,
}

impl TcpPathProbe {
    /// Probe `targets` (`host:port`), giving each attempt `timeout`.
    pub fn new<I, S>(targets: I, timeout: Duration) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            targets: targets.into_iter().map(Into::into).collect(),
            timeout,
        }
    }

    /// Build from the targets and timeout in `config`.
    #[must_use]
    pub fn from_config(config: &ConnectivityConfig) -> Self {
        Self::new(config.targets.iter().cloned(), config.probe_timeout)
    }

    /// Configured targets.
    #[must_use]
    pub fn targets(&self) -> &[String] {
        &self.targets
    }

    fn attempt(&self, target: &str) -> BoxFuture<'_, Result<(), ()>> {
        let target = target.to_owned();
        async move {
            match tokio::time::timeout(self.timeout, TcpStream::connect(target.as_str())).await {
                Ok(Ok(_stream)) => Ok(()),
                Ok(Err(err)) => {
                    log::debug!("connectivity probe to {target} failed: {err}");
                    Err(())
                }
                Err(_elapsed) => {
                    log::debug!("connectivity probe to {target} timed out");
                    Err(())
                }
            }
        }
        .boxed()
    }
}

#[async_trait]
impl PathProbe for TcpPathProbe {
    async fn probe(&self) -> PathStatus {
        if self.targets.is_empty() {
            return PathStatus::Satisfied;
        }
        let attempts = self.targets.iter().map(|target| self.attempt(target));
        match select_ok(attempts).await {
            Ok(((), _pending)) => PathStatus::Satisfied,
            Err(()) => PathStatus::Unsatisfied,
        }
    }
}
