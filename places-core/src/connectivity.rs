//! Reachability oracle consulted before any network attempt.

use std::sync::Arc;

use async_trait::async_trait;

/// Reports whether a usable network path currently exists.
///
/// Implementations answer from state pushed by a background monitor and
/// never probe the network on a query. Queries may come from many tasks at
/// once.
#[async_trait]
pub trait ConnectivityGate: Send + Sync {
    /// Latest known reachability.
    async fn check_connection(&self) -> bool;
}

#[async_trait]
impl<G> ConnectivityGate for Arc<G>
where
    G: ConnectivityGate + ?Sized,
{
    async fn check_connection(&self) -> bool {
        (**self).check_connection().await
    }
}
