//! Typed access to the remote list of locations.

use std::sync::Arc;

use async_trait::async_trait;

use crate::{NetworkError, Point};

/// Fetch the current list of points from the remote endpoint.
///
/// Errors from the underlying [`Transport`](crate::Transport) pass through
/// unchanged.
#[async_trait]
pub trait LocationSource: Send + Sync {
    /// Fetch every point, preserving payload order and duplicates.
    async fn fetch_locations(&self) -> Result<Vec<Point>, NetworkError>;
}

#[async_trait]
impl<S> LocationSource for Arc<S>
where
    S: LocationSource + ?Sized,
{
    async fn fetch_locations(&self) -> Result<Vec<Point>, NetworkError> {
        (**self).fetch_locations().await
    }
}
