//! Locations endpoint client.

use async_trait::async_trait;
use places_core::{FetchRequest, LocationSource, LocationsResponse, NetworkError, Point, Transport};

/// Endpoint serving the canonical locations list.
pub const DEFAULT_LOCATIONS_URL: &str =
    "https://raw.githubusercontent.com/abnamrocoesd/assignment-ios/main/locations.json";

/// [`LocationSource`] that `GET`s a `{"locations": [...]}` document.
#[derive(Debug, Clone)]
pub struct HttpLocationSource<T> {
    transport: T,
    endpoint: String,
}

impl<T: Transport> HttpLocationSource<T> {
    /// Fetch from [`DEFAULT_LOCATIONS_URL`].
    pub fn new(transport: T) -> Self {
        Self::with_endpoint(transport, DEFAULT_LOCATIONS_URL)
    }

    /// Fetch from `endpoint` instead.
    pub fn with_endpoint(transport: T, endpoint: impl Into<String>) -> Self {
        Self {
            transport,
            endpoint: endpoint.into(),
        }
    }

    /// URL requested on each fetch.
    #[must_use]
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl<T: Transport> LocationSource for HttpLocationSource<T> {
    async fn fetch_locations(&self) -> Result<Vec<Point>, NetworkError> {
        let request =
            FetchRequest::get(self.endpoint.as_str()).with_header("Accept", "application/json");
        let response: LocationsResponse = self.transport.fetch(request).await?;
        Ok(response.locations)
    }
}
