//! Failure taxonomy shared by every network-facing component.

use std::error::Error as StdError;
use std::fmt;
use std::sync::Arc;

use thiserror::Error;

/// Shared handle to the lower-level error behind a [`NetworkError`].
///
/// The handle is cheap to clone so outcomes carrying an error can be cloned
/// and compared freely.
#[derive(Clone)]
pub struct Underlying(Arc<dyn StdError + Send + Sync>);

impl Underlying {
    /// Wrap an error value.
    pub fn new(error: impl Into<Box<dyn StdError + Send + Sync>>) -> Self {
        Self(Arc::from(error.into()))
    }

    /// Borrow the wrapped error.
    #[must_use]
    pub fn get(&self) -> &(dyn StdError + Send + Sync + 'static) {
        self.0.as_ref()
    }
}

impl fmt::Debug for Underlying {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&*self.0, f)
    }
}

impl fmt::Display for Underlying {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&*self.0, f)
    }
}

impl StdError for Underlying {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.0.source()
    }
}

/// Errors produced by a [`Transport`](crate::Transport) fetch.
///
/// The set is closed: caches never add kinds and the repository only relays
/// these. Equality compares the kind and the status code; wrapped
/// lower-level errors and rejected URL text are ignored.
#[derive(Debug, Clone, Error)]
pub enum NetworkError {
    /// The connectivity gate reported no usable network path.
    #[error("no internet connection")]
    NoConnection,
    /// The request URL could not be parsed.
    #[error("the URL {0:?} is invalid")]
    BadUrl(String),
    /// The request never produced a response (timeout, DNS, refused, I/O).
    #[error("network request failed: {0}")]
    RequestFailed(#[source] Underlying),
    /// A response arrived with a status outside `200..=299`.
    #[error("unexpected HTTP status code {0}")]
    Status(u16),
    /// The response body did not decode into the requested shape.
    #[error("failed to decode response: {0}")]
    DecodingFailed(#[source] Underlying),
}

impl NetworkError {
    /// Build a [`NetworkError::RequestFailed`] from any error value.
    pub fn request_failed(error: impl Into<Box<dyn StdError + Send + Sync>>) -> Self {
        Self::RequestFailed(Underlying::new(error))
    }

    /// Build a [`NetworkError::DecodingFailed`] from any error value.
    pub fn decoding_failed(error: impl Into<Box<dyn StdError + Send + Sync>>) -> Self {
        Self::DecodingFailed(Underlying::new(error))
    }

    /// Coarse classification used when choosing how to describe a failure.
    #[must_use]
    pub const fn category(&self) -> FailureCategory {
        match self {
            Self::NoConnection => FailureCategory::Connectivity,
            Self::RequestFailed(_) | Self::Status(_) => FailureCategory::Server,
            Self::BadUrl(_) | Self::DecodingFailed(_) => FailureCategory::Data,
        }
    }
}

impl PartialEq for NetworkError {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::NoConnection, Self::NoConnection)
            | (Self::BadUrl(_), Self::BadUrl(_))
            | (Self::RequestFailed(_), Self::RequestFailed(_))
            | (Self::DecodingFailed(_), Self::DecodingFailed(_)) => true,
            (Self::Status(lhs), Self::Status(rhs)) => lhs == rhs,
            _ => false,
        }
    }
}

impl Eq for NetworkError {}

/// Broad family of a [`NetworkError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureCategory {
    /// The device is offline.
    Connectivity,
    /// The server was unreachable or answered with an error status.
    Server,
    /// The request or the payload was malformed.
    Data,
}
