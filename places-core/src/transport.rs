//! Request description and the transport abstraction.
//!
//! A [`Transport`] runs one request/response cycle and decodes the body into
//! a caller-chosen shape. Every failure maps onto [`NetworkError`]; retries
//! and caching belong to the caller.

use std::sync::Arc;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use url::Url;

use crate::NetworkError;

/// HTTP verbs supported by [`FetchRequest`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum HttpMethod {
    /// `GET`
    #[default]
    Get,
    /// `POST`
    Post,
    /// `PUT`
    Put,
    /// `DELETE`
    Delete,
}

impl HttpMethod {
    /// Upper-case method token.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Delete => "DELETE",
        }
    }
}

/// A single request for [`Transport::fetch`].
///
/// # Examples
/// ```
/// use places_core::{FetchRequest, HttpMethod};
///
/// let request = FetchRequest::get("https://example.org/locations.json")
///     .with_header("Accept", "application/json");
/// assert_eq!(request.method, HttpMethod::Get);
/// assert_eq!(request.headers.len(), 1);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchRequest {
    /// Raw URL; parsed by the transport.
    pub url: String,
    /// Request method.
    pub method: HttpMethod,
    /// Extra headers, applied in order.
    pub headers: Vec<(String, String)>,
    /// Optional request body.
    pub body: Option<Vec<u8>>,
}

impl FetchRequest {
    /// Request `url` with `method`, no headers and no body.
    pub fn new(url: impl Into<String>, method: HttpMethod) -> Self {
        Self {
            url: url.into(),
            method,
            headers: Vec::new(),
            body: None,
        }
    }

    /// Shorthand for a `GET` request.
    pub fn get(url: impl Into<String>) -> Self {
        Self::new(url, HttpMethod::Get)
    }

    /// Append a header.
    #[must_use]
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Attach a body.
    #[must_use]
    pub fn with_body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = Some(body.into());
        self
    }
}

/// Perform a request and decode the response body.
///
/// Implementations follow a fixed order and stop at the first failure:
/// connectivity, URL parsing, the exchange itself, the status code, then
/// decoding. They hold no per-request mutable state and are safe to share.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Fetch `request` and decode the body as `T`.
    async fn fetch<T>(&self, request: FetchRequest) -> Result<T, NetworkError>
    where
        T: DeserializeOwned + Send + 'static;
}

#[async_trait]
impl<C> Transport for Arc<C>
where
    C: Transport + ?Sized,
{
    async fn fetch<T>(&self, request: FetchRequest) -> Result<T, NetworkError>
    where
        T: DeserializeOwned + Send + 'static,
    {
        (**self).fetch(request).await
    }
}

/// Parse a request URL, rejecting anything that is not absolute.
///
/// # Errors
/// Returns [`NetworkError::BadUrl`] carrying the rejected input.
pub fn parse_url(raw: &str) -> Result<Url, NetworkError> {
    Url::parse(raw).map_err(|_| NetworkError::BadUrl(raw.to_owned()))
}

/// Accept only `2xx` status codes.
///
/// # Errors
/// Returns [`NetworkError::Status`] for any code outside `200..=299`.
pub const fn check_status(code: u16) -> Result<(), NetworkError> {
    if code >= 200 && code <= 299 {
        Ok(())
    } else {
        Err(NetworkError::Status(code))
    }
}

/// Decode a JSON body into `T`.
///
/// # Errors
/// Returns [`NetworkError::DecodingFailed`] wrapping the `serde_json` error,
/// including for an empty body.
pub fn decode_body<T: DeserializeOwned>(body: &[u8]) -> Result<T, NetworkError> {
    serde_json::from_slice(body).map_err(NetworkError::decoding_failed)
}
