//! `reqwest`-backed [`Transport`].

use std::time::Duration;

use async_trait::async_trait;
use places_core::transport::{check_status, decode_body, parse_url};
use places_core::{ConnectivityGate, FetchRequest, HttpMethod, NetworkError, Transport};
use reqwest::{Client, Method, RequestBuilder};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use thiserror::Error;
use url::Url;

use crate::config::duration_secs;

/// Default user agent sent with every request.
pub const DEFAULT_USER_AGENT: &str = "places-engine/0.1";

/// Default request timeout in seconds.
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Error raised while constructing an [`HttpTransport`].
#[derive(Debug, Error)]
pub enum TransportBuildError {
    /// The HTTP client rejected its configuration.
    #[error("failed to build HTTP client: {0}")]
    HttpClient(#[source] reqwest::Error),
}

/// Configuration for [`HttpTransport`].
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct HttpTransportConfig {
    /// Bound on connecting and on the whole exchange.
    #[serde(rename = "timeout_secs", deserialize_with = "duration_secs")]
    pub timeout: Duration,
    /// User agent string for requests.
    pub user_agent: String,
}

impl Default for HttpTransportConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            user_agent: DEFAULT_USER_AGENT.to_owned(),
        }
    }
}

impl HttpTransportConfig {
    /// Set the request timeout.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the user agent string.
    #[must_use]
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }
}

/// Transport that performs real HTTP exchanges.
///
/// Each fetch consults the connectivity gate, parses the URL, sends the
/// request, requires a `2xx` status, reads the whole body and decodes it as
/// JSON, stopping at the first failure. Nothing is retried or cached.
#[derive(Debug, Clone)]
pub struct HttpTransport<G> {
    client: Client,
    gate: G,
    config: HttpTransportConfig,
}

impl<G: ConnectivityGate> HttpTransport<G> {
    /// Create a transport with default configuration.
    ///
    /// # Errors
    /// Returns [`TransportBuildError`] if the HTTP client fails to build.
    pub fn new(gate: G) -> Result<Self, TransportBuildError> {
        Self::with_config(gate, HttpTransportConfig::default())
    }

    /// Create a transport with explicit configuration.
    ///
    /// # Errors
    /// Returns [`TransportBuildError`] if the HTTP client fails to build.
    pub fn with_config(gate: G, config: HttpTransportConfig) -> Result<Self, TransportBuildError> {
        let client = Client::builder()
            .user_agent(&config.user_agent)
            .connect_timeout(config.timeout)
            .timeout(config.timeout)
            .build()
            .map_err(TransportBuildError::HttpClient)?;
        Ok(Self {
            client,
            gate,
            config,
        })
    }

    /// Active configuration.
    #[must_use]
    pub const fn config(&self) -> &HttpTransportConfig {
        &self.config
    }

    /// Connectivity gate consulted before each request.
    #[must_use]
    pub const fn gate(&self) -> &G {
        &self.gate
    }

    fn build_request(&self, url: Url, request: FetchRequest) -> RequestBuilder {
        let mut builder = self.client.request(to_method(request.method), url);
        for (name, value) in request.headers {
            builder = builder.header(name, value);
        }
        if let Some(body) = request.body {
            builder = builder.body(body);
        }
        builder
    }
}

const fn to_method(method: HttpMethod) -> Method {
    match method {
        HttpMethod::Get => Method::GET,
        HttpMethod::Post => Method::POST,
        HttpMethod::Put => Method::PUT,
        HttpMethod::Delete => Method::DELETE,
    }
}

#[async_trait]
impl<G: ConnectivityGate> Transport for HttpTransport<G> {
    async fn fetch<T>(&self, request: FetchRequest) -> Result<T, NetworkError>
    where
        T: DeserializeOwned + Send + 'static,
    {
        if !self.gate.check_connection().await {
            log::debug!("refusing {} {}: offline", request.method.as_str(), request.url);
            return Err(NetworkError::NoConnection);
        }
        let url = parse_url(&request.url)?;
        log::debug!("{} {url}", request.method.as_str());

        let response = self
            .build_request(url, request)
            .send()
            .await
            .map_err(NetworkError::request_failed)?;
        let status = response.status().as_u16();
        if let Err(err) = check_status(status) {
            log::debug!("{} answered with status {status}", response.url());
            return Err(err);
        }
        let body = response
            .bytes()
            .await
            .map_err(NetworkError::request_failed)?;
        decode_body(&body)
    }
}
