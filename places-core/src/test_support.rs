//! In-memory stand-ins for every component seam.
//!
//! These doubles make no network or filesystem calls and follow the same
//! contracts as the production adapters, so policy code can be exercised
//! deterministically.

use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use futures_util::FutureExt;
use futures_util::future::ready;
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::transport::{check_status, decode_body, parse_url};
use crate::{
    CacheFuture, CacheKey, ConnectivityGate, FetchRequest, LocationSource, LocationsResponse,
    NetworkError, PersistentCache, Point, Transport,
};

/// Drive `future` to completion on a fresh current-thread Tokio runtime.
///
/// # Panics
/// Panics when the runtime cannot be created.
pub fn block_on_for_tests<F: Future>(future: F) -> F::Output {
    match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime.block_on(future),
        Err(err) => panic!("failed to build test runtime: {err}"),
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Connectivity gate whose answer is set directly.
#[derive(Debug)]
pub struct FixedConnectivity {
    connected: AtomicBool,
}

impl FixedConnectivity {
    /// Gate reporting `connected`.
    #[must_use]
    pub const fn new(connected: bool) -> Self {
        Self {
            connected: AtomicBool::new(connected),
        }
    }

    /// Change the reported state.
    pub fn set(&self, connected: bool) {
        self.connected.store(connected, Ordering::SeqCst);
    }
}

impl Default for FixedConnectivity {
    fn default() -> Self {
        Self::new(true)
    }
}

#[async_trait]
impl ConnectivityGate for FixedConnectivity {
    async fn check_connection(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }
}

#[derive(Debug, Clone)]
enum StubResponse {
    Body { status: u16, body: Vec<u8> },
    Error(NetworkError),
}

/// Transport returning a canned response.
///
/// Applies the same ordering as the HTTP client: connectivity, URL parsing,
/// the canned exchange, status check, then JSON decoding.
#[derive(Debug)]
pub struct StubTransport {
    connectivity: FixedConnectivity,
    response: StubResponse,
    requests: Mutex<Vec<FetchRequest>>,
}

impl StubTransport {
    /// Answer every request with `200 OK` and `body`.
    pub fn with_json(body: impl Into<Vec<u8>>) -> Self {
        Self::with_status(200, body)
    }

    /// Answer every request with `status` and `body`.
    pub fn with_status(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self::from_response(StubResponse::Body {
            status,
            body: body.into(),
        })
    }

    /// Fail every exchange with `error` once the earlier checks pass.
    #[must_use]
    pub fn with_error(error: NetworkError) -> Self {
        Self::from_response(StubResponse::Error(error))
    }

    fn from_response(response: StubResponse) -> Self {
        Self {
            connectivity: FixedConnectivity::default(),
            response,
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Report no connectivity.
    #[must_use]
    pub fn offline(self) -> Self {
        self.connectivity.set(false);
        self
    }

    /// Requests that reached the exchange step, in order.
    pub fn requests(&self) -> Vec<FetchRequest> {
        lock(&self.requests).clone()
    }
}

#[async_trait]
impl Transport for StubTransport {
    async fn fetch<T>(&self, request: FetchRequest) -> Result<T, NetworkError>
    where
        T: DeserializeOwned + Send + 'static,
    {
        if !self.connectivity.check_connection().await {
            return Err(NetworkError::NoConnection);
        }
        parse_url(&request.url)?;
        lock(&self.requests).push(request);
        match &self.response {
            StubResponse::Error(error) => Err(error.clone()),
            StubResponse::Body { status, body } => {
                check_status(*status)?;
                decode_body(body)
            }
        }
    }
}

/// Location source returning fixed points or a fixed error.
#[derive(Debug)]
pub struct StubLocationSource {
    response: Result<Vec<Point>, NetworkError>,
    calls: AtomicUsize,
}

impl StubLocationSource {
    /// Succeed with `points`.
    #[must_use]
    pub const fn with_points(points: Vec<Point>) -> Self {
        Self {
            response: Ok(points),
            calls: AtomicUsize::new(0),
        }
    }

    /// Fail with `error`.
    #[must_use]
    pub const fn with_error(error: NetworkError) -> Self {
        Self {
            response: Err(error),
            calls: AtomicUsize::new(0),
        }
    }

    /// Number of fetches made so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl LocationSource for StubLocationSource {
    async fn fetch_locations(&self) -> Result<Vec<Point>, NetworkError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.response.clone()
    }
}

/// Decode a canned locations payload the way the HTTP source does.
///
/// # Errors
/// Returns [`NetworkError::DecodingFailed`] for malformed payloads.
pub fn decode_locations(body: &[u8]) -> Result<Vec<Point>, NetworkError> {
    decode_body::<LocationsResponse>(body).map(|response| response.locations)
}

/// Cache keeping JSON bytes in memory.
///
/// Mirrors the file cache: values are serialised with `serde_json`, entries
/// that fail to decode are removed on load, and invalid keys are ignored.
/// Every `save` and `load` key is recorded for assertions.
#[derive(Debug, Default)]
pub struct MemoryCache {
    entries: Mutex<HashMap<String, Vec<u8>>>,
    saved_keys: Mutex<Vec<String>>,
    loaded_keys: Mutex<Vec<String>>,
    reject_writes: bool,
}

impl MemoryCache {
    /// Cache whose writes are always dropped, as if the disk were full.
    #[must_use]
    pub fn rejecting_writes() -> Self {
        Self {
            reject_writes: true,
            ..Self::default()
        }
    }

    /// Builder form of [`MemoryCache::insert`].
    #[must_use]
    pub fn with_entry<T: Serialize + ?Sized>(self, key: &str, value: &T) -> Self {
        self.insert(key, value);
        self
    }

    /// Store `value` directly, bypassing recording and write rejection.
    ///
    /// # Panics
    /// Panics when `value` cannot be serialised.
    pub fn insert<T: Serialize + ?Sized>(&self, key: &str, value: &T) {
        match serde_json::to_vec(value) {
            Ok(bytes) => self.insert_raw(key, bytes),
            Err(err) => panic!("test value for {key:?} must serialise: {err}"),
        }
    }

    /// Store raw bytes, e.g. to simulate corruption.
    pub fn insert_raw(&self, key: &str, bytes: Vec<u8>) {
        lock(&self.entries).insert(key.to_owned(), bytes);
    }

    /// Whether an entry exists for `key`.
    pub fn contains(&self, key: &str) -> bool {
        lock(&self.entries).contains_key(key)
    }

    /// Keys passed to `save`, in call order.
    pub fn saved_keys(&self) -> Vec<String> {
        lock(&self.saved_keys).clone()
    }

    /// Keys passed to `load`, in call order.
    pub fn loaded_keys(&self) -> Vec<String> {
        lock(&self.loaded_keys).clone()
    }
}

impl PersistentCache for MemoryCache {
    fn save<T>(&self, value: &T, key: &str) -> CacheFuture<()>
    where
        T: Serialize + ?Sized,
    {
        lock(&self.saved_keys).push(key.to_owned());
        if let Err(err) = CacheKey::parse(key) {
            log::warn!("skipping cache write: {err}");
        } else if self.reject_writes {
            log::warn!("cache write for {key:?} rejected");
        } else {
            match serde_json::to_vec(value) {
                Ok(bytes) => self.insert_raw(key, bytes),
                Err(err) => log::warn!("failed to serialise cache entry {key:?}: {err}"),
            }
        }
        ready(()).boxed()
    }

    fn load<T>(&self, key: &str) -> CacheFuture<Option<T>>
    where
        T: DeserializeOwned + Send + 'static,
    {
        lock(&self.loaded_keys).push(key.to_owned());
        let mut entries = lock(&self.entries);
        let decoded = entries.get(key).and_then(|bytes| {
            serde_json::from_slice(bytes)
                .map_err(|err| log::warn!("discarding corrupt cache entry {key:?}: {err}"))
                .ok()
        });
        if decoded.is_none() {
            entries.remove(key);
        }
        ready(decoded).boxed()
    }

    fn clear(&self) -> CacheFuture<()> {
        lock(&self.entries).clear();
        ready(()).boxed()
    }
}
