//! File-backed [`PersistentCache`].
//!
//! Entries are JSON documents named `<key>.json` inside one directory per
//! namespace. All filesystem access happens on a dedicated worker thread in
//! submission order; see [`FileCache`] for the exact guarantees.

mod worker;

use std::io;
use std::path::PathBuf;

use camino::{Utf8Path, Utf8PathBuf};
use futures_util::FutureExt;
use futures_util::future::ready;
use places_core::{CacheFuture, CacheKey, CacheKeyError, ENTRY_EXTENSION, PersistentCache};
use places_fs::STAGING_SUFFIX;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::oneshot;

use worker::{EntryStore, Job, Worker};

/// Namespace used when none is configured.
pub const DEFAULT_NAMESPACE: &str = "places";

/// Errors raised while opening a [`FileCache`].
#[derive(Debug, Error)]
pub enum CacheBuildError {
    /// The platform exposes no documents directory.
    #[error("no documents directory is available on this platform")]
    NoDocumentsDir,
    /// The resolved directory is not valid UTF-8.
    #[error("cache directory {0:?} is not valid UTF-8")]
    NonUtf8Path(PathBuf),
    /// The namespace cannot name a directory.
    #[error("invalid cache namespace: {0}")]
    InvalidNamespace(#[source] CacheKeyError),
    /// The I/O worker thread could not be started.
    #[error("failed to start cache worker: {0}")]
    Worker(#[source] io::Error),
}

/// Where a [`FileCache`] keeps its entries.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Subdirectory holding this cache's entries.
    pub namespace: String,
    /// Parent directory; the platform documents directory when absent.
    pub directory: Option<Utf8PathBuf>,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            namespace: DEFAULT_NAMESPACE.to_owned(),
            directory: None,
        }
    }
}

impl CacheConfig {
    /// Set the namespace.
    #[must_use]
    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = namespace.into();
        self
    }

    /// Keep entries under `directory` instead of the documents directory.
    #[must_use]
    pub fn with_directory(mut self, directory: impl Into<Utf8PathBuf>) -> Self {
        self.directory = Some(directory.into());
        self
    }
}

/// [`PersistentCache`] storing one JSON file per key.
///
/// - Each call submits its job to the worker before returning, so
///   operations run in call order. The returned future only waits for the
///   result; dropping it does not cancel the job.
/// - `save` serialises on the calling thread, then the worker writes a
///   staging file and renames it over the entry.
/// - A `load` that cannot decode the entry deletes it within the same job.
/// - `clear` deletes every entry and stray staging file in the namespace.
/// - The directory is created by the first write. Until then every load is
///   a miss.
///
/// Failures are logged at `warn` and never returned.
#[derive(Debug)]
pub struct FileCache {
    root: Utf8PathBuf,
    worker: Worker,
}

impl FileCache {
    /// Keep entries directly in `root`.
    ///
    /// # Errors
    /// Returns [`CacheBuildError::Worker`] if the I/O thread cannot start.
    pub fn open(root: impl Into<Utf8PathBuf>) -> Result<Self, CacheBuildError> {
        let root = root.into();
        let worker = Worker::spawn(root.clone()).map_err(CacheBuildError::Worker)?;
        log::debug!("file cache opened at {root}");
        Ok(Self { root, worker })
    }

    /// Keep entries in `<documents>/<namespace>`.
    ///
    /// # Errors
    /// Returns [`CacheBuildError`] when the documents directory is unknown
    /// or not UTF-8, the namespace is not a single path component, or the
    /// I/O thread cannot start.
    pub fn in_documents_dir(namespace: &str) -> Result<Self, CacheBuildError> {
        let documents = dirs::document_dir().ok_or(CacheBuildError::NoDocumentsDir)?;
        let documents =
            Utf8PathBuf::from_path_buf(documents).map_err(CacheBuildError::NonUtf8Path)?;
        Self::in_directory(&documents, namespace)
    }

    /// Open the cache described by `config`.
    ///
    /// # Errors
    /// See [`FileCache::in_documents_dir`].
    pub fn from_config(config: &CacheConfig) -> Result<Self, CacheBuildError> {
        match &config.directory {
            Some(directory) => Self::in_directory(directory, &config.namespace),
            None => Self::in_documents_dir(&config.namespace),
        }
    }

    fn in_directory(parent: &Utf8Path, namespace: &str) -> Result<Self, CacheBuildError> {
        let namespace = CacheKey::parse(namespace).map_err(CacheBuildError::InvalidNamespace)?;
        Self::open(parent.join(namespace.as_str()))
    }

    /// Directory holding the entries.
    #[must_use]
    pub fn root(&self) -> &Utf8Path {
        &self.root
    }

    /// Path of the file backing `key`, if the key is valid.
    #[must_use]
    pub fn entry_path(&self, key: &str) -> Option<Utf8PathBuf> {
        CacheKey::parse(key)
            .ok()
            .map(|key| self.root.join(key.file_name()))
    }

    fn submit(&self, job: Job) -> bool {
        let accepted = self.worker.submit(job);
        if !accepted {
            log::warn!("cache worker for {} has stopped; dropping operation", self.root);
        }
        accepted
    }
}

fn completion<T: Send + 'static>(reply: oneshot::Receiver<T>, fallback: T) -> CacheFuture<T> {
    async move { reply.await.unwrap_or(fallback) }.boxed()
}

impl PersistentCache for FileCache {
    fn save<T>(&self, value: &T, key: &str) -> CacheFuture<()>
    where
        T: Serialize + ?Sized,
    {
        let file_name = match CacheKey::parse(key) {
            Ok(key) => key.file_name(),
            Err(err) => {
                log::warn!("skipping cache write: {err}");
                return ready(()).boxed();
            }
        };
        let bytes = match serde_json::to_vec(value) {
            Ok(bytes) => bytes,
            Err(err) => {
                log::warn!("failed to serialise cache entry {key:?}: {err}");
                return ready(()).boxed();
            }
        };
        let (reply, done) = oneshot::channel();
        self.submit(Box::new(move |store: &EntryStore| {
            match store.write(&file_name, &bytes) {
                Ok(()) => log::debug!("wrote cache entry {file_name} ({} bytes)", bytes.len()),
                Err(err) => log::warn!("failed to write cache entry {file_name}: {err}"),
            }
            reply_to(reply, ());
        }));
        completion(done, ())
    }

    fn load<T>(&self, key: &str) -> CacheFuture<Option<T>>
    where
        T: DeserializeOwned + Send + 'static,
    {
        let file_name = match CacheKey::parse(key) {
            Ok(key) => key.file_name(),
            Err(err) => {
                log::warn!("skipping cache read: {err}");
                return ready(None).boxed();
            }
        };
        let (reply, done) = oneshot::channel();
        self.submit(Box::new(move |store: &EntryStore| {
            reply_to(reply, load_entry(store, &file_name));
        }));
        completion(done, None)
    }

    fn clear(&self) -> CacheFuture<()> {
        let (reply, done) = oneshot::channel();
        self.submit(Box::new(move |store: &EntryStore| {
            let entries = format!(".{ENTRY_EXTENSION}");
            let staging = format!("{entries}{STAGING_SUFFIX}");
            match store.remove_matching(&[entries.as_str(), staging.as_str()]) {
                Ok(removed) => log::debug!("cleared {removed} cache files from {}", store.root()),
                Err(err) => log::warn!("failed to clear cache at {}: {err}", store.root()),
            }
            reply_to(reply, ());
        }));
        completion(done, ())
    }
}

/// Hand a job's result back. The caller may have dropped its future, in which
/// case the job still ran and only the result is discarded.
fn reply_to<T>(reply: oneshot::Sender<T>, value: T) {
    if reply.send(value).is_err() {
        log::debug!("cache caller stopped waiting for a result");
    }
}

fn load_entry<T: DeserializeOwned>(store: &EntryStore, file_name: &str) -> Option<T> {
    let bytes = match store.read(file_name) {
        Ok(bytes) => bytes?,
        Err(err) => {
            log::warn!("failed to read cache entry {file_name}: {err}");
            return None;
        }
    };
    match serde_json::from_slice(&bytes) {
        Ok(value) => Some(value),
        Err(err) => {
            log::warn!("discarding corrupt cache entry {file_name}: {err}");
            if let Err(err) = store.remove(file_name) {
                log::warn!("failed to remove corrupt cache entry {file_name}: {err}");
            }
            None
        }
    }
}
