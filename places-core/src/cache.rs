//! Durable key-value storage for serialised payloads.
//!
//! Every [`PersistentCache`] operation is *submitted* when the method is
//! called and the returned future only reports completion. Operations on the
//! same key therefore run in call order regardless of when, or whether, the
//! caller awaits them, and dropping a returned future never cancels a write
//! that has already been submitted.

use std::sync::Arc;

use futures_util::future::BoxFuture;
use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;

/// Extension used for on-disk entries.
pub const ENTRY_EXTENSION: &str = "json";

/// Future returned by [`PersistentCache`] operations.
pub type CacheFuture<T> = BoxFuture<'static, T>;

/// Store and retrieve serialisable values under string keys.
///
/// Failures never reach the caller: a failed `save` is logged and treated as
/// not performed, and an entry that cannot be read back is reported as
/// absent.
pub trait PersistentCache: Send + Sync {
    /// Serialise `value` and overwrite the entry for `key`.
    fn save<T>(&self, value: &T, key: &str) -> CacheFuture<()>
    where
        T: Serialize + ?Sized;

    /// Read the entry for `key`.
    ///
    /// Resolves to `None` when nothing is stored. An entry that does not
    /// decode as `T` is deleted and also reported as `None`.
    fn load<T>(&self, key: &str) -> CacheFuture<Option<T>>
    where
        T: DeserializeOwned + Send + 'static;

    /// Remove every entry written through this cache.
    fn clear(&self) -> CacheFuture<()>;
}

impl<C> PersistentCache for Arc<C>
where
    C: PersistentCache + ?Sized,
{
    fn save<T>(&self, value: &T, key: &str) -> CacheFuture<()>
    where
        T: Serialize + ?Sized,
    {
        (**self).save(value, key)
    }

    fn load<T>(&self, key: &str) -> CacheFuture<Option<T>>
    where
        T: DeserializeOwned + Send + 'static,
    {
        (**self).load(key)
    }

    fn clear(&self) -> CacheFuture<()> {
        (**self).clear()
    }
}

/// Reasons a string cannot name a cache entry.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CacheKeyError {
    /// The key was empty.
    #[error("cache key must not be empty")]
    Empty,
    /// The key is a relative path component.
    #[error("cache key {0:?} is reserved")]
    Reserved(String),
    /// The key contains a path separator or NUL.
    #[error("cache key {key:?} contains forbidden character {found:?}")]
    ForbiddenCharacter {
        /// Offending key.
        key: String,
        /// First forbidden character found.
        found: char,
    },
}

/// A validated cache key.
///
/// Keys map one-to-one onto entry names, so a key may not smuggle in a path.
///
/// # Examples
/// ```
/// use places_core::CacheKey;
///
/// let key = CacheKey::parse("Locations")?;
/// assert_eq!(key.file_name(), "Locations.json");
/// assert!(CacheKey::parse("../escape").is_err());
/// # Ok::<(), places_core::CacheKeyError>(())
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CacheKey<'a>(&'a str);

impl<'a> CacheKey<'a> {
    /// Validate `raw` as a cache key.
    ///
    /// # Errors
    /// Returns [`CacheKeyError`] for empty keys, `.`/`..`, and keys holding
    /// `/`, `\` or NUL.
    pub fn parse(raw: &'a str) -> Result<Self, CacheKeyError> {
        if raw.is_empty() {
            return Err(CacheKeyError::Empty);
        }
        if raw == "." || raw == ".." {
            return Err(CacheKeyError::Reserved(raw.to_owned()));
        }
        if let Some(found) = raw.chars().find(|ch| matches!(ch, '/' | '\\' | '\0')) {
            return Err(CacheKeyError::ForbiddenCharacter {
                key: raw.to_owned(),
                found,
            });
        }
        Ok(Self(raw))
    }

    /// The key text.
    #[must_use]
    pub const fn as_str(&self) -> &'a str {
        self.0
    }

    /// Entry name derived from the key: `<key>.json`.
    #[must_use]
    pub fn file_name(&self) -> String {
        format!("{}.{ENTRY_EXTENSION}", self.0)
    }
}
