//! Secret access sessions.
//!
//! A [`Session`] mediates every read and write between callers, the
//! authoritative [`StorageProvider`], and an optional [`CacheProvider`]. On
//! each read the configured [`UpsertPolicy`] decides whether a cached value
//! may be trusted or must be refreshed from storage; [`Session::sync`] bulk
//! hydrates the cache for whole key prefixes.
//!
//! Sessions hold no mutable state of their own. Concurrent use is safe to
//! the extent the underlying providers are; the version reconciliation is
//! best-effort, not linearizable. Every operation is a plain future with no
//! internal fan-out — callers cancel by dropping it (e.g. under
//! `tokio::time::timeout`), and nothing is retried after a failure.

pub mod populate;

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::cache::{CacheLookup, CacheProvider};
use crate::error::{Error, Result};
use crate::storage::StorageProvider;
use crate::uri;

/// Rule governing when a cached value may be trusted versus refreshed.
///
/// Configured once at session construction and immutable afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UpsertPolicy {
    /// Trust the cache only on an exact version match; any mismatch forces a
    /// refresh, including a cache that is ahead of the authoritative store.
    ReplaceDifferent,
    /// Trust the cache whenever it is not strictly behind the authoritative
    /// version; refresh only when storage is strictly newer.
    #[default]
    ReplaceNewer,
    /// Trust a present cache entry unconditionally, never probing the
    /// authoritative version. Meant for use after an explicit [`Session::sync`].
    SkipCheck,
}

/// Composition root over one storage provider and at most one cache.
pub struct Session {
    storage: Arc<dyn StorageProvider>,
    cache: Option<Arc<dyn CacheProvider>>,
    policy: UpsertPolicy,
}

impl Session {
    pub fn new(
        storage: Arc<dyn StorageProvider>,
        cache: Option<Arc<dyn CacheProvider>>,
        policy: UpsertPolicy,
    ) -> Self {
        Self {
            storage,
            cache,
            policy,
        }
    }

    /// Read a secret, returning its value and version.
    ///
    /// With no cache configured this is a single storage fetch. Otherwise the
    /// cached entry is consulted first and trusted or refreshed according to
    /// the session's [`UpsertPolicy`]; a refresh writes the fresh entry back
    /// to the cache before returning.
    pub async fn get(&self, key: &str) -> Result<(String, i64)> {
        if let Some(cache) = &self.cache {
            if let Some((value, version)) = self.try_cache(cache.as_ref(), key).await? {
                debug!(key, version, "serving from cache");
                return Ok((value, version));
            }
        }

        let mut records = self.storage.get(std::slice::from_ref(&key.to_string())).await?;
        if records.len() != 1 {
            return Err(Error::UnexpectedResultCount {
                count: records.len(),
            });
        }
        let record = records.remove(0);

        if let Some(cache) = &self.cache {
            cache.set(record.version, key, &record.value).await?;
            debug!(key, version = record.version, "cache refreshed from storage");
        }

        Ok((record.value, record.version))
    }

    /// Consult the cache and decide whether its entry may be trusted.
    ///
    /// `Ok(None)` means the caller must refresh from storage. A miss under
    /// `ReplaceDifferent`/`ReplaceNewer` compares as version 0, so a store
    /// that reports version 0 for the key yields the empty entry without a
    /// fetch. Cache failures other than a miss abort the whole read.
    async fn try_cache(
        &self,
        cache: &dyn CacheProvider,
        key: &str,
    ) -> Result<Option<(String, i64)>> {
        let (value, version) = match cache.get(key).await? {
            CacheLookup::Hit { value, version } => {
                if self.policy == UpsertPolicy::SkipCheck {
                    return Ok(Some((value, version)));
                }
                (value, version)
            }
            CacheLookup::Miss => {
                if self.policy == UpsertPolicy::SkipCheck {
                    return Ok(None);
                }
                (String::new(), 0)
            }
        };

        let latest = self.storage.latest_version(key).await?;
        if latest == version {
            return Ok(Some((value, version)));
        }
        if self.policy == UpsertPolicy::ReplaceNewer && latest <= version {
            debug!(key, cached = version, latest, "cache ahead of storage, trusting it");
            return Ok(Some((value, version)));
        }

        debug!(key, cached = version, latest, "cache stale, refreshing");
        Ok(None)
    }

    /// Write a secret to the authoritative store.
    ///
    /// The store assigns the next version. The cache is deliberately left
    /// untouched — the next [`get`](Session::get) observes the version change
    /// and refreshes, or a [`sync`](Session::sync) does.
    pub async fn set(&self, key: &str, value: &str) -> Result<()> {
        self.storage.set(key, value).await
    }

    /// Bulk-hydrate the cache for every key under the given prefixes.
    ///
    /// Requires a syncable storage provider and a configured cache; both
    /// preconditions are checked before any prefix is touched. Prefixes are
    /// processed in caller order and keys in enumeration order, each through
    /// [`get`](Session::get)'s own refresh logic. The first failure aborts
    /// the remaining work; keys hydrated before it stay hydrated.
    pub async fn sync(&self, prefixes: &[String]) -> Result<()> {
        let syncable = self.storage.as_syncable().ok_or(Error::SyncUnsupported)?;
        if self.cache.is_none() {
            return Err(Error::NoCacheConfigured);
        }

        for prefix in prefixes {
            let keys = syncable.keys_by_prefix(prefix).await?;
            debug!(prefix, count = keys.len(), "enumerated keys for sync");
            for key in &keys {
                self.get(key).await?;
            }
        }

        Ok(())
    }

    /// Resolve a `shush://<key>` reference held in the named environment
    /// variable and return the secret's value.
    pub async fn get_env(&self, var: &str) -> Result<String> {
        let raw = std::env::var(var).unwrap_or_default();
        let key = uri::parse_reference(&raw)?;
        let (value, _) = self.get(&key).await?;
        Ok(value)
    }
}
