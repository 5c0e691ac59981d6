//! Local secret cache contracts.
//!
//! A [`CacheProvider`] is an optional fast local store of `(value, version)`
//! pairs. A miss is a distinguished, expected outcome ([`CacheLookup::Miss`]),
//! never an error — provider failures travel on the `Result` layer instead.

pub mod keyring;

use async_trait::async_trait;

use crate::error::Result;

/// Outcome of a cache lookup. Absence is a state of its own, not a
/// zero-version entry and not an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheLookup {
    Hit { value: String, version: i64 },
    Miss,
}

/// Fast local store of versioned secret values.
///
/// There is no delete primitive; [`set`](CacheProvider::set) has upsert
/// semantics and overwrite-in-place is the only required guarantee.
#[async_trait]
pub trait CacheProvider: Send + Sync {
    /// Look up a cached entry.
    async fn get(&self, key: &str) -> Result<CacheLookup>;

    /// Store an entry, overwriting any existing entry for the same key.
    async fn set(&self, version: i64, key: &str, value: &str) -> Result<()>;
}
