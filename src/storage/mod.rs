//! Authoritative secret storage contracts.
//!
//! A [`StorageProvider`] is the source of truth for secret values and their
//! versions. Providers that can enumerate keys under a prefix additionally
//! expose [`SyncableStorage`] through the explicit [`StorageProvider::as_syncable`]
//! capability check — there is no downcasting.

pub mod json_git;
pub mod param_store;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// A secret value together with the version the store assigned to it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecretRecord {
    pub value: String,
    pub version: i64,
}

/// Authoritative key/value store with monotonically non-decreasing integer
/// versions per key. Versions are assigned exclusively by the store on
/// [`set`](StorageProvider::set); readers never assign versions.
#[async_trait]
pub trait StorageProvider: Send + Sync {
    /// Fetch current values for the given keys.
    ///
    /// The session only ever calls this with exactly one key and treats any
    /// other result count as an invariant violation.
    async fn get(&self, keys: &[String]) -> Result<Vec<SecretRecord>>;

    /// Write a new value. The store atomically assigns the next version;
    /// callers must re-read to learn it.
    async fn set(&self, key: &str, value: &str) -> Result<()>;

    /// Cheap version probe without transferring the value.
    async fn latest_version(&self, key: &str) -> Result<i64>;

    /// Prefix enumeration capability, if this provider has one.
    fn as_syncable(&self) -> Option<&dyn SyncableStorage> {
        None
    }
}

/// Optional storage extension: enumerate keys under a prefix.
#[async_trait]
pub trait SyncableStorage: Send + Sync {
    /// All keys beginning with `prefix`, as one flattened sequence.
    ///
    /// Pagination is the provider's internal concern. An empty result is a
    /// valid answer, not an error.
    async fn keys_by_prefix(&self, prefix: &str) -> Result<Vec<String>>;
}
