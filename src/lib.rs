//! shush — versioned secret access with policy-driven local caching.
//!
//! Secrets live in an authoritative versioned store (AWS Parameter Store or
//! a git-versioned JSON document); an optional local cache (the OS
//! credential store) avoids redundant remote reads. On every read a
//! [`Session`] decides, under its [`UpsertPolicy`], whether the cached value
//! may be trusted or must be refreshed, and [`Session::sync`] bulk-hydrates
//! the cache for whole key prefixes.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use shush::storage::json_git::JsonGit;
//! use shush::{Session, UpsertPolicy};
//!
//! # async fn example() -> shush::Result<()> {
//! let storage = Arc::new(JsonGit::new("/srv/secrets", "secrets.json", None, "  "));
//! let session = Session::new(storage, None, UpsertPolicy::ReplaceNewer);
//!
//! let (value, version) = session.get("dev.db.password").await?;
//! println!("v{version}: {value}");
//! # Ok(())
//! # }
//! ```

pub mod cache;
pub mod cli;
pub mod config;
pub mod error;
pub mod logging;
pub mod session;
pub mod storage;
pub mod uri;

pub use cache::{CacheLookup, CacheProvider};
pub use error::{Error, Result};
pub use session::populate::{SecretBound, SecretField};
pub use session::{Session, UpsertPolicy};
pub use storage::{SecretRecord, StorageProvider, SyncableStorage};
