//! End-to-end session flows over real on-disk storage.
//!
//! These tests exercise the full get → reconcile → cache write path against
//! a JsonGit document in local mode (no remote, so git is never invoked) and
//! an in-memory cache standing in for the OS credential store.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use shush::storage::json_git::JsonGit;
use shush::{CacheLookup, CacheProvider, Error, Result, Session, UpsertPolicy};
use tempfile::TempDir;

/// In-memory cache with the contract of the real credential-store cache.
#[derive(Default)]
struct MemoryCache {
    entries: Mutex<HashMap<String, (String, i64)>>,
}

#[async_trait]
impl CacheProvider for MemoryCache {
    async fn get(&self, key: &str) -> Result<CacheLookup> {
        Ok(match self.entries.lock().unwrap().get(key) {
            Some((value, version)) => CacheLookup::Hit {
                value: value.clone(),
                version: *version,
            },
            None => CacheLookup::Miss,
        })
    }

    async fn set(&self, version: i64, key: &str, value: &str) -> Result<()> {
        self.entries
            .lock()
            .unwrap()
            .insert(key.to_string(), (value.to_string(), version));
        Ok(())
    }
}

fn local_store(dir: &TempDir) -> Arc<JsonGit> {
    std::fs::write(dir.path().join("secrets.json"), "{}").unwrap();
    Arc::new(JsonGit::new(dir.path(), "secrets.json", None, "  "))
}

#[tokio::test]
async fn write_then_read_round_trip() {
    let dir = TempDir::new().unwrap();
    let session = Session::new(local_store(&dir), None, UpsertPolicy::ReplaceNewer);

    session.set("dev.api.token", "tok-1").await.unwrap();
    let (value, version) = session.get("dev.api.token").await.unwrap();
    assert_eq!(value, "tok-1");
    assert_eq!(version, 1);

    session.set("dev.api.token", "tok-2").await.unwrap();
    let (value, version) = session.get("dev.api.token").await.unwrap();
    assert_eq!(value, "tok-2");
    assert_eq!(version, 2);
}

#[tokio::test]
async fn cached_read_follows_writes_through_the_version_probe() {
    let dir = TempDir::new().unwrap();
    let storage = local_store(&dir);
    let cache = Arc::new(MemoryCache::default());
    let session = Session::new(storage, Some(cache.clone()), UpsertPolicy::ReplaceNewer);

    session.set("dev.db.password", "first").await.unwrap();
    assert_eq!(session.get("dev.db.password").await.unwrap().1, 1);

    // The write bypasses the cache entirely; the next read notices the newer
    // authoritative version and refreshes.
    session.set("dev.db.password", "second").await.unwrap();
    let (value, version) = session.get("dev.db.password").await.unwrap();
    assert_eq!(value, "second");
    assert_eq!(version, 2);

    let entries = cache.entries.lock().unwrap();
    assert_eq!(entries["dev.db.password"], ("second".to_string(), 2));
}

#[tokio::test]
async fn skip_check_serves_stale_values_without_touching_storage() {
    let dir = TempDir::new().unwrap();
    let storage = local_store(&dir);
    let cache = Arc::new(MemoryCache::default());

    // Hydrate through a checking session, then go behind its back.
    let session = Session::new(storage.clone(), Some(cache.clone()), UpsertPolicy::ReplaceNewer);
    session.set("dev.flag", "old").await.unwrap();
    session.get("dev.flag").await.unwrap();
    session.set("dev.flag", "new").await.unwrap();

    // A SkipCheck session keeps serving the hydrated value.
    let offline = Session::new(storage, Some(cache), UpsertPolicy::SkipCheck);
    let (value, version) = offline.get("dev.flag").await.unwrap();
    assert_eq!(value, "old");
    assert_eq!(version, 1);
}

#[tokio::test]
async fn sync_is_refused_without_prefix_enumeration() {
    // JsonGit has no prefix enumeration, exactly like the original backend.
    let dir = TempDir::new().unwrap();
    let cache = Arc::new(MemoryCache::default());
    let session = Session::new(local_store(&dir), Some(cache), UpsertPolicy::ReplaceNewer);

    let err = session.sync(&["dev.".to_string()]).await.unwrap_err();
    assert!(matches!(err, Error::SyncUnsupported));
}

#[tokio::test]
async fn populate_hydrates_a_config_struct() {
    use shush::{SecretBound, SecretField};

    #[derive(Default)]
    struct AppConfig {
        token: String,
        password: String,
    }

    impl SecretBound for AppConfig {
        fn secret_fields(&mut self) -> Vec<SecretField<'_>> {
            vec![
                SecretField::mapped("token", "dev.api.token", &mut self.token),
                SecretField::mapped("password", "dev.db.password", &mut self.password),
            ]
        }
    }

    let dir = TempDir::new().unwrap();
    let session = Session::new(local_store(&dir), None, UpsertPolicy::ReplaceNewer);
    session.set("dev.api.token", "tok").await.unwrap();
    session.set("dev.db.password", "pw").await.unwrap();

    let mut config = AppConfig::default();
    session.populate(&mut config).await.unwrap();
    assert_eq!(config.token, "tok");
    assert_eq!(config.password, "pw");
}
