//! OS credential-store cache.
//!
//! Each secret key maps to one credential entry under a configurable service
//! name; the entry's password is a small JSON payload carrying the value and
//! its version. The keyring API is blocking, so every call runs under
//! `spawn_blocking`.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::Result;

use super::{CacheLookup, CacheProvider};

/// Stored payload: the secret value plus the storage version it was cached at.
#[derive(Debug, Serialize, Deserialize)]
struct Payload {
    v: i64,
    value: String,
}

#[derive(Debug, Clone)]
pub struct KeyringCache {
    service: String,
}

impl KeyringCache {
    pub fn new(service: impl Into<String>) -> Self {
        Self {
            service: service.into(),
        }
    }
}

#[async_trait]
impl CacheProvider for KeyringCache {
    async fn get(&self, key: &str) -> Result<CacheLookup> {
        let service = self.service.clone();
        let key = key.to_string();

        tokio::task::spawn_blocking(move || -> Result<CacheLookup> {
            let entry = keyring::Entry::new(&service, &key).map_err(anyhow::Error::from)?;
            match entry.get_password() {
                Ok(data) => {
                    let payload: Payload = serde_json::from_str(&data)
                        .map_err(|e| anyhow::anyhow!("corrupt cache entry for '{key}': {e}"))?;
                    Ok(CacheLookup::Hit {
                        value: payload.value,
                        version: payload.v,
                    })
                }
                Err(keyring::Error::NoEntry) => Ok(CacheLookup::Miss),
                Err(e) => Err(anyhow::Error::from(e).into()),
            }
        })
        .await
        .map_err(anyhow::Error::from)?
    }

    async fn set(&self, version: i64, key: &str, value: &str) -> Result<()> {
        let service = self.service.clone();
        let key = key.to_string();
        let data = serde_json::to_string(&Payload {
            v: version,
            value: value.to_string(),
        })
        .map_err(anyhow::Error::from)?;

        tokio::task::spawn_blocking(move || -> Result<()> {
            let entry = keyring::Entry::new(&service, &key).map_err(anyhow::Error::from)?;
            entry.set_password(&data).map_err(anyhow::Error::from)?;
            debug!(%key, "cache entry written");
            Ok(())
        })
        .await
        .map_err(anyhow::Error::from)?
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn payload_round_trips() {
        let data = serde_json::to_string(&Payload {
            v: 7,
            value: "secret".into(),
        })
        .unwrap();
        assert_eq!(data, r#"{"v":7,"value":"secret"}"#);

        let parsed: Payload = serde_json::from_str(&data).unwrap();
        assert_eq!(parsed.v, 7);
        assert_eq!(parsed.value, "secret");
    }

    #[test]
    fn rejects_foreign_payloads() {
        assert!(serde_json::from_str::<Payload>("not json").is_err());
        assert!(serde_json::from_str::<Payload>(r#"{"value":"x"}"#).is_err());
    }

    // Talks to the real OS credential store; ignored in regular runs.
    #[tokio::test]
    #[ignore = "requires an OS credential store"]
    async fn round_trips_against_os_keyring() {
        let cache = KeyringCache::new("shush-integration");
        cache.set(3, "probe", "value").await.unwrap();
        let lookup = cache.get("probe").await.unwrap();
        assert_eq!(
            lookup,
            CacheLookup::Hit {
                value: "value".into(),
                version: 3,
            }
        );
    }
}
