//! Profile-based configuration.
//!
//! The config file maps profile names to profiles; each profile names a
//! storage provider, an optional cache provider, the upsert policy, and the
//! prefixes `sync` should hydrate. Search order: an explicit `--config`
//! path, `./shush.json`, then `~/.shush/config.json`.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::cache::keyring::KeyringCache;
use crate::cache::CacheProvider;
use crate::session::{Session, UpsertPolicy};
use crate::storage::json_git::JsonGit;
use crate::storage::param_store::ParamStore;
use crate::storage::StorageProvider;

/// Top-level configuration: profile name → profile.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Config {
    pub profiles: HashMap<String, Profile>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    pub storage: StorageConfig,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cache: Option<CacheConfig>,
    #[serde(default)]
    pub policy: UpsertPolicy,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sync: Option<SyncConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum StorageConfig {
    #[serde(rename_all = "camelCase")]
    ParamStore {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        key_id: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        aws_profile: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        aws_region: Option<String>,
    },
    #[serde(rename_all = "camelCase")]
    JsonGit {
        path: String,
        filename: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        remote: Option<String>,
        #[serde(default = "default_indent")]
        indent: String,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum CacheConfig {
    Keyring { service: String },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncConfig {
    pub prefixes: Vec<String>,
}

fn default_indent() -> String {
    "  ".to_string()
}

/// One validation finding: where in the config, and what is wrong.
#[derive(Debug, Clone)]
pub struct ValidationError {
    pub path: String,
    pub message: String,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.path, self.message)
    }
}

impl Config {
    /// Load configuration from an explicit path or the default locations.
    pub fn load(path: Option<&str>) -> Result<Self> {
        let config_path = match path {
            Some(p) => PathBuf::from(p),
            None => find_config_file().context(
                "no config file found (searched ./shush.json and ~/.shush/config.json); \
                 run `shush config init` to create one",
            )?,
        };

        info!("loading config from {}", config_path.display());
        let content = std::fs::read_to_string(&config_path)
            .with_context(|| format!("cannot read config file '{}'", config_path.display()))?;
        let config: Config = serde_json::from_str(&content)
            .with_context(|| format!("config file '{}' is malformed", config_path.display()))?;
        Ok(config)
    }

    /// Look up a profile by name.
    pub fn profile(&self, name: &str) -> Result<&Profile> {
        self.profiles
            .get(name)
            .with_context(|| format!("no profile `{name}` in config"))
    }

    /// Write a starter configuration to the given path.
    pub fn write_default(path: &str) -> Result<()> {
        let config = Config {
            profiles: HashMap::from([(
                "default".to_string(),
                Profile {
                    storage: StorageConfig::JsonGit {
                        path: "/path/to/secrets-repo".to_string(),
                        filename: "secrets.json".to_string(),
                        remote: Some("origin".to_string()),
                        indent: default_indent(),
                    },
                    cache: Some(CacheConfig::Keyring {
                        service: "shush".to_string(),
                    }),
                    policy: UpsertPolicy::default(),
                    sync: None,
                },
            )]),
        };

        let content = serde_json::to_string_pretty(&config)?;
        std::fs::write(path, content)
            .with_context(|| format!("cannot write config file '{path}'"))?;
        Ok(())
    }

    /// Validate every profile, returning all findings.
    pub fn validate(&self) -> Vec<ValidationError> {
        let mut errors = Vec::new();

        for (name, profile) in &self.profiles {
            if let StorageConfig::JsonGit { path, filename, .. } = &profile.storage {
                if path.is_empty() {
                    errors.push(ValidationError {
                        path: format!("{name}.storage.path"),
                        message: "worktree path is required".to_string(),
                    });
                }
                if filename.is_empty() {
                    errors.push(ValidationError {
                        path: format!("{name}.storage.filename"),
                        message: "document filename is required".to_string(),
                    });
                }
            }

            if let Some(CacheConfig::Keyring { service }) = &profile.cache {
                if service.is_empty() {
                    errors.push(ValidationError {
                        path: format!("{name}.cache.service"),
                        message: "keyring service name is required".to_string(),
                    });
                }
            }

            if let Some(sync) = &profile.sync {
                if sync.prefixes.is_empty() || sync.prefixes.iter().any(String::is_empty) {
                    errors.push(ValidationError {
                        path: format!("{name}.sync.prefixes"),
                        message: "prefixes must be a non-empty list of non-empty strings"
                            .to_string(),
                    });
                }
            }
        }

        errors
    }
}

impl Profile {
    /// Construct the configured providers and assemble a session.
    pub async fn build_session(&self) -> Session {
        let storage: Arc<dyn StorageProvider> = match &self.storage {
            StorageConfig::ParamStore {
                key_id,
                aws_profile,
                aws_region,
            } => Arc::new(
                ParamStore::connect(key_id.clone(), aws_profile.clone(), aws_region.clone()).await,
            ),
            StorageConfig::JsonGit {
                path,
                filename,
                remote,
                indent,
            } => Arc::new(JsonGit::new(path, filename.clone(), remote.clone(), indent)),
        };

        let cache: Option<Arc<dyn CacheProvider>> = self.cache.as_ref().map(|cache| match cache {
            CacheConfig::Keyring { service } => {
                Arc::new(KeyringCache::new(service)) as Arc<dyn CacheProvider>
            }
        });

        Session::new(storage, cache, self.policy)
    }

    /// Prefixes to hydrate on `sync`, if any are configured.
    pub fn sync_prefixes(&self) -> &[String] {
        self.sync.as_ref().map(|s| s.prefixes.as_slice()).unwrap_or(&[])
    }
}

/// Default config search: the working directory first, then the home dir.
fn find_config_file() -> Option<PathBuf> {
    let local = PathBuf::from("shush.json");
    if local.exists() {
        return Some(local);
    }

    let home = dirs::home_dir()?.join(".shush").join("config.json");
    home.exists().then_some(home)
}
