//! Git-versioned JSON document storage.
//!
//! Secrets live in one JSON document inside a git worktree. Keys are dotted
//! paths into nested objects and each leaf is `{"value": ..., "v": ...}`.
//! Reads pull the configured remote first; writes bump the leaf version,
//! rewrite the document, and commit + push. Without a remote the store is a
//! plain local JSON document and git is never invoked.
//!
//! This backend does not support prefix enumeration and therefore cannot
//! back [`Session::sync`](crate::session::Session::sync).

use std::path::PathBuf;

use anyhow::Context;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::process::Command;
use tracing::debug;

use crate::error::Result;

use super::{SecretRecord, StorageProvider};

/// Leaf shape inside the document.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct JsonLeaf {
    value: String,
    v: i64,
}

pub struct JsonGit {
    path: PathBuf,
    filename: String,
    remote: Option<String>,
    indent: String,
}

impl JsonGit {
    pub fn new(
        path: impl Into<PathBuf>,
        filename: impl Into<String>,
        remote: Option<String>,
        indent: impl Into<String>,
    ) -> Self {
        Self {
            path: path.into(),
            filename: filename.into(),
            remote,
            indent: indent.into(),
        }
    }

    fn document_path(&self) -> PathBuf {
        self.path.join(&self.filename)
    }

    fn load(&self) -> Result<Value> {
        let path = self.document_path();
        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("cannot read secrets document '{}'", path.display()))?;
        let parsed = serde_json::from_str(&content)
            .with_context(|| format!("secrets document '{}' is not valid JSON", path.display()))?;
        Ok(parsed)
    }

    fn store(&self, document: &Value) -> Result<()> {
        let rendered = if self.indent.is_empty() {
            serde_json::to_string(document).context("serializing secrets document")?
        } else {
            let mut out = Vec::new();
            let formatter = serde_json::ser::PrettyFormatter::with_indent(self.indent.as_bytes());
            let mut serializer = serde_json::Serializer::with_formatter(&mut out, formatter);
            document
                .serialize(&mut serializer)
                .context("serializing secrets document")?;
            String::from_utf8(out).context("serialized document is not UTF-8")?
        };

        let path = self.document_path();
        std::fs::write(&path, rendered)
            .with_context(|| format!("cannot write secrets document '{}'", path.display()))?;
        Ok(())
    }

    /// Run git against the worktree, failing with stderr on a non-zero exit.
    async fn git(&self, args: &[&str]) -> Result<()> {
        let output = Command::new("git")
            .arg("-C")
            .arg(&self.path)
            .args(args)
            .output()
            .await
            .with_context(|| format!("failed to execute git {}", args.join(" ")))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(
                anyhow::anyhow!("git {} failed: {}", args.join(" "), stderr.trim()).into(),
            );
        }

        debug!(args = %args.join(" "), "git command succeeded");
        Ok(())
    }

    async fn pull(&self) -> Result<()> {
        match &self.remote {
            Some(remote) => self.git(&["pull", remote]).await,
            None => Ok(()),
        }
    }

    async fn commit_and_push(&self, key: &str) -> Result<()> {
        let Some(remote) = &self.remote else {
            return Ok(());
        };
        self.git(&["add", &self.filename]).await?;
        self.git(&["commit", "-m", &format!("set {key}")]).await?;
        self.git(&["push", remote]).await?;
        Ok(())
    }
}

impl std::fmt::Debug for JsonGit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JsonGit")
            .field("path", &self.path)
            .field("filename", &self.filename)
            .field("remote", &self.remote)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl StorageProvider for JsonGit {
    async fn get(&self, keys: &[String]) -> Result<Vec<SecretRecord>> {
        self.pull().await?;
        let document = self.load()?;

        let mut out = Vec::with_capacity(keys.len());
        for key in keys {
            let leaf = extract(key, &document)?;
            out.push(SecretRecord {
                value: leaf.value,
                version: leaf.v,
            });
        }
        Ok(out)
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        let mut document = self.load()?;

        let mut leaf = extract(key, &document)?;
        leaf.value = value.to_string();
        leaf.v += 1;
        insert(key, &mut document, &leaf)?;

        self.store(&document)?;
        self.commit_and_push(key).await
    }

    async fn latest_version(&self, key: &str) -> Result<i64> {
        let records = self.get(std::slice::from_ref(&key.to_string())).await?;
        match records.first() {
            Some(record) => Ok(record.version),
            None => Err(anyhow::anyhow!("not found").into()),
        }
    }
}

/// Read the leaf at a dotted key path. A missing key reads as the zero leaf
/// (empty value, version 0), not an error; a present leaf with the wrong
/// shape is an error.
fn extract(key: &str, document: &Value) -> Result<JsonLeaf> {
    let mut node = document;
    for segment in key.split('.') {
        match node.get(segment) {
            Some(child) => node = child,
            None => {
                return Ok(JsonLeaf {
                    value: String::new(),
                    v: 0,
                })
            }
        }
    }

    let leaf = serde_json::from_value(node.clone())
        .with_context(|| format!("entry at key '{key}' has an unexpected shape"))?;
    Ok(leaf)
}

/// Write the leaf at a dotted key path, creating intermediate objects.
fn insert(key: &str, document: &mut Value, leaf: &JsonLeaf) -> Result<()> {
    let mut node = document;
    let segments: Vec<&str> = key.split('.').collect();

    for (i, segment) in segments.iter().enumerate() {
        let map = node.as_object_mut().with_context(|| {
            format!(
                "key '{key}' collides with a non-object node at '{}'",
                segments[..i].join(".")
            )
        })?;

        if i == segments.len() - 1 {
            map.insert(
                segment.to_string(),
                serde_json::to_value(leaf).context("serializing secret entry")?,
            );
            return Ok(());
        }

        node = map
            .entry(segment.to_string())
            .or_insert_with(|| Value::Object(serde_json::Map::new()));
    }

    unreachable!("keys always have at least one segment");
}
