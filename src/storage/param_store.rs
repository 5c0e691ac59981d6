//! AWS SSM Parameter Store storage.
//!
//! Secrets are `SecureString` parameters encrypted through KMS; the store
//! assigns versions on every put. This is the only backend with prefix
//! enumeration, so it is the one that can back
//! [`Session::sync`](crate::session::Session::sync).

use anyhow::Context;
use async_trait::async_trait;
use aws_sdk_ssm::types::{ParameterStringFilter, ParameterTier, ParameterType};
use aws_sdk_ssm::Client;
use tracing::debug;

use crate::error::Result;

use super::{SecretRecord, StorageProvider, SyncableStorage};

pub struct ParamStore {
    client: Client,
    key_id: Option<String>,
}

impl ParamStore {
    /// Connect using the default AWS credential chain, optionally pinned to a
    /// named profile and region. `key_id` selects the KMS key for writes.
    pub async fn connect(
        key_id: Option<String>,
        profile: Option<String>,
        region: Option<String>,
    ) -> Self {
        let mut loader = aws_config::defaults(aws_config::BehaviorVersion::latest());
        if let Some(region) = region {
            loader = loader.region(aws_config::Region::new(region));
        }
        if let Some(profile) = profile {
            loader = loader.profile_name(profile);
        }
        let sdk_config = loader.load().await;

        Self {
            client: Client::new(&sdk_config),
            key_id,
        }
    }

    /// Wrap an existing SSM client.
    pub fn from_client(client: Client, key_id: Option<String>) -> Self {
        Self { client, key_id }
    }
}

impl std::fmt::Debug for ParamStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ParamStore")
            .field("key_id", &self.key_id)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl StorageProvider for ParamStore {
    async fn get(&self, keys: &[String]) -> Result<Vec<SecretRecord>> {
        let output = self
            .client
            .get_parameters()
            .set_names(Some(keys.to_vec()))
            .with_decryption(true)
            .send()
            .await
            .context("GetParameters failed")?;

        let records = output
            .parameters()
            .iter()
            .map(|parameter| SecretRecord {
                value: parameter.value().unwrap_or_default().to_string(),
                version: parameter.version(),
            })
            .collect();
        Ok(records)
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        self.client
            .put_parameter()
            .name(key)
            .value(value)
            .overwrite(true)
            .r#type(ParameterType::SecureString)
            .tier(ParameterTier::Standard)
            .set_key_id(self.key_id.clone())
            .send()
            .await
            .with_context(|| format!("PutParameter failed for '{key}'"))?;
        Ok(())
    }

    async fn latest_version(&self, key: &str) -> Result<i64> {
        let output = self
            .client
            .get_parameter()
            .name(key)
            .with_decryption(false)
            .send()
            .await
            .with_context(|| format!("GetParameter failed for '{key}'"))?;

        let parameter = output
            .parameter()
            .with_context(|| format!("GetParameter returned no parameter for '{key}'"))?;
        Ok(parameter.version())
    }

    fn as_syncable(&self) -> Option<&dyn SyncableStorage> {
        Some(self)
    }
}

#[async_trait]
impl SyncableStorage for ParamStore {
    async fn keys_by_prefix(&self, prefix: &str) -> Result<Vec<String>> {
        let filter = ParameterStringFilter::builder()
            .key("Name")
            .option("BeginsWith")
            .values(prefix)
            .build()
            .context("building BeginsWith filter")?;

        let mut keys = Vec::new();
        let mut next_token: Option<String> = None;

        loop {
            let output = self
                .client
                .describe_parameters()
                .parameter_filters(filter.clone())
                .set_next_token(next_token)
                .send()
                .await
                .with_context(|| format!("DescribeParameters failed for prefix '{prefix}'"))?;

            let page = output.parameters();
            keys.extend(
                page.iter()
                    .filter_map(|metadata| metadata.name().map(String::from)),
            );

            next_token = output.next_token().map(String::from);
            if next_token.is_none() || page.is_empty() {
                break;
            }
        }

        debug!(prefix, count = keys.len(), "enumerated parameters by prefix");
        Ok(keys)
    }
}
