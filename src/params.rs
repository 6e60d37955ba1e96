use crate::config::Parameters;
use crate::error::{RelayError, Result};
use anyhow::Context;
use async_trait::async_trait;
use std::sync::Arc;

/// Backend holding named configuration values, e.g. SSM Parameter Store.
#[async_trait]
pub trait ParameterStore: Send + Sync {
    /// Fetch the value stored under `name`, decrypting it when asked to.
    async fn get(&self, name: &str, decrypt: bool) -> anyhow::Result<String>;
}

pub struct SsmParameterStore {
    client: aws_sdk_ssm::Client,
}

impl SsmParameterStore {
    pub fn new(config: &aws_config::SdkConfig) -> Self {
        Self {
            client: aws_sdk_ssm::Client::new(config),
        }
    }
}

#[async_trait]
impl ParameterStore for SsmParameterStore {
    async fn get(&self, name: &str, decrypt: bool) -> anyhow::Result<String> {
        let output = self
            .client
            .get_parameter()
            .name(name)
            .with_decryption(decrypt)
            .send()
            .await
            .context("GetParameter request failed")?;

        output
            .parameter()
            .and_then(|p| p.value())
            .map(String::from)
            .context("parameter has no value")
    }
}

/// The two runtime targets the pipeline needs for one invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelayTargets {
    pub log_group: String,
    pub webhook_url: String,
}

/// Resolves the relay's configuration values from a [`ParameterStore`].
pub struct ConfigResolver {
    store: Arc<dyn ParameterStore>,
    decrypt: bool,
}

impl ConfigResolver {
    pub fn new(store: Arc<dyn ParameterStore>, decrypt: bool) -> Self {
        Self { store, decrypt }
    }

    pub async fn resolve(&self, name: &str) -> Result<String> {
        if name.is_empty() {
            return Err(RelayError::Config {
                name: String::new(),
                reason: "parameter name is empty".to_string(),
            });
        }

        match self.store.get(name, self.decrypt).await {
            Ok(value) => Ok(value),
            Err(e) => {
                tracing::error!("Failed to get parameter {}: {:#}", name, e);
                Err(RelayError::Config {
                    name: name.to_string(),
                    reason: format!("{:#}", e),
                })
            }
        }
    }

    pub async fn resolve_targets(&self, names: &Parameters) -> Result<RelayTargets> {
        let log_group = self.resolve(&names.log_group).await?;
        let webhook_url = self.resolve(&names.webhook_url).await?;
        Ok(RelayTargets {
            log_group,
            webhook_url,
        })
    }
}
