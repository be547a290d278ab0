// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Extraction of remote-cluster credentials from common sources

use std::path::PathBuf;

use async_trait::async_trait;
use k8s_openapi::api::core::v1::Secret;
use kube::{Api, Client};
use tracing::{info, instrument};

use crate::error::CredentialError;
use crate::types::config::{CommonCredentialSelectors, CredentialsSource};
use crate::types::ObjectKey;

/// Resolves the raw credentials (a kubeconfig) for a remote secret store
#[async_trait]
pub trait CredentialExtractor: Send + Sync {
    async fn extract(
        &self,
        source: CredentialsSource,
        local: &Client,
        selectors: &CommonCredentialSelectors,
    ) -> Result<Vec<u8>, CredentialError>;
}

/// Reads credentials from a secret in the local cluster, an environment
/// variable or a file
#[derive(Debug, Clone, Copy, Default)]
pub struct CommonCredentialExtractor;

#[async_trait]
impl CredentialExtractor for CommonCredentialExtractor {
    #[instrument(skip(self, local, selectors))]
    async fn extract(
        &self,
        source: CredentialsSource,
        local: &Client,
        selectors: &CommonCredentialSelectors,
    ) -> Result<Vec<u8>, CredentialError> {
        match source {
            CredentialsSource::Secret => {
                let selector = selectors
                    .secret_ref
                    .as_ref()
                    .ok_or(CredentialError::MissingSelector(source, "secretRef"))?;
                let key = ObjectKey::new(&selector.namespace, &selector.name);
                extract_from_secret(local, key, &selector.key).await
            }
            CredentialsSource::Environment => {
                let selector = selectors
                    .env
                    .as_ref()
                    .ok_or(CredentialError::MissingSelector(source, "env"))?;
                std::env::var(&selector.name)
                    .map(String::into_bytes)
                    .map_err(|_| CredentialError::Environment(selector.name.clone()))
            }
            CredentialsSource::Filesystem => {
                let selector = selectors
                    .fs
                    .as_ref()
                    .ok_or(CredentialError::MissingSelector(source, "fs"))?;
                tokio::fs::read(&selector.path)
                    .await
                    .map_err(|source| CredentialError::Filesystem {
                        path: PathBuf::from(&selector.path),
                        source,
                    })
            }
            CredentialsSource::None | CredentialsSource::InjectedIdentity => {
                Err(CredentialError::UnsupportedSource(source))
            }
        }
    }
}

async fn extract_from_secret(
    client: &Client,
    key: ObjectKey,
    field: &str,
) -> Result<Vec<u8>, CredentialError> {
    let secrets: Api<Secret> = Api::namespaced(client.clone(), &key.namespace);

    info!("Getting credentials secret '{}'...", key);

    let secret = match secrets.get(&key.name).await {
        Ok(secret) => secret,
        Err(source) => return Err(CredentialError::Secret { key, source }),
    };

    let Some(value) = secret.data.as_ref().and_then(|d| d.get(field)) else {
        return Err(CredentialError::MissingKey {
            key,
            field: field.to_string(),
        });
    };

    Ok(value.0.clone())
}
