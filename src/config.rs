// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use anyhow::{bail, Context, Result};
use std::env;

use crate::constants::env as vars;
use crate::constants::DEFAULT_SCOPE;
use crate::types::config::{
    CommonCredentialSelectors, CredentialsSource, EnvSelector, FsSelector, KubernetesAuthConfig,
    KubernetesSecretStoreConfig, SecretKeySelector,
};
use crate::types::SecretStoreConfig;

/// Store configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    pub store: SecretStoreConfig,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Load configuration through `lookup`, which maps a variable name to its value.
    ///
    /// A store config file named by `CONNECTION_STORE_CONFIG` wins over the
    /// individual variables.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        if let Some(path) = lookup(vars::STORE_CONFIG) {
            let raw = std::fs::read_to_string(&path)
                .with_context(|| format!("Failed to read store config file {}", path))?;
            let store = serde_yaml::from_str(&raw)
                .with_context(|| format!("Failed to parse store config file {}", path))?;
            return Ok(Config { store });
        }

        let default_scope = lookup(vars::DEFAULT_SCOPE).unwrap_or_else(|| DEFAULT_SCOPE.to_string());
        let kubernetes = remote_auth(&lookup)?.map(|auth| KubernetesSecretStoreConfig { auth });

        Ok(Config {
            store: SecretStoreConfig {
                kubernetes,
                default_scope,
            },
        })
    }
}

fn remote_auth(lookup: &impl Fn(&str) -> Option<String>) -> Result<Option<KubernetesAuthConfig>> {
    let secret = lookup(vars::REMOTE_KUBECONFIG_SECRET);
    let env = lookup(vars::REMOTE_KUBECONFIG_ENV);
    let path = lookup(vars::REMOTE_KUBECONFIG_PATH);

    let (source, selectors) = match (secret, env, path) {
        (None, None, None) => return Ok(None),
        (Some(secret), None, None) => {
            let (namespace, name) = secret.split_once('/').with_context(|| {
                format!(
                    "{} must be <namespace>/<name>, got {:?}",
                    vars::REMOTE_KUBECONFIG_SECRET,
                    secret
                )
            })?;
            let key = lookup(vars::REMOTE_KUBECONFIG_KEY)
                .unwrap_or_else(|| vars::DEFAULT_KUBECONFIG_KEY.to_string());
            (
                CredentialsSource::Secret,
                CommonCredentialSelectors {
                    secret_ref: Some(SecretKeySelector {
                        name: name.to_string(),
                        namespace: namespace.to_string(),
                        key,
                    }),
                    ..Default::default()
                },
            )
        }
        (None, Some(name), None) => (
            CredentialsSource::Environment,
            CommonCredentialSelectors {
                env: Some(EnvSelector { name }),
                ..Default::default()
            },
        ),
        (None, None, Some(path)) => (
            CredentialsSource::Filesystem,
            CommonCredentialSelectors {
                fs: Some(FsSelector { path }),
                ..Default::default()
            },
        ),
        _ => bail!(
            "Only one of {}, {} and {} may be set",
            vars::REMOTE_KUBECONFIG_SECRET,
            vars::REMOTE_KUBECONFIG_ENV,
            vars::REMOTE_KUBECONFIG_PATH
        ),
    };

    Ok(Some(KubernetesAuthConfig { source, selectors }))
}
