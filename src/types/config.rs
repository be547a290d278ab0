// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Secret store configuration, as embedded in a store config resource.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::constants::DEFAULT_SCOPE;

/// Selects where connection secrets are written.
///
/// Without a `kubernetes` section the store writes to the cluster the caller
/// runs in. With one, credentials for a remote cluster are extracted from
/// `kubernetes.auth` and secrets are written there instead.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct SecretStoreConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kubernetes: Option<KubernetesSecretStoreConfig>,
    /// Namespace used for secret instances that do not name one
    #[serde(default = "default_scope")]
    pub default_scope: String,
}

fn default_scope() -> String {
    DEFAULT_SCOPE.to_string()
}

impl Default for SecretStoreConfig {
    fn default() -> Self {
        Self {
            kubernetes: None,
            default_scope: default_scope(),
        }
    }
}

impl SecretStoreConfig {
    pub fn is_remote(&self) -> bool {
        self.kubernetes.is_some()
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct KubernetesSecretStoreConfig {
    pub auth: KubernetesAuthConfig,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct KubernetesAuthConfig {
    pub source: CredentialsSource,
    #[serde(flatten)]
    pub selectors: CommonCredentialSelectors,
}

/// Where remote-cluster credentials are read from
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, schemars::JsonSchema)]
pub enum CredentialsSource {
    None,
    Secret,
    InjectedIdentity,
    Environment,
    Filesystem,
}

impl fmt::Display for CredentialsSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            CredentialsSource::None => "None",
            CredentialsSource::Secret => "Secret",
            CredentialsSource::InjectedIdentity => "InjectedIdentity",
            CredentialsSource::Environment => "Environment",
            CredentialsSource::Filesystem => "Filesystem",
        })
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct CommonCredentialSelectors {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fs: Option<FsSelector>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub env: Option<EnvSelector>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secret_ref: Option<SecretKeySelector>,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, schemars::JsonSchema)]
pub struct FsSelector {
    pub path: String,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, schemars::JsonSchema)]
pub struct EnvSelector {
    pub name: String,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, schemars::JsonSchema)]
pub struct SecretKeySelector {
    pub name: String,
    pub namespace: String,
    pub key: String,
}
