// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Remote cluster client creation from kubeconfig bytes

use crate::error::CredentialError;
use kube::config::{KubeConfigOptions, Kubeconfig};
use kube::Client;
use tracing::{debug, instrument};

/// Create a Kubernetes client from raw kubeconfig bytes
#[instrument(skip(kubeconfig), fields(bytes = kubeconfig.len()))]
pub async fn client_for_kubeconfig(kubeconfig: &[u8]) -> Result<Client, CredentialError> {
    let kubeconfig = std::str::from_utf8(kubeconfig).map_err(|e| {
        CredentialError::Kubeconfig(format!("Failed to decode kubeconfig: {}", e))
    })?;

    let kubeconfig_parsed: Kubeconfig = serde_yaml::from_str(kubeconfig)
        .map_err(|e| CredentialError::Kubeconfig(format!("Failed to parse kubeconfig: {}", e)))?;

    let client_config =
        kube::Config::from_custom_kubeconfig(kubeconfig_parsed, &KubeConfigOptions::default())
            .await
            .map_err(|e| {
                CredentialError::Kubeconfig(format!("Failed to create config: {}", e))
            })?;

    debug!("Remote cluster URL: {}", client_config.cluster_url);

    Client::try_from(client_config)
        .map_err(|e| CredentialError::Kubeconfig(format!("Failed to create client: {}", e)))
}
