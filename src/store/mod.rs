// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Secret stores for connection details.

pub mod applicator;
pub mod kubernetes;
pub mod retry;

use async_trait::async_trait;
use kube::Client;
use tokio_util::sync::CancellationToken;

use crate::error::Result;
use crate::kubernetes::CommonCredentialExtractor;
use crate::types::{KeyValues, SecretInstance, SecretStoreConfig};

pub use applicator::{
    Applicator, ApplicatorWithRetry, ConnectionSecretMustBeControllableBy, PatchingApplicator,
    Precondition,
};
pub use kubernetes::SecretStore;
pub use retry::RetryPolicy;

/// Durable key/value persistence for connection secret instances
#[async_trait]
pub trait Store: Send + Sync {
    /// Return every key/value stored for the instance
    async fn read_key_values(
        &self,
        cancel: &CancellationToken,
        instance: &SecretInstance,
    ) -> Result<KeyValues>;

    /// Merge `kv` into the stored instance, creating it if needed
    async fn write_key_values(
        &self,
        cancel: &CancellationToken,
        instance: &SecretInstance,
        kv: &KeyValues,
    ) -> Result<()>;

    /// Remove the keys of `kv`, deleting the instance once it is empty
    async fn delete_key_values(
        &self,
        cancel: &CancellationToken,
        instance: &SecretInstance,
        kv: &KeyValues,
    ) -> Result<()>;
}

/// Build the store selected by `cfg`, using the common credential sources
/// for remote clusters
pub async fn new_store(local: Client, cfg: &SecretStoreConfig) -> Result<Box<dyn Store>> {
    let store = SecretStore::new(local, cfg, &CommonCredentialExtractor).await?;
    Ok(Box::new(store))
}
