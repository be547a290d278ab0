// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Secret store backed by Kubernetes Secrets in the local or a remote cluster.
//!
//! In the local cluster every write is guarded by the owner's controller
//! reference, and the garbage collector removes a connection secret once its
//! owner is gone. In a remote cluster the owner reference is recorded but
//! neither enforced nor collected: nothing watches the owner there, so a
//! bundle outlives an owner deleted locally until someone deletes its keys.

use std::collections::BTreeMap;

use async_trait::async_trait;
use k8s_openapi::api::core::v1::Secret;
use k8s_openapi::ByteString;
use kube::{
    api::{DeleteParams, ObjectMeta, PostParams, Preconditions},
    Api, Client,
};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument};

use crate::constants::{DEFAULT_SCOPE, FIELD_MANAGER, SECRET_TYPE_CONNECTION};
use crate::error::{is_not_found, ApplyError, Operation, Result, StoreError};
use crate::kubernetes::{client_for_kubeconfig, CredentialExtractor};
use crate::store::applicator::{
    Applicator, ApplicatorWithRetry, ConnectionSecretMustBeControllableBy, PatchingApplicator,
    Precondition,
};
use crate::store::retry::{cancellable, RetryPolicy};
use crate::store::Store;
use crate::types::{KeyValues, ObjectKey, SecretInstance, SecretStoreConfig};

#[derive(Clone)]
pub struct SecretStore {
    client: Client,
    applicator: ApplicatorWithRetry<PatchingApplicator>,
    default_scope: String,
    // decides whether writes are guarded by the owner reference
    remote_cluster: bool,
}

impl SecretStore {
    /// Build a store for `cfg`: the local cluster when it has no kubernetes
    /// section, otherwise the remote cluster its credentials point at.
    pub async fn new(
        local: Client,
        cfg: &SecretStoreConfig,
        extractor: &dyn CredentialExtractor,
    ) -> Result<Self> {
        let Some(kubernetes) = cfg.kubernetes.as_ref() else {
            debug!("No kubernetes store config, using the local API server");
            return Ok(Self::local(local, &cfg.default_scope));
        };

        let auth = &kubernetes.auth;
        let kubeconfig = extractor
            .extract(auth.source, &local, &auth.selectors)
            .await?;
        let remote = client_for_kubeconfig(&kubeconfig).await?;

        info!(
            "Using remote cluster as secret store (credentials source: {})",
            auth.source
        );
        Ok(Self::remote(remote, &cfg.default_scope))
    }

    pub fn local(client: Client, default_scope: impl Into<String>) -> Self {
        Self::build(client, default_scope.into(), false)
    }

    pub fn remote(client: Client, default_scope: impl Into<String>) -> Self {
        Self::build(client, default_scope.into(), true)
    }

    fn build(client: Client, default_scope: String, remote_cluster: bool) -> Self {
        let default_scope = if default_scope.is_empty() {
            DEFAULT_SCOPE.to_string()
        } else {
            default_scope
        };
        Self {
            applicator: ApplicatorWithRetry::new(
                PatchingApplicator::new(client.clone()),
                RetryPolicy::default(),
            ),
            client,
            default_scope,
            remote_cluster,
        }
    }

    pub fn with_retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.applicator = ApplicatorWithRetry::new(PatchingApplicator::new(self.client.clone()), policy);
        self
    }

    pub fn is_remote(&self) -> bool {
        self.remote_cluster
    }

    pub fn default_scope(&self) -> &str {
        &self.default_scope
    }

    /// Where the instance is stored: its own scope, or the default one
    pub fn object_key(&self, instance: &SecretInstance) -> ObjectKey {
        let namespace = if instance.scope.is_empty() {
            &self.default_scope
        } else {
            &instance.scope
        };
        ObjectKey::new(namespace, &instance.name)
    }

    fn secrets(&self, namespace: &str) -> Api<Secret> {
        Api::namespaced(self.client.clone(), namespace)
    }
}

/// The secret a write of `kv` for `instance` converges to
fn connection_secret(key: &ObjectKey, instance: &SecretInstance, kv: &KeyValues) -> Secret {
    let metadata = instance.metadata.clone().unwrap_or_default();

    Secret {
        metadata: ObjectMeta {
            name: Some(key.name.clone()),
            namespace: Some(key.namespace.clone()),
            owner_references: Some(vec![instance.owner.clone()]),
            labels: (!metadata.labels.is_empty()).then_some(metadata.labels),
            annotations: (!metadata.annotations.is_empty()).then_some(metadata.annotations),
            ..Default::default()
        },
        type_: Some(
            metadata
                .type_
                .unwrap_or_else(|| SECRET_TYPE_CONNECTION.to_string()),
        ),
        data: Some(
            kv.iter()
                .map(|(k, v)| (k.clone(), ByteString(v.clone())))
                .collect(),
        ),
        ..Default::default()
    }
}

/// One read-modify-write attempt of a key deletion
async fn remove_keys(
    secrets: &Api<Secret>,
    name: &str,
    kv: &KeyValues,
) -> std::result::Result<(), ApplyError> {
    let Some(mut secret) = secrets.get_opt(name).await? else {
        debug!("Secret does not exist, nothing to delete");
        return Ok(());
    };

    let data = secret.data.get_or_insert_with(BTreeMap::new);
    let before = data.len();
    data.retain(|k, _| !kv.contains_key(k));

    if !data.is_empty() {
        if data.len() == before {
            debug!("None of the keys are stored, leaving secret untouched");
            return Ok(());
        }
        debug!("Updating secret with {} remaining key(s)", data.len());
        let pp = PostParams {
            field_manager: Some(FIELD_MANAGER.to_string()),
            ..Default::default()
        };
        return match secrets.replace(name, &pp, &secret).await {
            Ok(_) => Ok(()),
            Err(e) if is_not_found(&e) => {
                debug!("Secret was deleted concurrently, nothing left to remove");
                Ok(())
            }
            Err(e) => Err(e.into()),
        };
    }

    debug!("No keys left, deleting secret");
    let dp = DeleteParams {
        preconditions: Some(Preconditions {
            resource_version: secret.metadata.resource_version.clone(),
            uid: secret.metadata.uid.clone(),
        }),
        ..Default::default()
    };
    match secrets.delete(name, &dp).await {
        Ok(_) => Ok(()),
        Err(e) if is_not_found(&e) => Ok(()),
        Err(e) => Err(e.into()),
    }
}

#[async_trait]
impl Store for SecretStore {
    #[instrument(skip(self, cancel, instance), fields(secret = %self.object_key(instance)))]
    async fn read_key_values(
        &self,
        cancel: &CancellationToken,
        instance: &SecretInstance,
    ) -> Result<KeyValues> {
        let key = self.object_key(instance);
        let secrets = self.secrets(&key.namespace);

        let secret = cancellable(cancel, secrets.get(&key.name))
            .await
            .and_then(|r| r.map_err(ApplyError::from))
            .map_err(|e| StoreError::from_apply(Operation::Read, key.clone(), e))?;

        Ok(secret
            .data
            .unwrap_or_default()
            .into_iter()
            .map(|(k, v)| (k, v.0))
            .collect())
    }

    #[instrument(skip(self, cancel, instance, kv), fields(secret = %self.object_key(instance), keys = kv.len()))]
    async fn write_key_values(
        &self,
        cancel: &CancellationToken,
        instance: &SecretInstance,
        kv: &KeyValues,
    ) -> Result<()> {
        let key = self.object_key(instance);
        let desired = connection_secret(&key, instance, kv);

        let controllable = ConnectionSecretMustBeControllableBy::new(&instance.owner.uid);
        let preconditions: Vec<&dyn Precondition<Secret>> = if self.remote_cluster {
            // Owner references do not carry across clusters, so there is
            // nothing meaningful to check ownership against.
            Vec::new()
        } else {
            vec![&controllable]
        };

        self.applicator
            .apply(cancel, &desired, &preconditions)
            .await
            .map_err(|e| StoreError::from_apply(Operation::Write, key, e))?;

        debug!("Connection secret written");
        Ok(())
    }

    #[instrument(skip(self, cancel, instance, kv), fields(secret = %self.object_key(instance), keys = kv.len()))]
    async fn delete_key_values(
        &self,
        cancel: &CancellationToken,
        instance: &SecretInstance,
        kv: &KeyValues,
    ) -> Result<()> {
        let key = self.object_key(instance);
        let secrets = self.secrets(&key.namespace);

        self.applicator
            .retry_policy()
            .run(cancel, || remove_keys(&secrets, &key.name, kv))
            .await
            .map_err(|e| StoreError::from_apply(Operation::Delete, key.clone(), e))
    }
}
