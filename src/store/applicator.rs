// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Create-or-merge-patch of namespaced resources, with preconditions and retry.

use std::fmt::Debug;

use async_trait::async_trait;
use k8s_openapi::api::core::v1::Secret;
use k8s_openapi::NamespaceResourceScope;
use kube::{
    api::{Patch, PatchParams, PostParams},
    Api, Client, Resource, ResourceExt,
};
use serde::{de::DeserializeOwned, Serialize};
use tokio_util::sync::CancellationToken;
use tracing::{debug, instrument};

use crate::constants::FIELD_MANAGER;
use crate::error::{is_not_found, ApplyError};
use crate::store::retry::{cancellable, RetryPolicy};

/// Namespaced resources an applicator can create and patch
pub trait Applicable:
    Resource<Scope = NamespaceResourceScope, DynamicType = ()>
    + Clone
    + Debug
    + Serialize
    + DeserializeOwned
    + Send
    + Sync
    + 'static
{
}

impl<K> Applicable for K where
    K: Resource<Scope = NamespaceResourceScope, DynamicType = ()>
        + Clone
        + Debug
        + Serialize
        + DeserializeOwned
        + Send
        + Sync
        + 'static
{
}

/// Checked against the existing resource before it is patched.
/// A failure aborts the apply and is never retried.
pub trait Precondition<K>: Send + Sync {
    fn check(&self, current: &K, desired: &K) -> Result<(), String>;
}

impl<K, F> Precondition<K> for F
where
    F: Fn(&K, &K) -> Result<(), String> + Send + Sync,
{
    fn check(&self, current: &K, desired: &K) -> Result<(), String> {
        self(current, desired)
    }
}

#[async_trait]
pub trait Applicator<K: Applicable>: Send + Sync {
    /// Create `desired` if absent, otherwise merge it into the existing resource
    async fn apply(
        &self,
        cancel: &CancellationToken,
        desired: &K,
        preconditions: &[&dyn Precondition<K>],
    ) -> Result<(), ApplyError>;
}

/// Makes a single get, then create or merge patch, attempt
#[derive(Clone)]
pub struct PatchingApplicator {
    client: Client,
}

impl PatchingApplicator {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl<K: Applicable> Applicator<K> for PatchingApplicator {
    #[instrument(skip_all, fields(object = %format!("{}/{}", desired.namespace().unwrap_or_default(), desired.name_any())))]
    async fn apply(
        &self,
        cancel: &CancellationToken,
        desired: &K,
        preconditions: &[&dyn Precondition<K>],
    ) -> Result<(), ApplyError> {
        let name = desired.name_any();
        let namespace = desired.namespace().unwrap_or_default();
        let api: Api<K> = Api::namespaced(self.client.clone(), &namespace);

        let Some(current) = cancellable(cancel, api.get_opt(&name)).await?? else {
            debug!("Object does not exist, creating it");
            cancellable(cancel, api.create(&create_params(), desired)).await??;
            return Ok(());
        };

        for precondition in preconditions {
            precondition
                .check(&current, desired)
                .map_err(ApplyError::Precondition)?;
        }

        // The resourceVersion makes the patch fail with 409 if the object
        // changed after it was read, so the preconditions are re-evaluated.
        let mut patch = desired.clone();
        patch.meta_mut().resource_version = current.resource_version();

        debug!("Object exists, merge patching it");
        let pp = PatchParams {
            field_manager: Some(FIELD_MANAGER.to_string()),
            ..Default::default()
        };
        match cancellable(cancel, api.patch(&name, &pp, &Patch::Merge(&patch))).await? {
            Ok(_) => Ok(()),
            Err(e) if is_not_found(&e) => {
                // Deleted after it was read. Anything recreating it in the
                // meantime makes the create fail with 409 and retry.
                debug!("Object disappeared before the patch, creating it");
                cancellable(cancel, api.create(&create_params(), desired)).await??;
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }
}

fn create_params() -> PostParams {
    PostParams {
        field_manager: Some(FIELD_MANAGER.to_string()),
        ..Default::default()
    }
}

/// Retries an inner applicator on transient errors
#[derive(Clone)]
pub struct ApplicatorWithRetry<A> {
    inner: A,
    policy: RetryPolicy,
}

impl<A> ApplicatorWithRetry<A> {
    pub fn new(inner: A, policy: RetryPolicy) -> Self {
        Self { inner, policy }
    }

    pub fn retry_policy(&self) -> &RetryPolicy {
        &self.policy
    }
}

#[async_trait]
impl<K, A> Applicator<K> for ApplicatorWithRetry<A>
where
    K: Applicable,
    A: Applicator<K>,
{
    async fn apply(
        &self,
        cancel: &CancellationToken,
        desired: &K,
        preconditions: &[&dyn Precondition<K>],
    ) -> Result<(), ApplyError> {
        self.policy
            .run(cancel, || self.inner.apply(cancel, desired, preconditions))
            .await
    }
}

/// Refuses to overwrite a connection secret controlled by someone else.
///
/// A secret without a controller is only adopted when it already carries the
/// desired type, so arbitrary secrets that happen to share the name are left
/// alone.
#[derive(Debug, Clone)]
pub struct ConnectionSecretMustBeControllableBy {
    uid: String,
}

impl ConnectionSecretMustBeControllableBy {
    pub fn new(uid: impl Into<String>) -> Self {
        Self { uid: uid.into() }
    }
}

impl Precondition<Secret> for ConnectionSecretMustBeControllableBy {
    fn check(&self, current: &Secret, desired: &Secret) -> Result<(), String> {
        let controller = current
            .owner_references()
            .iter()
            .find(|r| r.controller == Some(true));

        match controller {
            None if current.type_ != desired.type_ => Err(format!(
                "refusing to modify uncontrolled secret of type {:?}",
                current.type_.as_deref().unwrap_or_default()
            )),
            None => Ok(()),
            Some(c) if c.uid != self.uid => Err(format!(
                "existing secret is not controlled by UID {:?}",
                self.uid
            )),
            Some(_) => Ok(()),
        }
    }
}
