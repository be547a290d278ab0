// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Capabilities of the resources that own and configure connection secrets.
//!
//! Each trait is a narrow capability. A managed resource that publishes
//! connection details is a [`SecretOwner`]; a resource that configures a
//! store is a [`StoreConfig`]. Callers compose them as needed.

use kube::{Resource, ResourceExt};
use serde::{Deserialize, Serialize};

use crate::types::condition::{self, Condition};
use crate::types::{ConnectionSecretMetadata, SecretInstance, SecretStoreConfig};

/// Where a resource publishes its connection details
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct PublishConnectionDetailsTo {
    /// Name of the connection secret
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config_ref: Option<StoreConfigReference>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<ConnectionSecretMetadata>,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, schemars::JsonSchema)]
pub struct StoreConfigReference {
    pub name: String,
}

pub trait ConnectionDetailsPublisherTo {
    fn publish_connection_details_to(&self) -> Option<&PublishConnectionDetailsTo>;
    fn set_publish_connection_details_to(&mut self, to: Option<PublishConnectionDetailsTo>);
}

/// A Kubernetes object that publishes connection details
pub trait SecretOwner: Resource<DynamicType = ()> + ConnectionDetailsPublisherTo {}

impl<T> SecretOwner for T where T: Resource<DynamicType = ()> + ConnectionDetailsPublisherTo {}

pub trait StoreConfigProvider {
    fn store_config(&self) -> &SecretStoreConfig;
}

pub trait Conditioned {
    fn conditions(&self) -> &[Condition];
    fn set_condition(&mut self, condition: Condition);

    fn condition(&self, condition_type: &str) -> Option<&Condition> {
        self.conditions()
            .iter()
            .find(|c| c.condition_type == condition_type)
    }

    fn is_ready(&self) -> bool {
        condition::is_ready(self.conditions())
    }
}

/// A Kubernetes object that configures a secret store
pub trait StoreConfig: Resource<DynamicType = ()> + Conditioned + StoreConfigProvider {}

impl<T> StoreConfig for T where T: Resource<DynamicType = ()> + Conditioned + StoreConfigProvider {}

impl SecretInstance {
    /// The secret instance an owner publishes to.
    ///
    /// Returns `None` when the owner does not publish connection details, or
    /// has no name or uid yet to reference. The scope is the owner's
    /// namespace; cluster scoped owners get the store's default scope.
    pub fn for_owner<O: SecretOwner>(owner: &O) -> Option<Self> {
        let to = owner.publish_connection_details_to()?;
        let owner_ref = owner.controller_owner_ref(&())?;

        Some(Self {
            name: to.name.clone(),
            scope: owner.namespace().unwrap_or_default(),
            owner: owner_ref,
            metadata: to.metadata.clone(),
        })
    }
}
