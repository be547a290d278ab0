// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use std::collections::BTreeMap;
use std::fmt;

use k8s_openapi::apimachinery::pkg::apis::meta::v1::OwnerReference;
use serde::{Deserialize, Serialize};

/// Connection details: key to opaque value
pub type KeyValues = BTreeMap<String, Vec<u8>>;

/// One logical bundle of connection details
#[derive(Clone, Debug, PartialEq)]
pub struct SecretInstance {
    pub name: String,
    /// Namespace of the stored secret; empty means the store's default scope
    pub scope: String,
    /// Recorded on the stored secret and checked before overwriting it
    pub owner: OwnerReference,
    pub metadata: Option<ConnectionSecretMetadata>,
}

impl SecretInstance {
    pub fn new(name: impl Into<String>, scope: impl Into<String>, owner: OwnerReference) -> Self {
        Self {
            name: name.into(),
            scope: scope.into(),
            owner,
            metadata: None,
        }
    }

    pub fn with_metadata(mut self, metadata: ConnectionSecretMetadata) -> Self {
        self.metadata = Some(metadata);
        self
    }
}

/// Extra metadata applied to a stored connection secret
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionSecretMetadata {
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub labels: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub annotations: BTreeMap<String, String>,
    /// Overrides the connection secret type marker
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub type_: Option<String>,
}

/// Namespace and name of a stored secret
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ObjectKey {
    pub namespace: String,
    pub name: String,
}

impl ObjectKey {
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            name: name.into(),
        }
    }
}

impl fmt::Display for ObjectKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.namespace, self.name)
    }
}
