// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
pub mod config;
pub mod connection;
pub mod constants;
pub mod error;
pub mod kubernetes;
pub mod store;
pub mod types;

#[cfg(test)]
pub(crate) mod test_utils;

pub use error::{ErrorKind, Operation, Result, StoreError};
pub use store::{new_store, SecretStore, Store};
pub use types::{KeyValues, SecretInstance, SecretStoreConfig};
