// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Data types shared by the store, its factory and its callers.

pub mod condition;
pub mod config;
pub mod instance;

pub use condition::Condition;
pub use config::SecretStoreConfig;
pub use instance::{ConnectionSecretMetadata, KeyValues, ObjectKey, SecretInstance};
