// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Kubernetes utilities for remote credential extraction and client creation.

pub mod client;
pub mod credentials;

pub use client::client_for_kubeconfig;
pub use credentials::{CommonCredentialExtractor, CredentialExtractor};
