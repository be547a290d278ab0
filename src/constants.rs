// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

/// Type marker written on every connection secret
pub const SECRET_TYPE_CONNECTION: &str = "connection-secret";

/// The field manager recorded on creates, patches and replaces
pub const FIELD_MANAGER: &str = "connection-store";

/// Default scope used when neither the instance nor the store config name one
pub const DEFAULT_SCOPE: &str = "default";

/// Default retry policy, matching the Kubernetes client's `DefaultRetry`
pub mod retry {
    /// Total number of attempts, including the first one
    pub const STEPS: u32 = 5;
    /// Delay before the second attempt in milliseconds
    pub const INITIAL_DELAY_MS: u64 = 10;
    /// Multiplier applied to the delay after every attempt
    pub const FACTOR: f64 = 1.0;
    /// Maximum extra fraction of the delay added at random
    pub const JITTER: f64 = 0.1;
}

/// Environment variables read by `Config::from_env`
pub mod env {
    pub const STORE_CONFIG: &str = "CONNECTION_STORE_CONFIG";
    pub const DEFAULT_SCOPE: &str = "DEFAULT_SCOPE";
    pub const REMOTE_KUBECONFIG_SECRET: &str = "REMOTE_KUBECONFIG_SECRET";
    pub const REMOTE_KUBECONFIG_KEY: &str = "REMOTE_KUBECONFIG_KEY";
    pub const REMOTE_KUBECONFIG_ENV: &str = "REMOTE_KUBECONFIG_ENV";
    pub const REMOTE_KUBECONFIG_PATH: &str = "REMOTE_KUBECONFIG_PATH";

    /// Key read from the kubeconfig secret when `REMOTE_KUBECONFIG_KEY` is unset
    pub const DEFAULT_KUBECONFIG_KEY: &str = "kubeconfig";
}
