// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

use crate::types::config::CredentialsSource;
use crate::types::instance::ObjectKey;

/// The store operation an error was raised from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Read,
    Write,
    Delete,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Operation::Read => "read",
            Operation::Write => "write",
            Operation::Delete => "delete",
        })
    }
}

/// Closed set of failure kinds callers branch on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    OwnershipConflict,
    Transient,
    Configuration,
    Cancelled,
}

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("cannot {operation} secret {key}: not found")]
    NotFound { operation: Operation, key: ObjectKey },

    #[error("cannot {operation} secret {key}: {reason}")]
    OwnershipConflict {
        operation: Operation,
        key: ObjectKey,
        reason: String,
    },

    #[error("cannot {operation} secret {key} (after {attempts} attempt(s)): {source}")]
    Transient {
        operation: Operation,
        key: ObjectKey,
        attempts: u32,
        #[source]
        source: kube::Error,
    },

    #[error("cannot extract kubernetes auth credentials: {0}")]
    Configuration(#[from] CredentialError),

    #[error("cannot {operation} secret {key}: cancelled")]
    Cancelled { operation: Operation, key: ObjectKey },
}

impl StoreError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            StoreError::NotFound { .. } => ErrorKind::NotFound,
            StoreError::OwnershipConflict { .. } => ErrorKind::OwnershipConflict,
            StoreError::Transient { .. } => ErrorKind::Transient,
            StoreError::Configuration(_) => ErrorKind::Configuration,
            StoreError::Cancelled { .. } => ErrorKind::Cancelled,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.kind() == ErrorKind::NotFound
    }

    /// Attach operation context to a failed apply or retry loop
    pub(crate) fn from_apply(operation: Operation, key: ObjectKey, err: ApplyError) -> Self {
        match err {
            ApplyError::Precondition(reason) => StoreError::OwnershipConflict {
                operation,
                key,
                reason,
            },
            ApplyError::Api { source, .. }
                if operation == Operation::Read && is_not_found(&source) =>
            {
                StoreError::NotFound { operation, key }
            }
            ApplyError::Api { attempts, source } => StoreError::Transient {
                operation,
                key,
                attempts,
                source,
            },
            ApplyError::Cancelled => StoreError::Cancelled { operation, key },
        }
    }
}

/// Failure of a single apply, or of a whole retry loop
#[derive(Error, Debug)]
pub enum ApplyError {
    #[error("precondition failed: {0}")]
    Precondition(String),

    #[error("kubernetes API error after {attempts} attempt(s): {source}")]
    Api {
        attempts: u32,
        #[source]
        source: kube::Error,
    },

    #[error("cancelled")]
    Cancelled,
}

impl From<kube::Error> for ApplyError {
    fn from(source: kube::Error) -> Self {
        ApplyError::Api {
            attempts: 1,
            source,
        }
    }
}

/// Errors raised while resolving remote-cluster credentials
#[derive(Error, Debug)]
pub enum CredentialError {
    #[error("credentials source {0} is not supported by the kubernetes secret store")]
    UnsupportedSource(CredentialsSource),

    #[error("credentials source {0} requires a {1} selector")]
    MissingSelector(CredentialsSource, &'static str),

    #[error("cannot get credentials secret {key}: {source}")]
    Secret {
        key: ObjectKey,
        #[source]
        source: kube::Error,
    },

    #[error("credentials secret {key} does not contain '{field}' key")]
    MissingKey { key: ObjectKey, field: String },

    #[error("environment variable {0} is not set")]
    Environment(String),

    #[error("cannot read credentials file {path}: {source}")]
    Filesystem {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid kubeconfig: {0}")]
    Kubeconfig(String),
}

pub type Result<T> = std::result::Result<T, StoreError>;

pub(crate) fn is_not_found(err: &kube::Error) -> bool {
    matches!(err, kube::Error::Api(resp) if resp.code == 404)
}
