// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use std::collections::BTreeMap;

use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::OwnerReference;
use kube::Client;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use connection_store::config::Config;
use connection_store::{new_store, KeyValues, SecretInstance};

#[derive(Parser, Debug)]
#[command(name = "connection-store", version, about = "Manage connection secrets")]
struct Cli {
    /// Name of the connection secret
    #[arg(long, global = true, default_value = "")]
    name: String,

    /// Scope (namespace) of the secret, the store default when empty
    #[arg(long, global = true, default_value = "")]
    scope: String,

    /// UID of the owning resource, required for write
    #[arg(long, global = true)]
    owner_uid: Option<String>,

    #[arg(long, global = true, default_value = "")]
    owner_name: String,

    #[arg(long, global = true, default_value = "")]
    owner_kind: String,

    #[arg(long, global = true, default_value = "")]
    owner_api_version: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print every key/value of the secret as JSON
    Read,
    /// Merge key=value pairs into the secret
    Write {
        #[arg(required = true, value_parser = parse_key_value)]
        pairs: Vec<(String, String)>,
    },
    /// Remove keys, deleting the secret once it is empty
    Delete {
        #[arg(required = true)]
        keys: Vec<String>,
    },
}

fn parse_key_value(raw: &str) -> std::result::Result<(String, String), String> {
    match raw.split_once('=') {
        Some((key, _)) if key.is_empty() => Err(format!("empty key in {:?}", raw)),
        Some((key, value)) => Ok((key.to_string(), value.to_string())),
        None => Err(format!("expected key=value, got {:?}", raw)),
    }
}

impl Cli {
    fn instance(&self) -> Result<SecretInstance> {
        if self.name.is_empty() {
            bail!("--name is required");
        }

        let owner = OwnerReference {
            api_version: self.owner_api_version.clone(),
            kind: self.owner_kind.clone(),
            name: self.owner_name.clone(),
            uid: self.owner_uid.clone().unwrap_or_default(),
            controller: Some(true),
            ..Default::default()
        };
        Ok(SecretInstance::new(&self.name, &self.scope, owner))
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Logs go to stderr, stdout carries command output
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let instance = cli.instance()?;

    let config = Config::from_env()?;
    info!(
        "Configuration loaded: default_scope={}, remote={}",
        config.store.default_scope,
        config.store.is_remote()
    );

    let client = Client::try_default().await?;
    let store = new_store(client, &config.store).await?;

    let cancel = CancellationToken::new();
    let on_signal = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted, cancelling");
            on_signal.cancel();
        }
    });

    match cli.command {
        Command::Read => {
            let kv = store.read_key_values(&cancel, &instance).await?;
            let printable: BTreeMap<String, String> = kv
                .into_iter()
                .map(|(k, v)| (k, String::from_utf8_lossy(&v).into_owned()))
                .collect();
            println!("{}", serde_json::to_string_pretty(&printable)?);
        }
        Command::Write { pairs } => {
            if cli.owner_uid.is_none() {
                bail!("--owner-uid is required for write");
            }
            let kv: KeyValues = pairs
                .into_iter()
                .map(|(k, v)| (k, v.into_bytes()))
                .collect();
            store.write_key_values(&cancel, &instance, &kv).await?;
            info!("Wrote {} key(s) to {}", kv.len(), instance.name);
        }
        Command::Delete { keys } => {
            let kv: KeyValues = keys.into_iter().map(|k| (k, Vec::new())).collect();
            store.delete_key_values(&cancel, &instance, &kv).await?;
            info!("Removed {} key(s) from {}", kv.len(), instance.name);
        }
    }

    Ok(())
}
