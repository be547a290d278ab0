// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Test utilities: an in-memory Kubernetes API server for secrets.
//!
//! `FakeApiServer` is a tower service backing a real `kube::Client`. It keeps
//! secrets per namespace, assigns uids and resource versions, rejects stale
//! `resourceVersion`s with 409 like the real API server, applies JSON merge
//! patches, and can be told to fail the next N requests of a given method.

use http::{Method, Request, Response};
use http_body_util::BodyExt;
use k8s_openapi::api::core::v1::Secret;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::OwnerReference;
use k8s_openapi::ByteString;
use kube::api::ObjectMeta;
use kube::client::Body;
use kube::Client;
use serde_json::{json, Value};
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};
use std::task::{Context, Poll};
use tower::Service;

use crate::types::KeyValues;

#[derive(Clone, Default)]
pub struct FakeApiServer {
    state: Arc<Mutex<State>>,
}

#[derive(Default)]
struct State {
    secrets: BTreeMap<(String, String), Value>,
    resource_version: u64,
    faults: Vec<Fault>,
    // methods whose next request finds its secret deleted by someone else
    removals: Vec<String>,
    requests: Vec<(String, String)>,
}

struct Fault {
    method: String,
    status: u16,
    remaining: usize,
}

impl FakeApiServer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a kube Client talking to this server
    pub fn client(&self) -> Client {
        Client::new(self.clone(), "default")
    }

    /// Store a secret as if it had been created through the API
    pub fn insert_secret(&self, secret: &Secret) {
        let namespace = secret.metadata.namespace.clone().unwrap_or_default();
        let value = serde_json::to_value(secret).unwrap();
        let (status, body) = self.state.lock().unwrap().create(namespace, Some(value));
        assert_eq!(status, 201, "seeding secret failed: {}", body);
    }

    pub fn secret(&self, namespace: &str, name: &str) -> Option<Secret> {
        self.state
            .lock()
            .unwrap()
            .secrets
            .get(&(namespace.to_string(), name.to_string()))
            .map(|v| serde_json::from_value(v.clone()).unwrap())
    }

    /// Fail the next `times` requests with the given method
    pub fn fail_next(&self, method: &str, status: u16, times: usize) {
        self.state.lock().unwrap().faults.push(Fault {
            method: method.to_string(),
            status,
            remaining: times,
        });
    }

    /// Delete the addressed secret right before the next `method` request is served
    pub fn remove_before_next(&self, method: &str) {
        self.state.lock().unwrap().removals.push(method.to_string());
    }

    pub fn request_count(&self, method: &str) -> usize {
        self.state
            .lock()
            .unwrap()
            .requests
            .iter()
            .filter(|(m, _)| m == method)
            .count()
    }

    fn handle(&self, method: &Method, path: &str, body: &[u8]) -> (u16, Value) {
        let mut state = self.state.lock().unwrap();
        state
            .requests
            .push((method.to_string(), path.to_string()));

        if let Some(fault) = state
            .faults
            .iter_mut()
            .find(|f| f.method == method.as_str() && f.remaining > 0)
        {
            fault.remaining -= 1;
            let status = fault.status;
            return (status, status_json(status, "Injected", "injected failure"));
        }

        let Some((namespace, name)) = parse_secret_path(path) else {
            return (404, not_found_json("path", path));
        };
        if let (Some(name), Some(pos)) = (
            name.as_ref(),
            state.removals.iter().position(|m| m == method.as_str()),
        ) {
            state.removals.remove(pos);
            state.secrets.remove(&(namespace.clone(), name.clone()));
        }
        let request: Option<Value> = serde_json::from_slice(body).ok();

        match (method.as_str(), name) {
            ("GET", Some(name)) => state.get(namespace, name),
            ("POST", None) => state.create(namespace, request),
            ("PUT", Some(name)) => state.replace(namespace, name, request),
            ("PATCH", Some(name)) => state.patch(namespace, name, request),
            ("DELETE", Some(name)) => state.delete(namespace, name, request),
            _ => (
                405,
                status_json(405, "MethodNotAllowed", "method not allowed"),
            ),
        }
    }
}

impl State {
    fn next_version(&mut self) -> String {
        self.resource_version += 1;
        self.resource_version.to_string()
    }

    fn get(&self, namespace: String, name: String) -> (u16, Value) {
        match self.secrets.get(&(namespace, name.clone())) {
            Some(secret) => (200, secret.clone()),
            None => (404, not_found_json("secrets", &name)),
        }
    }

    fn create(&mut self, namespace: String, body: Option<Value>) -> (u16, Value) {
        let Some(mut secret) = body else {
            return (400, status_json(400, "BadRequest", "missing body"));
        };
        let Some(name) = secret["metadata"]["name"].as_str().map(str::to_string) else {
            return (422, status_json(422, "Invalid", "metadata.name is required"));
        };
        let key = (namespace.clone(), name.clone());
        if self.secrets.contains_key(&key) {
            return (
                409,
                status_json(
                    409,
                    "AlreadyExists",
                    &format!("secrets \"{}\" already exists", name),
                ),
            );
        }

        let version = self.next_version();
        secret["metadata"]["namespace"] = json!(namespace);
        secret["metadata"]["uid"] = json!(format!("uid-{}", version));
        secret["metadata"]["resourceVersion"] = json!(version);
        self.secrets.insert(key, secret.clone());
        (201, secret)
    }

    fn replace(&mut self, namespace: String, name: String, body: Option<Value>) -> (u16, Value) {
        let key = (namespace.clone(), name.clone());
        let Some(current) = self.secrets.get(&key) else {
            return (404, not_found_json("secrets", &name));
        };
        let Some(mut secret) = body else {
            return (400, status_json(400, "BadRequest", "missing body"));
        };
        if let Some(conflict) = check_version(current, &secret["metadata"]["resourceVersion"], &name) {
            return conflict;
        }

        let uid = current["metadata"]["uid"].clone();
        let version = self.next_version();
        secret["metadata"]["namespace"] = json!(namespace);
        secret["metadata"]["uid"] = uid;
        secret["metadata"]["resourceVersion"] = json!(version);
        self.secrets.insert(key, secret.clone());
        (200, secret)
    }

    fn patch(&mut self, namespace: String, name: String, body: Option<Value>) -> (u16, Value) {
        let key = (namespace, name.clone());
        let Some(mut secret) = self.secrets.get(&key).cloned() else {
            return (404, not_found_json("secrets", &name));
        };
        let Some(patch) = body else {
            return (400, status_json(400, "BadRequest", "missing body"));
        };
        if let Some(conflict) = check_version(&secret, &patch["metadata"]["resourceVersion"], &name) {
            return conflict;
        }

        merge_patch(&mut secret, &patch);
        secret["metadata"]["resourceVersion"] = json!(self.next_version());
        self.secrets.insert(key, secret.clone());
        (200, secret)
    }

    fn delete(&mut self, namespace: String, name: String, body: Option<Value>) -> (u16, Value) {
        let key = (namespace, name.clone());
        let Some(current) = self.secrets.get(&key) else {
            return (404, not_found_json("secrets", &name));
        };
        let expected = body
            .as_ref()
            .map(|b| b["preconditions"]["resourceVersion"].clone())
            .unwrap_or(Value::Null);
        if let Some(conflict) = check_version(current, &expected, &name) {
            return conflict;
        }

        let removed = self.secrets.remove(&key).unwrap_or(Value::Null);
        (200, removed)
    }
}

fn check_version(current: &Value, expected: &Value, name: &str) -> Option<(u16, Value)> {
    let expected = expected.as_str()?;
    if current["metadata"]["resourceVersion"].as_str() == Some(expected) {
        return None;
    }
    Some((
        409,
        status_json(
            409,
            "Conflict",
            &format!(
                "Operation cannot be fulfilled on secrets \"{}\": the object has been modified; please apply your changes to the latest version and try again",
                name
            ),
        ),
    ))
}

/// RFC 7386 JSON merge patch
fn merge_patch(target: &mut Value, patch: &Value) {
    let Value::Object(patch) = patch else {
        *target = patch.clone();
        return;
    };
    if !target.is_object() {
        *target = json!({});
    }
    let Value::Object(target) = target else {
        return;
    };
    for (key, value) in patch {
        if value.is_null() {
            target.remove(key);
        } else {
            merge_patch(target.entry(key.clone()).or_insert(Value::Null), value);
        }
    }
}

/// Split `/api/v1/namespaces/{ns}/secrets[/{name}]`
fn parse_secret_path(path: &str) -> Option<(String, Option<String>)> {
    let rest = path.strip_prefix("/api/v1/namespaces/")?;
    let mut parts = rest.split('/');
    let namespace = parts.next()?.to_string();
    if parts.next()? != "secrets" {
        return None;
    }
    let name = parts.next().filter(|n| !n.is_empty()).map(str::to_string);
    Some((namespace, name))
}

impl Service<Request<Body>> for FakeApiServer {
    type Response = Response<Body>;
    type Error = tower::BoxError;
    type Future = std::pin::Pin<
        Box<dyn std::future::Future<Output = Result<Self::Response, Self::Error>> + Send>,
    >;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, req: Request<Body>) -> Self::Future {
        let server = self.clone();

        Box::pin(async move {
            let (parts, body) = req.into_parts();
            let body = body.collect().await?.to_bytes();
            let (status, payload) = server.handle(&parts.method, parts.uri.path(), &body);

            Ok(Response::builder()
                .status(status)
                .header("content-type", "application/json")
                .body(Body::from(payload.to_string().into_bytes()))
                .unwrap())
        })
    }
}

fn status_json(code: u16, reason: &str, message: &str) -> Value {
    json!({
        "kind": "Status",
        "apiVersion": "v1",
        "metadata": {},
        "status": "Failure",
        "message": message,
        "reason": reason,
        "code": code
    })
}

/// Create a 404 not found response
pub fn not_found_json(resource: &str, name: &str) -> Value {
    status_json(
        404,
        "NotFound",
        &format!("{} \"{}\" not found", resource, name),
    )
}

/// A controller owner reference for a fake `Database` resource
pub fn owner(uid: &str) -> OwnerReference {
    OwnerReference {
        api_version: "example.org/v1".to_string(),
        kind: "Database".to_string(),
        name: format!("db-{}", uid),
        uid: uid.to_string(),
        controller: Some(true),
        block_owner_deletion: Some(true),
    }
}

pub fn kv(pairs: &[(&str, &str)]) -> KeyValues {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.as_bytes().to_vec()))
        .collect()
}

/// A secret that has never been touched by the store
pub fn plain_secret(namespace: &str, name: &str, type_: &str, data: &[(&str, &str)]) -> Secret {
    Secret {
        metadata: ObjectMeta {
            name: Some(name.to_string()),
            namespace: Some(namespace.to_string()),
            ..Default::default()
        },
        type_: Some(type_.to_string()),
        data: Some(
            data.iter()
                .map(|(k, v)| (k.to_string(), ByteString(v.as_bytes().to_vec())))
                .collect(),
        ),
        ..Default::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_secret_path_item() {
        assert_eq!(
            parse_secret_path("/api/v1/namespaces/ns1/secrets/db-creds"),
            Some(("ns1".to_string(), Some("db-creds".to_string())))
        );
    }

    #[test]
    fn test_parse_secret_path_collection() {
        assert_eq!(
            parse_secret_path("/api/v1/namespaces/ns1/secrets"),
            Some(("ns1".to_string(), None))
        );
        assert_eq!(parse_secret_path("/api/v1/namespaces/ns1/configmaps/x"), None);
    }

    #[test]
    fn test_merge_patch_merges_nested_maps() {
        let mut target = json!({"data": {"a": "1", "b": "2"}, "type": "x"});
        merge_patch(&mut target, &json!({"data": {"b": "3", "c": "4"}, "type": null}));
        assert_eq!(target, json!({"data": {"a": "1", "b": "3", "c": "4"}}));
    }
}
