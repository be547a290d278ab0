// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use serde::{Deserialize, Serialize};

pub const TYPE_READY: &str = "Ready";

pub const STATUS_TRUE: &str = "True";
pub const STATUS_FALSE: &str = "False";

/// A status condition on a conditioned resource such as a store config
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Condition {
    #[serde(rename = "type")]
    pub condition_type: String,
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl Condition {
    pub fn ready() -> Self {
        Self {
            condition_type: TYPE_READY.to_string(),
            status: STATUS_TRUE.to_string(),
            reason: Some("Available".to_string()),
            message: None,
        }
    }

    pub fn not_ready(reason: &str, message: impl Into<String>) -> Self {
        Self {
            condition_type: TYPE_READY.to_string(),
            status: STATUS_FALSE.to_string(),
            reason: Some(reason.to_string()),
            message: Some(message.into()),
        }
    }

    pub fn is_true(&self) -> bool {
        self.status == STATUS_TRUE
    }
}

/// Check whether a Ready=True condition is present
pub fn is_ready(conditions: &[Condition]) -> bool {
    conditions
        .iter()
        .any(|c| c.condition_type == TYPE_READY && c.is_true())
}

/// Replace the condition of the same type, or append it
pub fn set_condition(conditions: &mut Vec<Condition>, condition: Condition) {
    match conditions
        .iter_mut()
        .find(|c| c.condition_type == condition.condition_type)
    {
        Some(existing) => *existing = condition,
        None => conditions.push(condition),
    }
}
