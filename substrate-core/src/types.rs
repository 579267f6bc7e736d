use crate::error::ErrorInfo;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeSet;

/// A typed request to execute one capability with parameters.
///
/// Plans produced by an LLM planner deserialize directly into a
/// `Vec<CapabilityCall>`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CapabilityCall {
    pub capability: String,
    #[serde(default)]
    pub params: Map<String, Value>,
}

impl CapabilityCall {
    pub fn new(capability: impl Into<String>) -> Self {
        Self { capability: capability.into(), params: Map::new() }
    }

    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }
}

/// Identity and advertised capabilities of an agent.
///
/// `capabilities` is a sorted set; registration rejects an empty one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentInfo {
    pub agent_id: String,
    pub name: String,
    pub version: String,
    pub capabilities: BTreeSet<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl AgentInfo {
    pub fn new(
        agent_id: impl Into<String>,
        name: impl Into<String>,
        version: impl Into<String>,
    ) -> Self {
        Self {
            agent_id: agent_id.into(),
            name: name.into(),
            version: version.into(),
            capabilities: BTreeSet::new(),
            description: None,
        }
    }

    pub fn with_capability(mut self, capability: impl Into<String>) -> Self {
        self.capabilities.insert(capability.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// Outcome of a single agent invocation.
///
/// Exactly one of `result` / `error` is populated, matching `success`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvokeResult {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Map<String, Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorInfo>,
    pub agent_id: String,
    pub capability: String,
}

impl InvokeResult {
    pub fn ok(
        agent_id: impl Into<String>,
        capability: impl Into<String>,
        result: Map<String, Value>,
    ) -> Self {
        Self {
            success: true,
            result: Some(result),
            error: None,
            agent_id: agent_id.into(),
            capability: capability.into(),
        }
    }

    pub fn fail(
        agent_id: impl Into<String>,
        capability: impl Into<String>,
        error: ErrorInfo,
    ) -> Self {
        Self {
            success: false,
            result: None,
            error: Some(error),
            agent_id: agent_id.into(),
            capability: capability.into(),
        }
    }
}
