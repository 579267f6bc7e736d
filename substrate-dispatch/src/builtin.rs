//! Built-in string-transform agents.
//!
//! `ReverseAgent` and `UppercaseAgent` are the reference implementations of
//! the [`Agent`] contract: they read the string under `params["key"]`,
//! transform it, write it back, and bracket the work with `agent_invoked` /
//! `agent_completed` (or `agent_failed`) entries.

use crate::agent::Agent;
use serde_json::{Map, Value, json};
use substrate_core::{AgentInfo, EntryType, ErrorCode, ErrorInfo, InvokeResult};
use substrate_session::Session;
use tracing::warn;

/// Reverses the string stored under `params["key"]`.
pub struct ReverseAgent;

impl Agent for ReverseAgent {
    fn info(&self) -> AgentInfo {
        AgentInfo::new("reverse-agent", "Reverse", env!("CARGO_PKG_VERSION"))
            .with_capability("reverse")
            .with_description("Reverses the string stored under the given state key")
    }

    fn invoke(
        &self,
        capability: &str,
        session: &mut Session,
        params: &Map<String, Value>,
    ) -> InvokeResult {
        transform_string(&self.info(), "reverse", capability, session, params, |text| {
            text.chars().rev().collect()
        })
    }
}

/// Uppercases the string stored under `params["key"]`.
pub struct UppercaseAgent;

impl Agent for UppercaseAgent {
    fn info(&self) -> AgentInfo {
        AgentInfo::new("uppercase-agent", "Uppercase", env!("CARGO_PKG_VERSION"))
            .with_capability("uppercase")
            .with_description("Uppercases the string stored under the given state key")
    }

    fn invoke(
        &self,
        capability: &str,
        session: &mut Session,
        params: &Map<String, Value>,
    ) -> InvokeResult {
        transform_string(&self.info(), "uppercase", capability, session, params, |text| {
            text.to_uppercase()
        })
    }
}

fn transform_string(
    info: &AgentInfo,
    expected: &str,
    capability: &str,
    session: &mut Session,
    params: &Map<String, Value>,
    transform: impl FnOnce(&str) -> String,
) -> InvokeResult {
    let agent_id = info.agent_id.as_str();

    if capability != expected {
        return InvokeResult::fail(
            agent_id,
            capability,
            ErrorInfo::new(
                ErrorCode::UnknownCapability,
                format!("{} does not provide capability '{}'", agent_id, capability),
            ),
        );
    }

    let mut invoked = Map::new();
    invoked.insert("capability".to_string(), json!(capability));
    invoked.insert("params".to_string(), Value::Object(params.clone()));
    record(session, agent_id, EntryType::AgentInvoked, invoked);

    let fail = |session: &mut Session, message: String| {
        let mut content = Map::new();
        content.insert("capability".to_string(), json!(capability));
        content.insert("error".to_string(), json!(message));
        record(session, agent_id, EntryType::AgentFailed, content);
        InvokeResult::fail(agent_id, capability, ErrorInfo::new(ErrorCode::AgentError, message))
    };

    let Some(key) = params.get("key").and_then(Value::as_str) else {
        return fail(session, "params missing string field 'key'".to_string());
    };
    let Some(value) = session.get(key) else {
        return fail(session, format!("state key '{}' not found", key));
    };
    let Some(text) = value.as_str() else {
        return fail(session, format!("state key '{}' does not hold a string", key));
    };

    let transformed = transform(text);
    if let Err(err) = session.set(key, json!(transformed)) {
        return fail(session, err.to_string());
    }

    let mut completed = Map::new();
    completed.insert("capability".to_string(), json!(capability));
    completed.insert("key".to_string(), json!(key));
    record(session, agent_id, EntryType::AgentCompleted, completed);

    let mut result = Map::new();
    result.insert("key".to_string(), json!(key));
    result.insert("value".to_string(), json!(transformed));
    InvokeResult::ok(agent_id, capability, result)
}

fn record(
    session: &mut Session,
    agent_id: &str,
    entry_type: EntryType,
    content: Map<String, Value>,
) {
    // append only rejects an empty agent id; built-in ids are constants
    if let Err(err) = session.append(agent_id, entry_type, content) {
        warn!(error = %err, "failed to record agent entry");
    }
}
