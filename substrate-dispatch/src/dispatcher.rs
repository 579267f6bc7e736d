use crate::agent::Agent;
use serde::Serialize;
use serde_json::{Map, Value, json};
use std::any::Any;
use std::collections::HashMap;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;
use substrate_core::{
    AGENT_ID_DISPATCHER, AgentInfo, CapabilityCall, EntryType, ErrorCode, ErrorInfo, InvokeResult,
    Result, SubstrateError,
};
use substrate_session::Session;
use tracing::{debug, warn};

/// Outcome of [`Dispatcher::dispatch_sequence`].
///
/// On failure, `failed_at` is the index of the failing call, `error` is its
/// error, and `results` still includes the failing call's result so the
/// caller can inspect it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SequenceResult {
    pub success: bool,
    pub failed_at: Option<usize>,
    pub error: Option<ErrorInfo>,
    pub results: Vec<InvokeResult>,
}

/// Routes capability invocations to registered agents.
///
/// All registry state lives on the instance — there are no process-wide
/// singletons. At most one agent holds a capability at a time; taking over a
/// capability requires an explicit [`Dispatcher::unregister`] first.
///
/// Dispatch methods never return `Err` and never panic: routing problems and
/// agent failures are encoded in the returned results, and a panicking agent
/// is contained and converted to an `AGENT_ERROR` result. Because execution
/// is single-threaded, an agent's own trajectory entries always land between
/// the `started` and `completed`/`failed` dispatch markers; that ordering is
/// a property of the execution model, not something the dispatcher enforces.
#[derive(Default)]
pub struct Dispatcher {
    registry: HashMap<String, Arc<dyn Agent>>,
    agents: HashMap<String, AgentInfo>,
}

impl Dispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register every capability the agent advertises.
    ///
    /// All-or-nothing: a `DUPLICATE_CAPABILITY` conflict (or an empty
    /// capability set, `INVALID_VALUE`) registers nothing. Registering a
    /// second batch of capabilities under an already-known agent id merges
    /// into that agent's record.
    pub fn register(&mut self, agent: Arc<dyn Agent>) -> Result<()> {
        let info = agent.info();
        if info.capabilities.is_empty() {
            return Err(SubstrateError::InvalidValue(format!(
                "agent {} declares no capabilities",
                info.agent_id
            )));
        }

        for capability in &info.capabilities {
            if self.registry.contains_key(capability) {
                return Err(SubstrateError::DuplicateCapability(capability.clone()));
            }
        }

        for capability in &info.capabilities {
            self.registry.insert(capability.clone(), Arc::clone(&agent));
        }
        debug!(agent_id = %info.agent_id, count = info.capabilities.len(), "agent registered");
        self.agents
            .entry(info.agent_id.clone())
            .and_modify(|existing| {
                existing.capabilities.extend(info.capabilities.iter().cloned())
            })
            .or_insert(info);
        Ok(())
    }

    /// Remove all capabilities of the given agent. No-op when unknown.
    pub fn unregister(&mut self, agent_id: &str) {
        if let Some(info) = self.agents.remove(agent_id) {
            for capability in &info.capabilities {
                self.registry.remove(capability);
            }
            debug!(agent_id = %agent_id, "agent unregistered");
        }
    }

    /// Sorted list of registered capability names.
    pub fn capabilities(&self) -> Vec<String> {
        let mut capabilities: Vec<String> = self.registry.keys().cloned().collect();
        capabilities.sort();
        capabilities
    }

    /// Info for every registered agent, sorted by agent id.
    pub fn agents(&self) -> Vec<AgentInfo> {
        let mut agents: Vec<AgentInfo> = self.agents.values().cloned().collect();
        agents.sort_by(|a, b| a.agent_id.cmp(&b.agent_id));
        agents
    }

    /// Resolve and invoke one capability, bracketing the invocation with
    /// `capability_dispatched` markers attributed to `"dispatcher"`.
    pub fn dispatch_single(
        &self,
        capability: &str,
        session: &mut Session,
        params: &Map<String, Value>,
    ) -> InvokeResult {
        let Some(agent) = self.registry.get(capability) else {
            warn!(capability = %capability, "capability not registered");
            let mut content = Map::new();
            content.insert("capability".to_string(), json!(capability));
            content.insert("status".to_string(), json!("unknown"));
            self.record_marker(session, content);

            return InvokeResult::fail(
                AGENT_ID_DISPATCHER,
                capability,
                ErrorInfo::new(
                    ErrorCode::UnknownCapability,
                    format!("no agent registered for capability '{}'", capability),
                ),
            );
        };
        let agent_id = agent.info().agent_id;
        debug!(capability = %capability, agent_id = %agent_id, "dispatching");

        let mut content = Map::new();
        content.insert("capability".to_string(), json!(capability));
        content.insert("agent_id".to_string(), json!(agent_id));
        content.insert("status".to_string(), json!("started"));
        self.record_marker(session, content);

        let result =
            match catch_unwind(AssertUnwindSafe(|| agent.invoke(capability, session, params))) {
                Ok(result) => result,
                Err(panic) => {
                    let message = panic_message(panic.as_ref());
                    warn!(capability = %capability, agent_id = %agent_id, message = %message,
                        "agent panicked during invoke");
                    InvokeResult::fail(
                        agent_id.clone(),
                        capability,
                        ErrorInfo::new(ErrorCode::AgentError, message),
                    )
                }
            };

        let status = if result.success { "completed" } else { "failed" };
        let mut content = Map::new();
        content.insert("capability".to_string(), json!(capability));
        content.insert("agent_id".to_string(), json!(agent_id));
        content.insert("status".to_string(), json!(status));
        self.record_marker(session, content);

        result
    }

    /// Execute calls strictly in order, stopping at the first failure.
    ///
    /// An empty call list succeeds with empty results.
    pub fn dispatch_sequence(
        &self,
        calls: &[CapabilityCall],
        session: &mut Session,
    ) -> SequenceResult {
        let mut results = Vec::with_capacity(calls.len());

        for (index, call) in calls.iter().enumerate() {
            let result = self.dispatch_single(&call.capability, session, &call.params);
            let failed = !result.success;
            let error = result.error.clone();
            results.push(result);

            if failed {
                warn!(index, capability = %call.capability, "sequence halted at first failure");
                return SequenceResult { success: false, failed_at: Some(index), error, results };
            }
        }

        SequenceResult { success: true, failed_at: None, error: None, results }
    }

    fn record_marker(&self, session: &mut Session, content: Map<String, Value>) {
        // append only rejects an empty agent id, which "dispatcher" never is
        if let Err(err) =
            session.append(AGENT_ID_DISPATCHER, EntryType::CapabilityDispatched, content)
        {
            warn!(error = %err, "failed to record dispatch marker");
        }
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "agent panicked".to_string()
    }
}
