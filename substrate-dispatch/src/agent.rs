use serde_json::{Map, Value};
use substrate_core::{AgentInfo, InvokeResult};
use substrate_session::Session;

/// A callable unit advertising one or more capabilities.
///
/// `info` must be pure, idempotent, and cheap — the dispatcher reads it at
/// registration time and may read it again later. `invoke` runs one
/// capability against the session: it may read and write state, append
/// trajectory entries, and touch artifacts, but every error condition must
/// come back encoded in the [`InvokeResult`] — never as a panic. A
/// capability the agent does not recognize yields `success == false` with
/// `UNKNOWN_CAPABILITY`.
///
/// By convention an agent brackets its work with `agent_invoked` and
/// `agent_completed` / `agent_failed` entries attributed to its own id. The
/// built-ins in [`crate::builtin`] follow it; the dispatcher does not enforce
/// it.
pub trait Agent: Send + Sync {
    fn info(&self) -> AgentInfo;

    fn invoke(
        &self,
        capability: &str,
        session: &mut Session,
        params: &Map<String, Value>,
    ) -> InvokeResult;
}
