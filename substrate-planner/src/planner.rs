use serde::{Deserialize, Serialize};
use serde_json::{Map, json};
use substrate_core::{
    AGENT_ID_PLANNER, CapabilityCall, EntryType, ErrorInfo, Result, SubstrateError,
    TrajectoryEntry,
};
use substrate_session::{Session, Snapshot};

/// Outcome of a planning request: an ordered list of capability calls, or a
/// structured error (`LLM_ERROR` for transport failures, `PLAN_PARSE_ERROR`
/// for responses that do not decode into a valid plan).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanResult {
    pub success: bool,
    pub calls: Vec<CapabilityCall>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorInfo>,
}

impl PlanResult {
    pub fn ok(calls: Vec<CapabilityCall>) -> Self {
        Self { success: true, calls, error: None }
    }

    pub fn fail(error: ErrorInfo) -> Self {
        Self { success: false, calls: Vec::new(), error: Some(error) }
    }
}

/// Maps unstructured input to an ordered plan of capability calls.
///
/// A planner only observes the session through a [`Snapshot`], never the
/// live object; executing the plan is the dispatcher's job. `plan` blocks
/// for as long as the backing model takes — the substrate imposes no async
/// contract and no timeout, so planner implementations own their own.
pub trait Planner: Send + Sync {
    fn name(&self) -> &str;

    fn plan(&self, prompt: &str, snapshot: &Snapshot, capabilities: &[String]) -> PlanResult;
}

/// Record a generated plan in the trajectory, attributed to `"planner"`.
///
/// Content carries the prompt, the calls, and the model name when known.
pub fn record_plan(
    session: &mut Session,
    prompt: &str,
    calls: &[CapabilityCall],
    model: Option<&str>,
) -> Result<TrajectoryEntry> {
    let calls = serde_json::to_value(calls)
        .map_err(|e| SubstrateError::InvalidValue(format!("plan serialize failed: {}", e)))?;

    let mut content = Map::new();
    content.insert("prompt".to_string(), json!(prompt));
    content.insert("calls".to_string(), calls);
    if let Some(model) = model {
        content.insert("model".to_string(), json!(model));
    }
    session.append(AGENT_ID_PLANNER, EntryType::PlanGenerated, content)
}

#[cfg(test)]
mod tests {
    use super::*;
    use substrate_core::ErrorCode;

    #[test]
    fn test_plan_result_constructors() {
        let ok = PlanResult::ok(vec![CapabilityCall::new("reverse")]);
        assert!(ok.success);
        assert_eq!(ok.calls.len(), 1);

        let fail = PlanResult::fail(ErrorInfo::new(ErrorCode::LlmError, "connection refused"));
        assert!(!fail.success);
        assert!(fail.calls.is_empty());
    }

    #[test]
    fn test_record_plan_entry() {
        let mut session = Session::new();
        let calls = vec![CapabilityCall::new("reverse").with_param("key", "text")];

        let entry = record_plan(&mut session, "flip it", &calls, Some("llama3.2")).unwrap();

        assert_eq!(entry.entry_type, EntryType::PlanGenerated);
        assert_eq!(entry.agent_id, AGENT_ID_PLANNER);
        assert_eq!(entry.content["prompt"], json!("flip it"));
        assert_eq!(entry.content["model"], json!("llama3.2"));
        assert_eq!(entry.content["calls"][0]["capability"], json!("reverse"));
    }

    #[test]
    fn test_record_plan_without_model() {
        let mut session = Session::new();
        let entry = record_plan(&mut session, "noop", &[], None).unwrap();
        assert!(!entry.content.contains_key("model"));
        assert_eq!(entry.content["calls"], json!([]));
    }
}
