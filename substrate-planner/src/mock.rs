use crate::planner::{PlanResult, Planner};
use std::collections::VecDeque;
use std::sync::Mutex;
use substrate_session::Snapshot;

/// Canned planner for tests: hands out queued plans in order and an empty
/// successful plan once the queue runs dry.
pub struct MockPlanner {
    name: String,
    plans: Mutex<VecDeque<PlanResult>>,
}

impl MockPlanner {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into(), plans: Mutex::new(VecDeque::new()) }
    }

    pub fn with_plan(self, plan: PlanResult) -> Self {
        self.plans.lock().unwrap().push_back(plan);
        self
    }
}

impl Planner for MockPlanner {
    fn name(&self) -> &str {
        &self.name
    }

    fn plan(&self, _prompt: &str, _snapshot: &Snapshot, _capabilities: &[String]) -> PlanResult {
        self.plans
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| PlanResult::ok(Vec::new()))
    }
}
