use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;
use substrate_core::TrajectoryEntry;

/// A deeply-copied, disconnected view of a session.
///
/// Produced by [`crate::Session::snapshot_for_agent`]; owns every field, so
/// neither side can observe the other's later mutations. Artifact bytes are
/// deliberately absent — only names are listed. `Serialize` so a snapshot can
/// be embedded in a planner prompt or logged wholesale.
#[derive(Debug, Clone, Serialize)]
pub struct Snapshot {
    pub session_id: String,
    pub state: HashMap<String, Value>,
    pub state_version: u64,
    pub trajectory: Vec<TrajectoryEntry>,
    pub artifacts: Vec<String>,
    pub snapshot_time: DateTime<Utc>,
}

impl Snapshot {
    /// Read a state value from the snapshot.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.state.get(key)
    }
}
