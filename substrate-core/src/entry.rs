use crate::error::SubstrateError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;

// Reserved attribution ids
pub const AGENT_ID_SYSTEM: &str = "system";
pub const AGENT_ID_DISPATCHER: &str = "dispatcher";
pub const AGENT_ID_PLANNER: &str = "planner";

/// The closed set of trajectory entry types.
///
/// Serialized snake_case in JSON and in the persistence file's `entry_type`
/// column ([`EntryType::as_str`] / [`FromStr`] give the same form).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryType {
    SessionCreated,
    StateSet,
    StateDeleted,
    ArtifactWritten,
    ArtifactDeleted,
    AgentInvoked,
    AgentCompleted,
    AgentFailed,
    CapabilityDispatched,
    PlanGenerated,
    Custom,
}

impl EntryType {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntryType::SessionCreated => "session_created",
            EntryType::StateSet => "state_set",
            EntryType::StateDeleted => "state_deleted",
            EntryType::ArtifactWritten => "artifact_written",
            EntryType::ArtifactDeleted => "artifact_deleted",
            EntryType::AgentInvoked => "agent_invoked",
            EntryType::AgentCompleted => "agent_completed",
            EntryType::AgentFailed => "agent_failed",
            EntryType::CapabilityDispatched => "capability_dispatched",
            EntryType::PlanGenerated => "plan_generated",
            EntryType::Custom => "custom",
        }
    }
}

impl fmt::Display for EntryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EntryType {
    type Err = SubstrateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "session_created" => Ok(EntryType::SessionCreated),
            "state_set" => Ok(EntryType::StateSet),
            "state_deleted" => Ok(EntryType::StateDeleted),
            "artifact_written" => Ok(EntryType::ArtifactWritten),
            "artifact_deleted" => Ok(EntryType::ArtifactDeleted),
            "agent_invoked" => Ok(EntryType::AgentInvoked),
            "agent_completed" => Ok(EntryType::AgentCompleted),
            "agent_failed" => Ok(EntryType::AgentFailed),
            "capability_dispatched" => Ok(EntryType::CapabilityDispatched),
            "plan_generated" => Ok(EntryType::PlanGenerated),
            "custom" => Ok(EntryType::Custom),
            other => Err(SubstrateError::InvalidValue(format!("unknown entry type: {}", other))),
        }
    }
}

/// A single record in a session's append-only trajectory.
///
/// Entries are immutable once appended: the session hands out clones, never
/// mutable references. `seq_num` is dense and strictly increasing from 1;
/// `timestamp` is non-decreasing along the trajectory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrajectoryEntry {
    pub seq_num: u64,
    pub timestamp: DateTime<Utc>,
    pub agent_id: String,
    pub entry_type: EntryType,
    pub content: Map<String, Value>,
}

impl TrajectoryEntry {
    /// Convenience accessor for a content field.
    pub fn content_field(&self, key: &str) -> Option<&Value> {
        self.content.get(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_entry_type_round_trip() {
        for ty in [
            EntryType::SessionCreated,
            EntryType::StateSet,
            EntryType::StateDeleted,
            EntryType::ArtifactWritten,
            EntryType::ArtifactDeleted,
            EntryType::AgentInvoked,
            EntryType::AgentCompleted,
            EntryType::AgentFailed,
            EntryType::CapabilityDispatched,
            EntryType::PlanGenerated,
            EntryType::Custom,
        ] {
            assert_eq!(ty.as_str().parse::<EntryType>().unwrap(), ty);
        }
    }

    #[test]
    fn test_entry_type_serde_matches_as_str() {
        let value = serde_json::to_value(EntryType::CapabilityDispatched).unwrap();
        assert_eq!(value, json!("capability_dispatched"));
    }

    #[test]
    fn test_unknown_entry_type_rejected() {
        assert!("state_mutated".parse::<EntryType>().is_err());
    }

    #[test]
    fn test_entry_serde() {
        let mut content = Map::new();
        content.insert("key".to_string(), json!("text"));
        let entry = TrajectoryEntry {
            seq_num: 7,
            timestamp: Utc::now(),
            agent_id: AGENT_ID_SYSTEM.to_string(),
            entry_type: EntryType::StateSet,
            content,
        };
        let encoded = serde_json::to_string(&entry).unwrap();
        let back: TrajectoryEntry = serde_json::from_str(&encoded).unwrap();
        assert_eq!(back, entry);
        assert_eq!(back.content_field("key"), Some(&json!("text")));
    }
}
