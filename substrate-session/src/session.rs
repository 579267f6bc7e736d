use crate::config::{DEFAULT_MAX_ARTIFACT_SIZE, SCHEMA_VERSION, SessionConfig};
use crate::query::TrajectoryQuery;
use crate::snapshot::Snapshot;
use chrono::{DateTime, Utc};
use serde_json::{Map, Value, json};
use std::collections::HashMap;
use std::path::Path;
use substrate_core::{
    AGENT_ID_SYSTEM, EntryType, Result, SubstrateError, TrajectoryEntry,
};
use tracing::{debug, info};
use uuid::Uuid;

/// The complete addressable unit of work: versioned key-value state, an
/// append-only trajectory, and a size-bounded artifact store behind one
/// coordinating object.
///
/// Every accepted mutation appends exactly one trajectory entry with a dense,
/// strictly increasing `seq_num` and a non-decreasing timestamp, and state
/// mutations keep `state_version` equal to the number of `state_set` plus
/// `state_deleted` entries. Validation failures leave the session untouched
/// and append nothing.
///
/// A `Session` is single-threaded by design: mutation requires `&mut self`,
/// so the borrow checker enforces serialized access. Callers that need to
/// share one across threads must add their own synchronization.
pub struct Session {
    pub(crate) session_id: String,
    pub(crate) state: HashMap<String, Value>,
    pub(crate) state_version: u64,
    pub(crate) trajectory: Vec<TrajectoryEntry>,
    pub(crate) artifacts: HashMap<String, Vec<u8>>,
    pub(crate) max_artifact_size: usize,
    pub(crate) schema_version: i64,
}

impl Session {
    /// Create a session with a generated UUID v4 id and default limits.
    pub fn new() -> Self {
        Self::with_config(SessionConfig::default())
    }

    /// Create a session from explicit options.
    ///
    /// Appends the `session_created` entry, so the trajectory is never empty.
    pub fn with_config(config: SessionConfig) -> Self {
        let session_id =
            config.session_id.unwrap_or_else(|| Uuid::new_v4().to_string());
        let max_artifact_size =
            config.max_artifact_size.unwrap_or(DEFAULT_MAX_ARTIFACT_SIZE);

        let mut session = Self {
            session_id: session_id.clone(),
            state: HashMap::new(),
            state_version: 0,
            trajectory: Vec::new(),
            artifacts: HashMap::new(),
            max_artifact_size,
            schema_version: SCHEMA_VERSION,
        };

        let mut content = Map::new();
        content.insert("session_id".to_string(), json!(session_id));
        content.insert("schema_version".to_string(), json!(SCHEMA_VERSION));
        content.insert("max_artifact_size".to_string(), json!(max_artifact_size));
        session.push_entry(AGENT_ID_SYSTEM, EntryType::SessionCreated, content);

        info!(session_id = %session.session_id, "session created");
        session
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub fn schema_version(&self) -> i64 {
        self.schema_version
    }

    pub fn max_artifact_size(&self) -> usize {
        self.max_artifact_size
    }

    // ------------------------------------------------------------------
    // State
    // ------------------------------------------------------------------

    /// Store `value` under `key` and record a `state_set` entry.
    ///
    /// The session takes ownership of the value, so later caller-side edits
    /// cannot reach stored state. Fails with `INVALID_KEY` on an empty key.
    pub fn set(&mut self, key: impl Into<String>, value: Value) -> Result<()> {
        let key = key.into();
        if key.is_empty() {
            return Err(SubstrateError::InvalidKey("state key must not be empty".to_string()));
        }

        let old_value = self.state.get(&key).cloned().unwrap_or(Value::Null);
        self.state.insert(key.clone(), value.clone());
        self.state_version += 1;

        let mut content = Map::new();
        content.insert("key".to_string(), json!(key));
        content.insert("old_value".to_string(), old_value);
        content.insert("new_value".to_string(), value);
        content.insert("state_version".to_string(), json!(self.state_version));
        self.push_entry(AGENT_ID_SYSTEM, EntryType::StateSet, content);

        debug!(key = %key, state_version = self.state_version, "state set");
        Ok(())
    }

    /// Read a value. Returns an owned copy: mutating it never changes the
    /// session. Pure, no trajectory effect.
    pub fn get(&self, key: &str) -> Option<Value> {
        self.state.get(key).cloned()
    }

    /// Read a value, falling back to `default` when the key is absent.
    pub fn get_or(&self, key: &str, default: Value) -> Value {
        self.get(key).unwrap_or(default)
    }

    pub fn has(&self, key: &str) -> bool {
        self.state.contains_key(key)
    }

    /// Snapshot of current keys. Ordering is unspecified but stable within a
    /// call.
    pub fn keys(&self) -> Vec<String> {
        self.state.keys().cloned().collect()
    }

    pub fn state_version(&self) -> u64 {
        self.state_version
    }

    /// Remove a key. An absent key is a no-op with no trajectory entry;
    /// returns whether anything was removed.
    pub fn delete(&mut self, key: &str) -> bool {
        let Some(old_value) = self.state.remove(key) else {
            return false;
        };
        self.state_version += 1;

        let mut content = Map::new();
        content.insert("key".to_string(), json!(key));
        content.insert("old_value".to_string(), old_value);
        content.insert("state_version".to_string(), json!(self.state_version));
        self.push_entry(AGENT_ID_SYSTEM, EntryType::StateDeleted, content);

        debug!(key = %key, state_version = self.state_version, "state deleted");
        true
    }

    // ------------------------------------------------------------------
    // Trajectory
    // ------------------------------------------------------------------

    /// Append an entry on behalf of `agent_id` and return a copy of it.
    ///
    /// Fails with `INVALID_KEY` on an empty agent id. Sequence number and
    /// timestamp are assigned here; callers never pick them.
    pub fn append(
        &mut self,
        agent_id: &str,
        entry_type: EntryType,
        content: Map<String, Value>,
    ) -> Result<TrajectoryEntry> {
        if agent_id.is_empty() {
            return Err(SubstrateError::InvalidKey("agent id must not be empty".to_string()));
        }
        Ok(self.push_entry(agent_id, entry_type, content).clone())
    }

    /// Filtered view of the trajectory, ascending by `seq_num`.
    pub fn trajectory(&self, query: &TrajectoryQuery) -> Vec<TrajectoryEntry> {
        let mut entries: Vec<&TrajectoryEntry> = self
            .trajectory
            .iter()
            .filter(|e| query.since_seq.is_none_or(|since| e.seq_num > since))
            .filter(|e| query.entry_type.is_none_or(|ty| e.entry_type == ty))
            .collect();

        if let Some(limit) = query.limit {
            let start = entries.len().saturating_sub(limit);
            entries.drain(..start);
        }

        entries.into_iter().cloned().collect()
    }

    /// Single entry lookup by sequence number.
    pub fn entry(&self, seq_num: u64) -> Option<&TrajectoryEntry> {
        // seq_nums are dense from 1, so the index is seq_num - 1
        seq_num
            .checked_sub(1)
            .and_then(|idx| self.trajectory.get(idx as usize))
    }

    pub fn trajectory_len(&self) -> usize {
        self.trajectory.len()
    }

    // ------------------------------------------------------------------
    // Artifacts
    // ------------------------------------------------------------------

    /// Store an opaque byte blob under `name`, overwriting silently.
    ///
    /// Fails with `INVALID_NAME` on an empty name and `ARTIFACT_TOO_LARGE`
    /// when the blob exceeds the configured ceiling; either failure leaves
    /// the store unchanged and appends nothing. A blob exactly at the
    /// ceiling is accepted.
    pub fn write_artifact(&mut self, name: &str, data: impl Into<Vec<u8>>) -> Result<()> {
        if name.is_empty() {
            return Err(SubstrateError::InvalidName(
                "artifact name must not be empty".to_string(),
            ));
        }
        let data = data.into();
        if data.len() > self.max_artifact_size {
            return Err(SubstrateError::ArtifactTooLarge(format!(
                "{} is {} bytes, limit is {} bytes",
                name,
                data.len(),
                self.max_artifact_size
            )));
        }

        let size = data.len();
        let overwrote = self.artifacts.insert(name.to_string(), data).is_some();

        let mut content = Map::new();
        content.insert("name".to_string(), json!(name));
        content.insert("size".to_string(), json!(size));
        content.insert("overwrote".to_string(), json!(overwrote));
        self.push_entry(AGENT_ID_SYSTEM, EntryType::ArtifactWritten, content);

        debug!(name = %name, size, overwrote, "artifact written");
        Ok(())
    }

    /// Borrow an artifact's bytes. Fails with `ARTIFACT_NOT_FOUND` when
    /// absent. The returned slice is read-only; the stored blob can only
    /// change through [`Session::write_artifact`].
    pub fn read_artifact(&self, name: &str) -> Result<&[u8]> {
        self.artifacts
            .get(name)
            .map(|data| data.as_slice())
            .ok_or_else(|| SubstrateError::ArtifactNotFound(name.to_string()))
    }

    /// Sorted artifact names.
    pub fn list_artifacts(&self) -> Vec<String> {
        let mut names: Vec<String> = self.artifacts.keys().cloned().collect();
        names.sort();
        names
    }

    /// Remove an artifact. Fails with `ARTIFACT_NOT_FOUND` when absent.
    pub fn delete_artifact(&mut self, name: &str) -> Result<()> {
        let Some(data) = self.artifacts.remove(name) else {
            return Err(SubstrateError::ArtifactNotFound(name.to_string()));
        };

        let mut content = Map::new();
        content.insert("name".to_string(), json!(name));
        content.insert("size".to_string(), json!(data.len()));
        self.push_entry(AGENT_ID_SYSTEM, EntryType::ArtifactDeleted, content);

        debug!(name = %name, "artifact deleted");
        Ok(())
    }

    // ------------------------------------------------------------------
    // Snapshotting
    // ------------------------------------------------------------------

    /// Deeply-copied, disconnected view for safe observation by an agent.
    ///
    /// Carries state, the last `depth` trajectory entries (all when `None`),
    /// and artifact names only — no bytes. Mutating the snapshot never
    /// affects the session and vice versa.
    pub fn snapshot_for_agent(&self, agent_id: &str, depth: Option<usize>) -> Snapshot {
        let start = depth.map_or(0, |d| self.trajectory.len().saturating_sub(d));

        debug!(agent_id = %agent_id, depth, "snapshot taken");
        Snapshot {
            session_id: self.session_id.clone(),
            state: self.state.clone(),
            state_version: self.state_version,
            trajectory: self.trajectory[start..].to_vec(),
            artifacts: self.list_artifacts(),
            snapshot_time: self.clamped_now(),
        }
    }

    // ------------------------------------------------------------------
    // Persistence
    // ------------------------------------------------------------------

    /// Write the entire session to a single SQLite file at `path`.
    ///
    /// Atomic on success: the data goes to a temp sibling first and is
    /// renamed over `path`, so a failure leaves no partial file visible. An
    /// existing file is replaced.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        crate::database::save(self, path.as_ref())
    }

    /// Reconstruct a session previously written by [`Session::save`].
    ///
    /// Restores identity, limits, state, trajectory (exact seq_nums and
    /// timestamps), and artifact bytes. Fails with `PERSISTENCE_ERROR` on
    /// schema mismatch, corruption, or I/O error, yielding no partial
    /// session.
    pub fn load(path: impl AsRef<Path>) -> Result<Session> {
        crate::database::load(path.as_ref())
    }

    // ------------------------------------------------------------------
    // Internals
    // ------------------------------------------------------------------

    /// Wall clock clamped to the last entry's timestamp, so trajectory
    /// timestamps stay non-decreasing even if the clock steps back.
    fn clamped_now(&self) -> DateTime<Utc> {
        let now = Utc::now();
        match self.trajectory.last() {
            Some(last) if last.timestamp > now => last.timestamp,
            _ => now,
        }
    }

    fn push_entry(
        &mut self,
        agent_id: &str,
        entry_type: EntryType,
        content: Map<String, Value>,
    ) -> &TrajectoryEntry {
        let entry = TrajectoryEntry {
            seq_num: self.trajectory.len() as u64 + 1,
            timestamp: self.clamped_now(),
            agent_id: agent_id.to_string(),
            entry_type,
            content,
        };
        self.trajectory.push(entry);
        &self.trajectory[self.trajectory.len() - 1]
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("session_id", &self.session_id)
            .field("state_version", &self.state_version)
            .field("trajectory_len", &self.trajectory.len())
            .field("artifact_count", &self.artifacts.len())
            .finish()
    }
}
