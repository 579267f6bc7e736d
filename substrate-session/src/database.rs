use crate::config::SCHEMA_VERSION;
use crate::session::Session;
use chrono::{DateTime, Utc};
use rusqlite::{Connection, OpenFlags, params};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use substrate_core::{EntryType, Result, SubstrateError, TrajectoryEntry};
use tracing::info;
use uuid::Uuid;

/// Write the session to a fresh SQLite file at a temp sibling of `path`,
/// fsync it, then rename over `path`. A failure at any step removes the temp
/// file and leaves whatever was at `path` untouched.
pub(crate) fn save(session: &Session, path: &Path) -> Result<()> {
    let file_name = path
        .file_name()
        .ok_or_else(|| {
            SubstrateError::Persistence(format!("invalid save path: {}", path.display()))
        })?
        .to_string_lossy()
        .into_owned();
    let tmp_path =
        path.with_file_name(format!(".{}.tmp-{}", file_name, Uuid::new_v4().simple()));

    if let Err(err) = write_session(session, &tmp_path) {
        let _ = fs::remove_file(&tmp_path);
        return Err(err);
    }

    // The rename is only atomic-on-success if the temp file's contents are
    // durable first.
    let sync_and_rename = || -> Result<()> {
        let file = fs::File::open(&tmp_path)
            .map_err(|e| SubstrateError::Persistence(format!("fsync open failed: {}", e)))?;
        file.sync_all()
            .map_err(|e| SubstrateError::Persistence(format!("fsync failed: {}", e)))?;
        drop(file);
        fs::rename(&tmp_path, path)
            .map_err(|e| SubstrateError::Persistence(format!("rename failed: {}", e)))
    };
    if let Err(err) = sync_and_rename() {
        let _ = fs::remove_file(&tmp_path);
        return Err(err);
    }

    info!(session_id = %session.session_id, path = %path.display(), "session saved");
    Ok(())
}

fn write_session(session: &Session, path: &Path) -> Result<()> {
    let mut conn = Connection::open(path)
        .map_err(|e| SubstrateError::Persistence(format!("database open failed: {}", e)))?;

    conn.execute_batch(
        r#"
        CREATE TABLE metadata (
            key TEXT PRIMARY KEY,
            value TEXT
        );
        CREATE TABLE state (
            key TEXT PRIMARY KEY,
            value BLOB
        );
        CREATE TABLE trajectory (
            seq_num INTEGER PRIMARY KEY,
            timestamp TEXT,
            agent_id TEXT,
            entry_type TEXT,
            content BLOB
        );
        CREATE TABLE artifacts (
            name TEXT PRIMARY KEY,
            data BLOB
        );
        "#,
    )
    .map_err(|e| SubstrateError::Persistence(format!("migration failed: {}", e)))?;

    let tx = conn
        .transaction()
        .map_err(|e| SubstrateError::Persistence(format!("transaction failed: {}", e)))?;

    let metadata = [
        ("session_id", session.session_id.clone()),
        ("schema_version", session.schema_version.to_string()),
        ("max_artifact_size", session.max_artifact_size.to_string()),
        ("state_version", session.state_version.to_string()),
    ];
    for (key, value) in metadata {
        tx.execute("INSERT INTO metadata (key, value) VALUES (?1, ?2)", params![key, value])
            .map_err(|e| SubstrateError::Persistence(format!("insert failed: {}", e)))?;
    }

    for (key, value) in &session.state {
        // Values are serde_json::Value throughout, so this only fails on an
        // internal-consistency bug, not on user input.
        let raw = serde_json::to_vec(value)
            .map_err(|e| SubstrateError::Persistence(format!("state serialize failed: {}", e)))?;
        tx.execute("INSERT INTO state (key, value) VALUES (?1, ?2)", params![key, raw])
            .map_err(|e| SubstrateError::Persistence(format!("insert failed: {}", e)))?;
    }

    for entry in &session.trajectory {
        let content = serde_json::to_vec(&entry.content).map_err(|e| {
            SubstrateError::Persistence(format!("content serialize failed: {}", e))
        })?;
        tx.execute(
            "INSERT INTO trajectory (seq_num, timestamp, agent_id, entry_type, content) \
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                entry.seq_num as i64,
                entry.timestamp.to_rfc3339(),
                entry.agent_id,
                entry.entry_type.as_str(),
                content
            ],
        )
        .map_err(|e| SubstrateError::Persistence(format!("insert failed: {}", e)))?;
    }

    for (name, data) in &session.artifacts {
        tx.execute("INSERT INTO artifacts (name, data) VALUES (?1, ?2)", params![name, data])
            .map_err(|e| SubstrateError::Persistence(format!("insert failed: {}", e)))?;
    }

    tx.commit()
        .map_err(|e| SubstrateError::Persistence(format!("commit failed: {}", e)))?;
    conn.close()
        .map_err(|(_, e)| SubstrateError::Persistence(format!("database close failed: {}", e)))?;
    Ok(())
}

pub(crate) fn load(path: &Path) -> Result<Session> {
    let conn = Connection::open_with_flags(path, OpenFlags::SQLITE_OPEN_READ_ONLY)
        .map_err(|e| SubstrateError::Persistence(format!("database open failed: {}", e)))?;

    let metadata = read_metadata(&conn)?;
    let schema_version: i64 = metadata_value(&metadata, "schema_version")?
        .parse()
        .map_err(|e| SubstrateError::Persistence(format!("bad schema_version: {}", e)))?;
    if schema_version != SCHEMA_VERSION {
        return Err(SubstrateError::Persistence(format!(
            "unsupported schema version {} (expected {})",
            schema_version, SCHEMA_VERSION
        )));
    }
    let session_id = metadata_value(&metadata, "session_id")?.to_string();
    let max_artifact_size: usize = metadata_value(&metadata, "max_artifact_size")?
        .parse()
        .map_err(|e| SubstrateError::Persistence(format!("bad max_artifact_size: {}", e)))?;
    let state_version: u64 = metadata_value(&metadata, "state_version")?
        .parse()
        .map_err(|e| SubstrateError::Persistence(format!("bad state_version: {}", e)))?;

    let state = read_state(&conn)?;
    let trajectory = read_trajectory(&conn)?;
    let artifacts = read_artifacts(&conn)?;

    verify_integrity(&trajectory, state_version)?;

    info!(session_id = %session_id, path = %path.display(), "session loaded");
    Ok(Session {
        session_id,
        state,
        state_version,
        trajectory,
        artifacts,
        max_artifact_size,
        schema_version,
    })
}

fn read_metadata(conn: &Connection) -> Result<HashMap<String, String>> {
    let mut stmt = conn
        .prepare("SELECT key, value FROM metadata")
        .map_err(|e| SubstrateError::Persistence(format!("query failed: {}", e)))?;
    let rows = stmt
        .query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?)))
        .map_err(|e| SubstrateError::Persistence(format!("query failed: {}", e)))?;

    let mut metadata = HashMap::new();
    for row in rows {
        let (key, value) =
            row.map_err(|e| SubstrateError::Persistence(format!("row read failed: {}", e)))?;
        metadata.insert(key, value);
    }
    Ok(metadata)
}

fn metadata_value<'a>(metadata: &'a HashMap<String, String>, key: &str) -> Result<&'a str> {
    metadata
        .get(key)
        .map(String::as_str)
        .ok_or_else(|| SubstrateError::Persistence(format!("metadata missing {}", key)))
}

fn read_state(conn: &Connection) -> Result<HashMap<String, Value>> {
    let mut stmt = conn
        .prepare("SELECT key, value FROM state")
        .map_err(|e| SubstrateError::Persistence(format!("query failed: {}", e)))?;
    let rows = stmt
        .query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, Vec<u8>>(1)?)))
        .map_err(|e| SubstrateError::Persistence(format!("query failed: {}", e)))?;

    let mut state = HashMap::new();
    for row in rows {
        let (key, raw) =
            row.map_err(|e| SubstrateError::Persistence(format!("row read failed: {}", e)))?;
        let value: Value = serde_json::from_slice(&raw).map_err(|e| {
            SubstrateError::Persistence(format!("state deserialize failed: {}", e))
        })?;
        state.insert(key, value);
    }
    Ok(state)
}

fn read_trajectory(conn: &Connection) -> Result<Vec<TrajectoryEntry>> {
    let mut stmt = conn
        .prepare(
            "SELECT seq_num, timestamp, agent_id, entry_type, content \
             FROM trajectory ORDER BY seq_num",
        )
        .map_err(|e| SubstrateError::Persistence(format!("query failed: {}", e)))?;
    let rows = stmt
        .query_map([], |row| {
            Ok((
                row.get::<_, i64>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, String>(3)?,
                row.get::<_, Vec<u8>>(4)?,
            ))
        })
        .map_err(|e| SubstrateError::Persistence(format!("query failed: {}", e)))?;

    let mut trajectory = Vec::new();
    for row in rows {
        let (seq_num, timestamp, agent_id, entry_type, raw_content) =
            row.map_err(|e| SubstrateError::Persistence(format!("row read failed: {}", e)))?;

        let timestamp = DateTime::parse_from_rfc3339(&timestamp)
            .map_err(|e| SubstrateError::Persistence(format!("parse date failed: {}", e)))?
            .with_timezone(&Utc);
        let entry_type = entry_type.parse::<EntryType>().map_err(|_| {
            SubstrateError::Persistence(format!("unknown entry type: {}", entry_type))
        })?;
        let content: Map<String, Value> = serde_json::from_slice(&raw_content).map_err(|e| {
            SubstrateError::Persistence(format!("content deserialize failed: {}", e))
        })?;

        trajectory.push(TrajectoryEntry {
            seq_num: seq_num as u64,
            timestamp,
            agent_id,
            entry_type,
            content,
        });
    }
    Ok(trajectory)
}

fn read_artifacts(conn: &Connection) -> Result<HashMap<String, Vec<u8>>> {
    let mut stmt = conn
        .prepare("SELECT name, data FROM artifacts")
        .map_err(|e| SubstrateError::Persistence(format!("query failed: {}", e)))?;
    let rows = stmt
        .query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, Vec<u8>>(1)?)))
        .map_err(|e| SubstrateError::Persistence(format!("query failed: {}", e)))?;

    let mut artifacts = HashMap::new();
    for row in rows {
        let (name, data) =
            row.map_err(|e| SubstrateError::Persistence(format!("row read failed: {}", e)))?;
        artifacts.insert(name, data);
    }
    Ok(artifacts)
}

/// A loaded trajectory must satisfy the same invariants an in-memory session
/// maintains; anything else is corruption.
fn verify_integrity(trajectory: &[TrajectoryEntry], state_version: u64) -> Result<()> {
    for (idx, entry) in trajectory.iter().enumerate() {
        if entry.seq_num != idx as u64 + 1 {
            return Err(SubstrateError::Persistence(format!(
                "trajectory not dense: entry {} has seq_num {}",
                idx + 1,
                entry.seq_num
            )));
        }
    }
    if let Some(first) = trajectory.first() {
        if first.entry_type != EntryType::SessionCreated {
            return Err(SubstrateError::Persistence(
                "trajectory does not start with session_created".to_string(),
            ));
        }
    }
    let mutations = trajectory
        .iter()
        .filter(|e| matches!(e.entry_type, EntryType::StateSet | EntryType::StateDeleted))
        .count() as u64;
    if mutations != state_version {
        return Err(SubstrateError::Persistence(format!(
            "state_version {} does not match {} state-mutating entries",
            state_version, mutations
        )));
    }
    Ok(())
}
