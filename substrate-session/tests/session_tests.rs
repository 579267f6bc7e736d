use serde_json::{Map, json};
use substrate_core::{AGENT_ID_SYSTEM, EntryType, ErrorCode};
use substrate_session::{Session, SessionConfig, TrajectoryQuery};

#[test]
fn test_create_session() {
    let session = Session::new();
    assert!(!session.session_id().is_empty());
    assert_eq!(session.state_version(), 0);
    assert_eq!(session.trajectory_len(), 1);

    let first = session.entry(1).unwrap();
    assert_eq!(first.entry_type, EntryType::SessionCreated);
    assert_eq!(first.agent_id, AGENT_ID_SYSTEM);
    assert_eq!(first.content["session_id"], json!(session.session_id()));
}

#[test]
fn test_create_with_preset_id() {
    let session =
        Session::with_config(SessionConfig::new().with_session_id("fixed-id"));
    assert_eq!(session.session_id(), "fixed-id");
}

#[test]
fn test_set_and_get() {
    let mut session = Session::new();
    session.set("text", json!("hello")).unwrap();

    assert_eq!(session.get("text"), Some(json!("hello")));
    assert!(session.has("text"));
    assert_eq!(session.state_version(), 1);

    let entry = session.entry(2).unwrap();
    assert_eq!(entry.entry_type, EntryType::StateSet);
    assert_eq!(entry.content["key"], json!("text"));
    assert_eq!(entry.content["old_value"], json!(null));
    assert_eq!(entry.content["new_value"], json!("hello"));
    assert_eq!(entry.content["state_version"], json!(1));
}

#[test]
fn test_set_records_old_value_on_overwrite() {
    let mut session = Session::new();
    session.set("n", json!(1)).unwrap();
    session.set("n", json!(2)).unwrap();

    let entry = session.entry(3).unwrap();
    assert_eq!(entry.content["old_value"], json!(1));
    assert_eq!(entry.content["new_value"], json!(2));
    assert_eq!(session.state_version(), 2);
}

#[test]
fn test_set_empty_key_rejected() {
    let mut session = Session::new();
    let err = session.set("", json!(1)).unwrap_err();
    assert_eq!(err.code(), ErrorCode::InvalidKey);
    // validation failures leave no trace
    assert_eq!(session.state_version(), 0);
    assert_eq!(session.trajectory_len(), 1);
}

#[test]
fn test_get_or_default() {
    let session = Session::new();
    assert_eq!(session.get("missing"), None);
    assert_eq!(session.get_or("missing", json!("fallback")), json!("fallback"));
}

#[test]
fn test_get_returns_disconnected_value() {
    let mut session = Session::new();
    session.set("list", json!([1, 2, 3])).unwrap();

    let mut value = session.get("list").unwrap();
    value.as_array_mut().unwrap().push(json!(4));

    assert_eq!(session.get("list"), Some(json!([1, 2, 3])));
}

#[test]
fn test_delete_present_key() {
    let mut session = Session::new();
    session.set("text", json!("hello")).unwrap();
    assert!(session.delete("text"));

    assert_eq!(session.get("text"), None);
    assert_eq!(session.state_version(), 2);

    let entry = session.entry(3).unwrap();
    assert_eq!(entry.entry_type, EntryType::StateDeleted);
    assert_eq!(entry.content["old_value"], json!("hello"));
    assert_eq!(entry.content["state_version"], json!(2));
}

#[test]
fn test_delete_absent_key_is_noop() {
    let mut session = Session::new();
    assert!(!session.delete("missing"));
    assert_eq!(session.state_version(), 0);
    assert_eq!(session.trajectory_len(), 1);
}

#[test]
fn test_set_then_delete_then_get_returns_default() {
    let mut session = Session::new();
    session.set("k", json!({"a": 1})).unwrap();
    session.delete("k");
    assert_eq!(session.get_or("k", json!(null)), json!(null));
}

#[test]
fn test_keys() {
    let mut session = Session::new();
    session.set("a", json!(1)).unwrap();
    session.set("b", json!(2)).unwrap();

    let mut keys = session.keys();
    keys.sort();
    assert_eq!(keys, vec!["a".to_string(), "b".to_string()]);
}

#[test]
fn test_append_custom_entry() {
    let mut session = Session::new();
    let mut content = Map::new();
    content.insert("note".to_string(), json!("checkpoint"));

    let entry = session.append("observer", EntryType::Custom, content).unwrap();
    assert_eq!(entry.seq_num, 2);
    assert_eq!(entry.agent_id, "observer");
    assert_eq!(session.entry(2).unwrap(), &entry);
}

#[test]
fn test_append_empty_agent_id_rejected() {
    let mut session = Session::new();
    let err = session.append("", EntryType::Custom, Map::new()).unwrap_err();
    assert_eq!(err.code(), ErrorCode::InvalidKey);
    assert_eq!(session.trajectory_len(), 1);
}

#[test]
fn test_trajectory_query_filters() {
    let mut session = Session::new();
    session.set("a", json!(1)).unwrap(); // seq 2
    session.write_artifact("f", b"x".to_vec()).unwrap(); // seq 3
    session.set("b", json!(2)).unwrap(); // seq 4
    session.delete("a"); // seq 5

    let all = session.trajectory(&TrajectoryQuery::new());
    assert_eq!(all.len(), 5);

    let sets = session.trajectory(&TrajectoryQuery::new().of_type(EntryType::StateSet));
    assert_eq!(sets.len(), 2);
    assert!(sets.iter().all(|e| e.entry_type == EntryType::StateSet));

    let since = session.trajectory(&TrajectoryQuery::new().since(3));
    assert_eq!(since.iter().map(|e| e.seq_num).collect::<Vec<_>>(), vec![4, 5]);
}

#[test]
fn test_trajectory_limit_keeps_newest_in_ascending_order() {
    let mut session = Session::new();
    for i in 0..5 {
        session.set(format!("k{}", i), json!(i)).unwrap();
    }

    let tail = session.trajectory(&TrajectoryQuery::new().with_limit(2));
    assert_eq!(tail.iter().map(|e| e.seq_num).collect::<Vec<_>>(), vec![5, 6]);
}

#[test]
fn test_entry_lookup_out_of_range() {
    let session = Session::new();
    assert!(session.entry(0).is_none());
    assert!(session.entry(2).is_none());
}

#[test]
fn test_write_and_read_artifact() {
    let mut session = Session::new();
    session.write_artifact("out/data.bin", vec![0u8, 1, 2]).unwrap();

    assert_eq!(session.read_artifact("out/data.bin").unwrap(), &[0u8, 1, 2]);

    let entry = session.entry(2).unwrap();
    assert_eq!(entry.entry_type, EntryType::ArtifactWritten);
    assert_eq!(entry.content["name"], json!("out/data.bin"));
    assert_eq!(entry.content["size"], json!(3));
    assert_eq!(entry.content["overwrote"], json!(false));
}

#[test]
fn test_artifact_overwrite_flag() {
    let mut session = Session::new();
    session.write_artifact("f", b"one".to_vec()).unwrap();
    session.write_artifact("f", b"two".to_vec()).unwrap();

    assert_eq!(session.read_artifact("f").unwrap(), b"two");
    let entry = session.entry(3).unwrap();
    assert_eq!(entry.content["overwrote"], json!(true));
}

#[test]
fn test_artifact_size_boundary() {
    let mut session = Session::with_config(SessionConfig::new().with_max_artifact_size(16));

    session.write_artifact("a", vec![0u8; 16]).unwrap();

    let err = session.write_artifact("b", vec![0u8; 17]).unwrap_err();
    assert_eq!(err.code(), ErrorCode::ArtifactTooLarge);

    // the failed write left no blob and no entry
    assert_eq!(session.list_artifacts(), vec!["a".to_string()]);
    assert_eq!(session.trajectory_len(), 2);
}

#[test]
fn test_artifact_empty_name_rejected() {
    let mut session = Session::new();
    let err = session.write_artifact("", b"x".to_vec()).unwrap_err();
    assert_eq!(err.code(), ErrorCode::InvalidName);
    assert_eq!(session.trajectory_len(), 1);
}

#[test]
fn test_read_missing_artifact() {
    let session = Session::new();
    let err = session.read_artifact("nope").unwrap_err();
    assert_eq!(err.code(), ErrorCode::ArtifactNotFound);
}

#[test]
fn test_list_artifacts_sorted() {
    let mut session = Session::new();
    session.write_artifact("b", b"2".to_vec()).unwrap();
    session.write_artifact("a", b"1".to_vec()).unwrap();
    assert_eq!(session.list_artifacts(), vec!["a".to_string(), "b".to_string()]);
}

#[test]
fn test_delete_artifact() {
    let mut session = Session::new();
    session.write_artifact("f", b"x".to_vec()).unwrap();
    session.delete_artifact("f").unwrap();

    assert!(session.list_artifacts().is_empty());
    assert_eq!(session.entry(3).unwrap().entry_type, EntryType::ArtifactDeleted);

    let err = session.delete_artifact("f").unwrap_err();
    assert_eq!(err.code(), ErrorCode::ArtifactNotFound);
}

#[test]
fn test_snapshot_is_isolated_from_session() {
    let mut session = Session::new();
    session.set("x", json!([1, 2, 3])).unwrap();

    let mut snapshot = session.snapshot_for_agent("observer", None);

    // mutating the snapshot does not reach the session
    snapshot
        .state
        .get_mut("x")
        .unwrap()
        .as_array_mut()
        .unwrap()
        .push(json!(4));
    assert_eq!(session.get("x"), Some(json!([1, 2, 3])));

    // mutating the session does not reach an earlier snapshot
    let snapshot = session.snapshot_for_agent("observer", None);
    session.set("x", json!([9])).unwrap();
    assert_eq!(snapshot.get("x"), Some(&json!([1, 2, 3])));
}

#[test]
fn test_snapshot_contents() {
    let mut session = Session::new();
    session.set("a", json!(1)).unwrap();
    session.write_artifact("blob", b"bytes".to_vec()).unwrap();

    let snapshot = session.snapshot_for_agent("observer", None);
    assert_eq!(snapshot.session_id, session.session_id());
    assert_eq!(snapshot.state_version, 1);
    assert_eq!(snapshot.trajectory.len(), 3);
    // names only, no bytes
    assert_eq!(snapshot.artifacts, vec!["blob".to_string()]);
}

#[test]
fn test_snapshot_depth() {
    let mut session = Session::new();
    for i in 0..4 {
        session.set(format!("k{}", i), json!(i)).unwrap();
    }

    let snapshot = session.snapshot_for_agent("observer", Some(2));
    assert_eq!(snapshot.trajectory.len(), 2);
    assert_eq!(snapshot.trajectory[0].seq_num, 4);
    assert_eq!(snapshot.trajectory[1].seq_num, 5);
}

#[test]
fn test_hundred_sets_dense_seq_and_monotonic_timestamps() {
    let mut session = Session::new();
    for i in 0..100 {
        session.set(format!("k{}", i), json!(i)).unwrap();
    }

    let entries = session.trajectory(&TrajectoryQuery::new());
    assert_eq!(entries.len(), 101);
    for (idx, entry) in entries.iter().enumerate() {
        assert_eq!(entry.seq_num, idx as u64 + 1);
    }
    for pair in entries.windows(2) {
        assert!(pair[0].timestamp <= pair[1].timestamp);
    }
    assert_eq!(session.state_version(), 100);
}
