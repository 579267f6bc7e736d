//! # substrate-session
//!
//! Versioned state, append-only trajectory, and artifact storage behind a
//! single session object.
//!
//! ## Overview
//!
//! This crate provides the substrate's central data structure:
//!
//! - [`Session`] - State + trajectory + artifacts with cross-structure invariants
//! - [`SessionConfig`] - Construction options (preset id, artifact size ceiling)
//! - [`TrajectoryQuery`] - Filtered trajectory reads
//! - [`Snapshot`] - Disconnected deep-copy view for safe observation
//! - SQLite persistence via [`Session::save`] / [`Session::load`]
//!
//! ## Quick Start
//!
//! ```rust
//! use serde_json::json;
//! use substrate_session::Session;
//!
//! let mut session = Session::new();
//! session.set("text", json!("hello")).unwrap();
//! assert_eq!(session.get("text"), Some(json!("hello")));
//! assert_eq!(session.state_version(), 1);
//! // seq 1 is session_created, seq 2 the state_set
//! assert_eq!(session.trajectory_len(), 2);
//! ```
//!
//! ## Invariants
//!
//! Every accepted mutation appends exactly one trajectory entry; sequence
//! numbers are dense from 1; timestamps never decrease; `state_version`
//! equals the number of state-mutating entries. Validation failures (empty
//! key, oversized artifact, ...) surface as errors at the call site and leave
//! both the stores and the trajectory untouched.

pub mod config;
mod database;
pub mod query;
pub mod session;
pub mod snapshot;

pub use config::{DEFAULT_MAX_ARTIFACT_SIZE, SCHEMA_VERSION, SessionConfig};
pub use query::TrajectoryQuery;
pub use session::Session;
pub use snapshot::Snapshot;
