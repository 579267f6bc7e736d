//! # substrate-dispatch
//!
//! Capability registry and fail-fast dispatch for session substrate agents.
//!
//! ## Overview
//!
//! - [`Agent`] - The contract callable units implement: identity via
//!   [`substrate_core::AgentInfo`], execution via `invoke`
//! - [`Dispatcher`] - Maps capability names to agents and routes
//!   [`substrate_core::CapabilityCall`]s, recording `capability_dispatched`
//!   markers around every invocation
//! - [`SequenceResult`] - Outcome of an ordered, fail-fast call sequence
//! - [`builtin`] - Reference agents (`reverse`, `uppercase`)
//!
//! ## Quick Start
//!
//! ```rust
//! use serde_json::{Map, json};
//! use std::sync::Arc;
//! use substrate_dispatch::{Dispatcher, builtin::ReverseAgent};
//! use substrate_session::Session;
//!
//! let mut session = Session::new();
//! session.set("text", json!("hello")).unwrap();
//!
//! let mut dispatcher = Dispatcher::new();
//! dispatcher.register(Arc::new(ReverseAgent)).unwrap();
//!
//! let mut params = Map::new();
//! params.insert("key".to_string(), json!("text"));
//! let result = dispatcher.dispatch_single("reverse", &mut session, &params);
//!
//! assert!(result.success);
//! assert_eq!(session.get("text"), Some(json!("olleh")));
//! ```

pub mod agent;
pub mod builtin;
pub mod dispatcher;

pub use agent::Agent;
pub use dispatcher::{Dispatcher, SequenceResult};
