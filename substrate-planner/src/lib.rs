//! # substrate-planner
//!
//! LLM planner contract for the session substrate.
//!
//! ## Overview
//!
//! - [`Planner`] - Maps a prompt + [`substrate_session::Snapshot`] +
//!   capability list to an ordered plan of capability calls
//! - [`PlanResult`] - Plan or structured error (`LLM_ERROR`, `PLAN_PARSE_ERROR`)
//! - [`record_plan`] - Appends the `plan_generated` trajectory entry
//! - [`MockPlanner`] - Canned plans for tests
//! - `OllamaPlanner` - Local LLMs via Ollama — requires the `ollama` feature
//!
//! ## Quick Start
//!
//! ```rust
//! use substrate_core::CapabilityCall;
//! use substrate_planner::{MockPlanner, PlanResult, Planner, record_plan};
//! use substrate_session::Session;
//!
//! let mut session = Session::new();
//! let planner = MockPlanner::new("mock")
//!     .with_plan(PlanResult::ok(vec![CapabilityCall::new("reverse")]));
//!
//! let snapshot = session.snapshot_for_agent("planner", None);
//! let plan = planner.plan("flip the text", &snapshot, &["reverse".to_string()]);
//! assert!(plan.success);
//!
//! record_plan(&mut session, "flip the text", &plan.calls, Some(planner.name())).unwrap();
//! ```

pub mod mock;
pub mod planner;

#[cfg(feature = "ollama")]
pub mod ollama;

pub use mock::MockPlanner;
pub use planner::{PlanResult, Planner, record_plan};

#[cfg(feature = "ollama")]
pub use ollama::{OllamaConfig, OllamaPlanner};
