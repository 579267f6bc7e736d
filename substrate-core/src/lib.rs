//! # substrate-core
//!
//! Core value types and error codes for the session substrate.
//!
//! ## Overview
//!
//! This crate provides the foundational types shared by every substrate crate:
//!
//! - [`TrajectoryEntry`] / [`EntryType`] - Records in a session's append-only trajectory
//! - [`InvokeResult`] - Structured outcome of an agent invocation
//! - [`CapabilityCall`] / [`AgentInfo`] - Typed capability requests and agent identity
//! - [`SubstrateError`] / [`ErrorCode`] / [`Result`] - Unified error handling
//!
//! ## Error Handling
//!
//! Fallible APIs return [`Result`] with a [`SubstrateError`]; every variant maps
//! onto the closed [`ErrorCode`] set, and errors that cross the dispatch boundary
//! travel as structured [`ErrorInfo`] values inside an [`InvokeResult`] rather
//! than as native errors.

pub mod entry;
pub mod error;
pub mod types;

pub use entry::{
    AGENT_ID_DISPATCHER, AGENT_ID_PLANNER, AGENT_ID_SYSTEM, EntryType, TrajectoryEntry,
};
pub use error::{ErrorCode, ErrorInfo, Result, SubstrateError};
pub use types::{AgentInfo, CapabilityCall, InvokeResult};
