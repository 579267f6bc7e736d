use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// The closed set of error codes surfaced by the substrate.
///
/// Codes cross the dispatch boundary inside [`ErrorInfo`] and serialize as
/// SCREAMING_SNAKE_CASE strings (`INVALID_KEY`, `ARTIFACT_TOO_LARGE`, ...),
/// which is also the form stored in trajectory content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    InvalidKey,
    InvalidValue,
    InvalidName,
    ArtifactNotFound,
    ArtifactTooLarge,
    UnknownCapability,
    DuplicateCapability,
    AgentError,
    PersistenceError,
    LlmError,
    PlanParseError,
}

impl ErrorCode {
    /// The wire form of the code.
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::InvalidKey => "INVALID_KEY",
            ErrorCode::InvalidValue => "INVALID_VALUE",
            ErrorCode::InvalidName => "INVALID_NAME",
            ErrorCode::ArtifactNotFound => "ARTIFACT_NOT_FOUND",
            ErrorCode::ArtifactTooLarge => "ARTIFACT_TOO_LARGE",
            ErrorCode::UnknownCapability => "UNKNOWN_CAPABILITY",
            ErrorCode::DuplicateCapability => "DUPLICATE_CAPABILITY",
            ErrorCode::AgentError => "AGENT_ERROR",
            ErrorCode::PersistenceError => "PERSISTENCE_ERROR",
            ErrorCode::LlmError => "LLM_ERROR",
            ErrorCode::PlanParseError => "PLAN_PARSE_ERROR",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A structured error value: code, human-readable message, optional details.
///
/// This is the form errors take inside [`crate::InvokeResult`] and in
/// trajectory content; session APIs use [`SubstrateError`] instead.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorInfo {
    pub error_code: ErrorCode,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
}

impl ErrorInfo {
    pub fn new(error_code: ErrorCode, message: impl Into<String>) -> Self {
        Self { error_code, message: message.into(), details: None }
    }

    pub fn with_details(mut self, details: Value) -> Self {
        self.details = Some(details);
        self
    }
}

impl fmt::Display for ErrorInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.error_code, self.message)
    }
}

/// Error type for fallible substrate operations.
///
/// Variants map 1:1 onto [`ErrorCode`] via [`SubstrateError::code`], so a
/// caller can always recover the wire code from a native error.
#[derive(Debug, thiserror::Error)]
pub enum SubstrateError {
    #[error("invalid key: {0}")]
    InvalidKey(String),

    #[error("invalid value: {0}")]
    InvalidValue(String),

    #[error("invalid artifact name: {0}")]
    InvalidName(String),

    #[error("artifact not found: {0}")]
    ArtifactNotFound(String),

    #[error("artifact too large: {0}")]
    ArtifactTooLarge(String),

    #[error("unknown capability: {0}")]
    UnknownCapability(String),

    #[error("duplicate capability: {0}")]
    DuplicateCapability(String),

    #[error("agent error: {0}")]
    Agent(String),

    #[error("persistence error: {0}")]
    Persistence(String),

    #[error("llm error: {0}")]
    Llm(String),

    #[error("plan parse error: {0}")]
    PlanParse(String),
}

impl SubstrateError {
    /// The wire code for this error.
    pub fn code(&self) -> ErrorCode {
        match self {
            SubstrateError::InvalidKey(_) => ErrorCode::InvalidKey,
            SubstrateError::InvalidValue(_) => ErrorCode::InvalidValue,
            SubstrateError::InvalidName(_) => ErrorCode::InvalidName,
            SubstrateError::ArtifactNotFound(_) => ErrorCode::ArtifactNotFound,
            SubstrateError::ArtifactTooLarge(_) => ErrorCode::ArtifactTooLarge,
            SubstrateError::UnknownCapability(_) => ErrorCode::UnknownCapability,
            SubstrateError::DuplicateCapability(_) => ErrorCode::DuplicateCapability,
            SubstrateError::Agent(_) => ErrorCode::AgentError,
            SubstrateError::Persistence(_) => ErrorCode::PersistenceError,
            SubstrateError::Llm(_) => ErrorCode::LlmError,
            SubstrateError::PlanParse(_) => ErrorCode::PlanParseError,
        }
    }

    /// Convert into the structured form carried by dispatch results.
    pub fn info(&self) -> ErrorInfo {
        ErrorInfo::new(self.code(), self.to_string())
    }
}

impl From<&SubstrateError> for ErrorInfo {
    fn from(err: &SubstrateError) -> Self {
        err.info()
    }
}

pub type Result<T> = std::result::Result<T, SubstrateError>;
