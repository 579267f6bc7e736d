/// Default ceiling for a single artifact: 100 MiB.
pub const DEFAULT_MAX_ARTIFACT_SIZE: usize = 100 * 1024 * 1024;

/// Persistence schema version embedded at creation and checked on load.
pub const SCHEMA_VERSION: i64 = 1;

/// Construction options for a [`crate::Session`].
///
/// # Example
///
/// ```rust
/// use substrate_session::{Session, SessionConfig};
///
/// let session = Session::with_config(
///     SessionConfig::new()
///         .with_session_id("5f9a0a2e-8d4f-4a7e-9c1b-30c1f1a0b9d2")
///         .with_max_artifact_size(16 * 1024),
/// );
/// assert_eq!(session.max_artifact_size(), 16 * 1024);
/// ```
#[derive(Debug, Clone, Default)]
pub struct SessionConfig {
    /// Preset session id; a UUID v4 is generated when absent.
    pub session_id: Option<String>,
    /// Byte ceiling for a single artifact; [`DEFAULT_MAX_ARTIFACT_SIZE`] when absent.
    pub max_artifact_size: Option<usize>,
}

impl SessionConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_session_id(mut self, session_id: impl Into<String>) -> Self {
        self.session_id = Some(session_id.into());
        self
    }

    pub fn with_max_artifact_size(mut self, bytes: usize) -> Self {
        self.max_artifact_size = Some(bytes);
        self
    }
}
