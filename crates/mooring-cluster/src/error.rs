//! Error types for orchestrator access.

use thiserror::Error;

/// Result type alias for cluster operations.
pub type ClusterResult<T> = Result<T, ClusterError>;

/// Errors surfaced by the orchestrator client.
#[derive(Debug, Error)]
pub enum ClusterError {
    /// Transport-level failure (connection, TLS, timeout).
    #[error("cluster transport error: {0}")]
    Transport(String),

    /// The orchestrator answered with a non-success status.
    #[error("cluster api error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("manifest serialization error: {0}")]
    Serialize(String),
}

impl From<reqwest::Error> for ClusterError {
    fn from(err: reqwest::Error) -> Self {
        ClusterError::Transport(err.to_string())
    }
}

impl ClusterError {
    /// True when the orchestrator reported the resource as absent.
    pub fn is_not_found(&self) -> bool {
        matches!(self, ClusterError::Api { status: 404, .. })
    }
}
