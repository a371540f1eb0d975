//! Error types for lifecycle coordination.

use mooring_cluster::ClusterError;
use mooring_store::StoreError;
use thiserror::Error;

/// Result type alias for coordinator operations.
pub type CoordinatorResult<T> = Result<T, CoordinatorError>;

/// Errors surfaced by lifecycle operations.
#[derive(Debug, Error)]
pub enum CoordinatorError {
    #[error("invalid descriptor: {0}")]
    Validation(String),

    /// A live resource already holds the name; the create was refused.
    #[error("{0} already exists")]
    AlreadyExists(String),

    /// Update was asked for a resource that is not live; there is no
    /// upsert, the caller must create first.
    #[error("{0} is not live, create it first")]
    MustCreateFirst(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("manifest serialization failed: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error(transparent)]
    Cluster(#[from] ClusterError),

    #[error("store error: {0}")]
    Store(StoreError),
}

impl From<StoreError> for CoordinatorError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(what) => CoordinatorError::NotFound(what),
            other => CoordinatorError::Store(other),
        }
    }
}
