//! Error types for graph backends.

use thiserror::Error;

/// Errors that can occur in a graph backend.
#[derive(Debug, Error)]
pub enum GraphError {
    /// The named graph does not exist.
    #[error("graph '{0}' was not found")]
    GraphNotFound(String),

    /// The graph name failed validation.
    #[error("invalid graph name: {0}")]
    InvalidName(#[from] arachne_core::CoreError),

    /// The backend failed while serving a request or a stream.
    #[error("backend failure: {0}")]
    Backend(String),
}

impl GraphError {
    /// Creates a backend failure error.
    #[must_use]
    pub fn backend(msg: impl Into<String>) -> Self {
        Self::Backend(msg.into())
    }
}

/// Result type for backend operations.
pub type GraphResult<T> = Result<T, GraphError>;
