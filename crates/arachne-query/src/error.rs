//! Error types for traversal compilation and execution.

use thiserror::Error;

use arachne_graph::GraphError;

/// Errors that can occur while compiling or running a traversal.
///
/// Compile-time variants (`InvalidPipeline`, `UnknownLabel`, `Compile`,
/// `InvalidArgument`) abort before any output. `Backend` terminates a stream
/// at its first occurrence; results already delivered remain valid.
/// Evaluation failures and unresolved lookups are not errors at all: the
/// affected traveler is dropped and execution continues.
#[derive(Debug, Error)]
pub enum QueryError {
    /// The statement list cannot form a pipeline.
    #[error("invalid pipeline: {0}")]
    InvalidPipeline(String),

    /// A `select` referenced a label no prior `as` marked.
    #[error("unknown label '{0}' in select")]
    UnknownLabel(String),

    /// An embedded expression was rejected by the evaluator.
    #[error("expression compile error at offset {position}: {message}")]
    Compile {
        /// Byte offset into the expression source.
        position: usize,
        /// What the evaluator rejected.
        message: String,
    },

    /// A request precondition failed.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// The storage backend failed mid-stream.
    #[error(transparent)]
    Backend(#[from] GraphError),

    /// The caller canceled the traversal.
    #[error("traversal canceled")]
    Canceled,
}

impl QueryError {
    /// Creates an invalid-pipeline error.
    #[must_use]
    pub fn invalid_pipeline(msg: impl Into<String>) -> Self {
        Self::InvalidPipeline(msg.into())
    }
}

/// Result type for traversal operations.
pub type QueryResult<T> = Result<T, QueryError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = QueryError::invalid_pipeline("pipeline must begin with V or E");
        assert!(err.to_string().contains("invalid pipeline"));

        let err = QueryError::UnknownLabel("a".to_string());
        assert!(err.to_string().contains("unknown label 'a'"));

        let err = QueryError::Compile { position: 4, message: "unexpected token".to_string() };
        assert!(err.to_string().contains("offset 4"));
    }
}
