//! Error types for knowledge-map operations.

use thiserror::Error;

/// Result type for knowledge-map operations.
pub type MapResult<T> = Result<T, MapError>;

/// Errors that can occur while editing or loading a map.
#[derive(Debug, Error)]
pub enum MapError {
    /// Node not found in the graph.
    #[error("Node not found: {0}")]
    NodeNotFound(String),

    /// A node with the same hash already exists.
    #[error("Duplicate node hash: {0}")]
    DuplicateNode(String),

    /// An edge references a node that is not in the graph.
    #[error("Edge endpoint missing: {from} -> {to}")]
    MissingEndpoint {
        /// Source node hash.
        from: String,
        /// Target node hash.
        to: String,
    },

    /// Edge not found in the graph.
    #[error("Edge not found: {0}")]
    EdgeNotFound(String),

    /// Invalid graph operation.
    #[error("Invalid operation: {0}")]
    InvalidOperation(String),

    /// Graph serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Drag-and-drop payload could not be understood.
    #[error("Invalid drop payload: {0}")]
    Payload(String),

    /// Search terms could not be compiled.
    #[error("Invalid search pattern: {0}")]
    InvalidPattern(String),
}
