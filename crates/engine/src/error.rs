//! Engine-level error types.
//!
//! Graph errors are fatal to the run and surface verbatim in the HTTP
//! `{"error": …}` payload, so the display strings are part of the contract.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    /// Topological sort could not consume every node.
    #[error("Cycle detected in workflow")]
    CycleDetected,

    /// An edge references a node id that does not exist in the workflow.
    #[error("Edge references unknown node '{node_id}'")]
    UnknownNodeReference { node_id: String },

    /// Two or more nodes share the same id.
    #[error("Duplicate node ID: '{0}'")]
    DuplicateNodeId(String),

    /// A node with an empty id is malformed.
    #[error("Node ID must not be empty")]
    EmptyNodeId,
}
