//! Graph compilation error.
//!
//! Returned by `StateGraph::compile` when edges reference unknown nodes or the
//! graph has no well-formed path from START to END.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CompilationError {
    /// A node id in an edge was not registered via `add_node` (and is not START/END).
    #[error("node not found: {0}")]
    NodeNotFound(String),

    /// No edge has from_id == START.
    #[error("graph must have exactly one edge from START")]
    MissingStart,

    /// Nothing can reach END.
    #[error("graph must have at least one edge to END")]
    MissingEnd,

    /// Edges do not form a valid chain (branching plain edges, multiple entry points).
    #[error("invalid graph edges: {0}")]
    InvalidChain(String),

    /// A node has both an outgoing edge and conditional edges; it must have exactly one.
    #[error("node has both edge and conditional edges: {0}")]
    NodeHasBothEdgeAndConditional(String),

    /// A value in a conditional path_map is not a valid node id or END.
    #[error("conditional path_map invalid target: {0}")]
    InvalidConditionalPathMap(String),
}
