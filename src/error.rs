//! Error types for graph construction and layout
//!
//! Everything here is caller misuse: the layout engine does no I/O, so a
//! failure always means a malformed graph or out-of-range parameter.

use thiserror::Error;

use crate::graph::NodeId;

/// Errors raised while building or validating a [`Graph`](crate::graph::Graph)
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GraphError {
    /// A node with this id is already present
    #[error("duplicate node id: {0}")]
    DuplicateNode(NodeId),

    /// An edge or lookup referenced a node that does not exist
    #[error("unknown node id: {0}")]
    UnknownNode(NodeId),

    /// An edge endpoint index is outside the node list
    #[error("edge {edge} references node index {index}, but the graph has {len} nodes")]
    InvalidEdge { edge: usize, index: usize, len: usize },

    /// A node position contains NaN or infinity
    #[error("node {0} has a non-finite position")]
    NonFinitePosition(NodeId),
}

/// Errors raised by the layout session
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LayoutError {
    /// A layout option would produce degenerate (NaN/infinite) positions
    #[error("invalid layout option `{name}`: {value}")]
    InvalidOption { name: &'static str, value: f64 },

    /// The graph failed validation
    #[error(transparent)]
    Graph(#[from] GraphError),

    /// `generate` was called before `init`
    #[error("layout not initialized")]
    NotInitialized,

    /// The graph passed to `generate` has different nodes or edges than at `init`
    #[error("graph changed since init: expected {expected_nodes} nodes and {expected_edges} edges, got {nodes} and {edges}")]
    GraphChanged {
        expected_nodes: usize,
        expected_edges: usize,
        nodes: usize,
        edges: usize,
    },

    /// Nodes are spread so far apart that squared distances overflow
    #[error("node positions span {span}, too far apart to lay out")]
    SpanTooLarge { span: f64 },

    /// The force passes overflowed; the graph was left untouched
    #[error("layout diverged at iteration {iteration}: forces overflowed")]
    Diverged { iteration: usize },
}

/// Result type for layout operations
pub type Result<T> = std::result::Result<T, LayoutError>;
