//! forcegraph3d - 3D force-directed layout for graph widget payloads.
//!
//! The crate lays out a directed graph in three dimensions with a
//! Fruchterman-Reingold style simulation that a host render loop drives one
//! iteration per frame, and reads/writes the widget payloads and layout
//! reports around it.

pub mod error;
pub mod graph;
pub mod interaction;
pub mod io;
pub mod layout;
pub mod payload;
pub mod placement;
pub mod report;

pub use error::{GraphError, LayoutError};
pub use graph::{Edge, Graph, Node, NodeId, NodeIndex, Position};
pub use layout::{ForceDirected, Iteration, LayoutOptions, StopReason};
pub use placement::Placement;
