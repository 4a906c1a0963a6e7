//! Serializable layout result

use serde::{Deserialize, Serialize};

use crate::graph::{Graph, NodeId};
use crate::layout::ForceDirected;

/// Final position of one node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodePosition {
    pub id: NodeId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

/// What a layout run produced
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayoutReport {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Iteration counter when the run stopped
    pub iterations: usize,
    pub finished: bool,
    /// Temperature when the run stopped
    pub temperature: f64,
    pub nodes: Vec<NodePosition>,
}

impl LayoutReport {
    pub fn new(graph: &Graph, layout: &ForceDirected, title: Option<String>) -> Self {
        let nodes = graph
            .nodes()
            .iter()
            .map(|n| NodePosition {
                id: n.id().clone(),
                label: n.label.clone(),
                x: n.position.x,
                y: n.position.y,
                z: n.position.z,
            })
            .collect();
        Self {
            title,
            iterations: layout.iteration().min(layout.options().iterations),
            finished: layout.is_finished(),
            temperature: layout.temperature(),
            nodes,
        }
    }
}
