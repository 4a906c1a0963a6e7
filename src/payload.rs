//! Graph widget payload
//!
//! The host hands the widget row-wise node and edge tables plus a few layout
//! knobs. Colors, sizes and the other display fields are carried through
//! untouched; only ids, labels and the layout knobs matter here.

use serde::{Deserialize, Serialize};

use crate::error::GraphError;
use crate::graph::{Graph, NodeId, Position};
use crate::layout::LayoutOptions;
use crate::placement::Placement;

/// One row of the node table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeRecord {
    pub id: NodeId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

/// One row of the edge table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EdgeRecord {
    pub from: NodeId,
    pub to: NodeId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

/// Everything the graph widget receives from its host
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphPayload {
    #[serde(default)]
    pub nodes: Vec<NodeRecord>,
    #[serde(default)]
    pub edges: Vec<EdgeRecord>,

    /// Plot title
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub main: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attraction: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repulsion: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iterations: Option<usize>,

    #[serde(default)]
    pub show_labels: bool,
    /// 1 draws spheres, anything else draws sprites
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub node_type: Option<u8>,
    /// Background color
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bg: Option<String>,
    /// Foreground (label/title) color
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fg: Option<String>,
}

impl GraphPayload {
    /// Build the graph, placing nodes with `placement`
    ///
    /// Duplicate node ids and edges to unknown nodes are errors; a repeated
    /// edge is skipped.
    pub fn build_graph(&self, placement: &Placement) -> Result<Graph, GraphError> {
        let mut graph = Graph::new();
        for node in &self.nodes {
            graph.add_node(node.id.clone(), node.label.clone(), Position::ORIGIN)?;
        }
        for edge in &self.edges {
            if !graph.add_edge(&edge.from, &edge.to)? {
                tracing::warn!(from = %edge.from, to = %edge.to, "skipping duplicate edge");
            }
        }
        placement.apply(&mut graph);
        Ok(graph)
    }

    /// Layout options: widget defaults overridden by the payload's knobs
    pub fn layout_options(&self) -> LayoutOptions {
        let mut options = LayoutOptions::widget();
        if let Some(attraction) = self.attraction {
            options.attraction = attraction;
        }
        if let Some(repulsion) = self.repulsion {
            options.repulsion = repulsion;
        }
        if let Some(iterations) = self.iterations {
            options.iterations = iterations;
        }
        options
    }
}
