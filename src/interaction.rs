//! Dragging nodes
//!
//! When a node is dragged in the plane, everything connected to it follows,
//! attenuated by hop distance: a node `d` hops away moves by
//! `0.7^(1.5 d)` of the drag.

use crate::error::GraphError;
use crate::graph::{Graph, NodeId};

/// Base of the per-hop attenuation
pub const DRAG_FALLOFF: f64 = 0.7;

/// Exponent applied to the hop distance
pub const DRAG_EXPONENT: f64 = 1.5;

/// Fraction of the drag applied to a node `hops` away
pub fn drag_weight(hops: usize) -> f64 {
    DRAG_FALLOFF.powf(DRAG_EXPONENT * hops as f64)
}

/// Move node `id` to `(x, y)` and drag its connected neighbourhood along
///
/// Depth is left alone. Returns the number of nodes moved, including the
/// dragged one.
pub fn drag_node(graph: &mut Graph, id: &NodeId, x: f64, y: f64) -> Result<usize, GraphError> {
    let idx = graph
        .index_of(id)
        .ok_or_else(|| GraphError::UnknownNode(id.clone()))?;

    let (dx, dy) = match graph.node_mut(idx) {
        Some(node) => {
            let delta = (node.position.x - x, node.position.y - y);
            node.position.x = x;
            node.position.y = y;
            delta
        }
        None => return Err(GraphError::UnknownNode(id.clone())),
    };

    let mut moved = 1;
    for (other, hops) in graph.hop_distances(idx) {
        if other == idx {
            continue;
        }
        let weight = drag_weight(hops);
        if let Some(node) = graph.node_mut(other) {
            node.position.x -= dx * weight;
            node.position.y -= dy * weight;
            moved += 1;
        }
    }

    tracing::debug!(node = %id, moved, "dragged node");
    Ok(moved)
}
