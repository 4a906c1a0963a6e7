//! Graph data model
//!
//! Nodes carry their rendered position and connectivity lists; edges are
//! directed pairs of node indices. The graph owns no rendering state and no
//! layout scratch data, so any number of layout sessions can read it.

use std::collections::{HashMap, VecDeque};
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::GraphError;

/// Node identifier as supplied by the caller
///
/// Widget payloads use data-frame row numbers, hand-written ones tend to use
/// names, so both are accepted.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum NodeId {
    Number(i64),
    Name(String),
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NodeId::Number(n) => write!(f, "{n}"),
            NodeId::Name(s) => f.write_str(s),
        }
    }
}

impl From<i64> for NodeId {
    fn from(n: i64) -> Self {
        NodeId::Number(n)
    }
}

impl From<i32> for NodeId {
    fn from(n: i32) -> Self {
        NodeId::Number(n.into())
    }
}

impl From<&str> for NodeId {
    fn from(s: &str) -> Self {
        NodeId::Name(s.to_string())
    }
}

impl From<String> for NodeId {
    fn from(s: String) -> Self {
        NodeId::Name(s)
    }
}

/// A point in 3D space
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Position {
    pub const ORIGIN: Position = Position {
        x: 0.0,
        y: 0.0,
        z: 0.0,
    };

    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Euclidean distance from the origin
    pub fn length(&self) -> f64 {
        (self.x * self.x + self.y * self.y + self.z * self.z).sqrt()
    }

    /// Euclidean distance to another point
    pub fn distance(&self, other: &Position) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        let dz = self.z - other.z;
        (dx * dx + dy * dy + dz * dz).sqrt()
    }

    pub fn scale(&self, factor: f64) -> Position {
        Position::new(self.x * factor, self.y * factor, self.z * factor)
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }
}

/// Index of a node in [`Graph::nodes`]
pub type NodeIndex = usize;

/// A graph node
#[derive(Debug, Clone)]
pub struct Node {
    id: NodeId,
    /// Display label, if the payload provided one
    pub label: Option<String>,
    /// Rendered position, mutated by the layout engine
    pub position: Position,
    nodes_from: Vec<NodeIndex>,
    nodes_to: Vec<NodeIndex>,
}

impl Node {
    pub fn id(&self) -> &NodeId {
        &self.id
    }

    /// Nodes with an edge pointing at this one
    pub fn nodes_from(&self) -> &[NodeIndex] {
        &self.nodes_from
    }

    /// Nodes this one has an edge pointing at
    pub fn nodes_to(&self) -> &[NodeIndex] {
        &self.nodes_to
    }

    /// Number of incident edges, counting both directions
    pub fn degree(&self) -> usize {
        self.nodes_from.len() + self.nodes_to.len()
    }

    /// A node with no incident edges
    pub fn is_singleton(&self) -> bool {
        self.degree() == 0
    }
}

/// A directed edge between two nodes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Edge {
    pub source: NodeIndex,
    pub target: NodeIndex,
}

/// Nodes plus directed edges
#[derive(Debug, Clone, Default)]
pub struct Graph {
    nodes: Vec<Node>,
    edges: Vec<Edge>,
    index: HashMap<NodeId, NodeIndex>,
}

impl Graph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a node, returning its index
    pub fn add_node(
        &mut self,
        id: impl Into<NodeId>,
        label: Option<String>,
        position: Position,
    ) -> Result<NodeIndex, GraphError> {
        let id = id.into();
        if self.index.contains_key(&id) {
            return Err(GraphError::DuplicateNode(id));
        }
        let idx = self.nodes.len();
        self.index.insert(id.clone(), idx);
        self.nodes.push(Node {
            id,
            label,
            position,
            nodes_from: Vec::new(),
            nodes_to: Vec::new(),
        });
        Ok(idx)
    }

    /// Connect `source` to `target`
    ///
    /// Returns `Ok(false)` without adding anything when the same directed
    /// edge already exists.
    pub fn add_edge(&mut self, source: &NodeId, target: &NodeId) -> Result<bool, GraphError> {
        let s = self.require(source)?;
        let t = self.require(target)?;
        if self.nodes[s].nodes_to.contains(&t) {
            return Ok(false);
        }
        self.nodes[s].nodes_to.push(t);
        self.nodes[t].nodes_from.push(s);
        self.edges.push(Edge {
            source: s,
            target: t,
        });
        Ok(true)
    }

    fn require(&self, id: &NodeId) -> Result<NodeIndex, GraphError> {
        self.index_of(id)
            .ok_or_else(|| GraphError::UnknownNode(id.clone()))
    }

    pub fn index_of(&self, id: &NodeId) -> Option<NodeIndex> {
        self.index.get(id).copied()
    }

    pub fn node(&self, idx: NodeIndex) -> Option<&Node> {
        self.nodes.get(idx)
    }

    pub fn node_mut(&mut self, idx: NodeIndex) -> Option<&mut Node> {
        self.nodes.get_mut(idx)
    }

    /// Look up a node by id
    pub fn get(&self, id: &NodeId) -> Option<&Node> {
        self.index_of(id).map(|i| &self.nodes[i])
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn singleton_count(&self) -> usize {
        self.nodes.iter().filter(|n| n.is_singleton()).count()
    }

    /// Nodes sharing an edge with `idx` in either direction, in index order
    pub fn neighbors(&self, idx: NodeIndex) -> Vec<NodeIndex> {
        let Some(node) = self.nodes.get(idx) else {
            return Vec::new();
        };
        let mut out: Vec<NodeIndex> = node
            .nodes_from
            .iter()
            .chain(node.nodes_to.iter())
            .copied()
            .filter(|&n| n != idx)
            .collect();
        out.sort_unstable();
        out.dedup();
        out
    }

    /// Breadth-first hop distance from `start` to every reachable node
    ///
    /// Edges are followed in both directions. `start` itself maps to 0;
    /// unreachable nodes are absent.
    pub fn hop_distances(&self, start: NodeIndex) -> HashMap<NodeIndex, usize> {
        let mut dist = HashMap::new();
        if start >= self.nodes.len() {
            return dist;
        }
        dist.insert(start, 0);
        let mut queue = VecDeque::from([start]);
        while let Some(current) = queue.pop_front() {
            let d = dist[&current];
            for next in self.neighbors(current) {
                if !dist.contains_key(&next) {
                    dist.insert(next, d + 1);
                    queue.push_back(next);
                }
            }
        }
        dist
    }

    /// Size of the axis-aligned box holding every node, per axis
    pub fn extent(&self) -> Position {
        let mut nodes = self.nodes.iter().map(|n| n.position);
        let Some(first) = nodes.next() else {
            return Position::ORIGIN;
        };
        let (min, max) = nodes.fold((first, first), |(lo, hi), p| {
            (
                Position::new(lo.x.min(p.x), lo.y.min(p.y), lo.z.min(p.z)),
                Position::new(hi.x.max(p.x), hi.y.max(p.y), hi.z.max(p.z)),
            )
        });
        Position::new(max.x - min.x, max.y - min.y, max.z - min.z)
    }

    /// Check edge endpoints and positions
    pub fn validate(&self) -> Result<(), GraphError> {
        let len = self.nodes.len();
        for (i, edge) in self.edges.iter().enumerate() {
            for index in [edge.source, edge.target] {
                if index >= len {
                    return Err(GraphError::InvalidEdge {
                        edge: i,
                        index,
                        len,
                    });
                }
            }
        }
        if let Some(node) = self.nodes.iter().find(|n| !n.position.is_finite()) {
            return Err(GraphError::NonFinitePosition(node.id.clone()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn path_graph() -> Graph {
        let mut g = Graph::new();
        for id in ["a", "b", "c", "d"] {
            g.add_node(id, None, Position::ORIGIN).unwrap();
        }
        g.add_edge(&"a".into(), &"b".into()).unwrap();
        g.add_edge(&"b".into(), &"c".into()).unwrap();
        g
    }

    #[test]
    fn add_node_rejects_duplicates() {
        let mut g = Graph::new();
        g.add_node(1, None, Position::ORIGIN).unwrap();
        assert_eq!(
            g.add_node(1, None, Position::ORIGIN),
            Err(GraphError::DuplicateNode(NodeId::Number(1)))
        );
        assert_eq!(g.len(), 1);
    }

    #[test]
    fn add_edge_updates_connectivity() {
        let g = path_graph();
        let b = g.get(&"b".into()).unwrap();
        assert_eq!(b.nodes_from(), &[0]);
        assert_eq!(b.nodes_to(), &[2]);
        assert_eq!(b.degree(), 2);
        assert!(g.get(&"d".into()).unwrap().is_singleton());
        assert_eq!(g.singleton_count(), 1);
    }

    #[test]
    fn add_edge_ignores_repeat_connection() {
        let mut g = path_graph();
        assert_eq!(g.add_edge(&"a".into(), &"b".into()), Ok(false));
        assert_eq!(g.edge_count(), 2);
        // the reverse direction is a different edge
        assert_eq!(g.add_edge(&"b".into(), &"a".into()), Ok(true));
        assert_eq!(g.edge_count(), 3);
        assert_eq!(g.neighbors(0), vec![1]);
    }

    #[test]
    fn add_edge_rejects_unknown_endpoint() {
        let mut g = path_graph();
        assert_eq!(
            g.add_edge(&"a".into(), &"zzz".into()),
            Err(GraphError::UnknownNode(NodeId::from("zzz")))
        );
    }

    #[test]
    fn hop_distances_follow_edges_both_ways() {
        let g = path_graph();
        let dist = g.hop_distances(2);
        assert_eq!(dist[&2], 0);
        assert_eq!(dist[&1], 1);
        assert_eq!(dist[&0], 2);
        assert!(!dist.contains_key(&3));
    }

    #[test]
    fn hop_distances_take_shortest_path() {
        let mut g = path_graph();
        g.add_edge(&"a".into(), &"c".into()).unwrap();
        assert_eq!(g.hop_distances(0)[&2], 1);
    }

    #[test]
    fn validate_rejects_nan_positions() {
        let mut g = path_graph();
        g.node_mut(3).unwrap().position.x = f64::NAN;
        assert_eq!(
            g.validate(),
            Err(GraphError::NonFinitePosition(NodeId::from("d")))
        );
    }

    #[test]
    fn node_id_deserializes_numbers_and_names() {
        let ids: Vec<NodeId> = serde_json::from_str(r#"[3, "x"]"#).unwrap();
        assert_eq!(ids, vec![NodeId::Number(3), NodeId::from("x")]);
    }

    #[test]
    fn extent_spans_all_nodes() {
        let mut g = Graph::new();
        assert_eq!(g.extent(), Position::ORIGIN);
        g.add_node("a", None, Position::new(-10.0, 4.0, 0.0)).unwrap();
        g.add_node("b", None, Position::new(5.0, -6.0, 3.0)).unwrap();
        assert_eq!(g.extent(), Position::new(15.0, 10.0, 3.0));
    }

    #[test]
    fn position_distance() {
        let a = Position::new(1.0, 2.0, 2.0);
        assert_eq!(a.length(), 3.0);
        assert_eq!(a.distance(&Position::ORIGIN), 3.0);
        assert_eq!(a.scale(2.0), Position::new(2.0, 4.0, 4.0));
    }
}
