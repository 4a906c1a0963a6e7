//! Force-directed layout in 3D
//!
//! A Fruchterman-Reingold style simulation: every node pair repels, every
//! edge pulls its endpoints together, and per-axis displacement is capped by a
//! temperature that decays linearly over the iteration budget.
//!
//! The session is driven one iteration at a time, typically once per
//! animation frame:
//!
//! ```rust
//! use forcegraph3d::graph::{Graph, Position};
//! use forcegraph3d::layout::{ForceDirected, LayoutOptions};
//!
//! let mut graph = Graph::new();
//! graph.add_node("a", None, Position::new(-40.0, 10.0, 5.0)).unwrap();
//! graph.add_node("b", None, Position::new(30.0, -20.0, -5.0)).unwrap();
//! graph.add_edge(&"a".into(), &"b".into()).unwrap();
//!
//! let mut layout = ForceDirected::start(&graph, LayoutOptions::default()).unwrap();
//! while layout.generate(&mut graph).unwrap().is_some() {}
//! assert!(layout.is_finished());
//! ```
//!
//! In-plane (x, y) forces use the planar distance between two nodes while the
//! depth (z) force uses the full 3D distance. The two are deliberately not
//! unified; the visual result depends on it.

use serde::{Deserialize, Serialize};

use crate::error::{LayoutError, Result};
use crate::graph::{Edge, Graph, NodeIndex, Position};

/// Floor for every distance and magnitude used as a divisor
pub const EPSILON: f64 = 0.000001;

/// Per-iteration scale applied to the rendered position of a singleton
pub const SINGLETON_DAMPING: f64 = 0.7;

/// Fraction of the gap between rendered and simulated position closed per iteration
pub const EASING: f64 = 0.1;

/// Minimum change in mean displacement between iterations before the
/// simulation is considered settled
pub const CONVERGENCE_THRESHOLD: f64 = 0.01;

pub const DEFAULT_ATTRACTION: f64 = 5.0;
pub const DEFAULT_REPULSION: f64 = 0.75;
pub const DEFAULT_ITERATIONS: usize = 1000;
pub const DEFAULT_SIZE: f64 = 200.0;

/// Viewport size the graph widget lays out into
pub const WIDGET_SIZE: f64 = 2000.0;

/// Tunable parameters for a layout run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LayoutOptions {
    /// Spring stiffness multiplier
    pub attraction: f64,
    /// Repulsion strength multiplier
    pub repulsion: f64,
    /// Hard cap on iterations
    pub iterations: usize,
    /// Viewport width, sets the force scale and starting temperature
    pub width: f64,
    /// Viewport height, sets the force scale
    pub height: f64,
}

impl Default for LayoutOptions {
    fn default() -> Self {
        Self {
            attraction: DEFAULT_ATTRACTION,
            repulsion: DEFAULT_REPULSION,
            iterations: DEFAULT_ITERATIONS,
            width: DEFAULT_SIZE,
            height: DEFAULT_SIZE,
        }
    }
}

impl LayoutOptions {
    /// Defaults used by the graph widget, which lays out into a larger viewport
    pub fn widget() -> Self {
        Self {
            width: WIDGET_SIZE,
            height: WIDGET_SIZE,
            ..Self::default()
        }
    }

    /// Set the spring stiffness multiplier
    pub fn with_attraction(mut self, attraction: f64) -> Self {
        self.attraction = attraction;
        self
    }

    /// Set the repulsion strength multiplier
    pub fn with_repulsion(mut self, repulsion: f64) -> Self {
        self.repulsion = repulsion;
        self
    }

    /// Set the iteration cap
    pub fn with_iterations(mut self, iterations: usize) -> Self {
        self.iterations = iterations;
        self
    }

    /// Set the viewport size
    pub fn with_size(mut self, width: f64, height: f64) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    /// Reject values that would turn positions into NaN or infinity
    pub fn validate(&self) -> Result<()> {
        let non_negative = [("attraction", self.attraction), ("repulsion", self.repulsion)];
        for (name, value) in non_negative {
            if !value.is_finite() || value < 0.0 {
                return Err(LayoutError::InvalidOption { name, value });
            }
        }
        let positive = [("width", self.width), ("height", self.height)];
        for (name, value) in positive {
            if !value.is_finite() || value <= 0.0 {
                return Err(LayoutError::InvalidOption { name, value });
            }
        }
        Ok(())
    }

    /// Starting temperature for these options
    pub fn initial_temperature(&self) -> f64 {
        self.width / 10.0
    }

    /// `sqrt(width * height / node_count)`, the ideal spacing between nodes
    pub fn force_constant(&self, node_count: usize) -> f64 {
        (self.width * self.height / node_count as f64).sqrt()
    }
}

/// Outcome of one call to [`ForceDirected::generate`] that moved nodes
#[derive(Debug, Clone, PartialEq)]
pub struct Iteration {
    /// Zero-based number of the iteration just performed
    pub index: usize,
    /// Temperature after decay
    pub temperature: f64,
    /// Mean per-node L1 distance between rendered and simulated position
    pub mean_delta: f64,
    node_count: usize,
}

impl Iteration {
    /// Nodes whose position was updated, in index order
    pub fn updated(&self) -> impl Iterator<Item = NodeIndex> + use<> {
        0..self.node_count
    }
}

/// Why a session stopped iterating
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// Nothing to lay out: no nodes, or one node and no edges
    Degenerate,
    /// The iteration budget ran out (or [`ForceDirected::stop_calculating`] was called)
    IterationLimit,
    /// The temperature reached zero
    Cooled,
}

/// Per-node scratch state, keyed by node index
#[derive(Debug, Clone, Default)]
struct Scratch {
    tmp: Vec<Position>,
    offset: Vec<Position>,
    singleton: Vec<bool>,
}

impl Scratch {
    fn seed(graph: &Graph) -> Self {
        Self {
            tmp: graph.nodes().iter().map(|n| n.position).collect(),
            offset: vec![Position::ORIGIN; graph.len()],
            singleton: graph.nodes().iter().map(|n| n.is_singleton()).collect(),
        }
    }
}

/// A layout session over one graph
///
/// All simulation state lives here rather than on the graph, so independent
/// sessions can run over clones of the same graph.
#[derive(Debug, Clone)]
pub struct ForceDirected {
    options: LayoutOptions,
    force_constant: f64,
    attraction_constant: f64,
    repulsion_constant: f64,
    iteration: usize,
    temperature: f64,
    ds_old: f64,
    finished: bool,
    stop_reason: Option<StopReason>,
    initialized: bool,
    edges: Vec<Edge>,
    scratch: Scratch,
}

impl ForceDirected {
    /// Create a session; call [`init`](Self::init) before generating
    pub fn new(options: LayoutOptions) -> Self {
        Self {
            options,
            force_constant: 0.0,
            attraction_constant: 0.0,
            repulsion_constant: 0.0,
            iteration: 0,
            temperature: 0.0,
            ds_old: 0.0,
            finished: false,
            stop_reason: None,
            initialized: false,
            edges: Vec::new(),
            scratch: Scratch::default(),
        }
    }

    /// Create and initialize a session in one step
    pub fn start(graph: &Graph, options: LayoutOptions) -> Result<Self> {
        let mut layout = Self::new(options);
        layout.init(graph)?;
        Ok(layout)
    }

    /// (Re)initialize the session from the graph's current positions
    ///
    /// Safe to call repeatedly, e.g. after nodes were added or to restart a
    /// finished layout.
    pub fn init(&mut self, graph: &Graph) -> Result<()> {
        self.options.validate()?;
        graph.validate()?;

        let n = graph.len();
        self.iteration = 0;
        self.temperature = self.options.initial_temperature();
        self.ds_old = 0.0;
        self.finished = false;
        self.stop_reason = None;
        self.edges = graph.edges().to_vec();
        self.scratch = Scratch::seed(graph);
        self.initialized = true;

        if n == 0 || (n == 1 && graph.edge_count() == 0) {
            self.force_constant = 0.0;
            self.attraction_constant = 0.0;
            self.repulsion_constant = 0.0;
            self.finish(StopReason::Degenerate);
            return Ok(());
        }

        self.force_constant = self.options.force_constant(n);
        self.attraction_constant = self.options.attraction / self.force_constant;
        self.repulsion_constant = self.options.repulsion * self.force_constant;
        if let Err(err) = self.check_constants(graph) {
            self.initialized = false;
            return Err(err);
        }

        tracing::debug!(
            nodes = n,
            edges = self.edges.len(),
            force_constant = self.force_constant,
            attraction_constant = self.attraction_constant,
            repulsion_constant = self.repulsion_constant,
            temperature = self.temperature,
            "layout initialized"
        );
        Ok(())
    }

    /// Advance the simulation by one iteration
    ///
    /// Returns `Some` when nodes were moved and `None` once the layout is
    /// finished. After the first `None` the graph is never touched again
    /// until [`init`](Self::init) is called.
    pub fn generate(&mut self, graph: &mut Graph) -> Result<Option<Iteration>> {
        if !self.initialized {
            return Err(LayoutError::NotInitialized);
        }
        if self.finished {
            return Ok(None);
        }
        self.check_graph(graph)?;

        if self.iteration >= self.options.iterations {
            self.finish(StopReason::IterationLimit);
            return Ok(None);
        }
        if self.temperature <= EPSILON {
            self.finish(StopReason::Cooled);
            return Ok(None);
        }

        for offset in &mut self.scratch.offset {
            *offset = Position::ORIGIN;
        }
        self.apply_repulsion();
        self.apply_attraction(graph);
        if !self.scratch.offset.iter().all(|o| o.length().is_finite()) {
            return Err(LayoutError::Diverged {
                iteration: self.iteration,
            });
        }
        let ds = self.update_positions(graph);

        let index = self.iteration;
        self.temperature *= 1.0 - index as f64 / self.options.iterations as f64;
        if (ds - self.ds_old).abs() < CONVERGENCE_THRESHOLD {
            self.temperature = 0.0;
        }
        self.ds_old = ds;
        self.iteration += 1;

        tracing::trace!(
            iteration = index,
            temperature = self.temperature,
            mean_delta = ds,
            "layout iteration"
        );

        Ok(Some(Iteration {
            index,
            temperature: self.temperature,
            mean_delta: ds,
            node_count: graph.len(),
        }))
    }

    /// Boolean form of [`generate`](Self::generate): `true` while iterations remain
    pub fn step(&mut self, graph: &mut Graph) -> Result<bool> {
        Ok(self.generate(graph)?.is_some())
    }

    /// Drive the session until it finishes or `max_frames` calls have been made
    ///
    /// Returns the number of iterations performed.
    pub fn run(&mut self, graph: &mut Graph, max_frames: usize) -> Result<usize> {
        let mut performed = 0;
        for _ in 0..max_frames {
            if self.generate(graph)?.is_none() {
                break;
            }
            performed += 1;
        }
        Ok(performed)
    }

    /// Stop at the next termination check
    pub fn stop_calculating(&mut self) {
        self.iteration = self.options.iterations;
    }

    /// Whether the session has stopped iterating
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Why the session stopped, once it has
    pub fn stop_reason(&self) -> Option<StopReason> {
        self.stop_reason
    }

    /// Iterations performed since the last `init`
    pub fn iteration(&self) -> usize {
        self.iteration
    }

    /// Current temperature, the per-axis displacement cap
    pub fn temperature(&self) -> f64 {
        self.temperature
    }

    /// Ideal node spacing for the graph passed to `init`
    pub fn force_constant(&self) -> f64 {
        self.force_constant
    }

    /// Options this session runs with
    pub fn options(&self) -> &LayoutOptions {
        &self.options
    }

    fn finish(&mut self, reason: StopReason) {
        self.finished = true;
        self.stop_reason = Some(reason);
        tracing::info!(
            iterations = self.iteration.min(self.options.iterations),
            reason = ?reason,
            "layout finished"
        );
    }

    /// Derived constants and squared node spans must stay finite, otherwise
    /// the force passes produce NaN
    fn check_constants(&self, graph: &Graph) -> Result<()> {
        let rc2 = self.repulsion_constant * self.repulsion_constant;
        let derived = [
            ("force constant", self.force_constant),
            ("attraction constant", self.attraction_constant),
            ("repulsion constant", self.repulsion_constant),
            ("squared repulsion constant", rc2 / EPSILON),
            ("initial temperature", self.temperature),
        ];
        for (name, value) in derived {
            if !value.is_finite() {
                return Err(LayoutError::InvalidOption { name, value });
            }
        }

        let span = graph.extent();
        if !(span.x * span.x + span.y * span.y + span.z * span.z).is_finite() {
            return Err(LayoutError::SpanTooLarge {
                span: span.x.max(span.y).max(span.z),
            });
        }
        Ok(())
    }

    fn check_graph(&self, graph: &Graph) -> Result<()> {
        if graph.len() != self.scratch.tmp.len() || graph.edges() != self.edges.as_slice() {
            return Err(LayoutError::GraphChanged {
                expected_nodes: self.scratch.tmp.len(),
                expected_edges: self.edges.len(),
                nodes: graph.len(),
                edges: graph.edge_count(),
            });
        }
        Ok(())
    }

    /// Every node pair pushes apart
    fn apply_repulsion(&mut self) {
        let rc2 = self.repulsion_constant * self.repulsion_constant;
        let Scratch { tmp, offset, .. } = &mut self.scratch;
        let n = tmp.len();

        for i in 0..n {
            for j in (i + 1)..n {
                let dx = tmp[i].x - tmp[j].x;
                let dy = tmp[i].y - tmp[j].y;
                let dz = tmp[i].z - tmp[j].z;
                let planar = (dx * dx + dy * dy).sqrt().max(EPSILON);
                let spatial = (dx * dx + dy * dy + dz * dz).sqrt().max(EPSILON);
                let force = rc2 / planar;
                let force_z = rc2 / spatial;

                let fx = dx / planar * force;
                let fy = dy / planar * force;
                let fz = dz / spatial * force_z;

                offset[i].x += fx;
                offset[i].y += fy;
                offset[i].z += fz;
                offset[j].x -= fx;
                offset[j].y -= fy;
                offset[j].z -= fz;
            }
        }
    }

    /// Every edge pulls its endpoints together
    fn apply_attraction(&mut self, graph: &Graph) {
        let ac = self.attraction_constant;
        let Scratch { tmp, offset, .. } = &mut self.scratch;

        for edge in graph.edges() {
            let (s, t) = (edge.source, edge.target);
            let dx = tmp[s].x - tmp[t].x;
            let dy = tmp[s].y - tmp[t].y;
            let dz = tmp[s].z - tmp[t].z;
            let planar = (dx * dx + dy * dy).sqrt().max(EPSILON);
            let spatial = (dx * dx + dy * dy + dz * dz).sqrt().max(EPSILON);
            let force = planar * planar * ac;
            let force_z = spatial * spatial * ac;

            let fx = dx / planar * force;
            let fy = dy / planar * force;
            let fz = dz / spatial * force_z;

            offset[s].x -= fx;
            offset[s].y -= fy;
            offset[s].z -= fz;
            offset[t].x += fx;
            offset[t].y += fy;
            offset[t].z += fz;
        }
    }

    /// Move simulated positions, then ease rendered positions toward them.
    /// Returns the mean L1 gap between the two before easing.
    fn update_positions(&mut self, graph: &mut Graph) -> f64 {
        let temperature = self.temperature;
        let Scratch {
            tmp,
            offset,
            singleton,
        } = &mut self.scratch;
        let n = tmp.len();
        let mut ds = 0.0;

        for i in 0..n {
            let o = offset[i];
            let len_x = (o.z * o.z + o.x * o.x).sqrt().max(EPSILON);
            let len_y = (o.x * o.x + o.y * o.y).sqrt().max(EPSILON);
            let len_z = (o.z * o.z + o.y * o.y).sqrt().max(EPSILON);

            tmp[i].x += o.x / len_x * len_x.min(temperature);
            tmp[i].y += o.y / len_y * len_y.min(temperature);
            tmp[i].z += o.z / len_z * len_z.min(temperature);

            let Some(node) = graph.node_mut(i) else {
                continue;
            };
            let pos = &mut node.position;
            ds += (pos.x - tmp[i].x).abs() + (pos.y - tmp[i].y).abs() + (pos.z - tmp[i].z).abs();

            if singleton[i] {
                *pos = pos.scale(SINGLETON_DAMPING);
            }

            pos.x -= (pos.x - tmp[i].x) * EASING;
            pos.y -= (pos.y - tmp[i].y) * EASING;
            pos.z -= (pos.z - tmp[i].z) * EASING;
        }

        ds / n as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::NodeId;
    use crate::placement::Placement;

    fn pair(distance: f64) -> Graph {
        let mut g = Graph::new();
        g.add_node("a", None, Position::new(-distance / 2.0, 0.0, 0.0))
            .unwrap();
        g.add_node("b", None, Position::new(distance / 2.0, 0.0, 0.0))
            .unwrap();
        g.add_edge(&"a".into(), &"b".into()).unwrap();
        g
    }

    fn path_graph(seed: u64) -> Graph {
        let mut g = Graph::new();
        for id in ["A", "B", "C"] {
            g.add_node(id, None, Position::ORIGIN).unwrap();
        }
        g.add_edge(&"A".into(), &"B".into()).unwrap();
        g.add_edge(&"B".into(), &"C".into()).unwrap();
        Placement::random_cube(seed).apply(&mut g);
        g
    }

    fn positions(g: &Graph) -> Vec<Position> {
        g.nodes().iter().map(|n| n.position).collect()
    }

    fn run_to_end(layout: &mut ForceDirected, g: &mut Graph) {
        while layout.generate(g).unwrap().is_some() {}
    }

    #[test]
    fn default_options_match_widget_library() {
        let opts = LayoutOptions::default();
        assert_eq!(opts.attraction, 5.0);
        assert_eq!(opts.repulsion, 0.75);
        assert_eq!(opts.iterations, 1000);
        assert_eq!(opts.initial_temperature(), 20.0);
        assert_eq!(LayoutOptions::widget().width, 2000.0);
    }

    #[test]
    fn options_deserialize_camel_case_with_defaults() {
        let opts: LayoutOptions =
            serde_json::from_str(r#"{"attraction": 2.5, "iterations": 50}"#).unwrap();
        assert_eq!(opts.attraction, 2.5);
        assert_eq!(opts.iterations, 50);
        assert_eq!(opts.repulsion, DEFAULT_REPULSION);
        assert_eq!(opts.width, DEFAULT_SIZE);
    }

    #[test]
    fn init_rejects_bad_options() {
        let g = pair(10.0);
        let err = ForceDirected::start(&g, LayoutOptions::default().with_size(0.0, 100.0))
            .unwrap_err();
        assert_eq!(
            err,
            LayoutError::InvalidOption {
                name: "width",
                value: 0.0
            }
        );

        let err = ForceDirected::start(&g, LayoutOptions::default().with_repulsion(f64::NAN))
            .unwrap_err();
        assert!(matches!(
            err,
            LayoutError::InvalidOption {
                name: "repulsion",
                ..
            }
        ));

        let err = ForceDirected::start(&g, LayoutOptions::default().with_attraction(-1.0))
            .unwrap_err();
        assert!(matches!(
            err,
            LayoutError::InvalidOption {
                name: "attraction",
                ..
            }
        ));
    }

    #[test]
    fn init_rejects_non_finite_positions() {
        let mut g = pair(10.0);
        g.node_mut(0).unwrap().position.z = f64::INFINITY;
        let err = ForceDirected::start(&g, LayoutOptions::default()).unwrap_err();
        assert!(matches!(err, LayoutError::Graph(_)));
    }

    #[test]
    fn generate_before_init_is_an_error() {
        let mut g = pair(10.0);
        let mut layout = ForceDirected::new(LayoutOptions::default());
        assert_eq!(layout.generate(&mut g), Err(LayoutError::NotInitialized));
    }

    #[test]
    fn generate_rejects_a_different_graph() {
        let g = pair(10.0);
        let mut layout = ForceDirected::start(&g, LayoutOptions::default()).unwrap();
        let mut other = path_graph(1);
        assert!(matches!(
            layout.generate(&mut other),
            Err(LayoutError::GraphChanged { .. })
        ));
    }

    #[test]
    fn generate_rejects_same_shape_with_other_edges() {
        let mut g = Graph::new();
        for id in 0..3 {
            g.add_node(id, None, Position::new(id as f64 * 10.0, 0.0, 0.0))
                .unwrap();
        }
        let mut other = g.clone();
        g.add_edge(&0.into(), &1.into()).unwrap();
        other.add_edge(&1.into(), &2.into()).unwrap();

        let mut layout = ForceDirected::start(&g, LayoutOptions::default()).unwrap();
        let before = positions(&other);
        assert!(matches!(
            layout.generate(&mut other),
            Err(LayoutError::GraphChanged { .. })
        ));
        assert_eq!(positions(&other), before);
        assert!(layout.step(&mut g).unwrap());
    }

    #[test]
    fn init_rejects_viewport_that_overflows_force_constant() {
        let g = pair(10.0);
        let err = ForceDirected::start(&g, LayoutOptions::default().with_size(1e200, 1e200))
            .unwrap_err();
        assert!(matches!(
            err,
            LayoutError::InvalidOption {
                name: "force constant",
                ..
            }
        ));
    }

    #[test]
    fn init_rejects_nodes_too_far_apart() {
        let g = pair(2e200);
        let err = ForceDirected::start(&g, LayoutOptions::default()).unwrap_err();
        assert_eq!(err, LayoutError::SpanTooLarge { span: 2e200 });
    }

    #[test]
    fn overflowing_forces_error_without_touching_the_graph() {
        let mut g = pair(150.0);
        let opts = LayoutOptions::default().with_attraction(1e300);
        let mut layout = ForceDirected::start(&g, opts).unwrap();
        let before = positions(&g);
        assert_eq!(
            layout.generate(&mut g),
            Err(LayoutError::Diverged { iteration: 0 })
        );
        assert_eq!(positions(&g), before);
        assert!(g.nodes().iter().all(|n| n.position.is_finite()));
    }

    #[test]
    fn empty_graph_is_finished_immediately() {
        let mut g = Graph::new();
        let mut layout = ForceDirected::start(&g, LayoutOptions::default()).unwrap();
        assert!(layout.is_finished());
        assert_eq!(layout.stop_reason(), Some(StopReason::Degenerate));
        assert_eq!(layout.generate(&mut g).unwrap(), None);
    }

    #[test]
    fn lone_node_is_finished_without_moving() {
        let mut g = Graph::new();
        g.add_node(NodeId::from(1), None, Position::new(10.0, 20.0, 30.0))
            .unwrap();
        let mut layout = ForceDirected::start(&g, LayoutOptions::default()).unwrap();
        assert!(layout.is_finished());
        assert!(!layout.step(&mut g).unwrap());
        assert_eq!(layout.iteration(), 0);
        assert_eq!(g.nodes()[0].position, Position::new(10.0, 20.0, 30.0));
    }

    #[test]
    fn zero_iteration_budget_finishes_without_mutation() {
        let mut g = path_graph(3);
        let before = positions(&g);
        let mut layout =
            ForceDirected::start(&g, LayoutOptions::default().with_iterations(0)).unwrap();
        assert!(!layout.is_finished());
        assert_eq!(layout.generate(&mut g).unwrap(), None);
        assert!(layout.is_finished());
        assert_eq!(layout.stop_reason(), Some(StopReason::IterationLimit));
        assert_eq!(positions(&g), before);
    }

    #[test]
    fn finished_layout_never_mutates_again() {
        let mut g = path_graph(7);
        let mut layout = ForceDirected::start(&g, LayoutOptions::default()).unwrap();
        run_to_end(&mut layout, &mut g);
        assert!(layout.is_finished());

        let settled = positions(&g);
        for _ in 0..5 {
            assert!(!layout.step(&mut g).unwrap());
        }
        assert_eq!(positions(&g), settled);
    }

    #[test]
    fn temperature_never_increases() {
        let mut g = path_graph(11);
        let mut layout = ForceDirected::start(&g, LayoutOptions::default()).unwrap();
        let mut last = layout.temperature();
        while let Some(it) = layout.generate(&mut g).unwrap() {
            assert!(it.temperature >= 0.0);
            assert!(it.temperature <= last);
            last = it.temperature;
        }
    }

    #[test]
    fn stop_calculating_ends_the_run() {
        let mut g = path_graph(5);
        let mut layout = ForceDirected::start(&g, LayoutOptions::default()).unwrap();
        assert!(layout.step(&mut g).unwrap());
        layout.stop_calculating();
        let before = positions(&g);
        assert!(!layout.step(&mut g).unwrap());
        assert!(layout.is_finished());
        assert_eq!(positions(&g), before);
    }

    #[test]
    fn init_restarts_a_finished_layout() {
        let mut g = path_graph(5);
        let mut layout = ForceDirected::start(&g, LayoutOptions::default()).unwrap();
        layout.stop_calculating();
        assert!(!layout.step(&mut g).unwrap());

        layout.init(&g).unwrap();
        assert!(!layout.is_finished());
        assert_eq!(layout.iteration(), 0);
        assert_eq!(layout.temperature(), 20.0);
        assert!(layout.step(&mut g).unwrap());
    }

    #[test]
    fn iteration_reports_every_node_as_updated() {
        let mut g = path_graph(2);
        let mut layout = ForceDirected::start(&g, LayoutOptions::default()).unwrap();
        let it = layout.generate(&mut g).unwrap().unwrap();
        assert_eq!(it.index, 0);
        assert_eq!(it.updated().collect::<Vec<_>>(), vec![0, 1, 2]);
    }

    #[test]
    fn singleton_without_repulsion_settles_toward_origin() {
        let mut g = pair(10.0);
        g.add_node("loner", None, Position::new(40.0, -30.0, 20.0))
            .unwrap();
        let start = g.nodes()[2].position.length();

        // with repulsion off the singleton's simulated position never moves
        let opts = LayoutOptions::default().with_repulsion(0.0);
        let mut layout = ForceDirected::start(&g, opts).unwrap();
        let mut previous = start;
        while layout.generate(&mut g).unwrap().is_some() {
            let now = g.nodes()[2].position.length();
            assert!(now <= start);
            previous = now;
        }
        assert!(previous < start);
    }

    #[test]
    fn singleton_render_is_damped_against_simulated_position() {
        // repulsion can push the simulated position outward, past the start;
        // the rendered position only ever closes 73% of the larger of the two
        let mut g = pair(10.0);
        g.add_node("loner", None, Position::new(1.0, 1.0, 1.0)).unwrap();
        let mut layout = ForceDirected::start(&g, LayoutOptions::default()).unwrap();

        let bound = SINGLETON_DAMPING * (1.0 - EASING) + EASING;
        let mut previous = g.nodes()[2].position.length();
        while layout.generate(&mut g).unwrap().is_some() {
            let rendered = g.nodes()[2].position.length();
            let simulated = layout.scratch.tmp[2].length();
            assert!(
                rendered <= bound * previous.max(simulated) + 1e-9,
                "rendered {rendered}, previous {previous}, simulated {simulated}"
            );
            previous = rendered;
        }
        assert!(previous <= layout.scratch.tmp[2].length());
    }

    #[test]
    fn stronger_attraction_shortens_an_edge() {
        let settle = |attraction: f64| {
            let mut g = pair(150.0);
            let opts = LayoutOptions::default()
                .with_attraction(attraction)
                .with_repulsion(0.75);
            let mut layout = ForceDirected::start(&g, opts).unwrap();
            layout.run(&mut g, 500).unwrap();
            g.nodes()[0].position.distance(&g.nodes()[1].position)
        };
        let weak = settle(0.5);
        let strong = settle(20.0);
        assert!(
            strong < weak,
            "attraction 20 gave {strong}, attraction 0.5 gave {weak}"
        );
    }

    #[test]
    fn fixed_seed_path_graph_is_repeatable() {
        let opts = LayoutOptions::default()
            .with_attraction(5.0)
            .with_repulsion(0.75)
            .with_iterations(500)
            .with_size(200.0, 200.0);

        let run = || {
            let mut g = path_graph(42);
            let mut layout = ForceDirected::start(&g, opts.clone()).unwrap();
            run_to_end(&mut layout, &mut g);
            let p = positions(&g);
            (p[0].distance(&p[1]), p[1].distance(&p[2]))
        };

        let (ab, bc) = run();
        assert_eq!(run(), (ab, bc));
        for d in [ab, bc] {
            assert!(d.is_finite());
            assert!(d < 1000.0, "edge length {d} out of range");
        }
    }

    #[test]
    fn coincident_nodes_stay_finite() {
        let mut g = Graph::new();
        for id in 0..4 {
            g.add_node(id, None, Position::new(5.0, 5.0, 5.0)).unwrap();
        }
        g.add_edge(&0.into(), &1.into()).unwrap();
        let mut layout = ForceDirected::start(&g, LayoutOptions::default()).unwrap();
        layout.run(&mut g, 50).unwrap();
        assert!(g.nodes().iter().all(|n| n.position.is_finite()));
    }

    #[test]
    fn sessions_over_clones_are_independent() {
        let base = path_graph(9);
        let mut a = base.clone();
        let mut b = base.clone();
        let mut la = ForceDirected::start(&a, LayoutOptions::default()).unwrap();
        let mut lb = ForceDirected::start(&b, LayoutOptions::default()).unwrap();

        la.run(&mut a, 10).unwrap();
        assert_eq!(positions(&b), positions(&base));
        lb.run(&mut b, 10).unwrap();
        assert_eq!(positions(&a), positions(&b));
    }
}
