//! Initial node placement
//!
//! The layout only refines positions, so nodes need a starting point. The
//! graph widget scatters them over a small integer cube; a seeded generator
//! makes that reproducible.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::graph::{Graph, Position};

/// Half the edge length of the cube the widget scatters nodes into
pub const DEFAULT_HALF_EXTENT: i32 = 50;

/// Radius of the Fibonacci sphere
pub const DEFAULT_SPHERE_RADIUS: f64 = 100.0;

/// Strategy for assigning starting positions
#[derive(Debug, Clone, PartialEq)]
pub enum Placement {
    /// Integer coordinates drawn uniformly from `[-half_extent, half_extent]`
    RandomCube { half_extent: i32, seed: u64 },
    /// Even spread over a sphere (deterministic, no randomness)
    FibonacciSphere { radius: f64 },
}

impl Placement {
    /// The widget's own scatter, seeded
    pub fn random_cube(seed: u64) -> Self {
        Placement::RandomCube {
            half_extent: DEFAULT_HALF_EXTENT,
            seed,
        }
    }

    pub fn fibonacci_sphere() -> Self {
        Placement::FibonacciSphere {
            radius: DEFAULT_SPHERE_RADIUS,
        }
    }

    /// Assign a starting position to every node, in index order
    pub fn apply(&self, graph: &mut Graph) {
        let total = graph.len();
        let mut rng = match self {
            Placement::RandomCube { seed, .. } => Some(StdRng::seed_from_u64(*seed)),
            Placement::FibonacciSphere { .. } => None,
        };
        for index in 0..total {
            let position = self.position(index, total, rng.as_mut());
            if let Some(node) = graph.node_mut(index) {
                node.position = position;
            }
        }
    }

    /// Position for node `index` out of `total`
    ///
    /// `rng` is only consulted by [`Placement::RandomCube`]; without one the
    /// node lands at the origin.
    pub fn position(&self, index: usize, total: usize, rng: Option<&mut StdRng>) -> Position {
        match self {
            Placement::RandomCube { half_extent, .. } => {
                let Some(rng) = rng else {
                    return Position::ORIGIN;
                };
                let a = (*half_extent).max(0);
                Position::new(
                    rng.random_range(-a..=a) as f64,
                    rng.random_range(-a..=a) as f64,
                    rng.random_range(-a..=a) as f64,
                )
            }
            Placement::FibonacciSphere { radius } => {
                let golden_ratio = (1.0 + 5.0_f64.sqrt()) / 2.0;
                let i = index as f64;
                let n = total.max(1) as f64;

                let theta = 2.0 * std::f64::consts::PI * i / golden_ratio;
                let phi = (1.0 - 2.0 * (i + 0.5) / n).acos();

                Position::new(
                    radius * phi.sin() * theta.cos(),
                    radius * phi.sin() * theta.sin(),
                    radius * phi.cos(),
                )
            }
        }
    }
}
