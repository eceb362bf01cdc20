//! Community detection traits.

use crate::error::Result;
use petgraph::graph::UnGraph;

/// Trait for community detection algorithms over weighted graphs.
pub trait CommunityDetection {
    /// Detect communities in a graph.
    ///
    /// Returns a mapping from node index to a dense community label
    /// (`0..k`). An empty graph yields an empty mapping.
    fn detect<N>(&self, graph: &UnGraph<N, f64>) -> Result<Vec<usize>>;

    /// Objective value of `labels` on `graph` (higher is better).
    fn quality<N>(&self, graph: &UnGraph<N, f64>, labels: &[usize]) -> f64;

    /// Get the resolution parameter (if applicable).
    fn resolution(&self) -> f64 {
        1.0
    }
}
