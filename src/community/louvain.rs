//! Louvain algorithm for community detection.
//!
//! Fast modularity optimization through local node moves and graph aggregation.
//!
//! ## The Algorithm (Blondel et al. 2008)
//!
//! Louvain is a multi-level, greedy modularity optimization algorithm:
//!
//! 1. **Phase 1 (Local Moving)**: Start with each node in its own community.
//!    Visit nodes in a seeded random order and move each to the neighboring
//!    community with the highest modularity gain, until a full pass moves
//!    nothing.
//!
//! 2. **Phase 2 (Aggregation)**: Build a meta-graph where communities become
//!    single nodes. Edge weights are sums of edges between communities.
//!    Self-loops represent internal community edges.
//!
//! 3. **Iterate**: Repeat phases 1-2 on the meta-graph until modularity
//!    stops improving.
//!
//! The gain of moving isolated node `i` into community `C` is proportional to
//!
//! ```text
//! k_i,C − γ · Σ_tot(C) · k_i / 2m
//! ```
//!
//! A node only leaves its community for a strictly better one, so equal
//! gains keep the current assignment and the seed alone decides visiting
//! order.
//!
//! ## References
//!
//! Blondel et al. (2008). "Fast unfolding of communities in large networks."
//! Journal of Statistical Mechanics: Theory and Experiment, P10008.

use super::level::{renumber, LevelGraph};
use super::traits::CommunityDetection;
use crate::error::Result;
use petgraph::graph::UnGraph;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tracing::debug;

/// Louvain community detection algorithm.
#[derive(Debug, Clone)]
pub struct Louvain {
    /// Resolution parameter (gamma).
    resolution: f64,
    /// Maximum passes per level.
    max_iter: usize,
    /// Maximum levels of aggregation.
    max_levels: usize,
    /// Minimum modularity improvement to accept a level.
    min_modularity_gain: f64,
    /// Seed for node visiting order.
    seed: u64,
}

impl Louvain {
    /// Create a new Louvain detector with default settings.
    pub fn new() -> Self {
        Self {
            resolution: 1.0,
            max_iter: 100,
            max_levels: 32,
            min_modularity_gain: 1e-7,
            seed: 42,
        }
    }

    /// Set resolution parameter.
    ///
    /// Higher values produce smaller communities.
    pub fn with_resolution(mut self, resolution: f64) -> Self {
        self.resolution = resolution;
        self
    }

    /// Set maximum passes per level.
    pub fn with_max_iter(mut self, max_iter: usize) -> Self {
        self.max_iter = max_iter;
        self
    }

    /// Set maximum aggregation levels.
    pub fn with_max_levels(mut self, levels: usize) -> Self {
        self.max_levels = levels;
        self
    }

    /// Set random seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Phase 1: Local moving on one level.
    /// Returns (communities, improved).
    fn local_moving(&self, g: &LevelGraph, rng: &mut ChaCha8Rng) -> (Vec<usize>, bool) {
        let n = g.n;
        let two_m = 2.0 * g.total_weight;
        let mut communities: Vec<usize> = (0..n).collect();
        let mut community_degrees = g.degrees.clone();

        let mut order: Vec<usize> = (0..n).collect();
        order.shuffle(rng);

        // Scratch: weight from the current node to each community.
        let mut link = vec![0.0; n];
        let mut seen = vec![false; n];
        let mut touched: Vec<usize> = Vec::new();
        let mut any_improved = false;

        for _pass in 0..self.max_iter {
            let mut improved = false;

            for &node in &order {
                let current = communities[node];
                let ki = g.degrees[node];

                for &(neighbor, w) in &g.adj[node] {
                    let c = communities[neighbor];
                    if !seen[c] {
                        seen[c] = true;
                        touched.push(c);
                    }
                    link[c] += w;
                }

                // Temporarily remove node from its community
                community_degrees[current] -= ki;

                let gain =
                    |c: usize, deg: &[f64]| link[c] - self.resolution * deg[c] * ki / two_m;
                let mut best = current;
                let mut best_gain = gain(current, &community_degrees);
                for &c in &touched {
                    let g_c = gain(c, &community_degrees);
                    if g_c > best_gain {
                        best_gain = g_c;
                        best = c;
                    }
                }

                communities[node] = best;
                community_degrees[best] += ki;
                if best != current {
                    improved = true;
                    any_improved = true;
                }

                for &c in &touched {
                    link[c] = 0.0;
                    seen[c] = false;
                }
                touched.clear();
            }

            if !improved {
                break;
            }
        }

        (communities, any_improved)
    }
}

impl Default for Louvain {
    fn default() -> Self {
        Self::new()
    }
}

impl CommunityDetection for Louvain {
    fn detect<N>(&self, graph: &UnGraph<N, f64>) -> Result<Vec<usize>> {
        let n = graph.node_count();
        if n == 0 {
            return Ok(Vec::new());
        }

        let mut level = LevelGraph::from_graph(graph);
        if level.total_weight <= 0.0 {
            // No edges: each node is its own community
            return Ok((0..n).collect());
        }

        let mut rng = ChaCha8Rng::seed_from_u64(self.seed);
        // Original node -> node of the current level.
        let mut membership: Vec<usize> = (0..n).collect();
        let identity: Vec<usize> = (0..n).collect();
        let mut prev_modularity = level.modularity(&identity, self.resolution);

        for depth in 0..self.max_levels {
            let (partition, improved) = self.local_moving(&level, &mut rng);
            if !improved {
                break;
            }

            let (partition, k) = renumber(&partition);
            let modularity = level.modularity(&partition, self.resolution);
            if modularity - prev_modularity < self.min_modularity_gain {
                break;
            }
            prev_modularity = modularity;

            for m in &mut membership {
                *m = partition[*m];
            }
            debug!(
                level = depth,
                communities = k,
                modularity,
                "louvain level complete"
            );

            // If no aggregation happened (each node is its own community), stop
            if k == level.n {
                break;
            }
            level = level.aggregate(&partition, k);
        }

        Ok(renumber(&membership).0)
    }

    fn quality<N>(&self, graph: &UnGraph<N, f64>, labels: &[usize]) -> f64 {
        LevelGraph::from_graph(graph).modularity(labels, self.resolution)
    }

    fn resolution(&self) -> f64 {
        self.resolution
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use petgraph::graph::{NodeIndex, UnGraph};

    fn two_triangles(bridge: f64) -> UnGraph<(), f64> {
        // Two triangles connected by a single edge
        let mut graph = UnGraph::<(), f64>::new_undirected();
        let n: Vec<NodeIndex> = (0..6).map(|_| graph.add_node(())).collect();
        for &(a, b) in &[(0, 1), (1, 2), (0, 2), (3, 4), (4, 5), (3, 5)] {
            let _ = graph.add_edge(n[a], n[b], 1.0);
        }
        let _ = graph.add_edge(n[2], n[3], bridge);
        graph
    }

    #[test]
    fn test_louvain_triangle() {
        // Simple triangle - should be one community
        let mut graph = UnGraph::<(), f64>::new_undirected();
        let n0 = graph.add_node(());
        let n1 = graph.add_node(());
        let n2 = graph.add_node(());

        let _ = graph.add_edge(n0, n1, 1.0);
        let _ = graph.add_edge(n1, n2, 1.0);
        let _ = graph.add_edge(n0, n2, 1.0);

        let communities = Louvain::new().detect(&graph).unwrap();

        assert_eq!(communities, vec![0, 0, 0]);
    }

    #[test]
    fn test_louvain_two_cliques() {
        let graph = two_triangles(1.0);
        let louvain = Louvain::new();
        let communities = louvain.detect(&graph).unwrap();

        assert_eq!(communities.len(), 6);
        assert_eq!(communities[0], communities[1]);
        assert_eq!(communities[1], communities[2]);
        assert_eq!(communities[3], communities[4]);
        assert_eq!(communities[4], communities[5]);
        assert_ne!(communities[0], communities[3]);

        // Q = 2 × (3/7 − (7/14)²) = 5/14
        let q = louvain.quality(&graph, &communities);
        assert!((q - 5.0 / 14.0).abs() < 1e-12);
    }

    #[test]
    fn heavy_bridge_merges_cliques() {
        let graph = two_triangles(50.0);
        let communities = Louvain::new().detect(&graph).unwrap();
        assert_eq!(communities[2], communities[3]);
    }

    #[test]
    fn test_louvain_empty_graph() {
        let graph = UnGraph::<(), f64>::new_undirected();
        let communities = Louvain::new().detect(&graph).unwrap();
        assert!(communities.is_empty());
    }

    #[test]
    fn test_louvain_disconnected() {
        // Two isolated nodes
        let mut graph = UnGraph::<(), f64>::new_undirected();
        let _ = graph.add_node(());
        let _ = graph.add_node(());

        let communities = Louvain::new().detect(&graph).unwrap();
        assert_eq!(communities, vec![0, 1]);
    }

    #[test]
    fn same_seed_same_partition() {
        let mut graph = UnGraph::<(), f64>::new_undirected();
        let n: Vec<NodeIndex> = (0..30).map(|_| graph.add_node(())).collect();
        for i in 0..30 {
            for j in [1usize, 2, 7] {
                let w = 1.0 + ((i * 31 + j * 17) % 5) as f64 / 3.0;
                let _ = graph.add_edge(n[i], n[(i + j) % 30], w);
            }
        }
        let louvain = Louvain::new().with_seed(7);
        let a = louvain.detect(&graph).unwrap();
        let b = louvain.detect(&graph).unwrap();
        assert_eq!(a, b);
        assert_eq!(
            louvain.quality(&graph, &a).to_bits(),
            louvain.quality(&graph, &b).to_bits()
        );
    }

    #[test]
    fn capped_passes_and_levels_still_cover_every_node() {
        let graph = two_triangles(1.0);
        let full = Louvain::new();
        let best = full.quality(&graph, &full.detect(&graph).unwrap());
        for louvain in [
            Louvain::new().with_max_iter(1),
            Louvain::new().with_max_levels(1),
            Louvain::new().with_max_iter(1).with_max_levels(1),
        ] {
            let communities = louvain.detect(&graph).unwrap();
            assert_eq!(communities.len(), 6);
            let count = communities.iter().max().map_or(0, |m| m + 1);
            assert!((1..=6).contains(&count));
            assert!(louvain.quality(&graph, &communities) <= best + 1e-12);
        }
    }

    #[test]
    fn higher_resolution_never_merges_more() {
        let graph = two_triangles(1.0);
        let coarse = Louvain::new().with_resolution(0.1).detect(&graph).unwrap();
        let fine = Louvain::new().with_resolution(5.0).detect(&graph).unwrap();
        let count = |c: &[usize]| c.iter().max().map_or(0, |m| m + 1);
        assert!(count(&fine) >= count(&coarse));
    }
}
