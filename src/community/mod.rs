//! Community detection over the publication graph.
//!
//! Given the fused graph, find groups of publications that are densely
//! connected to each other and sparsely connected to the rest. Each group is
//! one inferred author identity.
//!
//! ## The Modularity Objective (Louvain)
//!
//! ```text
//! Q = (1/2m) × Σ[A_ij - γ(k_i × k_j)/(2m)] × δ(c_i, c_j)
//! ```
//!
//! Where:
//! - m = total edge weight (sum of all edges)
//! - A_ij = edge weight between i and j
//! - k_i = weighted degree of node i
//! - γ = resolution parameter
//! - δ(c_i, c_j) = 1 if i and j are in same community
//!
//! - **γ = 1**: Standard modularity (default)
//! - **γ > 1**: Smaller communities (higher penalty for merging)
//! - **γ < 1**: Larger communities (lower penalty for merging)
//!
//! ## The Constant Potts Model (Leiden)
//!
//! ```text
//! H = Σ_c [ e_c − γ · n_c (n_c − 1) / 2 ]
//! ```
//!
//! γ is a density threshold in edge-weight units rather than a ratio to a
//! null model, so sensible values depend on the weight scale of the fused
//! graph.
//!
//! ## Algorithms
//!
//! ### Leiden
//!
//! The Leiden algorithm ([Traag et al. 2019](https://arxiv.org/abs/1810.08473))
//! improves on Louvain with a critical guarantee: **communities are always
//! connected**.
//!
//! ### Louvain
//!
//! The original fast modularity algorithm ([Blondel et al. 2008](https://arxiv.org/abs/0803.0476)).
//! **Can produce disconnected communities**.
//!
//! Each variant sits behind a cargo feature (`louvain`, `leiden`). Asking
//! [`CommunityDetector`] for a variant that was compiled out is an
//! [`Error::DependencyMissing`]; it never substitutes the other one.
//!
//! ## Usage
//!
//! ```rust
//! use petgraph::graph::UnGraph;
//! use namesake::community::{CommunityDetection, Louvain};
//!
//! let mut graph = UnGraph::<(), f64>::new_undirected();
//! let a = graph.add_node(());
//! let b = graph.add_node(());
//! let c = graph.add_node(());
//! graph.add_edge(a, b, 2.0);
//! graph.add_edge(b, c, 1.5);
//!
//! let louvain = Louvain::new().with_seed(42);
//! let communities = louvain.detect(&graph).unwrap();
//! assert_eq!(communities.len(), 3);
//! ```
//!
//! ## References
//!
//! - Traag, Waltman, van Eck (2019). "From Louvain to Leiden: guaranteeing
//!   well-connected communities." Scientific Reports 9, 5233.
//! - Blondel et al. (2008). "Fast unfolding of communities in large networks."
//! - Newman & Girvan (2004). "Finding and evaluating community structure in networks."

#[cfg(any(feature = "louvain", feature = "leiden"))]
mod level;
#[cfg(feature = "leiden")]
mod leiden;
#[cfg(feature = "louvain")]
mod louvain;
mod traits;

#[cfg(feature = "leiden")]
pub use leiden::Leiden;
#[cfg(feature = "louvain")]
pub use louvain::Louvain;
pub use traits::CommunityDetection;

use crate::config::{Algorithm, DisambiguationConfig};
use crate::error::{Error, Result};
use crate::graph::PublicationGraph;
use crate::partition::Partition;
use tracing::info;

/// Runs the configured algorithm on a [`PublicationGraph`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CommunityDetector {
    algorithm: Algorithm,
    resolution: f64,
    seed: u64,
}

impl CommunityDetector {
    /// Detector for `algorithm` with resolution 1.0 and seed 42.
    pub fn new(algorithm: Algorithm) -> Self {
        Self {
            algorithm,
            resolution: 1.0,
            seed: 42,
        }
    }

    /// Detector configured from a run configuration.
    pub fn from_config(config: &DisambiguationConfig) -> Self {
        Self::new(config.algorithm)
            .with_resolution(config.resolution)
            .with_seed(config.seed)
    }

    /// Set the resolution (modularity γ or CPM resolution parameter).
    pub fn with_resolution(mut self, resolution: f64) -> Self {
        self.resolution = resolution;
        self
    }

    /// Set the seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Selected algorithm.
    pub fn algorithm(&self) -> Algorithm {
        self.algorithm
    }

    /// Whether `algorithm` was compiled into this build.
    pub fn is_available(algorithm: Algorithm) -> bool {
        match algorithm {
            Algorithm::Louvain => cfg!(feature = "louvain"),
            Algorithm::Leiden => cfg!(feature = "leiden"),
        }
    }

    /// Partition `graph`.
    ///
    /// An empty graph gives an empty partition with quality 0.0. Every node
    /// of a non-empty graph receives exactly one label.
    pub fn detect(&self, graph: &PublicationGraph) -> Result<Partition> {
        if !Self::is_available(self.algorithm) {
            return Err(Error::DependencyMissing {
                capability: self.algorithm.capability(),
            });
        }
        if !(self.resolution.is_finite() && self.resolution >= 0.0) {
            return Err(Error::InvalidParameter {
                name: "resolution",
                message: "must be a finite number >= 0",
            });
        }
        if graph.is_empty() {
            info!(algorithm = ?self.algorithm, "empty graph, nothing to partition");
            return Ok(Partition::empty(self.algorithm));
        }

        let (labels, quality) = self.run(graph)?;
        let partition = Partition::from_labels(graph.ids(), &labels, quality, self.algorithm);
        info!(
            algorithm = ?self.algorithm,
            nodes = graph.node_count(),
            communities = partition.community_count(),
            quality,
            "partitioned publication graph"
        );
        Ok(partition)
    }

    fn run(&self, graph: &PublicationGraph) -> Result<(Vec<usize>, f64)> {
        match self.algorithm {
            #[cfg(feature = "louvain")]
            Algorithm::Louvain => {
                let louvain = Louvain::new()
                    .with_resolution(self.resolution)
                    .with_seed(self.seed);
                run_with(&louvain, graph)
            }
            #[cfg(feature = "leiden")]
            Algorithm::Leiden => {
                let leiden = Leiden::new()
                    .with_resolution(self.resolution)
                    .with_seed(self.seed);
                run_with(&leiden, graph)
            }
            #[allow(unreachable_patterns)]
            other => Err(Error::DependencyMissing {
                capability: other.capability(),
            }),
        }
    }
}

#[cfg(any(feature = "louvain", feature = "leiden"))]
fn run_with<D: CommunityDetection>(
    detector: &D,
    graph: &PublicationGraph,
) -> Result<(Vec<usize>, f64)> {
    let labels = detector.detect(graph.inner())?;
    let quality = detector.quality(graph.inner(), &labels);
    Ok((labels, quality))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::WeightedEdge;

    fn two_groups() -> PublicationGraph {
        let mut edges = Vec::new();
        for (a, b) in [("a1", "a2"), ("a2", "a3"), ("a1", "a3"), ("b1", "b2"), ("b2", "b3"), ("b1", "b3")] {
            edges.push(WeightedEdge::canonical(a, b, 2.0).unwrap());
        }
        edges.push(WeightedEdge::canonical("a3", "b1", 0.2).unwrap());
        PublicationGraph::from_edges(&edges)
    }

    fn available() -> Vec<Algorithm> {
        [Algorithm::Louvain, Algorithm::Leiden]
            .into_iter()
            .filter(|&a| CommunityDetector::is_available(a))
            .collect()
    }

    fn resolution_for(algorithm: Algorithm) -> f64 {
        match algorithm {
            Algorithm::Louvain => 1.0,
            Algorithm::Leiden => 0.5,
        }
    }

    #[test]
    fn empty_graph_gives_empty_partition() {
        let graph = PublicationGraph::from_edges(&[]);
        for algorithm in available() {
            let partition = CommunityDetector::new(algorithm).detect(&graph).unwrap();
            assert!(partition.is_empty());
            assert_eq!(partition.quality(), 0.0);
        }
    }

    #[test]
    fn both_variants_label_every_node_once() {
        let graph = two_groups();
        for algorithm in available() {
            let partition = CommunityDetector::new(algorithm)
                .with_resolution(resolution_for(algorithm))
                .detect(&graph)
                .unwrap();
            assert_eq!(partition.len(), graph.node_count());
            for id in graph.ids() {
                assert!(partition.label(id).is_some());
            }
            assert_eq!(partition.community_count(), 2);
            assert_eq!(partition.label("a1"), partition.label("a3"));
            assert_ne!(partition.label("a1"), partition.label("b1"));
        }
    }

    #[test]
    fn repeated_runs_are_identical() {
        let graph = two_groups();
        for algorithm in available() {
            let detector = CommunityDetector::new(algorithm)
                .with_resolution(resolution_for(algorithm))
                .with_seed(42);
            let a = detector.detect(&graph).unwrap();
            let b = detector.detect(&graph).unwrap();
            assert_eq!(a, b);
            assert_eq!(a.quality().to_bits(), b.quality().to_bits());
        }
    }

    #[test]
    fn rejects_negative_resolution() {
        for algorithm in available() {
            let err = CommunityDetector::new(algorithm)
                .with_resolution(-1.0)
                .detect(&two_groups())
                .unwrap_err();
            assert!(matches!(err, Error::InvalidParameter { .. }));
        }
    }

    #[test]
    fn missing_detector_is_reported_before_anything_else() {
        for algorithm in [Algorithm::Louvain, Algorithm::Leiden] {
            if CommunityDetector::is_available(algorithm) {
                continue;
            }
            let err = CommunityDetector::new(algorithm)
                .with_resolution(-1.0)
                .detect(&PublicationGraph::from_edges(&[]))
                .unwrap_err();
            assert_eq!(
                err,
                Error::DependencyMissing {
                    capability: algorithm.capability()
                }
            );
        }
    }

    #[test]
    fn availability_follows_features() {
        assert_eq!(
            CommunityDetector::is_available(Algorithm::Louvain),
            cfg!(feature = "louvain")
        );
        assert_eq!(
            CommunityDetector::is_available(Algorithm::Leiden),
            cfg!(feature = "leiden")
        );
    }
}
