//! Publication graph.
//!
//! A petgraph `UnGraph` whose node weights are publication ids and whose
//! edge weights are fused relation weights. Nodes are inserted in id order
//! and edges in canonical pair order, so node indices are stable for a given
//! edge set.

use crate::types::WeightedEdge;
use petgraph::graph::{NodeIndex, UnGraph};
use petgraph::visit::EdgeRef;
use std::collections::{BTreeMap, HashMap};
use tracing::{debug, info};

/// Weighted undirected graph over publication identifiers.
///
/// Invariants: no self-loops, at most one edge per unordered pair, every
/// weight finite and `> 0`, every node has at least one edge.
#[derive(Debug, Clone, Default)]
pub struct PublicationGraph {
    graph: UnGraph<String, f64>,
    index: HashMap<String, NodeIndex>,
}

impl PublicationGraph {
    /// Build from fused edges.
    ///
    /// Duplicate pairs are coalesced by summing their weights. Self-loops and
    /// edges whose (coalesced) weight is not positive are dropped.
    pub fn from_edges(edges: &[WeightedEdge]) -> Self {
        let mut merged: BTreeMap<(&str, &str), Vec<f64>> = BTreeMap::new();
        let mut dropped = 0usize;
        for e in edges {
            if e.node_a == e.node_b || e.node_a.is_empty() || e.node_b.is_empty() {
                dropped += 1;
                continue;
            }
            let key = if e.node_a < e.node_b {
                (e.node_a.as_str(), e.node_b.as_str())
            } else {
                (e.node_b.as_str(), e.node_a.as_str())
            };
            merged.entry(key).or_default().push(e.weight);
        }
        let duplicates = edges.len() - dropped - merged.len();

        let mut kept: Vec<((&str, &str), f64)> = Vec::with_capacity(merged.len());
        for (key, mut weights) in merged {
            weights.sort_by(f64::total_cmp);
            let w: f64 = weights.iter().sum();
            if w.is_finite() && w > 0.0 {
                kept.push((key, w));
            } else {
                dropped += 1;
            }
        }

        let mut ids: Vec<&str> = kept.iter().flat_map(|((a, b), _)| [*a, *b]).collect();
        ids.sort_unstable();
        ids.dedup();

        let mut graph = UnGraph::with_capacity(ids.len(), kept.len());
        let mut index = HashMap::with_capacity(ids.len());
        for id in ids {
            let idx = graph.add_node(id.to_string());
            let _ = index.insert(id.to_string(), idx);
        }
        for ((a, b), w) in kept {
            let _ = graph.add_edge(index[a], index[b], w);
        }

        if duplicates > 0 || dropped > 0 {
            debug!(duplicates, dropped, "coalesced graph input");
        }
        info!(
            nodes = graph.node_count(),
            edges = graph.edge_count(),
            "built publication graph"
        );
        Self { graph, index }
    }

    /// Underlying petgraph graph.
    pub fn inner(&self) -> &UnGraph<String, f64> {
        &self.graph
    }

    /// Number of publications with at least one edge.
    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    /// Number of edges.
    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// True when no edge survived.
    pub fn is_empty(&self) -> bool {
        self.graph.node_count() == 0
    }

    /// Sum of edge weights (`m`).
    pub fn total_weight(&self) -> f64 {
        self.graph.edge_weights().sum()
    }

    /// Whether `id` is a node.
    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    /// Node ids in index order.
    pub fn ids(&self) -> impl Iterator<Item = &str> + '_ {
        self.graph.node_weights().map(String::as_str)
    }

    /// Weight of the edge between two ids, if any.
    pub fn weight(&self, a: &str, b: &str) -> Option<f64> {
        let (ia, ib) = (*self.index.get(a)?, *self.index.get(b)?);
        self.graph.find_edge(ia, ib).map(|e| self.graph[e])
    }

    /// Edges as canonical [`WeightedEdge`]s.
    pub fn edges(&self) -> Vec<WeightedEdge> {
        self.graph
            .edge_references()
            .filter_map(|e| {
                WeightedEdge::canonical(
                    &self.graph[e.source()],
                    &self.graph[e.target()],
                    *e.weight(),
                )
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn edge(a: &str, b: &str, w: f64) -> WeightedEdge {
        WeightedEdge {
            node_a: a.to_string(),
            node_b: b.to_string(),
            weight: w,
        }
    }

    #[test]
    fn coalesces_duplicate_pairs() {
        let g = PublicationGraph::from_edges(&[edge("a", "b", 1.0), edge("b", "a", 0.5)]);
        assert_eq!(g.edge_count(), 1);
        assert_eq!(g.weight("a", "b"), Some(1.5));
        assert_eq!(g.weight("b", "a"), Some(1.5));
    }

    #[test]
    fn drops_loops_and_non_positive_weights() {
        let g = PublicationGraph::from_edges(&[
            edge("a", "a", 3.0),
            edge("a", "b", 0.0),
            edge("c", "d", -1.0),
            edge("e", "f", 2.0),
        ]);
        assert_eq!(g.node_count(), 2);
        assert!(!g.contains("a"));
        assert!(g.contains("e"));
    }

    #[test]
    fn nodes_are_sorted_by_id() {
        let g = PublicationGraph::from_edges(&[edge("w3", "w1", 1.0), edge("w2", "w3", 1.0)]);
        let ids: Vec<&str> = g.ids().collect();
        assert_eq!(ids, vec!["w1", "w2", "w3"]);
        assert!((g.total_weight() - 2.0).abs() < 1e-12);
    }

    #[test]
    fn empty_input_gives_empty_graph() {
        assert!(PublicationGraph::from_edges(&[]).is_empty());
    }

    proptest! {
        #[test]
        fn built_graph_has_no_loops_and_positive_weights(
            raw in proptest::collection::vec((0u8..8, 0u8..8, -1.0f64..3.0), 0..50),
        ) {
            let edges: Vec<WeightedEdge> = raw
                .iter()
                .map(|&(a, b, w)| edge(&format!("n{a}"), &format!("n{b}"), w))
                .collect();
            let g = PublicationGraph::from_edges(&edges);
            for e in g.edges() {
                prop_assert!(e.node_a < e.node_b);
                prop_assert!(e.weight > 0.0);
            }
            prop_assert_eq!(g.edges().len(), g.edge_count());
        }
    }
}
