//! Weighted working graph shared by the multi-level algorithms.
//!
//! Level 0 mirrors the input graph. Each aggregation collapses a partition
//! into one node per community: inter-community edges are summed, internal
//! edges become a self-loop, and node sizes (number of original nodes) add.
//! Every loop below runs in index order so results are reproducible.

use petgraph::graph::UnGraph;
use petgraph::visit::EdgeRef;
use std::collections::{BTreeMap, VecDeque};

#[derive(Debug, Clone)]
pub(crate) struct LevelGraph {
    pub n: usize,
    /// node -> [(neighbor, weight)], neighbors ascending, no self entries.
    pub adj: Vec<Vec<(usize, f64)>>,
    /// Internal weight folded into each node.
    pub self_loops: Vec<f64>,
    /// Weighted degree: Σ adjacent weights + 2 × self-loop.
    pub degrees: Vec<f64>,
    /// Number of original nodes each node stands for.
    pub sizes: Vec<f64>,
    /// Total edge weight `m` (self-loops counted once).
    pub total_weight: f64,
}

impl LevelGraph {
    /// Level 0 from a petgraph graph. Parallel edges are summed; edges with
    /// non-positive or non-finite weight are ignored.
    pub fn from_graph<N>(graph: &UnGraph<N, f64>) -> Self {
        let n = graph.node_count();
        let mut edges: Vec<(usize, usize, f64)> = Vec::with_capacity(graph.edge_count());
        let mut self_loops = vec![0.0; n];
        for e in graph.edge_references() {
            let w = *e.weight();
            if !(w.is_finite() && w > 0.0) {
                continue;
            }
            let (i, j) = (e.source().index(), e.target().index());
            if i == j {
                self_loops[i] += w;
            } else {
                edges.push((i.min(j), i.max(j), w));
            }
        }
        edges.sort_by(|a, b| (a.0, a.1).cmp(&(b.0, b.1)).then(a.2.total_cmp(&b.2)));
        Self::from_sorted_edges(n, &edges, self_loops, vec![1.0; n])
    }

    fn from_sorted_edges(
        n: usize,
        edges: &[(usize, usize, f64)],
        self_loops: Vec<f64>,
        sizes: Vec<f64>,
    ) -> Self {
        let mut adj: Vec<Vec<(usize, f64)>> = vec![Vec::new(); n];
        let mut degrees = vec![0.0; n];
        let mut total_weight = self_loops.iter().sum::<f64>();
        for &(i, j, w) in edges {
            match adj[i].last_mut() {
                Some((last, acc)) if *last == j => *acc += w,
                _ => adj[i].push((j, w)),
            }
            total_weight += w;
        }
        // Mirror the upper triangle; rows stay sorted because i ascends.
        for i in 0..n {
            for k in 0..adj[i].len() {
                let (j, w) = adj[i][k];
                if j > i {
                    adj[j].push((i, w));
                }
            }
        }
        for row in &mut adj {
            row.sort_by_key(|&(j, _)| j);
        }
        for i in 0..n {
            degrees[i] = adj[i].iter().map(|(_, w)| w).sum::<f64>() + 2.0 * self_loops[i];
        }
        Self {
            n,
            adj,
            self_loops,
            degrees,
            sizes,
            total_weight,
        }
    }

    /// Collapse `membership` (dense labels `0..k`) into a new level.
    pub fn aggregate(&self, membership: &[usize], k: usize) -> Self {
        let mut weights: BTreeMap<(usize, usize), f64> = BTreeMap::new();
        let mut self_loops = vec![0.0; k];
        let mut sizes = vec![0.0; k];
        for i in 0..self.n {
            let ci = membership[i];
            self_loops[ci] += self.self_loops[i];
            sizes[ci] += self.sizes[i];
            for &(j, w) in &self.adj[i] {
                if j <= i {
                    continue;
                }
                let cj = membership[j];
                if ci == cj {
                    self_loops[ci] += w;
                } else {
                    *weights.entry((ci.min(cj), ci.max(cj))).or_insert(0.0) += w;
                }
            }
        }
        let edges: Vec<(usize, usize, f64)> =
            weights.into_iter().map(|((i, j), w)| (i, j, w)).collect();
        Self::from_sorted_edges(k, &edges, self_loops, sizes)
    }

    /// Internal weight and total degree per community.
    fn community_sums(&self, labels: &[usize]) -> (Vec<f64>, Vec<f64>, Vec<f64>) {
        let k = labels.iter().copied().max().map_or(0, |c| c + 1);
        let mut internal = vec![0.0; k];
        let mut degree = vec![0.0; k];
        let mut size = vec![0.0; k];
        for i in 0..self.n {
            let c = labels[i];
            internal[c] += self.self_loops[i];
            degree[c] += self.degrees[i];
            size[c] += self.sizes[i];
            for &(j, w) in &self.adj[i] {
                if j > i && labels[j] == c {
                    internal[c] += w;
                }
            }
        }
        (internal, degree, size)
    }

    /// Modularity with resolution `γ`:
    ///
    /// ```text
    /// Q = Σ_c [ L_c / m − γ (d_c / 2m)² ]
    /// ```
    ///
    /// which equals `(1/2m) Σ_ij [A_ij − γ k_i k_j / 2m] δ(c_i, c_j)`.
    pub fn modularity(&self, labels: &[usize], resolution: f64) -> f64 {
        let m = self.total_weight;
        if m <= 0.0 {
            return 0.0;
        }
        let (internal, degree, _) = self.community_sums(labels);
        internal
            .iter()
            .zip(&degree)
            .map(|(&l, &d)| l / m - resolution * (d / (2.0 * m)).powi(2))
            .sum()
    }

    /// Constant Potts Model quality:
    ///
    /// ```text
    /// H = Σ_c [ e_c − γ n_c (n_c − 1) / 2 ]
    /// ```
    pub fn cpm_quality(&self, labels: &[usize], resolution: f64) -> f64 {
        let (internal, _, size) = self.community_sums(labels);
        internal
            .iter()
            .zip(&size)
            .map(|(&e, &s)| e - resolution * s * (s - 1.0) / 2.0)
            .sum()
    }

    /// Relabel so that every community is connected: each connected piece of
    /// a community gets its own label. Labels come out dense, in order of
    /// first node.
    pub fn split_disconnected(&self, labels: &[usize]) -> Vec<usize> {
        let mut out = vec![usize::MAX; self.n];
        let mut next = 0;
        let mut queue = VecDeque::new();
        for start in 0..self.n {
            if out[start] != usize::MAX {
                continue;
            }
            out[start] = next;
            queue.push_back(start);
            while let Some(node) = queue.pop_front() {
                for &(neighbor, _) in &self.adj[node] {
                    if out[neighbor] == usize::MAX && labels[neighbor] == labels[node] {
                        out[neighbor] = next;
                        queue.push_back(neighbor);
                    }
                }
            }
            next += 1;
        }
        out
    }
}

/// Renumber labels to `0..k` in order of first appearance. Returns `(labels, k)`.
pub(crate) fn renumber(labels: &[usize]) -> (Vec<usize>, usize) {
    let mut mapping: Vec<usize> = vec![usize::MAX; labels.iter().copied().max().map_or(0, |c| c + 1)];
    let mut next = 0;
    let out = labels
        .iter()
        .map(|&c| {
            if mapping[c] == usize::MAX {
                mapping[c] = next;
                next += 1;
            }
            mapping[c]
        })
        .collect();
    (out, next)
}
