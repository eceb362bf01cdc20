//! Evaluation against known author identities.
//!
//! Compares predicted communities to ground-truth labels (one label per
//! publication, e.g. the candidate author id it was fetched under).
//!
//! # Metrics Overview
//!
//! | Metric | Range | Best | Properties |
//! |--------|-------|------|------------|
//! | [`nmi`] | [0, 1] | 1 | Normalized, label-permutation invariant |
//! | [`ari`] | [-1, 1] | 1 | Adjusted Rand Index, chance-corrected |
//! | [`pairwise`] | [0, 1] | 1 | Precision / recall / F1 over same-author pairs |
//!
//! Pairwise F1 is the usual headline number for name disambiguation: a pair
//! of publications is a positive when both are attributed to the same author.
//!
//! # Example
//!
//! ```rust
//! use namesake::metrics::{ari, nmi};
//!
//! let pred = [0, 0, 1, 1, 2, 2];
//! let truth = [0, 0, 0, 1, 1, 1];
//!
//! let nmi_score = nmi(&pred, &truth);
//! let ari_score = ari(&pred, &truth);
//! assert!(nmi_score < 1.0 && ari_score < 1.0);
//! ```
//!
//! # References
//!
//! - Hubert & Arabie (1985). "Comparing partitions" (ARI)
//! - Strehl & Ghosh (2002). "Cluster ensembles" (NMI)

use crate::partition::PartitionReport;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use tracing::{info, warn};

/// Normalized Mutual Information between two clusterings.
///
/// ```text
/// NMI(U, V) = 2 * I(U; V) / (H(U) + H(V))
/// ```
///
/// Returns 0.0 for mismatched or empty inputs and 1.0 when both clusterings
/// are a single cluster.
///
/// ```rust
/// use namesake::metrics::nmi;
///
/// // Same grouping, different label names
/// assert!((nmi(&[1, 1, 0, 0], &[0, 0, 1, 1]) - 1.0).abs() < 1e-12);
/// ```
pub fn nmi(pred: &[usize], truth: &[usize]) -> f64 {
    if pred.len() != truth.len() || pred.is_empty() {
        return 0.0;
    }
    let table = Contingency::new(pred, truth);
    let n = table.n as f64;

    let h_pred = entropy(table.rows.values().copied(), n);
    let h_truth = entropy(table.cols.values().copied(), n);

    let mut mi = 0.0;
    for (&(p, t), &count) in &table.joint {
        let p_joint = count as f64 / n;
        let p_p = table.rows[&p] as f64 / n;
        let p_t = table.cols[&t] as f64 / n;
        mi += p_joint * (p_joint / (p_p * p_t)).ln();
    }

    let denom = h_pred + h_truth;
    if denom > 0.0 {
        (2.0 * mi / denom).clamp(0.0, 1.0)
    } else {
        1.0
    }
}

/// Adjusted Rand Index between two clusterings.
///
/// 0 is what random labelling scores on average, 1 is perfect agreement.
pub fn ari(pred: &[usize], truth: &[usize]) -> f64 {
    if pred.len() != truth.len() || pred.is_empty() {
        return 0.0;
    }
    let table = Contingency::new(pred, truth);

    let sum_comb_ij: f64 = table.joint.values().map(|&c| comb2(c) as f64).sum();
    let sum_comb_a: f64 = table.rows.values().map(|&a| comb2(a) as f64).sum();
    let sum_comb_b: f64 = table.cols.values().map(|&b| comb2(b) as f64).sum();
    let comb_n = comb2(table.n) as f64;
    if comb_n == 0.0 {
        return 1.0;
    }

    let expected = sum_comb_a * sum_comb_b / comb_n;
    let max_index = (sum_comb_a + sum_comb_b) / 2.0;
    let denom = max_index - expected;
    if denom.abs() < 1e-10 {
        return 1.0;
    }
    (sum_comb_ij - expected) / denom
}

/// Pairwise precision, recall and F1.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PairwiseScores {
    /// Predicted same-author pairs that are correct.
    pub precision: f64,
    /// True same-author pairs that were predicted.
    pub recall: f64,
    /// Harmonic mean of the two.
    pub f1: f64,
}

/// Pairwise scores, counted from the contingency table rather than by
/// enumerating pairs.
pub fn pairwise(pred: &[usize], truth: &[usize]) -> PairwiseScores {
    let zero = PairwiseScores {
        precision: 0.0,
        recall: 0.0,
        f1: 0.0,
    };
    if pred.len() != truth.len() || pred.is_empty() {
        return zero;
    }
    let table = Contingency::new(pred, truth);
    let tp: usize = table.joint.values().map(|&c| comb2(c)).sum();
    let predicted: usize = table.rows.values().map(|&c| comb2(c)).sum();
    let actual: usize = table.cols.values().map(|&c| comb2(c)).sum();

    // No pairs on either side: singletons everywhere agree perfectly.
    if predicted == 0 && actual == 0 {
        return PairwiseScores {
            precision: 1.0,
            recall: 1.0,
            f1: 1.0,
        };
    }
    let precision = if predicted > 0 { tp as f64 / predicted as f64 } else { 0.0 };
    let recall = if actual > 0 { tp as f64 / actual as f64 } else { 0.0 };
    let f1 = if precision + recall > 0.0 {
        2.0 * precision * recall / (precision + recall)
    } else {
        0.0
    };
    PairwiseScores {
        precision,
        recall,
        f1,
    }
}

/// All scores for one run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Evaluation {
    /// Publications present in both the report and the ground truth.
    pub evaluated: usize,
    /// Report publications with no ground-truth label.
    pub unlabelled: usize,
    /// Normalized mutual information.
    pub nmi: f64,
    /// Adjusted Rand Index.
    pub ari: f64,
    /// Pairwise precision / recall / F1.
    pub pairwise: PairwiseScores,
}

impl Evaluation {
    /// Score `report` against `ground_truth` (publication id → author label).
    ///
    /// Publications missing from the ground truth are skipped and counted in
    /// [`Evaluation::unlabelled`].
    pub fn against<S: AsRef<str>>(
        report: &PartitionReport,
        ground_truth: &BTreeMap<String, S>,
    ) -> Self {
        let mut truth_ids: HashMap<&str, usize> = HashMap::new();
        let mut pred = Vec::new();
        let mut truth = Vec::new();
        let mut unlabelled = 0;

        for (id, label) in report.assignments() {
            match ground_truth.get(id) {
                Some(author) => {
                    let next = truth_ids.len();
                    let t = *truth_ids.entry(author.as_ref()).or_insert(next);
                    pred.push(label);
                    truth.push(t);
                }
                None => unlabelled += 1,
            }
        }
        if unlabelled > 0 {
            warn!(unlabelled, "publications without ground-truth label skipped");
        }

        let evaluation = Self {
            evaluated: pred.len(),
            unlabelled,
            nmi: nmi(&pred, &truth),
            ari: ari(&pred, &truth),
            pairwise: pairwise(&pred, &truth),
        };
        info!(
            evaluated = evaluation.evaluated,
            authors = truth_ids.len(),
            nmi = evaluation.nmi,
            ari = evaluation.ari,
            f1 = evaluation.pairwise.f1,
            "evaluated partition against ground truth"
        );
        evaluation
    }
}

// Helper functions

struct Contingency {
    joint: BTreeMap<(usize, usize), usize>,
    rows: BTreeMap<usize, usize>,
    cols: BTreeMap<usize, usize>,
    n: usize,
}

impl Contingency {
    fn new(pred: &[usize], truth: &[usize]) -> Self {
        let mut joint = BTreeMap::new();
        let mut rows = BTreeMap::new();
        let mut cols = BTreeMap::new();
        for (&p, &t) in pred.iter().zip(truth) {
            *joint.entry((p, t)).or_insert(0) += 1;
            *rows.entry(p).or_insert(0) += 1;
            *cols.entry(t).or_insert(0) += 1;
        }
        Self {
            joint,
            rows,
            cols,
            n: pred.len(),
        }
    }
}

fn entropy(counts: impl Iterator<Item = usize>, n: f64) -> f64 {
    counts
        .map(|c| {
            let p = c as f64 / n;
            if p > 0.0 {
                -p * p.ln()
            } else {
                0.0
            }
        })
        .sum()
}

fn comb2(n: usize) -> usize {
    if n < 2 {
        0
    } else {
        n * (n - 1) / 2
    }
}
