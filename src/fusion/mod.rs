//! Relation fusion.
//!
//! Collapses COAUTHOR, COVENUE and COTITLE relations into a single weighted
//! undirected edge per publication pair:
//!
//! ```text
//! COAUTHOR  s_a * f(shared)            f(x) = ln(1 + x) or x; missing count = 1.0
//! COVENUE   s_v * (value or 1.0)       null or zero value counts as 1.0
//! COTITLE   s_t * similarity           missing similarity = 0.0
//!
//! w(a, b)   = Σ over every relation connecting a and b
//! ```
//!
//! Contributions are grouped by canonical pair and kind, sorted, and summed
//! in a fixed kind order, so any permutation of the input yields bit-identical
//! weights.

mod derive;

pub use derive::derive_relations;

use crate::error::Error;
use crate::types::{Relation, RelationKind, WeightedEdge};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use tracing::{info, warn};

/// Per-kind scaling rules.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FusionConfig {
    /// Multiplier on COAUTHOR contributions.
    pub coauthor_scale: f64,
    /// Multiplier on COVENUE contributions.
    pub covenue_scale: f64,
    /// Multiplier on COTITLE contributions.
    pub cotitle_scale: f64,
    /// Log-scale shared-author counts.
    pub use_log_coauthor: bool,
}

impl Default for FusionConfig {
    fn default() -> Self {
        Self {
            coauthor_scale: 1.0,
            covenue_scale: 1.0,
            cotitle_scale: 1.2,
            use_log_coauthor: true,
        }
    }
}

impl FusionConfig {
    /// Weight contributed by one relation.
    pub fn contribution(&self, kind: RelationKind, value: Option<f64>) -> f64 {
        match kind {
            RelationKind::Coauthor => {
                let f = match value {
                    None => 1.0,
                    Some(x) if self.use_log_coauthor => x.ln_1p(),
                    Some(x) => x,
                };
                self.coauthor_scale * f
            }
            RelationKind::Covenue => match value {
                Some(x) if x != 0.0 => self.covenue_scale * x,
                _ => self.covenue_scale,
            },
            RelationKind::Cotitle => self.cotitle_scale * value.unwrap_or(0.0),
        }
    }
}

/// Result of fusing one relation set.
#[derive(Debug, Clone, Default)]
pub struct FusionOutcome {
    /// Fused edges, sorted by `(node_a, node_b)`.
    pub edges: Vec<WeightedEdge>,
    /// Relations skipped as [`Error::InvalidRelation`].
    pub rejected: Vec<Error>,
}

/// Merges raw relations into weighted edges.
#[derive(Debug, Clone, Default)]
pub struct RelationFuser {
    config: FusionConfig,
}

impl RelationFuser {
    /// Create a fuser.
    pub fn new(config: FusionConfig) -> Self {
        Self { config }
    }

    /// Fuse relations without endpoint validation.
    pub fn fuse(&self, relations: &[Relation]) -> FusionOutcome {
        self.fuse_inner(relations, None)
    }

    /// Fuse relations, rejecting any whose endpoints are not in `known_ids`.
    pub fn fuse_known<'a, I>(&self, relations: &[Relation], known_ids: I) -> FusionOutcome
    where
        I: IntoIterator<Item = &'a str>,
    {
        let known: HashSet<&str> = known_ids.into_iter().collect();
        self.fuse_inner(relations, Some(&known))
    }

    fn fuse_inner(&self, relations: &[Relation], known: Option<&HashSet<&str>>) -> FusionOutcome {
        let mut rejected = Vec::new();
        let mut contributions: BTreeMap<(&str, &str), [Vec<f64>; 3]> = BTreeMap::new();

        for relation in relations {
            if let Some(reason) = invalid_reason(relation, known) {
                warn!(
                    source_id = %relation.source,
                    target_id = %relation.target,
                    kind = %relation.kind,
                    reason,
                    "skipping relation"
                );
                rejected.push(Error::InvalidRelation {
                    source_id: relation.source.clone(),
                    target_id: relation.target.clone(),
                    reason: reason.to_string(),
                });
                continue;
            }
            // Missing endpoints and self-relations carry no signal.
            if relation.source.is_empty()
                || relation.target.is_empty()
                || relation.source == relation.target
            {
                continue;
            }

            let (a, b) = if relation.source < relation.target {
                (relation.source.as_str(), relation.target.as_str())
            } else {
                (relation.target.as_str(), relation.source.as_str())
            };
            let w = self.config.contribution(relation.kind, relation.value);
            contributions.entry((a, b)).or_default()[relation.kind.index()].push(w);
        }

        let edges: Vec<WeightedEdge> = contributions
            .into_iter()
            .filter_map(|((a, b), mut per_kind)| {
                let weight: f64 = per_kind
                    .iter_mut()
                    .map(|ws| {
                        ws.sort_by(f64::total_cmp);
                        ws.iter().sum::<f64>()
                    })
                    .sum();
                WeightedEdge::canonical(a, b, weight)
            })
            .collect();

        info!(
            relations = relations.len(),
            edges = edges.len(),
            rejected = rejected.len(),
            "fused relations"
        );
        FusionOutcome { edges, rejected }
    }
}

fn invalid_reason(relation: &Relation, known: Option<&HashSet<&str>>) -> Option<&'static str> {
    if let Some(v) = relation.value {
        if !v.is_finite() {
            return Some("raw value is not finite");
        }
        if v < 0.0 {
            return Some("raw value is negative");
        }
        if relation.kind == RelationKind::Cotitle && v > 1.0 {
            return Some("similarity above 1");
        }
    }
    if let Some(known) = known {
        let missing = |id: &str| !id.is_empty() && !known.contains(id);
        if missing(&relation.source) || missing(&relation.target) {
            return Some("endpoint not in publication set");
        }
    }
    None
}
