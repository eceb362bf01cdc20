//! End-to-end disambiguation run.
//!
//! ```text
//! publications ─┬─> derive_relations ─┐
//!               │   (or given list)   ├─> RelationFuser ─> PublicationGraph ─> CommunityDetector ─> PartitionReport
//!               └─────────────────────┘
//! ```
//!
//! Each stage is a pure function of its input, so a [`Disambiguator`] holds
//! only configuration and can be reused across runs.

use crate::community::CommunityDetector;
use crate::config::DisambiguationConfig;
use crate::dataset::PublicationSource;
use crate::error::{Error, Result};
use crate::fusion::{derive_relations, RelationFuser};
use crate::graph::PublicationGraph;
use crate::partition::{Partition, PartitionReport};
use crate::similarity::TitleSimilarity;
use crate::types::{Publication, Relation};
use tracing::{info, warn};

/// Output of one run.
#[derive(Debug, Clone)]
pub struct Disambiguation {
    /// Detector output over graph nodes.
    pub partition: Partition,
    /// Communities over every publication, isolated ones as singletons.
    pub report: PartitionReport,
    /// Per-record problems that were skipped, plus [`Error::EmptyGraph`]
    /// when nothing survived fusion.
    pub issues: Vec<Error>,
    /// Nodes in the built graph.
    pub graph_nodes: usize,
    /// Edges in the built graph.
    pub graph_edges: usize,
}

/// Runs the full pipeline with one configuration.
#[derive(Debug, Clone)]
pub struct Disambiguator {
    config: DisambiguationConfig,
    fuser: RelationFuser,
    titles: TitleSimilarity,
    detector: CommunityDetector,
}

impl Disambiguator {
    /// Validate `config` and build the stages.
    pub fn new(config: DisambiguationConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            fuser: RelationFuser::new(config.fusion()),
            titles: config.title_similarity(),
            detector: CommunityDetector::from_config(&config),
            config,
        })
    }

    /// Configuration in use.
    pub fn config(&self) -> &DisambiguationConfig {
        &self.config
    }

    /// Partition `publications` using the given relations. Relations whose
    /// endpoints are not among `publications` are rejected.
    pub fn run(&self, publications: &[Publication], relations: &[Relation]) -> Result<Disambiguation> {
        self.ensure_available()?;

        let outcome = self
            .fuser
            .fuse_known(relations, publications.iter().map(|p| p.id.as_str()));
        let mut issues = outcome.rejected;

        let graph = PublicationGraph::from_edges(&outcome.edges);
        if graph.is_empty() {
            warn!(
                publications = publications.len(),
                "no edges survived fusion, every publication is a singleton"
            );
            issues.push(Error::EmptyGraph);
        }

        let partition = self.detector.detect(&graph)?;
        let report = PartitionReport::with_publications(
            &partition,
            publications.iter().map(|p| p.id.as_str()),
        );
        info!(
            publications = publications.len(),
            nodes = graph.node_count(),
            edges = graph.edge_count(),
            communities = report.community_count(),
            quality = report.quality,
            issues = issues.len(),
            "disambiguation complete"
        );

        Ok(Disambiguation {
            partition,
            report,
            issues,
            graph_nodes: graph.node_count(),
            graph_edges: graph.edge_count(),
        })
    }

    /// Derive relations from the publications themselves, then [`run`](Self::run).
    pub fn run_derived(&self, publications: &[Publication]) -> Result<Disambiguation> {
        self.ensure_available()?;
        let relations = derive_relations(publications, &self.titles);
        self.run(publications, &relations)
    }

    /// Pull records from `source`. Sources without precomputed relations get
    /// them derived. Problems the source met while reading come first in
    /// [`Disambiguation::issues`].
    pub fn run_source<S: PublicationSource + ?Sized>(&self, source: &S) -> Result<Disambiguation> {
        let (publications, mut issues) = source.load()?;
        let relations = source.relations()?;
        let mut result = if relations.is_empty() {
            self.run_derived(&publications)?
        } else {
            self.run(&publications, &relations)?
        };
        issues.append(&mut result.issues);
        result.issues = issues;
        Ok(result)
    }

    // Fail before any scoring work when the algorithm is compiled out.
    fn ensure_available(&self) -> Result<()> {
        let algorithm = self.detector.algorithm();
        if CommunityDetector::is_available(algorithm) {
            Ok(())
        } else {
            Err(Error::DependencyMissing {
                capability: algorithm.capability(),
            })
        }
    }
}
