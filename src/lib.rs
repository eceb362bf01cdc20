//! # namesake
//!
//! Author name disambiguation by community detection.
//!
//! Publications that share an ambiguous author name are linked by three
//! signals (shared co-authors, shared venue, similar titles). The signals are
//! fused into one weighted edge per publication pair, and the resulting graph
//! is partitioned with Louvain (modularity) or Leiden (Constant Potts Model).
//! Each community is one inferred author.
//!
//! ```rust
//! use namesake::{DisambiguationConfig, Disambiguator, Publication, Relation};
//!
//! let publications = vec![
//!     Publication::new("w1", "Protein folding kinetics"),
//!     Publication::new("w2", "Folding kinetics revisited"),
//!     Publication::new("w3", "Medieval trade routes"),
//! ];
//! let relations = vec![Relation::coauthor("w1", "w2", 2)];
//!
//! let result = Disambiguator::new(DisambiguationConfig::default())?
//!     .run(&publications, &relations)?;
//! assert_eq!(result.report.sizes(), vec![2, 1]);
//! # Ok::<(), namesake::Error>(())
//! ```
//!
//! **Default build** compiles both detectors. Disable `louvain` or `leiden` to
//! drop one; selecting a compiled-out detector is an
//! [`Error::DependencyMissing`]. The `parallel` feature scores title rows on
//! the rayon pool.

pub mod community;
pub mod config;
pub mod dataset;
/// Error types used across `namesake`.
pub mod error;
pub mod fusion;
pub mod graph;
pub mod metrics;
pub mod partition;
pub mod pipeline;
pub mod similarity;
pub mod types;


pub use community::{CommunityDetection, CommunityDetector};
pub use config::{Algorithm, DisambiguationConfig};
pub use dataset::{InMemorySource, PublicationSource, WorksCache};
pub use error::{Error, Result};
pub use fusion::{derive_relations, FusionConfig, FusionOutcome, RelationFuser};
pub use graph::PublicationGraph;
pub use metrics::{ari, nmi, pairwise, Evaluation, PairwiseScores};
pub use partition::{ClusterExport, Community, Partition, PartitionReport};
pub use pipeline::{Disambiguation, Disambiguator};
pub use similarity::{TitlePair, TitleSimilarity};
pub use types::{AuthorRef, Publication, Relation, RelationKind, WeightedEdge};

#[cfg(feature = "leiden")]
pub use community::Leiden;
#[cfg(feature = "louvain")]
pub use community::Louvain;
