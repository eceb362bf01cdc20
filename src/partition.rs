//! Partitions and their reports.
//!
//! A [`Partition`] is what the detector hands back: one dense label per graph
//! node plus the objective value. A [`PartitionReport`] is what a caller
//! inspects or exports: communities ordered by size, with publications that
//! never made it into the graph listed as singleton communities.

use crate::config::Algorithm;
use crate::types::{AuthorRef, Publication};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// Node id → community label, with the quality of the whole assignment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Partition {
    labels: BTreeMap<String, usize>,
    quality: f64,
    algorithm: Algorithm,
    community_count: usize,
}

impl Partition {
    /// Partition with no nodes and quality 0.0.
    pub fn empty(algorithm: Algorithm) -> Self {
        Self {
            labels: BTreeMap::new(),
            quality: 0.0,
            algorithm,
            community_count: 0,
        }
    }

    /// Zip node ids with their labels. Labels must be dense (`0..k`).
    pub fn from_labels<'a, I>(ids: I, labels: &[usize], quality: f64, algorithm: Algorithm) -> Self
    where
        I: IntoIterator<Item = &'a str>,
    {
        let labels: BTreeMap<String, usize> = ids
            .into_iter()
            .zip(labels.iter().copied())
            .map(|(id, label)| (id.to_string(), label))
            .collect();
        let community_count = labels.values().copied().max().map_or(0, |m| m + 1);
        Self {
            labels,
            quality,
            algorithm,
            community_count,
        }
    }

    /// Label of `id`, if it was part of the graph.
    pub fn label(&self, id: &str) -> Option<usize> {
        self.labels.get(id).copied()
    }

    /// All assignments, ordered by id.
    pub fn labels(&self) -> &BTreeMap<String, usize> {
        &self.labels
    }

    /// Modularity (Louvain) or CPM quality (Leiden).
    pub fn quality(&self) -> f64 {
        self.quality
    }

    /// Algorithm that produced the partition.
    pub fn algorithm(&self) -> Algorithm {
        self.algorithm
    }

    /// Number of distinct labels.
    pub fn community_count(&self) -> usize {
        self.community_count
    }

    /// Number of labelled nodes.
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    /// True when no node is labelled.
    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}

/// One community in a report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Community {
    /// Report label: position in the size ordering.
    pub label: usize,
    /// Label assigned by the detector; `None` for isolated publications.
    pub detector_label: Option<usize>,
    /// Member ids, ascending.
    pub members: Vec<String>,
}

impl Community {
    /// Number of members.
    pub fn size(&self) -> usize {
        self.members.len()
    }
}

/// Size statistics over a report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SizeSummary {
    /// Largest community size.
    pub largest: usize,
    /// Smallest community size.
    pub smallest: usize,
    /// Mean community size.
    pub mean: f64,
    /// Communities with exactly one member.
    pub singletons: usize,
}

/// Communities ordered by descending size, ties by smallest member id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PartitionReport {
    /// Ordered communities; `communities[i].label == i`.
    pub communities: Vec<Community>,
    /// Quality passed through from the partition.
    pub quality: f64,
    /// Algorithm that produced the partition.
    pub algorithm: Algorithm,
}

impl PartitionReport {
    /// Report over the partition's nodes only.
    pub fn from_partition(partition: &Partition) -> Self {
        Self::build(partition, std::iter::empty())
    }

    /// Report over every publication id: ids missing from the partition
    /// become singleton communities.
    pub fn with_publications<'a, I>(partition: &Partition, publication_ids: I) -> Self
    where
        I: IntoIterator<Item = &'a str>,
    {
        Self::build(partition, publication_ids)
    }

    fn build<'a, I>(partition: &Partition, extra_ids: I) -> Self
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut groups: BTreeMap<usize, Vec<String>> = BTreeMap::new();
        for (id, &label) in partition.labels() {
            groups.entry(label).or_default().push(id.clone());
        }

        let mut communities: Vec<Community> = groups
            .into_iter()
            .map(|(label, members)| Community {
                label,
                detector_label: Some(label),
                members,
            })
            .collect();

        let mut isolated: Vec<&str> = extra_ids
            .into_iter()
            .filter(|id| partition.label(id).is_none())
            .collect();
        isolated.sort_unstable();
        isolated.dedup();
        communities.extend(isolated.into_iter().map(|id| Community {
            label: 0,
            detector_label: None,
            members: vec![id.to_string()],
        }));

        // Members are ascending, so members[0] is the smallest id.
        communities.sort_by(|a, b| {
            b.size()
                .cmp(&a.size())
                .then_with(|| a.members[0].cmp(&b.members[0]))
        });
        for (i, c) in communities.iter_mut().enumerate() {
            c.label = i;
        }

        Self {
            communities,
            quality: partition.quality(),
            algorithm: partition.algorithm(),
        }
    }

    /// Total number of communities, singletons included.
    pub fn community_count(&self) -> usize {
        self.communities.len()
    }

    /// Community sizes in report order.
    pub fn sizes(&self) -> Vec<usize> {
        self.communities.iter().map(Community::size).collect()
    }

    /// Report label of every publication.
    pub fn assignments(&self) -> BTreeMap<&str, usize> {
        self.communities
            .iter()
            .flat_map(|c| c.members.iter().map(move |m| (m.as_str(), c.label)))
            .collect()
    }

    /// Size statistics; `None` for an empty report.
    pub fn summary(&self) -> Option<SizeSummary> {
        let sizes = self.sizes();
        let largest = *sizes.first()?;
        let smallest = *sizes.last()?;
        let total: usize = sizes.iter().sum();
        Some(SizeSummary {
            largest,
            smallest,
            mean: total as f64 / sizes.len() as f64,
            singletons: sizes.iter().filter(|&&s| s == 1).count(),
        })
    }

    /// Group publication records by community for export.
    pub fn export(&self, publications: &[Publication]) -> ClusterExport {
        let by_id: HashMap<&str, &Publication> =
            publications.iter().map(|p| (p.id.as_str(), p)).collect();
        let clusters = self
            .communities
            .iter()
            .map(|c| {
                let records = c
                    .members
                    .iter()
                    .map(|id| {
                        let publication = by_id.get(id.as_str());
                        ExportRecord {
                            pub_id: id.clone(),
                            title: publication.map(|p| p.title.clone()).unwrap_or_default(),
                            coauthors: publication.map(|p| p.authors.clone()).unwrap_or_default(),
                        }
                    })
                    .collect();
                (c.label, records)
            })
            .collect();
        ClusterExport {
            quality: self.quality,
            clusters,
        }
    }
}

/// One publication in an exported cluster.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportRecord {
    /// Publication id.
    #[serde(rename = "pubId")]
    pub pub_id: String,
    /// Title.
    pub title: String,
    /// Author list.
    pub coauthors: Vec<AuthorRef>,
}

/// Clusters keyed by community label, ready for `serde_json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClusterExport {
    /// Partition quality.
    pub quality: f64,
    /// Label → member records, ids ascending.
    pub clusters: BTreeMap<usize, Vec<ExportRecord>>,
}

impl ClusterExport {
    /// Pretty-printed JSON.
    pub fn to_json_pretty(&self) -> crate::Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
