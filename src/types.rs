//! Records shared by every stage: publications, raw relations, fused edges.

use serde::{Deserialize, Serialize};
use std::fmt;

/// One author reference on a publication.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AuthorRef {
    /// Author identifier (e.g. an OpenAlex author id).
    pub id: String,
    /// Display name as printed on the publication.
    pub name: String,
}

impl AuthorRef {
    /// Create an author reference.
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }
}

/// A publication attributed to the ambiguous name.
///
/// Read-only to the core; owned by the dataset collaborator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Publication {
    /// Unique identifier.
    pub id: String,
    /// Title, empty when unknown.
    #[serde(default)]
    pub title: String,
    /// Venue name, if any.
    #[serde(default)]
    pub venue: Option<String>,
    /// Ordered author list.
    #[serde(default)]
    pub authors: Vec<AuthorRef>,
    /// Publication year.
    #[serde(default)]
    pub year: Option<i32>,
}

impl Publication {
    /// Create a publication with only an id and a title.
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            venue: None,
            authors: Vec::new(),
            year: None,
        }
    }

    /// Set the venue.
    pub fn with_venue(mut self, venue: impl Into<String>) -> Self {
        self.venue = Some(venue.into());
        self
    }

    /// Append an author reference.
    pub fn with_author(mut self, id: impl Into<String>, name: impl Into<String>) -> Self {
        self.authors.push(AuthorRef::new(id, name));
        self
    }

    /// Set the year.
    pub fn with_year(mut self, year: i32) -> Self {
        self.year = Some(year);
        self
    }
}

/// The signal a relation carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RelationKind {
    /// Publications share at least one author; value is the shared count.
    Coauthor,
    /// Publications appeared in the same venue; value is an optional weight.
    Covenue,
    /// Publication titles are similar; value is cosine similarity in [0, 1].
    Cotitle,
}

impl RelationKind {
    /// All kinds, in fusion order.
    pub const ALL: [RelationKind; 3] = [
        RelationKind::Coauthor,
        RelationKind::Covenue,
        RelationKind::Cotitle,
    ];

    pub(crate) fn index(self) -> usize {
        match self {
            RelationKind::Coauthor => 0,
            RelationKind::Covenue => 1,
            RelationKind::Cotitle => 2,
        }
    }
}

impl fmt::Display for RelationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RelationKind::Coauthor => "COAUTHOR",
            RelationKind::Covenue => "COVENUE",
            RelationKind::Cotitle => "COTITLE",
        };
        f.write_str(name)
    }
}

/// A raw, symmetric relation between two publications.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Relation {
    /// One endpoint.
    pub source: String,
    /// The other endpoint. Order does not matter.
    pub target: String,
    /// Signal type.
    pub kind: RelationKind,
    /// Kind-specific raw value; `None` means "not recorded".
    #[serde(default)]
    pub value: Option<f64>,
}

impl Relation {
    /// Create a relation.
    pub fn new(
        source: impl Into<String>,
        target: impl Into<String>,
        kind: RelationKind,
        value: Option<f64>,
    ) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
            kind,
            value,
        }
    }

    /// COAUTHOR relation with a shared-author count.
    pub fn coauthor(a: impl Into<String>, b: impl Into<String>, shared: usize) -> Self {
        Self::new(a, b, RelationKind::Coauthor, Some(shared as f64))
    }

    /// COVENUE relation without an explicit weight.
    pub fn covenue(a: impl Into<String>, b: impl Into<String>) -> Self {
        Self::new(a, b, RelationKind::Covenue, None)
    }

    /// COTITLE relation with a cosine similarity.
    pub fn cotitle(a: impl Into<String>, b: impl Into<String>, similarity: f64) -> Self {
        Self::new(a, b, RelationKind::Cotitle, Some(similarity))
    }
}

/// A fused undirected edge in canonical form (`node_a < node_b`, `weight > 0`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeightedEdge {
    /// Lexicographically smaller endpoint.
    pub node_a: String,
    /// Lexicographically larger endpoint.
    pub node_b: String,
    /// Positive weight.
    pub weight: f64,
}

impl WeightedEdge {
    /// Build a canonical edge. Returns `None` for self-loops and for
    /// non-positive or non-finite weights.
    pub fn canonical(a: &str, b: &str, weight: f64) -> Option<Self> {
        if a == b || !weight.is_finite() || weight <= 0.0 {
            return None;
        }
        let (node_a, node_b) = if a < b { (a, b) } else { (b, a) };
        Some(Self {
            node_a: node_a.to_string(),
            node_b: node_b.to_string(),
            weight,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canonical_edge_orders_endpoints() {
        let e = WeightedEdge::canonical("w9", "w1", 2.0).unwrap();
        assert_eq!(e.node_a, "w1");
        assert_eq!(e.node_b, "w9");
    }

    #[test]
    fn canonical_edge_rejects_loops_and_bad_weights() {
        assert!(WeightedEdge::canonical("a", "a", 1.0).is_none());
        assert!(WeightedEdge::canonical("a", "b", 0.0).is_none());
        assert!(WeightedEdge::canonical("a", "b", -1.0).is_none());
        assert!(WeightedEdge::canonical("a", "b", f64::NAN).is_none());
    }

    #[test]
    fn relation_kind_serializes_upper_case() {
        let json = serde_json::to_string(&RelationKind::Cotitle).unwrap();
        assert_eq!(json, "\"COTITLE\"");
    }
}
