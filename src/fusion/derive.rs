//! Raw relation derivation from a publication set.
//!
//! Candidate pairs come from inverted indices (author -> publications,
//! venue -> publications) rather than a scan over every publication pair.

use crate::similarity::TitleSimilarity;
use crate::types::{AuthorRef, Publication, Relation};
use std::collections::BTreeMap;
use tracing::debug;

/// Build COAUTHOR, COVENUE and COTITLE relations for `publications`.
///
/// - COAUTHOR: value = number of `(author id, name)` references two
///   publications share.
/// - COVENUE: publications with the same non-empty venue, no explicit weight.
/// - COTITLE: title pairs from `titles`, value = cosine similarity.
///
/// Every relation is emitted once with `source < target`, grouped by kind
/// and sorted by pair.
pub fn derive_relations(publications: &[Publication], titles: &TitleSimilarity) -> Vec<Relation> {
    let mut relations = coauthor_relations(publications);
    let n_coauthor = relations.len();
    relations.extend(covenue_relations(publications));
    let n_covenue = relations.len() - n_coauthor;

    let pairs: Vec<(&str, &str)> = publications
        .iter()
        .map(|p| (p.id.as_str(), p.title.as_str()))
        .collect();
    let cotitle = titles.score(&pairs);
    let n_cotitle = cotitle.len();
    relations.extend(
        cotitle
            .into_iter()
            .map(|p| Relation::cotitle(p.id_a, p.id_b, p.similarity)),
    );

    debug!(
        publications = publications.len(),
        coauthor = n_coauthor,
        covenue = n_covenue,
        cotitle = n_cotitle,
        "derived relations"
    );
    relations
}

fn coauthor_relations(publications: &[Publication]) -> Vec<Relation> {
    let mut by_author: BTreeMap<&AuthorRef, Vec<&str>> = BTreeMap::new();
    for p in publications {
        let mut authors: Vec<&AuthorRef> = p.authors.iter().collect();
        authors.sort();
        authors.dedup();
        for a in authors {
            by_author.entry(a).or_default().push(p.id.as_str());
        }
    }

    let mut shared: BTreeMap<(&str, &str), usize> = BTreeMap::new();
    for ids in by_author.values_mut() {
        ids.sort_unstable();
        ids.dedup();
        for (i, a) in ids.iter().enumerate() {
            for b in &ids[i + 1..] {
                *shared.entry((*a, *b)).or_insert(0) += 1;
            }
        }
    }

    shared
        .into_iter()
        .map(|((a, b), count)| Relation::coauthor(a, b, count))
        .collect()
}

fn covenue_relations(publications: &[Publication]) -> Vec<Relation> {
    let mut by_venue: BTreeMap<&str, Vec<&str>> = BTreeMap::new();
    for p in publications {
        if let Some(venue) = p.venue.as_deref().map(str::trim).filter(|v| !v.is_empty()) {
            by_venue.entry(venue).or_default().push(p.id.as_str());
        }
    }

    let mut pairs: Vec<(&str, &str)> = Vec::new();
    for ids in by_venue.values_mut() {
        ids.sort_unstable();
        ids.dedup();
        for (i, a) in ids.iter().enumerate() {
            for b in &ids[i + 1..] {
                pairs.push((*a, *b));
            }
        }
    }
    pairs.sort_unstable();
    pairs.dedup();
    pairs
        .into_iter()
        .map(|(a, b)| Relation::covenue(a, b))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::RelationKind;

    fn corpus() -> Vec<Publication> {
        vec![
            Publication::new("w1", "Graph clustering of citation networks")
                .with_venue("KDD")
                .with_author("a0", "David Nathan")
                .with_author("a1", "Ann Lee")
                .with_author("a2", "Bo Chen"),
            Publication::new("w2", "Graph clustering of citation networks revisited")
                .with_venue("KDD")
                .with_author("a0", "David Nathan")
                .with_author("a1", "Ann Lee")
                .with_author("a2", "Bo Chen"),
            Publication::new("w3", "Marine sediment chemistry")
                .with_author("a9", "David Nathan"),
        ]
    }

    #[test]
    fn counts_shared_authors() {
        let relations = derive_relations(&corpus(), &TitleSimilarity::new());
        let coauthor: Vec<_> = relations
            .iter()
            .filter(|r| r.kind == RelationKind::Coauthor)
            .collect();
        assert_eq!(coauthor.len(), 1);
        assert_eq!(coauthor[0].source, "w1");
        assert_eq!(coauthor[0].target, "w2");
        assert_eq!(coauthor[0].value, Some(3.0));
    }

    #[test]
    fn same_name_different_id_is_not_shared() {
        let relations = derive_relations(&corpus(), &TitleSimilarity::new());
        assert!(!relations.iter().any(|r| r.source == "w3" || r.target == "w3"));
    }

    #[test]
    fn missing_venues_do_not_link() {
        let pubs = vec![Publication::new("x", "a"), Publication::new("y", "b")];
        let relations = derive_relations(&pubs, &TitleSimilarity::new());
        assert!(relations.is_empty());
    }

    #[test]
    fn emits_each_kind_once_per_pair() {
        let relations = derive_relations(&corpus(), &TitleSimilarity::new());
        let kinds: Vec<RelationKind> = relations.iter().map(|r| r.kind).collect();
        assert_eq!(
            kinds,
            vec![
                RelationKind::Coauthor,
                RelationKind::Covenue,
                RelationKind::Cotitle
            ]
        );
    }
}
