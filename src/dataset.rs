//! Dataset collaborators.
//!
//! The core never fetches anything. A [`PublicationSource`] hands it
//! publications (and optionally precomputed relations); [`WorksCache`] reads
//! the JSON cache written by the fetch step:
//!
//! ```text
//! {
//!   "author_name": "David Nathan",
//!   "author_data": { "<author id>": { "works": ["<work id>", ...], ... } },
//!   "works_data":  { "<work id>": { "id", "title", "year", "authors", "venue" } },
//!   "author_id_to_label": { "<author id>": "0" }
//! }
//! ```

use crate::error::{Error, Result};
use crate::types::{AuthorRef, Publication, Relation};
use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::io::Read;
use tracing::{info, warn};

/// Supplies the records a run consumes.
pub trait PublicationSource {
    /// Publications attributed to the ambiguous name.
    fn publications(&self) -> Result<Vec<Publication>>;

    /// Precomputed relations. Sources that only hold publications return
    /// nothing and let the pipeline derive relations itself.
    fn relations(&self) -> Result<Vec<Relation>> {
        Ok(Vec::new())
    }

    /// Publications plus the per-record problems met while reading them.
    fn load(&self) -> Result<(Vec<Publication>, Vec<Error>)> {
        Ok((self.publications()?, Vec::new()))
    }
}

/// Records already in memory.
#[derive(Debug, Clone, Default)]
pub struct InMemorySource {
    /// Publications.
    pub publications: Vec<Publication>,
    /// Relations.
    pub relations: Vec<Relation>,
}

impl PublicationSource for InMemorySource {
    fn publications(&self) -> Result<Vec<Publication>> {
        Ok(self.publications.clone())
    }

    fn relations(&self) -> Result<Vec<Relation>> {
        Ok(self.relations.clone())
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
struct CachedAuthor {
    #[serde(default)]
    works: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
struct CachedWork {
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    title: Value,
    #[serde(default)]
    year: Option<i32>,
    #[serde(default)]
    authors: Vec<AuthorRef>,
    #[serde(default)]
    venue: Option<String>,
}

/// The works cache for one ambiguous author name.
#[derive(Debug, Clone, Deserialize)]
pub struct WorksCache {
    /// The ambiguous name the cache was built for.
    pub author_name: String,
    #[serde(default)]
    author_data: BTreeMap<String, CachedAuthor>,
    #[serde(default)]
    works_data: BTreeMap<String, CachedWork>,
    #[serde(default)]
    author_id_to_label: BTreeMap<String, String>,
}

impl WorksCache {
    /// Parse a cache document.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let cache: Self = serde_json::from_str(json)?;
        cache.log_loaded();
        Ok(cache)
    }

    /// Parse a cache document from a reader.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        let cache: Self = serde_json::from_reader(reader)?;
        cache.log_loaded();
        Ok(cache)
    }

    fn log_loaded(&self) {
        info!(
            author_name = %self.author_name,
            candidates = self.author_data.len(),
            works = self.works_data.len(),
            "loaded works cache"
        );
    }

    /// Number of cached works.
    pub fn work_count(&self) -> usize {
        self.works_data.len()
    }

    /// Publications ordered by id, plus one [`Error::MalformedTitle`] per
    /// work whose title was null or not a string (its title becomes empty).
    pub fn load_publications(&self) -> Result<(Vec<Publication>, Vec<Error>)> {
        let mut publications = Vec::with_capacity(self.works_data.len());
        let mut issues = Vec::new();
        for (key, work) in &self.works_data {
            let id = work.id.clone().unwrap_or_else(|| key.clone());
            if id.is_empty() {
                return Err(Error::Dataset(format!("work under key {key:?} has an empty id")));
            }
            let title = match &work.title {
                Value::String(s) => s.clone(),
                _ => {
                    warn!(id = %id, "missing or non-text title, treating as empty");
                    issues.push(Error::MalformedTitle { id: id.clone() });
                    String::new()
                }
            };
            publications.push(Publication {
                id,
                title,
                venue: work.venue.clone(),
                authors: work.authors.clone(),
                year: work.year,
            });
        }
        Ok((publications, issues))
    }

    /// Ground-truth author label per publication id.
    ///
    /// A work listed under several candidate authors keeps the label of the
    /// first candidate in id order.
    pub fn ground_truth(&self) -> BTreeMap<String, String> {
        let mut truth = BTreeMap::new();
        for (author_id, author) in &self.author_data {
            let Some(label) = self.author_id_to_label.get(author_id) else {
                warn!(author_id = %author_id, "candidate author has no label");
                continue;
            };
            for work in &author.works {
                if let Some(existing) = truth.get(work) {
                    if existing != label {
                        warn!(work = %work, kept = %existing, "work listed under several candidates");
                    }
                    continue;
                }
                truth.insert(work.clone(), label.clone());
            }
        }
        truth
    }
}

impl PublicationSource for WorksCache {
    fn publications(&self) -> Result<Vec<Publication>> {
        Ok(self.load_publications()?.0)
    }

    fn load(&self) -> Result<(Vec<Publication>, Vec<Error>)> {
        self.load_publications()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CACHE: &str = r#"{
        "author_name": "David Nathan",
        "author_data": {
            "A1": { "display_name": "David Nathan", "works": ["W1", "W2"] },
            "A2": { "works": ["W3", "W2"] },
            "A3": { "works": ["W4"] }
        },
        "works_data": {
            "W2": { "id": "W2", "title": "Graph methods", "year": 2020,
                    "authors": [{ "id": "A1", "name": "David Nathan" }], "venue": "Nature" },
            "W1": { "id": "W1", "title": null, "year": null, "authors": [], "venue": null },
            "W3": { "id": "W3", "title": 17, "authors": [] },
            "W4": { "title": "Untitled" }
        },
        "author_id_to_label": { "A1": "0", "A2": "1" }
    }"#;

    #[test]
    fn reads_publications_in_id_order() {
        let cache = WorksCache::from_json_str(CACHE).unwrap();
        assert_eq!(cache.author_name, "David Nathan");
        let (pubs, _) = cache.load_publications().unwrap();
        let ids: Vec<&str> = pubs.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["W1", "W2", "W3", "W4"]);
        assert_eq!(pubs[1].venue.as_deref(), Some("Nature"));
        assert_eq!(pubs[1].authors[0].name, "David Nathan");
        assert_eq!(pubs[1].year, Some(2020));
        assert_eq!(pubs[3].title, "Untitled");
    }

    #[test]
    fn malformed_titles_become_empty() {
        let cache = WorksCache::from_json_str(CACHE).unwrap();
        let (pubs, issues) = cache.load_publications().unwrap();
        assert_eq!(pubs[0].title, "");
        assert_eq!(pubs[2].title, "");
        assert_eq!(
            issues,
            vec![
                Error::MalformedTitle { id: "W1".into() },
                Error::MalformedTitle { id: "W3".into() },
            ]
        );
    }

    #[test]
    fn ground_truth_follows_candidate_labels() {
        let truth = WorksCache::from_json_str(CACHE).unwrap().ground_truth();
        assert_eq!(truth.get("W1").map(String::as_str), Some("0"));
        // Listed under A1 and A2: A1 comes first.
        assert_eq!(truth.get("W2").map(String::as_str), Some("0"));
        assert_eq!(truth.get("W3").map(String::as_str), Some("1"));
        // A3 has no label.
        assert!(!truth.contains_key("W4"));
    }

    #[test]
    fn invalid_json_is_a_dataset_error() {
        let err = WorksCache::from_json_str("{ not json").unwrap_err();
        assert!(matches!(err, Error::Dataset(_)));
    }

    #[test]
    fn in_memory_source_returns_its_records() {
        let source = InMemorySource {
            publications: vec![Publication::new("w1", "t")],
            relations: vec![Relation::covenue("w1", "w2")],
        };
        assert_eq!(source.publications().unwrap().len(), 1);
        assert_eq!(source.relations().unwrap().len(), 1);
        let cache = WorksCache::from_json_str(CACHE).unwrap();
        assert!(cache.relations().unwrap().is_empty());
        assert_eq!(cache.work_count(), 4);
    }

    #[test]
    fn load_carries_title_issues() {
        let source = InMemorySource {
            publications: vec![Publication::new("w1", "t")],
            relations: Vec::new(),
        };
        let (pubs, issues) = source.load().unwrap();
        assert_eq!(pubs.len(), 1);
        assert!(issues.is_empty());

        let cache = WorksCache::from_json_str(CACHE).unwrap();
        let (pubs, issues) = cache.load().unwrap();
        assert_eq!(pubs.len(), 4);
        assert_eq!(issues.len(), 2);
        assert!(issues.contains(&Error::MalformedTitle { id: "W3".into() }));
    }
}
