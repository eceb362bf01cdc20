//! Sparse TF-IDF vectors.
//!
//! ```text
//! idf(t)   = ln((1 + n) / (1 + df(t))) + 1
//! x[d, t]  = count(t in d) * idf(t),   then each row L2-normalized
//! ```
//!
//! Rows are stored as sorted `(term, weight)` lists, so the cosine of two
//! rows is a merge of two sorted lists and the all-pairs product runs
//! through an inverted index instead of a dense n x n matrix.

use super::tokenize::Analyzer;
use std::collections::{BTreeMap, HashMap};

/// One L2-normalized sparse row. Entries are sorted by term index.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SparseVector {
    entries: Vec<(u32, f64)>,
}

impl SparseVector {
    fn from_sorted(entries: Vec<(u32, f64)>) -> Self {
        Self { entries }
    }

    /// Non-zero entries.
    pub fn entries(&self) -> &[(u32, f64)] {
        &self.entries
    }

    /// True when the row has no non-zero entry (empty or all-stop-word title).
    pub fn is_zero(&self) -> bool {
        self.entries.is_empty()
    }

    /// Dot product by sorted merge. A zero vector yields 0.
    pub fn dot(&self, other: &SparseVector) -> f64 {
        let (mut i, mut j) = (0, 0);
        let mut acc = 0.0;
        while i < self.entries.len() && j < other.entries.len() {
            let (ti, wi) = self.entries[i];
            let (tj, wj) = other.entries[j];
            match ti.cmp(&tj) {
                std::cmp::Ordering::Less => i += 1,
                std::cmp::Ordering::Greater => j += 1,
                std::cmp::Ordering::Equal => {
                    acc += wi * wj;
                    i += 1;
                    j += 1;
                }
            }
        }
        acc
    }
}

/// Fitted vocabulary plus the document vectors it produced.
#[derive(Debug, Clone)]
pub struct TfidfMatrix {
    /// Vocabulary in index order.
    pub vocabulary: Vec<String>,
    /// One row per input document, in input order.
    pub rows: Vec<SparseVector>,
}

impl TfidfMatrix {
    /// Inverted index: term -> [(row, weight)], rows ascending.
    pub fn postings(&self) -> Vec<Vec<(usize, f64)>> {
        let mut postings = vec![Vec::new(); self.vocabulary.len()];
        for (row, vector) in self.rows.iter().enumerate() {
            for &(term, weight) in vector.entries() {
                postings[term as usize].push((row, weight));
            }
        }
        postings
    }
}

/// TF-IDF vectorizer with a capped vocabulary.
#[derive(Debug, Clone)]
pub struct TfidfVectorizer {
    analyzer: Analyzer,
    max_features: usize,
}

impl TfidfVectorizer {
    /// Create a vectorizer.
    pub fn new(analyzer: Analyzer, max_features: usize) -> Self {
        Self {
            analyzer,
            max_features: max_features.max(1),
        }
    }

    /// Learn the vocabulary from `docs` and vectorize them.
    pub fn fit_transform<S: AsRef<str>>(&self, docs: &[S]) -> TfidfMatrix {
        let n = docs.len();
        let counts: Vec<BTreeMap<String, usize>> = docs
            .iter()
            .map(|doc| {
                let mut tf = BTreeMap::new();
                for term in self.analyzer.terms(doc.as_ref()) {
                    *tf.entry(term).or_insert(0usize) += 1;
                }
                tf
            })
            .collect();

        // (corpus frequency, document frequency)
        let mut stats: BTreeMap<&str, (usize, usize)> = BTreeMap::new();
        for tf in &counts {
            for (term, &c) in tf {
                let entry = stats.entry(term.as_str()).or_insert((0, 0));
                entry.0 += c;
                entry.1 += 1;
            }
        }

        let mut selected: Vec<(&str, usize, usize)> =
            stats.into_iter().map(|(t, (cf, df))| (t, cf, df)).collect();
        if selected.len() > self.max_features {
            selected.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
            selected.truncate(self.max_features);
            selected.sort_by(|a, b| a.0.cmp(b.0));
        }

        let index: HashMap<&str, u32> = selected
            .iter()
            .enumerate()
            .map(|(i, (t, _, _))| (*t, i as u32))
            .collect();
        let idf: Vec<f64> = selected
            .iter()
            .map(|&(_, _, df)| ((1.0 + n as f64) / (1.0 + df as f64)).ln() + 1.0)
            .collect();

        let rows = counts
            .iter()
            .map(|tf| {
                let mut entries: Vec<(u32, f64)> = tf
                    .iter()
                    .filter_map(|(term, &c)| {
                        index
                            .get(term.as_str())
                            .map(|&i| (i, c as f64 * idf[i as usize]))
                    })
                    .collect();
                entries.sort_by_key(|&(i, _)| i);
                let norm = entries.iter().map(|(_, w)| w * w).sum::<f64>().sqrt();
                if norm > 0.0 {
                    for (_, w) in &mut entries {
                        *w /= norm;
                    }
                } else {
                    entries.clear();
                }
                SparseVector::from_sorted(entries)
            })
            .collect();

        TfidfMatrix {
            vocabulary: selected.into_iter().map(|(t, _, _)| t.to_string()).collect(),
            rows,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::similarity::TitleSimilarity;

    fn vectorizer(max_features: usize) -> TfidfVectorizer {
        TfidfVectorizer::new(Analyzer::new(), max_features)
    }

    #[test]
    fn rows_are_unit_length() {
        let m = vectorizer(100).fit_transform(&["graph clustering", "graph databases at scale"]);
        for row in &m.rows {
            let norm: f64 = row.entries().iter().map(|(_, w)| w * w).sum();
            assert!((norm - 1.0).abs() < 1e-12);
        }
    }

    #[test]
    fn empty_and_stop_word_titles_are_zero_vectors() {
        let m = vectorizer(100).fit_transform(&["", "of the and", "graph theory"]);
        assert!(m.rows[0].is_zero());
        assert!(m.rows[1].is_zero());
        assert!(!m.rows[2].is_zero());
        assert_eq!(m.rows[0].dot(&m.rows[2]), 0.0);
    }

    #[test]
    fn dot_matches_scored_similarity() {
        let titles = ["graph clustering methods", "clustering graph data"];
        let m = vectorizer(10_000).fit_transform(&titles);
        assert!((m.rows[0].dot(&m.rows[0]) - 1.0).abs() < 1e-12);
        assert_eq!(m.rows[0].dot(&m.rows[1]), m.rows[1].dot(&m.rows[0]));

        let pairs = TitleSimilarity::new()
            .with_threshold(0.0)
            .score(&[("a", titles[0]), ("b", titles[1])]);
        assert_eq!(pairs.len(), 1);
        assert!((pairs[0].similarity - m.rows[0].dot(&m.rows[1])).abs() < 1e-12);
    }

    #[test]
    fn vocabulary_cap_keeps_most_frequent_terms() {
        let m = vectorizer(1).fit_transform(&["graph theory", "graph mining", "graph"]);
        assert_eq!(m.vocabulary, vec!["graph".to_string()]);
    }

    #[test]
    fn vocabulary_includes_bigrams() {
        let m = vectorizer(100).fit_transform(&["protein folding"]);
        assert!(m.vocabulary.contains(&"protein folding".to_string()));
    }

    #[test]
    fn postings_list_every_non_zero_entry() {
        let m = vectorizer(100).fit_transform(&["graph theory", "graph mining"]);
        let postings = m.postings();
        let total: usize = postings.iter().map(Vec::len).sum();
        let nnz: usize = m.rows.iter().map(|r| r.entries().len()).sum();
        assert_eq!(total, nnz);
    }
}
