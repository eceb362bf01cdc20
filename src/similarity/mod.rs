//! Pairwise title similarity.
//!
//! Titles are turned into TF-IDF vectors (see [`tfidf`]) and compared with
//! cosine similarity. Only the upper triangle of the similarity matrix is
//! produced and entries under the threshold are never stored:
//!
//! ```text
//! titles ──► TF-IDF rows ──► inverted index ──► (i < j, cos ≥ threshold)
//! ```
//!
//! For row `i` the scorer walks the posting list of every term in the row and
//! accumulates `w_i * w_j` for rows `j > i` only. Cost is proportional to the
//! number of co-occurring term pairs instead of n², and memory is one
//! accumulator row per worker.

mod tfidf;
mod tokenize;

pub use tfidf::{SparseVector, TfidfMatrix, TfidfVectorizer};
pub use tokenize::{Analyzer, ENGLISH_STOP_WORDS};

use serde::{Deserialize, Serialize};
use tracing::debug;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// One scored title pair with `id_a < id_b`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TitlePair {
    /// Smaller identifier.
    pub id_a: String,
    /// Larger identifier.
    pub id_b: String,
    /// Cosine similarity in [0, 1].
    pub similarity: f64,
}

/// Title similarity scorer.
#[derive(Debug, Clone)]
pub struct TitleSimilarity {
    threshold: f64,
    max_features: usize,
    analyzer: Analyzer,
}

impl TitleSimilarity {
    /// Threshold 0.60, 10 000 features, English stop words, uni+bigrams.
    pub fn new() -> Self {
        Self {
            threshold: 0.60,
            max_features: 10_000,
            analyzer: Analyzer::new(),
        }
    }

    /// Minimum similarity kept.
    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.threshold = threshold;
        self
    }

    /// Vocabulary cap.
    pub fn with_max_features(mut self, max_features: usize) -> Self {
        self.max_features = max_features;
        self
    }

    /// Additional stop words.
    pub fn with_extra_stop_words<I, S>(mut self, words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.analyzer = self.analyzer.with_extra_stop_words(words);
        self
    }

    /// Score every pair of titles.
    ///
    /// Pairs with zero similarity are never emitted, even at threshold 0.
    /// Identifiers are expected to be unique.
    pub fn score<I, S>(&self, titles: &[(I, S)]) -> Vec<TitlePair>
    where
        I: AsRef<str> + Sync,
        S: AsRef<str> + Sync,
    {
        if titles.is_empty() {
            return Vec::new();
        }

        let docs: Vec<&str> = titles.iter().map(|(_, t)| t.as_ref()).collect();
        let matrix =
            TfidfVectorizer::new(self.analyzer.clone(), self.max_features).fit_transform(&docs);
        let postings = matrix.postings();
        let n = matrix.rows.len();

        let row_pairs = |i: usize| -> Vec<(usize, usize, f64)> {
            let mut acc = vec![0.0f64; n];
            let mut touched: Vec<usize> = Vec::new();
            for &(term, wi) in matrix.rows[i].entries() {
                for &(j, wj) in &postings[term as usize] {
                    if j <= i {
                        continue;
                    }
                    if acc[j] == 0.0 {
                        touched.push(j);
                    }
                    acc[j] += wi * wj;
                }
            }
            touched.sort_unstable();
            touched
                .into_iter()
                .filter_map(|j| {
                    let sim = clamp_cosine(acc[j]);
                    (sim > 0.0 && sim >= self.threshold).then_some((i, j, sim))
                })
                .collect()
        };

        #[cfg(feature = "parallel")]
        let raw: Vec<(usize, usize, f64)> = (0..n).into_par_iter().flat_map_iter(row_pairs).collect();
        #[cfg(not(feature = "parallel"))]
        let raw: Vec<(usize, usize, f64)> = (0..n).flat_map(row_pairs).collect();

        let mut pairs: Vec<TitlePair> = raw
            .into_iter()
            .map(|(i, j, similarity)| {
                let (a, b) = (titles[i].0.as_ref(), titles[j].0.as_ref());
                let (id_a, id_b) = if a < b { (a, b) } else { (b, a) };
                TitlePair {
                    id_a: id_a.to_string(),
                    id_b: id_b.to_string(),
                    similarity,
                }
            })
            .collect();
        pairs.sort_by(|x, y| x.id_a.cmp(&y.id_a).then_with(|| x.id_b.cmp(&y.id_b)));

        debug!(
            titles = n,
            vocabulary = matrix.vocabulary.len(),
            pairs = pairs.len(),
            threshold = self.threshold,
            "scored title similarity"
        );
        pairs
    }
}

impl Default for TitleSimilarity {
    fn default() -> Self {
        Self::new()
    }
}

/// Rounding can push the dot product of two unit vectors just past 1.
fn clamp_cosine(dot: f64) -> f64 {
    if dot >= 1.0 - 1e-12 {
        1.0
    } else {
        dot.max(0.0)
    }
}
