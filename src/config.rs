//! Run configuration.
//!
//! Every knob a caller can turn lives in [`DisambiguationConfig`]. Defaults
//! reproduce the weighting used on the reference "David Nathan" dataset:
//! log-scaled co-authorship, unit venue weight, and title similarity boosted
//! by 1.2.

use crate::error::{Error, Result};
use crate::fusion::FusionConfig;
use crate::similarity::TitleSimilarity;
use serde::{Deserialize, Serialize};

/// Community detection algorithm variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Algorithm {
    /// Greedy modularity optimization with aggregation.
    #[default]
    Louvain,
    /// Leiden with the Constant Potts Model objective.
    Leiden,
}

impl Algorithm {
    /// Cargo feature backing this variant.
    pub fn capability(self) -> &'static str {
        match self {
            Algorithm::Louvain => "louvain",
            Algorithm::Leiden => "leiden",
        }
    }
}

/// Configuration for one disambiguation run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisambiguationConfig {
    /// Multiplier on the COAUTHOR contribution.
    pub coauthor_scale: f64,
    /// Multiplier on the COVENUE contribution.
    pub covenue_scale: f64,
    /// Multiplier on the COTITLE contribution.
    pub cotitle_scale: f64,
    /// Use `ln(1 + shared)` instead of the raw shared-author count.
    pub use_log_coauthor: bool,
    /// Minimum title cosine similarity for a COTITLE relation.
    pub cotitle_min_similarity: f64,
    /// Vocabulary cap for the title vectorizer.
    pub max_title_features: usize,
    /// Extra stop words removed from titles.
    pub extra_stop_words: Vec<String>,
    /// Partitioning algorithm.
    pub algorithm: Algorithm,
    /// Modularity resolution (Louvain) or CPM resolution parameter (Leiden).
    pub resolution: f64,
    /// Seed for visitation order and tie-breaking.
    pub seed: u64,
}

impl Default for DisambiguationConfig {
    fn default() -> Self {
        Self {
            coauthor_scale: 1.0,
            covenue_scale: 1.0,
            cotitle_scale: 1.2,
            use_log_coauthor: true,
            cotitle_min_similarity: 0.60,
            max_title_features: 10_000,
            extra_stop_words: Vec::new(),
            algorithm: Algorithm::Louvain,
            resolution: 1.0,
            seed: 42,
        }
    }
}

impl DisambiguationConfig {
    /// Default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a JSON document; missing fields take their defaults.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Set the per-kind scales.
    pub fn with_scales(mut self, coauthor: f64, covenue: f64, cotitle: f64) -> Self {
        self.coauthor_scale = coauthor;
        self.covenue_scale = covenue;
        self.cotitle_scale = cotitle;
        self
    }

    /// Toggle log scaling of shared-author counts.
    pub fn with_log_coauthor(mut self, use_log: bool) -> Self {
        self.use_log_coauthor = use_log;
        self
    }

    /// Set the COTITLE similarity threshold.
    pub fn with_cotitle_min_similarity(mut self, threshold: f64) -> Self {
        self.cotitle_min_similarity = threshold;
        self
    }

    /// Select the algorithm.
    pub fn with_algorithm(mut self, algorithm: Algorithm) -> Self {
        self.algorithm = algorithm;
        self
    }

    /// Set the resolution parameter.
    pub fn with_resolution(mut self, resolution: f64) -> Self {
        self.resolution = resolution;
        self
    }

    /// Set the random seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Check value ranges.
    pub fn validate(&self) -> Result<()> {
        let positive = |v: f64| v.is_finite() && v > 0.0;
        if !positive(self.coauthor_scale) {
            return Err(Error::InvalidParameter {
                name: "coauthor_scale",
                message: "must be a positive finite number",
            });
        }
        if !positive(self.covenue_scale) {
            return Err(Error::InvalidParameter {
                name: "covenue_scale",
                message: "must be a positive finite number",
            });
        }
        if !positive(self.cotitle_scale) {
            return Err(Error::InvalidParameter {
                name: "cotitle_scale",
                message: "must be a positive finite number",
            });
        }
        if !(0.0..=1.0).contains(&self.cotitle_min_similarity) {
            return Err(Error::InvalidParameter {
                name: "cotitle_min_similarity",
                message: "must lie in [0, 1]",
            });
        }
        if self.max_title_features == 0 {
            return Err(Error::InvalidParameter {
                name: "max_title_features",
                message: "must be at least 1",
            });
        }
        if !(self.resolution.is_finite() && self.resolution >= 0.0) {
            return Err(Error::InvalidParameter {
                name: "resolution",
                message: "must be a finite number >= 0",
            });
        }
        Ok(())
    }

    /// Scaling rules for the relation fuser.
    pub fn fusion(&self) -> FusionConfig {
        FusionConfig {
            coauthor_scale: self.coauthor_scale,
            covenue_scale: self.covenue_scale,
            cotitle_scale: self.cotitle_scale,
            use_log_coauthor: self.use_log_coauthor,
        }
    }

    /// Title similarity scorer configured from this run.
    pub fn title_similarity(&self) -> TitleSimilarity {
        TitleSimilarity::new()
            .with_threshold(self.cotitle_min_similarity)
            .with_max_features(self.max_title_features)
            .with_extra_stop_words(self.extra_stop_words.iter().cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = DisambiguationConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.algorithm, Algorithm::Louvain);
        assert_eq!(config.seed, 42);
    }

    #[test]
    fn json_fills_missing_fields() {
        let config =
            DisambiguationConfig::from_json_str(r#"{"algorithm": "leiden", "resolution": 0.05}"#)
                .unwrap();
        assert_eq!(config.algorithm, Algorithm::Leiden);
        assert!((config.resolution - 0.05).abs() < 1e-12);
        assert!((config.cotitle_scale - 1.2).abs() < 1e-12);
    }

    #[test]
    fn rejects_out_of_range_values() {
        let bad = DisambiguationConfig::default().with_scales(0.0, 1.0, 1.0);
        assert!(matches!(
            bad.validate(),
            Err(Error::InvalidParameter {
                name: "coauthor_scale",
                ..
            })
        ));

        let bad = DisambiguationConfig::default().with_cotitle_min_similarity(1.5);
        assert!(bad.validate().is_err());

        let bad = DisambiguationConfig::default().with_resolution(f64::NAN);
        assert!(bad.validate().is_err());
    }

    #[test]
    fn unknown_algorithm_is_a_dataset_error() {
        let err = DisambiguationConfig::from_json_str(r#"{"algorithm": "infomap"}"#).unwrap_err();
        assert!(matches!(err, Error::Dataset(_)));
    }
}
