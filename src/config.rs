//! Engine configuration
//!
//! Blend weights and thresholds are configuration defaults, not tuned
//! constants. Every pair of blend weights must sum to 1.0; `validate()`
//! rejects anything else at construction time.

use crate::error::{EngineError, Result};
use serde::{Deserialize, Serialize};

const WEIGHT_SUM_TOLERANCE: f32 = 1e-3;

/// Top-level engine configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Classifier blending and training settings
    #[serde(default)]
    pub classifier: ClassifierConfig,

    /// Recommendation ranking and auto-application settings
    #[serde(default)]
    pub recommender: RecommenderConfig,
}

impl EngineConfig {
    /// Validate the full configuration
    pub fn validate(&self) -> Result<()> {
        self.classifier.validate()?;
        self.recommender.validate()?;
        Ok(())
    }
}

/// Configuration for the issue classifier
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassifierConfig {
    /// Weight of the statistical score when a trained model is available
    #[serde(default = "default_statistical_weight")]
    pub statistical_weight: f32,

    /// Weight of the rule-based score when a trained model is available
    #[serde(default = "default_rule_weight")]
    pub rule_weight: f32,

    /// Weight of the naive Bayes model inside the statistical ensemble
    #[serde(default = "default_bayes_weight")]
    pub bayes_weight: f32,

    /// Weight of the tree ensemble inside the statistical ensemble
    #[serde(default = "default_forest_weight")]
    pub forest_weight: f32,

    /// Vocabulary cap for the TF-IDF vectorizer
    #[serde(default = "default_max_features")]
    pub max_features: usize,

    /// Maximum n-gram length (1 = unigrams only)
    #[serde(default = "default_ngram_max")]
    pub ngram_max: usize,

    /// Number of trees in the forest
    #[serde(default = "default_tree_count")]
    pub tree_count: usize,

    /// Maximum depth per tree
    #[serde(default = "default_max_depth")]
    pub max_depth: usize,

    /// Fraction of training examples held out for the accuracy report
    #[serde(default = "default_holdout_ratio")]
    pub holdout_ratio: f32,

    /// Seed for bootstrap and feature sampling (training is deterministic)
    #[serde(default = "default_seed")]
    pub seed: u64,
}

fn default_statistical_weight() -> f32 {
    0.6
}

fn default_rule_weight() -> f32 {
    0.4
}

fn default_bayes_weight() -> f32 {
    0.3
}

fn default_forest_weight() -> f32 {
    0.7
}

fn default_max_features() -> usize {
    1000
}

fn default_ngram_max() -> usize {
    3
}

fn default_tree_count() -> usize {
    50
}

fn default_max_depth() -> usize {
    8
}

fn default_holdout_ratio() -> f32 {
    0.2
}

fn default_seed() -> u64 {
    42
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            statistical_weight: default_statistical_weight(),
            rule_weight: default_rule_weight(),
            bayes_weight: default_bayes_weight(),
            forest_weight: default_forest_weight(),
            max_features: default_max_features(),
            ngram_max: default_ngram_max(),
            tree_count: default_tree_count(),
            max_depth: default_max_depth(),
            holdout_ratio: default_holdout_ratio(),
            seed: default_seed(),
        }
    }
}

impl ClassifierConfig {
    /// Validate blend weights and training parameters
    pub fn validate(&self) -> Result<()> {
        check_weight_pair(
            "statistical_weight/rule_weight",
            self.statistical_weight,
            self.rule_weight,
        )?;
        check_weight_pair(
            "bayes_weight/forest_weight",
            self.bayes_weight,
            self.forest_weight,
        )?;

        if self.max_features == 0 {
            return Err(EngineError::Configuration(
                "max_features must be at least 1".to_string(),
            ));
        }
        if self.ngram_max == 0 {
            return Err(EngineError::Configuration(
                "ngram_max must be at least 1".to_string(),
            ));
        }
        if self.tree_count == 0 {
            return Err(EngineError::Configuration(
                "tree_count must be at least 1".to_string(),
            ));
        }
        if !(0.0..1.0).contains(&self.holdout_ratio) {
            return Err(EngineError::Configuration(format!(
                "holdout_ratio must be in [0, 1), got {}",
                self.holdout_ratio
            )));
        }

        Ok(())
    }
}

/// Configuration for the solution recommender
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecommenderConfig {
    /// Weight of text similarity in the blended rank score
    #[serde(default = "default_similarity_weight")]
    pub similarity_weight: f32,

    /// Weight of historical confidence in the blended rank score
    #[serde(default = "default_confidence_weight")]
    pub confidence_weight: f32,

    /// Minimum similarity for auto-application
    #[serde(default = "default_auto_similarity")]
    pub auto_apply_similarity: f32,

    /// Minimum historical confidence for auto-application
    #[serde(default = "default_auto_confidence")]
    pub auto_apply_confidence: f32,

    /// Default number of recommendations returned
    #[serde(default = "default_top_k")]
    pub default_top_k: usize,

    /// Default similarity floor for candidates
    #[serde(default = "default_min_similarity")]
    pub default_min_similarity: f32,
}

fn default_similarity_weight() -> f32 {
    0.6
}

fn default_confidence_weight() -> f32 {
    0.4
}

fn default_auto_similarity() -> f32 {
    0.8
}

fn default_auto_confidence() -> f32 {
    0.8
}

fn default_top_k() -> usize {
    5
}

fn default_min_similarity() -> f32 {
    0.1
}

impl Default for RecommenderConfig {
    fn default() -> Self {
        Self {
            similarity_weight: default_similarity_weight(),
            confidence_weight: default_confidence_weight(),
            auto_apply_similarity: default_auto_similarity(),
            auto_apply_confidence: default_auto_confidence(),
            default_top_k: default_top_k(),
            default_min_similarity: default_min_similarity(),
        }
    }
}

impl RecommenderConfig {
    /// Validate ranking weights and thresholds
    pub fn validate(&self) -> Result<()> {
        check_weight_pair(
            "similarity_weight/confidence_weight",
            self.similarity_weight,
            self.confidence_weight,
        )?;

        for (name, value) in [
            ("auto_apply_similarity", self.auto_apply_similarity),
            ("auto_apply_confidence", self.auto_apply_confidence),
            ("default_min_similarity", self.default_min_similarity),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(EngineError::Configuration(format!(
                    "{} must be in [0, 1], got {}",
                    name, value
                )));
            }
        }

        if self.default_top_k == 0 {
            return Err(EngineError::Configuration(
                "default_top_k must be at least 1".to_string(),
            ));
        }

        Ok(())
    }
}

fn check_weight_pair(name: &str, a: f32, b: f32) -> Result<()> {
    if !(0.0..=1.0).contains(&a) || !(0.0..=1.0).contains(&b) {
        return Err(EngineError::Configuration(format!(
            "{} must each be in [0, 1], got {} and {}",
            name, a, b
        )));
    }
    if (a + b - 1.0).abs() > WEIGHT_SUM_TOLERANCE {
        return Err(EngineError::Configuration(format!(
            "{} must sum to 1.0, got {}",
            name,
            a + b
        )));
    }
    Ok(())
}
