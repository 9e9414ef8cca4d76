//! Issue classification
//!
//! Two interchangeable scoring strategies — the rule-based keyword matcher
//! and the trained statistical ensemble — composed by a blend step. Rules
//! give interpretable zero-training coverage and guard against a cold or
//! stale model; the statistical layer captures patterns the rules don't
//! encode. When no model is trained the blend degrades to rules only.

pub mod bayes;
pub mod dataset;
pub mod forest;
pub mod models;
pub mod rules;
pub mod statistical;

pub use models::{
    CategoryScore, ClassificationResult, ClassifierSource, IssueCategory, LabeledExample,
    ModelInfo, TrainingReport,
};
pub use rules::RuleClassifier;
pub use statistical::StatisticalClassifier;

use crate::config::ClassifierConfig;
use crate::error::Result;
use std::collections::BTreeMap;
use tracing::{debug, warn};

/// Hybrid rule/statistical issue classifier
pub struct IssueClassifier {
    config: ClassifierConfig,
    rules: RuleClassifier,
    statistical: StatisticalClassifier,
}

impl IssueClassifier {
    pub fn new(config: ClassifierConfig) -> Self {
        Self {
            rules: RuleClassifier::new(),
            statistical: StatisticalClassifier::new(config.clone()),
            config,
        }
    }

    /// Classify text into a confidence-ranked category list.
    ///
    /// Empty input or text matching nothing yields an empty ranking with
    /// `primary == None` — a valid "unknown" outcome, never an error.
    pub fn classify(&self, text: &str) -> ClassificationResult {
        let rule_scores = self.rules.classify(text);

        let (ranked, source) = if self.statistical.is_trained() {
            let statistical_scores = self
                .statistical
                .classify(text, IssueCategory::ALL.len());
            (
                self.blend(&rule_scores, &statistical_scores),
                ClassifierSource::Blended,
            )
        } else {
            if !text.trim().is_empty() {
                warn!("no trained model loaded, classifying with rules only");
            }
            (rule_scores, ClassifierSource::Rules)
        };

        debug!(
            categories = ranked.len(),
            primary = ranked.first().map(|s| s.category.as_str()),
            "classification complete"
        );

        ClassificationResult {
            text: text.to_string(),
            primary: ranked.first().map(|s| s.category),
            ranked,
            source,
        }
    }

    /// Combine rule and statistical scores with the configured weights.
    ///
    /// A category scored by only one source still participates with the
    /// other source contributing zero.
    fn blend(
        &self,
        rule_scores: &[CategoryScore],
        statistical_scores: &[(IssueCategory, f32)],
    ) -> Vec<CategoryScore> {
        let mut combined: BTreeMap<IssueCategory, (f32, f32)> = BTreeMap::new();
        for score in rule_scores {
            combined.entry(score.category).or_default().0 = score.confidence;
        }
        for &(category, probability) in statistical_scores {
            combined.entry(category).or_default().1 = probability;
        }

        let mut blended: Vec<CategoryScore> = combined
            .into_iter()
            .map(|(category, (rule, statistical))| CategoryScore {
                category,
                confidence: (self.config.rule_weight * rule
                    + self.config.statistical_weight * statistical)
                    .clamp(0.0, 1.0),
                evidence: rule.max(statistical),
            })
            .filter(|score| score.confidence > 0.0)
            .collect();

        blended.sort_by(|a, b| {
            b.confidence
                .partial_cmp(&a.confidence)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| {
                    b.evidence
                        .partial_cmp(&a.evidence)
                        .unwrap_or(std::cmp::Ordering::Equal)
                })
                .then_with(|| a.category.cmp(&b.category))
        });
        blended
    }

    /// Train the statistical layer; rules are untouched
    pub fn train(&self, examples: &[LabeledExample]) -> Result<TrainingReport> {
        self.statistical.train(examples)
    }

    /// Whether the statistical layer has a trained model
    pub fn is_trained(&self) -> bool {
        self.statistical.is_trained()
    }

    /// Metadata about the loaded statistical model
    pub fn model_info(&self) -> ModelInfo {
        self.statistical.model_info()
    }

    /// Export the statistical model as a versioned blob
    pub fn export_model(&self) -> Result<Vec<u8>> {
        self.statistical.export_bytes()
    }

    /// Restore a statistical model from a previously exported blob
    pub fn load_model(&self, bytes: &[u8]) -> Result<()> {
        self.statistical.load_bytes(bytes)
    }
}
