//! Statistical classifier: naive Bayes + random forest ensemble
//!
//! The two models are evaluated independently on the same TF-IDF feature
//! vector and blended with fixed configurable weights. Training builds a
//! complete replacement model off to the side and swaps a single `Arc`, so
//! concurrent classification sees either the old state or the new state,
//! never a mixture.

use super::bayes::MultinomialNb;
use super::forest::RandomForest;
use super::models::{IssueCategory, LabeledExample, ModelInfo, TrainingReport};
use crate::config::ClassifierConfig;
use crate::error::{EngineError, Result};
use crate::text::TfIdfVectorizer;
use chrono::{DateTime, Utc};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::{Arc, RwLock};
use tracing::{debug, info};

/// Bump when the serialized layout changes; mismatched blobs are rejected
/// at load time instead of being silently reinterpreted.
pub const MODEL_SCHEMA_VERSION: u32 = 1;

/// Fully fitted model state, immutable once built
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainedModel {
    pub schema_version: u32,
    vectorizer: TfIdfVectorizer,
    bayes: MultinomialNb,
    forest: RandomForest,
    classes: Vec<IssueCategory>,
    pub trained_at: DateTime<Utc>,
    pub accuracy: f32,
    pub examples_used: usize,
}

#[derive(Deserialize)]
struct VersionProbe {
    schema_version: u32,
}

/// Ensemble classifier with copy-on-write model state
pub struct StatisticalClassifier {
    config: ClassifierConfig,
    model: RwLock<Option<Arc<TrainedModel>>>,
}

impl StatisticalClassifier {
    pub fn new(config: ClassifierConfig) -> Self {
        Self {
            config,
            model: RwLock::new(None),
        }
    }

    /// Whether a trained model is currently loaded
    pub fn is_trained(&self) -> bool {
        self.model.read().map(|m| m.is_some()).unwrap_or(false)
    }

    fn current(&self) -> Option<Arc<TrainedModel>> {
        self.model.read().ok().and_then(|guard| guard.clone())
    }

    /// Train a replacement model and swap it in atomically.
    ///
    /// Requires at least two distinct categories; each category present in
    /// the dataset contributes at least one training example by
    /// construction of the stratified split.
    pub fn train(&self, examples: &[LabeledExample]) -> Result<TrainingReport> {
        let mut by_class: BTreeMap<IssueCategory, Vec<&LabeledExample>> = BTreeMap::new();
        for example in examples {
            by_class.entry(example.category).or_default().push(example);
        }

        if by_class.len() < 2 {
            return Err(EngineError::Configuration(format!(
                "training requires at least 2 distinct categories, got {}",
                by_class.len()
            )));
        }

        let classes: Vec<IssueCategory> = by_class.keys().copied().collect();

        // Stratified split: the first example of every class always trains,
        // the remainder is shuffled deterministically and split by ratio.
        let mut train_set: Vec<&LabeledExample> = Vec::new();
        let mut holdout: Vec<&LabeledExample> = Vec::new();
        let mut rng = StdRng::seed_from_u64(self.config.seed);
        for class_examples in by_class.values() {
            let mut rest: Vec<&LabeledExample> = class_examples.to_vec();
            let first = rest.remove(0);
            train_set.push(first);
            rest.shuffle(&mut rng);
            let holdout_count = (rest.len() as f32 * self.config.holdout_ratio) as usize;
            holdout.extend(rest.drain(..holdout_count));
            train_set.extend(rest);
        }

        info!(
            examples = examples.len(),
            train = train_set.len(),
            holdout = holdout.len(),
            classes = classes.len(),
            "training statistical classifier"
        );

        let train_docs: Vec<String> = train_set.iter().map(|e| e.text.clone()).collect();
        let vectorizer =
            TfIdfVectorizer::fit(&train_docs, self.config.max_features, self.config.ngram_max);
        let class_index = |category: IssueCategory| {
            classes.iter().position(|&c| c == category).unwrap_or(0)
        };

        let train_features: Vec<_> = train_docs.iter().map(|d| vectorizer.transform(d)).collect();
        let train_labels: Vec<usize> = train_set.iter().map(|e| class_index(e.category)).collect();

        let bayes = MultinomialNb::fit(
            &train_features,
            &train_labels,
            classes.len(),
            vectorizer.feature_count(),
        );
        let forest = RandomForest::fit(
            &train_features,
            &train_labels,
            classes.len(),
            vectorizer.feature_count(),
            self.config.tree_count,
            self.config.max_depth,
            self.config.seed,
        );

        let model = TrainedModel {
            schema_version: MODEL_SCHEMA_VERSION,
            vectorizer,
            bayes,
            forest,
            classes: classes.clone(),
            trained_at: Utc::now(),
            accuracy: 0.0,
            examples_used: examples.len(),
        };

        // Small datasets may leave the holdout empty; fall back to
        // measuring on the training split so the report stays meaningful.
        let eval_set: &[&LabeledExample] = if holdout.is_empty() {
            &train_set
        } else {
            &holdout
        };
        let correct = eval_set
            .iter()
            .filter(|example| {
                blended_ranking(&model, &self.config, &example.text)
                    .first()
                    .map(|&(category, _)| category == example.category)
                    .unwrap_or(false)
            })
            .count();
        let accuracy = correct as f32 / eval_set.len().max(1) as f32;

        let report = TrainingReport {
            accuracy,
            feature_count: model.vectorizer.feature_count(),
            examples_used: examples.len(),
            class_count: classes.len(),
            trained_at: model.trained_at,
        };

        let model = Arc::new(TrainedModel { accuracy, ..model });
        if let Ok(mut guard) = self.model.write() {
            *guard = Some(model);
        }

        info!(accuracy, "statistical classifier trained");
        Ok(report)
    }

    /// Rank categories by blended ensemble probability.
    ///
    /// Returns an empty list when no model is trained; callers fall back to
    /// the rule-based classifier.
    pub fn classify(&self, text: &str, top_n: usize) -> Vec<(IssueCategory, f32)> {
        let Some(model) = self.current() else {
            return Vec::new();
        };
        let mut ranking = blended_ranking(&model, &self.config, text);
        ranking.truncate(top_n);
        ranking
    }

    /// Metadata about the loaded model
    pub fn model_info(&self) -> ModelInfo {
        match self.current() {
            Some(model) => ModelInfo {
                trained: true,
                trained_at: Some(model.trained_at),
                feature_count: model.vectorizer.feature_count(),
                classes: model.classes.clone(),
            },
            None => ModelInfo {
                trained: false,
                trained_at: None,
                feature_count: 0,
                classes: Vec::new(),
            },
        }
    }

    /// Serialize the current model as a versioned blob
    pub fn export_bytes(&self) -> Result<Vec<u8>> {
        let model = self.current().ok_or_else(|| {
            EngineError::Configuration("no trained model to export".to_string())
        })?;
        Ok(serde_json::to_vec(model.as_ref())?)
    }

    /// Load a previously exported model without retraining.
    ///
    /// Blobs with a different schema version are rejected outright.
    pub fn load_bytes(&self, bytes: &[u8]) -> Result<()> {
        let probe: VersionProbe = serde_json::from_slice(bytes)?;
        if probe.schema_version != MODEL_SCHEMA_VERSION {
            return Err(EngineError::ModelVersionMismatch {
                found: probe.schema_version,
                expected: MODEL_SCHEMA_VERSION,
            });
        }
        let model: TrainedModel = serde_json::from_slice(bytes)?;
        debug!(
            classes = model.classes.len(),
            features = model.vectorizer.feature_count(),
            "loaded statistical model from blob"
        );
        if let Ok(mut guard) = self.model.write() {
            *guard = Some(Arc::new(model));
        }
        Ok(())
    }
}

/// Blend the two model outputs into a full descending ranking.
///
/// Ties break on raw forest vote count (the more decisive model wins),
/// then on taxonomy order for determinism.
fn blended_ranking(
    model: &TrainedModel,
    config: &ClassifierConfig,
    text: &str,
) -> Vec<(IssueCategory, f32)> {
    let vector = model.vectorizer.transform(text);
    let bayes_probs = model.bayes.predict_proba(&vector);
    let forest_probs = model.forest.predict_proba(&vector);
    let forest_votes = model.forest.predict_votes(&vector);

    let mut scored: Vec<(IssueCategory, f32, usize)> = model
        .classes
        .iter()
        .enumerate()
        .map(|(i, &category)| {
            let blended =
                config.bayes_weight * bayes_probs[i] + config.forest_weight * forest_probs[i];
            (category, blended, forest_votes[i])
        })
        .collect();

    scored.sort_by(|a, b| {
        b.1.partial_cmp(&a.1)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| b.2.cmp(&a.2))
            .then_with(|| a.0.cmp(&b.0))
    });

    scored
        .into_iter()
        .map(|(category, probability, _)| (category, probability))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::dataset::seed_examples;

    fn two_class_examples() -> Vec<LabeledExample> {
        vec![
            LabeledExample::new("contact failure on pin 5", IssueCategory::ContactFailure),
            LabeledExample::new("open contact detected", IssueCategory::ContactFailure),
            LabeledExample::new("contact resistance high", IssueCategory::ContactFailure),
            LabeledExample::new("pin contact force low", IssueCategory::ContactFailure),
            LabeledExample::new("execution timeout reached", IssueCategory::Timeout),
            LabeledExample::new("test timed out waiting", IssueCategory::Timeout),
            LabeledExample::new("connection timeout on device", IssueCategory::Timeout),
            LabeledExample::new("operation timed out", IssueCategory::Timeout),
        ]
    }

    #[test]
    fn test_untrained_returns_empty() {
        let classifier = StatisticalClassifier::new(ClassifierConfig::default());
        assert!(!classifier.is_trained());
        assert!(classifier.classify("contact failure", 3).is_empty());
    }

    #[test]
    fn test_train_requires_two_categories() {
        let classifier = StatisticalClassifier::new(ClassifierConfig::default());
        let examples = vec![LabeledExample::new("timeout", IssueCategory::Timeout)];
        assert!(matches!(
            classifier.train(&examples),
            Err(EngineError::Configuration(_))
        ));
    }

    #[test]
    fn test_train_and_classify() {
        let classifier = StatisticalClassifier::new(ClassifierConfig::default());
        let report = classifier.train(&two_class_examples()).unwrap();
        assert!(report.feature_count > 0);
        assert_eq!(report.class_count, 2);
        assert!((0.0..=1.0).contains(&report.accuracy));

        let ranking = classifier.classify("contact failure pin resistance", 5);
        assert_eq!(ranking.len(), 2);
        assert_eq!(ranking[0].0, IssueCategory::ContactFailure);
        for pair in ranking.windows(2) {
            assert!(pair[0].1 >= pair[1].1);
        }
    }

    #[test]
    fn test_classification_is_idempotent() {
        let classifier = StatisticalClassifier::new(ClassifierConfig::default());
        classifier.train(&two_class_examples()).unwrap();
        let a = classifier.classify("timeout during contact test", 5);
        let b = classifier.classify("timeout during contact test", 5);
        assert_eq!(a.len(), b.len());
        for (x, y) in a.iter().zip(&b) {
            assert_eq!(x.0, y.0);
            assert_eq!(x.1, y.1);
        }
    }

    #[test]
    fn test_export_and_reload_without_retraining() {
        let classifier = StatisticalClassifier::new(ClassifierConfig::default());
        classifier.train(&two_class_examples()).unwrap();
        let before = classifier.classify("contact failure", 2);
        let blob = classifier.export_bytes().unwrap();

        let restored = StatisticalClassifier::new(ClassifierConfig::default());
        restored.load_bytes(&blob).unwrap();
        assert!(restored.is_trained());
        let after = restored.classify("contact failure", 2);
        assert_eq!(before[0].0, after[0].0);
    }

    #[test]
    fn test_version_mismatch_rejected() {
        let classifier = StatisticalClassifier::new(ClassifierConfig::default());
        let blob = br#"{"schema_version": 99}"#;
        assert!(matches!(
            classifier.load_bytes(blob),
            Err(EngineError::ModelVersionMismatch { found: 99, .. })
        ));
    }

    #[test]
    fn test_trains_on_seed_dataset() {
        let classifier = StatisticalClassifier::new(ClassifierConfig::default());
        let report = classifier.train(&seed_examples()).unwrap();
        assert!(report.class_count >= 10);
        assert!(report.examples_used >= report.class_count);
    }
}
