//! Multinomial naive Bayes over TF-IDF features
//!
//! Generative half of the statistical ensemble. Laplace-smoothed per-class
//! feature likelihoods, scored in log space and softmax-normalized into
//! probabilities.

use crate::text::SparseVector;
use serde::{Deserialize, Serialize};

const SMOOTHING_ALPHA: f32 = 1.0;

/// Fitted multinomial naive Bayes model
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MultinomialNb {
    /// log P(class)
    log_priors: Vec<f32>,
    /// log P(feature | class), [class][feature]
    log_likelihoods: Vec<Vec<f32>>,
    feature_count: usize,
}

impl MultinomialNb {
    /// Fit the model from sparse feature vectors and class indices.
    ///
    /// `labels[i]` is the class index of `features[i]`; class indices are
    /// dense in `0..class_count`.
    pub fn fit(
        features: &[SparseVector],
        labels: &[usize],
        class_count: usize,
        feature_count: usize,
    ) -> Self {
        let mut class_doc_counts = vec![0usize; class_count];
        let mut feature_sums = vec![vec![0.0f32; feature_count]; class_count];
        let mut class_totals = vec![0.0f32; class_count];

        for (vector, &class) in features.iter().zip(labels) {
            class_doc_counts[class] += 1;
            for &(index, weight) in &vector.0 {
                feature_sums[class][index] += weight;
                class_totals[class] += weight;
            }
        }

        let total_docs = features.len() as f32;
        let log_priors = class_doc_counts
            .iter()
            .map(|&count| {
                ((count as f32 + SMOOTHING_ALPHA)
                    / (total_docs + SMOOTHING_ALPHA * class_count as f32))
                    .ln()
            })
            .collect();

        let log_likelihoods = (0..class_count)
            .map(|class| {
                let denom = class_totals[class] + SMOOTHING_ALPHA * feature_count as f32;
                feature_sums[class]
                    .iter()
                    .map(|&sum| ((sum + SMOOTHING_ALPHA) / denom).ln())
                    .collect()
            })
            .collect();

        Self {
            log_priors,
            log_likelihoods,
            feature_count,
        }
    }

    /// Per-class probabilities for a feature vector.
    ///
    /// An empty vector (all tokens out of vocabulary) degrades to the class
    /// priors alone.
    pub fn predict_proba(&self, vector: &SparseVector) -> Vec<f32> {
        let mut log_scores = self.log_priors.clone();
        for &(index, weight) in &vector.0 {
            if index >= self.feature_count {
                continue;
            }
            for (class, score) in log_scores.iter_mut().enumerate() {
                *score += weight * self.log_likelihoods[class][index];
            }
        }
        softmax(&log_scores)
    }
}

/// Numerically stable softmax
fn softmax(log_scores: &[f32]) -> Vec<f32> {
    let max = log_scores.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    let exps: Vec<f32> = log_scores.iter().map(|&s| (s - max).exp()).collect();
    let sum: f32 = exps.iter().sum();
    if sum > 0.0 {
        exps.iter().map(|&e| e / sum).collect()
    } else {
        vec![1.0 / log_scores.len().max(1) as f32; log_scores.len()]
    }
}
