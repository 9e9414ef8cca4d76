//! Random forest over TF-IDF features
//!
//! Discriminative half of the statistical ensemble: depth-limited Gini
//! decision trees, each trained on a bootstrap sample with a random √F
//! feature subset per node. Training is deterministic for a fixed seed;
//! inference is pure voting, so classification is idempotent.

use crate::text::SparseVector;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
enum TreeNode {
    Leaf {
        class: usize,
    },
    Split {
        feature: usize,
        threshold: f32,
        left: Box<TreeNode>,
        right: Box<TreeNode>,
    },
}

impl TreeNode {
    fn predict(&self, vector: &SparseVector) -> usize {
        match self {
            TreeNode::Leaf { class } => *class,
            TreeNode::Split {
                feature,
                threshold,
                left,
                right,
            } => {
                if vector.get(*feature) <= *threshold {
                    left.predict(vector)
                } else {
                    right.predict(vector)
                }
            }
        }
    }
}

/// Fitted random forest
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RandomForest {
    trees: Vec<TreeNode>,
    class_count: usize,
}

impl RandomForest {
    /// Fit the forest from sparse feature vectors and class indices
    pub fn fit(
        features: &[SparseVector],
        labels: &[usize],
        class_count: usize,
        feature_count: usize,
        tree_count: usize,
        max_depth: usize,
        seed: u64,
    ) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        let sample_count = features.len();
        let features_per_node = ((feature_count as f32).sqrt().ceil() as usize)
            .clamp(1, feature_count.max(1));

        let trees = (0..tree_count)
            .map(|_| {
                let bootstrap: Vec<usize> = (0..sample_count)
                    .map(|_| rng.gen_range(0..sample_count))
                    .collect();
                build_tree(
                    features,
                    labels,
                    &bootstrap,
                    class_count,
                    feature_count,
                    features_per_node,
                    max_depth,
                    &mut rng,
                )
            })
            .collect();

        Self { trees, class_count }
    }

    /// Raw vote counts per class
    pub fn predict_votes(&self, vector: &SparseVector) -> Vec<usize> {
        let mut votes = vec![0usize; self.class_count];
        for tree in &self.trees {
            votes[tree.predict(vector)] += 1;
        }
        votes
    }

    /// Vote fractions per class
    pub fn predict_proba(&self, vector: &SparseVector) -> Vec<f32> {
        let votes = self.predict_votes(vector);
        let total = self.trees.len().max(1) as f32;
        votes.into_iter().map(|v| v as f32 / total).collect()
    }

    pub fn tree_count(&self) -> usize {
        self.trees.len()
    }
}

#[allow(clippy::too_many_arguments)]
fn build_tree(
    features: &[SparseVector],
    labels: &[usize],
    samples: &[usize],
    class_count: usize,
    feature_count: usize,
    features_per_node: usize,
    depth_remaining: usize,
    rng: &mut StdRng,
) -> TreeNode {
    let counts = class_counts(labels, samples, class_count);
    let majority = argmax(&counts);

    if depth_remaining == 0 || samples.len() < 2 || is_pure(&counts) {
        return TreeNode::Leaf { class: majority };
    }

    let parent_gini = gini(&counts, samples.len());
    let mut best: Option<(usize, f32, f32)> = None; // (feature, threshold, impurity)

    for _ in 0..features_per_node {
        let feature = rng.gen_range(0..feature_count.max(1));
        let mut values: Vec<(f32, usize)> = samples
            .iter()
            .map(|&i| (features[i].get(feature), labels[i]))
            .collect();
        values.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(std::cmp::Ordering::Equal));

        // Candidate thresholds are midpoints between distinct adjacent values
        let mut left_counts = vec![0usize; class_count];
        let mut right_counts = counts.clone();
        for window in 0..values.len().saturating_sub(1) {
            let (value, label) = values[window];
            left_counts[label] += 1;
            right_counts[label] -= 1;
            let next_value = values[window + 1].0;
            if (next_value - value).abs() < f32::EPSILON {
                continue;
            }
            let threshold = (value + next_value) / 2.0;
            let left_n = window + 1;
            let right_n = values.len() - left_n;
            let impurity = (left_n as f32 * gini(&left_counts, left_n)
                + right_n as f32 * gini(&right_counts, right_n))
                / values.len() as f32;
            if best.map_or(true, |(_, _, b)| impurity < b) {
                best = Some((feature, threshold, impurity));
            }
        }
    }

    match best {
        Some((feature, threshold, impurity)) if impurity < parent_gini => {
            let (left_samples, right_samples): (Vec<usize>, Vec<usize>) = samples
                .iter()
                .partition(|&&i| features[i].get(feature) <= threshold);
            if left_samples.is_empty() || right_samples.is_empty() {
                return TreeNode::Leaf { class: majority };
            }
            let left = build_tree(
                features,
                labels,
                &left_samples,
                class_count,
                feature_count,
                features_per_node,
                depth_remaining - 1,
                rng,
            );
            let right = build_tree(
                features,
                labels,
                &right_samples,
                class_count,
                feature_count,
                features_per_node,
                depth_remaining - 1,
                rng,
            );
            TreeNode::Split {
                feature,
                threshold,
                left: Box::new(left),
                right: Box::new(right),
            }
        }
        _ => TreeNode::Leaf { class: majority },
    }
}

fn class_counts(labels: &[usize], samples: &[usize], class_count: usize) -> Vec<usize> {
    let mut counts = vec![0usize; class_count];
    for &i in samples {
        counts[labels[i]] += 1;
    }
    counts
}

fn is_pure(counts: &[usize]) -> bool {
    counts.iter().filter(|&&c| c > 0).count() <= 1
}

fn gini(counts: &[usize], total: usize) -> f32 {
    if total == 0 {
        return 0.0;
    }
    let total = total as f32;
    1.0 - counts
        .iter()
        .map(|&c| {
            let p = c as f32 / total;
            p * p
        })
        .sum::<f32>()
}

fn argmax(counts: &[usize]) -> usize {
    counts
        .iter()
        .enumerate()
        .max_by_key(|(_, &c)| c)
        .map(|(i, _)| i)
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::text::TfIdfVectorizer;

    fn fixture() -> (TfIdfVectorizer, RandomForest) {
        let docs: Vec<String> = vec![
            "contact failure on pin".to_string(),
            "open contact resistance detected".to_string(),
            "contact force insufficient probe".to_string(),
            "execution timeout waiting response".to_string(),
            "test timed out after limit".to_string(),
            "connection timeout during run".to_string(),
        ];
        let labels = vec![0, 0, 0, 1, 1, 1];
        let vectorizer = TfIdfVectorizer::fit(&docs, 200, 2);
        let features: Vec<_> = docs.iter().map(|d| vectorizer.transform(d)).collect();
        let forest = RandomForest::fit(
            &features,
            &labels,
            2,
            vectorizer.feature_count(),
            25,
            6,
            42,
        );
        (vectorizer, forest)
    }

    #[test]
    fn test_votes_cover_all_trees() {
        let (vectorizer, forest) = fixture();
        let votes = forest.predict_votes(&vectorizer.transform("contact failure"));
        assert_eq!(votes.iter().sum::<usize>(), forest.tree_count());
    }

    #[test]
    fn test_proba_sums_to_one() {
        let (vectorizer, forest) = fixture();
        let probs = forest.predict_proba(&vectorizer.transform("timeout waiting"));
        let sum: f32 = probs.iter().sum();
        assert!((sum - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_training_is_deterministic_for_fixed_seed() {
        let (vectorizer, forest_a) = fixture();
        let (_, forest_b) = fixture();
        let vector = vectorizer.transform("contact resistance out of spec");
        assert_eq!(forest_a.predict_votes(&vector), forest_b.predict_votes(&vector));
    }

    #[test]
    fn test_gini_bounds() {
        assert_eq!(gini(&[4, 0], 4), 0.0);
        assert!((gini(&[2, 2], 4) - 0.5).abs() < 1e-6);
    }
}
