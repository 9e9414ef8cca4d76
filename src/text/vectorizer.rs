//! TF-IDF vectorization over n-gram features
//!
//! The vocabulary is fitted once (at training time, or when the knowledge
//! base index is rebuilt) and is immutable afterwards; tokens outside the
//! vocabulary contribute zero weight at transform time. Vectors are
//! L2-normalized so cosine similarity reduces to a sparse dot product.

use crate::text::{ngrams, normalize};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Sparse feature vector: (feature index, weight) pairs sorted by index
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SparseVector(pub Vec<(usize, f32)>);

impl SparseVector {
    /// Dot product of two index-sorted sparse vectors
    pub fn dot(&self, other: &SparseVector) -> f32 {
        let (mut i, mut j) = (0, 0);
        let mut sum = 0.0;
        while i < self.0.len() && j < other.0.len() {
            let (ia, va) = self.0[i];
            let (ib, vb) = other.0[j];
            match ia.cmp(&ib) {
                std::cmp::Ordering::Less => i += 1,
                std::cmp::Ordering::Greater => j += 1,
                std::cmp::Ordering::Equal => {
                    sum += va * vb;
                    i += 1;
                    j += 1;
                }
            }
        }
        sum
    }

    /// Whether the vector has no non-zero components
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Weight of a single feature, zero if absent
    pub fn get(&self, index: usize) -> f32 {
        self.0
            .binary_search_by_key(&index, |(i, _)| *i)
            .map(|pos| self.0[pos].1)
            .unwrap_or(0.0)
    }
}

/// Cosine similarity between two L2-normalized vectors, clamped to [0, 1]
pub fn cosine_similarity(a: &SparseVector, b: &SparseVector) -> f32 {
    a.dot(b).clamp(0.0, 1.0)
}

/// TF-IDF vectorizer with a fitted, frozen vocabulary
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TfIdfVectorizer {
    /// Feature term -> column index (insertion order preserved)
    vocabulary: IndexMap<String, usize>,
    /// Per-feature inverse document frequency, indexed by column
    idf: Vec<f32>,
    /// Maximum n-gram length used at fit time
    ngram_max: usize,
}

impl TfIdfVectorizer {
    /// Fit a vocabulary over the given documents.
    ///
    /// The vocabulary is capped to `max_features` terms by document
    /// frequency; ties break lexicographically so fitting is deterministic
    /// for identical input.
    pub fn fit(documents: &[String], max_features: usize, ngram_max: usize) -> Self {
        let doc_count = documents.len();
        let mut doc_freq: HashMap<String, usize> = HashMap::new();

        for doc in documents {
            let tokens = normalize(doc);
            let mut seen: Vec<String> = ngrams(&tokens, ngram_max);
            seen.sort();
            seen.dedup();
            for term in seen {
                *doc_freq.entry(term).or_insert(0) += 1;
            }
        }

        let mut terms: Vec<(String, usize)> = doc_freq.into_iter().collect();
        terms.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        terms.truncate(max_features);
        // Stable column order independent of frequency rank
        terms.sort_by(|a, b| a.0.cmp(&b.0));

        let mut vocabulary = IndexMap::with_capacity(terms.len());
        let mut idf = Vec::with_capacity(terms.len());
        for (index, (term, df)) in terms.into_iter().enumerate() {
            vocabulary.insert(term, index);
            // Smoothed IDF, always positive
            idf.push(((1.0 + doc_count as f32) / (1.0 + df as f32)).ln() + 1.0);
        }

        Self {
            vocabulary,
            idf,
            ngram_max,
        }
    }

    /// Transform text into an L2-normalized TF-IDF vector.
    ///
    /// Out-of-vocabulary terms are silently ignored; an all-unknown input
    /// yields an empty vector.
    pub fn transform(&self, text: &str) -> SparseVector {
        let tokens = normalize(text);
        let mut counts: HashMap<usize, f32> = HashMap::new();
        for term in ngrams(&tokens, self.ngram_max) {
            if let Some(&index) = self.vocabulary.get(&term) {
                *counts.entry(index).or_insert(0.0) += 1.0;
            }
        }

        let mut entries: Vec<(usize, f32)> = counts
            .into_iter()
            .map(|(index, tf)| (index, tf * self.idf[index]))
            .collect();
        entries.sort_by_key(|(index, _)| *index);

        let norm: f32 = entries.iter().map(|(_, w)| w * w).sum::<f32>().sqrt();
        if norm > 0.0 {
            for (_, w) in &mut entries {
                *w /= norm;
            }
        }

        SparseVector(entries)
    }

    /// Number of features in the fitted vocabulary
    pub fn feature_count(&self) -> usize {
        self.vocabulary.len()
    }
}
