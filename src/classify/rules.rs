//! Rule-based keyword classifier
//!
//! Zero-training-data fallback and blending input. Matches the category
//! keyword signatures against the normalized token stream; longer phrases
//! carry more weight. Never fails — an empty result means "unknown".

use super::models::{CategoryScore, IssueCategory};
use crate::text::normalize;
use std::collections::HashMap;
use tracing::debug;

/// A compiled keyword with its specificity weight and sharing count
#[derive(Debug, Clone)]
struct CompiledKeyword {
    /// Normalized phrase, token-joined with single spaces
    phrase: String,
    /// Token count of the normalized phrase; multi-word phrases are more
    /// specific
    weight: f32,
    /// How many categories carry this phrase (1 = unique to one category)
    shared_by: usize,
}

/// Keyword/pattern matcher over the fixed taxonomy
#[derive(Debug)]
pub struct RuleClassifier {
    patterns: Vec<(IssueCategory, Vec<CompiledKeyword>)>,
}

impl RuleClassifier {
    /// Compile the taxonomy's keyword signatures.
    ///
    /// Phrases pass through the same normalization as the input text, so a
    /// signature like "out of memory" still matches after stopword removal
    /// strips "of" from both sides.
    pub fn new() -> Self {
        let compiled: Vec<(IssueCategory, Vec<String>)> = IssueCategory::ALL
            .iter()
            .map(|&category| {
                let mut phrases: Vec<String> = category
                    .keywords()
                    .iter()
                    .map(|&phrase| normalize(phrase).join(" "))
                    .filter(|phrase| !phrase.is_empty())
                    .collect();
                phrases.sort();
                phrases.dedup();
                (category, phrases)
            })
            .collect();

        let mut sharing: HashMap<String, usize> = HashMap::new();
        for (_, phrases) in &compiled {
            for phrase in phrases {
                *sharing.entry(phrase.clone()).or_insert(0) += 1;
            }
        }

        let patterns = compiled
            .into_iter()
            .map(|(category, phrases)| {
                let keywords = phrases
                    .into_iter()
                    .map(|phrase| CompiledKeyword {
                        weight: phrase.split_whitespace().count() as f32,
                        shared_by: sharing[&phrase],
                        phrase,
                    })
                    .collect();
                (category, keywords)
            })
            .collect();

        Self { patterns }
    }

    /// Score every category against the text.
    ///
    /// Returns categories with at least one keyword hit, ordered by
    /// normalized score descending. Ties break on raw weighted hit count,
    /// then on keyword-set specificity (fewest categories sharing the
    /// matched keywords), then on taxonomy order for determinism.
    pub fn classify(&self, text: &str) -> Vec<CategoryScore> {
        let tokens = normalize(text);
        if tokens.is_empty() {
            return Vec::new();
        }
        // Space-delimited form so phrases match on token boundaries only
        let haystack = format!(" {} ", tokens.join(" "));
        let token_count = tokens.len() as f32;

        struct Hit {
            category: IssueCategory,
            raw: f32,
            normalized: f32,
            avg_sharing: f32,
        }

        let mut hits: Vec<Hit> = Vec::new();
        for (category, keywords) in &self.patterns {
            let mut raw = 0.0;
            let mut sharing_sum = 0.0;
            let mut matched = 0usize;
            for keyword in keywords {
                if haystack.contains(&format!(" {} ", keyword.phrase)) {
                    raw += keyword.weight;
                    sharing_sum += keyword.shared_by as f32;
                    matched += 1;
                }
            }
            if matched > 0 {
                hits.push(Hit {
                    category: *category,
                    raw,
                    normalized: (raw / token_count).min(1.0),
                    avg_sharing: sharing_sum / matched as f32,
                });
            }
        }

        hits.sort_by(|a, b| {
            b.normalized
                .partial_cmp(&a.normalized)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| b.raw.partial_cmp(&a.raw).unwrap_or(std::cmp::Ordering::Equal))
                .then_with(|| {
                    a.avg_sharing
                        .partial_cmp(&b.avg_sharing)
                        .unwrap_or(std::cmp::Ordering::Equal)
                })
                .then_with(|| a.category.cmp(&b.category))
        });

        debug!(matches = hits.len(), "rule classification complete");

        hits.into_iter()
            .map(|hit| CategoryScore {
                category: hit.category,
                confidence: hit.normalized,
                evidence: hit.raw,
            })
            .collect()
    }
}

impl Default for RuleClassifier {
    fn default() -> Self {
        Self::new()
    }
}
