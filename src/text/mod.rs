//! Text normalization
//!
//! All downstream scoring works on the canonical token sequence produced
//! here: lowercase alphanumeric tokens with stopwords removed. Numeric
//! tokens are kept because error codes carry signal.

pub mod vectorizer;

pub use vectorizer::{cosine_similarity, SparseVector, TfIdfVectorizer};

use once_cell::sync::Lazy;
use std::collections::HashSet;

static STOPWORDS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "a", "an", "and", "are", "as", "at", "be", "been", "but", "by", "for", "from", "had",
        "has", "have", "in", "into", "is", "it", "its", "of", "on", "or", "that", "the", "this",
        "to", "was", "were", "which", "while", "will", "with",
    ]
    .into_iter()
    .collect()
});

/// Normalize raw text into an ordered token sequence.
///
/// Empty or non-text input yields an empty sequence; callers treat that as
/// "no information", never as an error.
pub fn normalize(text: &str) -> Vec<String> {
    let lower = text.to_lowercase();
    lower
        .split(|c: char| !c.is_alphanumeric())
        .filter(|tok| !tok.is_empty())
        .filter(|tok| tok.len() > 1 || tok.chars().all(|c| c.is_ascii_digit()))
        .filter(|tok| !STOPWORDS.contains(tok))
        .map(str::to_string)
        .collect()
}

/// Expand a token sequence into n-grams of length 1..=max_n.
///
/// N-grams are joined with a single space, matching the vocabulary keys
/// produced at fit time.
pub fn ngrams(tokens: &[String], max_n: usize) -> Vec<String> {
    let max_n = max_n.max(1);
    let mut out = Vec::with_capacity(tokens.len() * max_n);
    for n in 1..=max_n {
        if tokens.len() < n {
            break;
        }
        for window in tokens.windows(n) {
            out.push(window.join(" "));
        }
    }
    out
}
