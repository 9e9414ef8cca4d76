//! Data models for the solution knowledge base

use crate::classify::IssueCategory;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Outcome totals at or above this count use the raw success rate;
/// below it the rate is Laplace-smoothed toward 0.5.
const SMOOTHING_CUTOFF: u32 = 10;

/// A previously-validated remediation solution.
///
/// Owned exclusively by the knowledge base; counters mutate only through
/// outcome recording. Solutions are never deleted implicitly — one that
/// stops working accumulates failures and sinks in ranking.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Solution {
    pub id: String,
    pub title: String,
    pub description: String,

    /// Category affinity; empty = applies to any category
    #[serde(default)]
    pub categories: Vec<IssueCategory>,

    /// Compatible module names; empty = universal
    #[serde(default)]
    pub modules: Vec<String>,

    /// Compatible baseline-version patterns (exact or trailing-`*` prefix);
    /// empty = universal
    #[serde(default)]
    pub baselines: Vec<String>,

    #[serde(default)]
    pub success_count: u32,
    #[serde(default)]
    pub failure_count: u32,

    /// Derived smoothed success rate, kept in sync with the counters
    #[serde(default = "default_confidence")]
    pub confidence: f32,

    pub created_at: DateTime<Utc>,
    pub last_updated_at: DateTime<Utc>,
}

fn default_confidence() -> f32 {
    0.5
}

impl Solution {
    /// Create a solution with a fresh v4 id
    pub fn new(title: impl Into<String>, description: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            title: title.into(),
            description: description.into(),
            categories: Vec::new(),
            modules: Vec::new(),
            baselines: Vec::new(),
            success_count: 0,
            failure_count: 0,
            confidence: default_confidence(),
            created_at: now,
            last_updated_at: now,
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    pub fn with_categories(mut self, categories: Vec<IssueCategory>) -> Self {
        self.categories = categories;
        self
    }

    pub fn with_modules(mut self, modules: Vec<String>) -> Self {
        self.modules = modules;
        self
    }

    pub fn with_baselines(mut self, baselines: Vec<String>) -> Self {
        self.baselines = baselines;
        self
    }

    pub fn with_outcomes(mut self, successes: u32, failures: u32) -> Self {
        self.success_count = successes;
        self.failure_count = failures;
        self.confidence = derived_confidence(successes, failures);
        self
    }

    /// Text indexed for similarity search
    pub fn search_text(&self) -> String {
        format!("{} {}", self.title, self.description)
    }

    /// Record one application outcome and refresh derived state
    pub fn record_outcome(&mut self, succeeded: bool) {
        if succeeded {
            self.success_count += 1;
        } else {
            self.failure_count += 1;
        }
        self.confidence = derived_confidence(self.success_count, self.failure_count);
        self.last_updated_at = Utc::now();
    }

    /// Whether this solution's category affinity includes `category`
    pub fn applies_to_category(&self, category: IssueCategory) -> bool {
        self.categories.is_empty() || self.categories.contains(&category)
    }

    /// Binary module compatibility: empty applicability set is universal
    pub fn applies_to_module(&self, module: &str) -> bool {
        self.modules.is_empty() || self.modules.iter().any(|m| m == module)
    }

    /// Binary baseline compatibility via exact or trailing-`*` prefix match
    pub fn applies_to_baseline(&self, baseline: &str) -> bool {
        self.baselines.is_empty()
            || self
                .baselines
                .iter()
                .any(|pattern| baseline_matches(pattern, baseline))
    }
}

fn baseline_matches(pattern: &str, baseline: &str) -> bool {
    match pattern.strip_suffix('*') {
        Some(prefix) => baseline.starts_with(prefix),
        None => pattern == baseline,
    }
}

/// Smoothed success rate: raw at high volume, Laplace (s+1)/(n+2) below
fn derived_confidence(successes: u32, failures: u32) -> f32 {
    let total = successes + failures;
    if total >= SMOOTHING_CUTOFF {
        successes as f32 / total as f32
    } else {
        (successes as f32 + 1.0) / (total as f32 + 2.0)
    }
}

/// Caller-supplied applicability constraints; absent fields mean
/// "no constraint"
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SolutionContext {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub module_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub baseline_version: Option<String>,
}

impl SolutionContext {
    pub fn for_module(module: impl Into<String>) -> Self {
        Self {
            module_name: Some(module.into()),
            baseline_version: None,
        }
    }
}

/// One ranked candidate in a recommendation list
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Recommendation {
    pub solution: Solution,
    /// Cosine similarity of the query to the solution text, in [0, 1]
    pub similarity: f32,
    /// Blended rank score: similarity and historical confidence combined
    pub rank_score: f32,
    /// True only for a top-ranked candidate passing both auto-apply gates
    pub auto_applicable: bool,
}

/// Ranked recommendations for one query; transient
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecommendationList {
    pub query: String,
    pub recommendations: Vec<Recommendation>,
    pub best_similarity: f32,
    pub avg_similarity: f32,
}

impl RecommendationList {
    pub fn empty(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            recommendations: Vec::new(),
            best_similarity: 0.0,
            avg_similarity: 0.0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.recommendations.is_empty()
    }

    /// The top-ranked recommendation, if any
    pub fn top(&self) -> Option<&Recommendation> {
        self.recommendations.first()
    }

    /// The auto-applicable candidate; at most one exists by construction
    pub fn auto_applicable(&self) -> Option<&Recommendation> {
        self.recommendations.iter().find(|r| r.auto_applicable)
    }
}

/// Aggregate statistics over the knowledge base
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KnowledgeBaseStats {
    pub total_solutions: usize,
    pub total_applications: u64,
    pub successful_applications: u64,
    pub overall_success_rate: f32,
    pub category_distribution: BTreeMap<IssueCategory, usize>,
}
