//! Solution recommendation
//!
//! Ranks knowledge-base candidates for an issue by blending text similarity
//! with historical success, after filtering on category affinity and caller
//! context. Context compatibility is binary: an incompatible candidate is
//! excluded outright, never down-weighted.

use super::base::KnowledgeBase;
use super::models::{Recommendation, RecommendationList, SolutionContext};
use crate::classify::IssueCategory;
use crate::config::RecommenderConfig;
use std::sync::Arc;
use tracing::{debug, info};

/// Recommends solutions from a shared knowledge base
pub struct SolutionRecommender {
    knowledge_base: Arc<KnowledgeBase>,
    config: RecommenderConfig,
}

impl SolutionRecommender {
    pub fn new(knowledge_base: Arc<KnowledgeBase>, config: RecommenderConfig) -> Self {
        Self {
            knowledge_base,
            config,
        }
    }

    /// Recommend solutions for an issue description.
    ///
    /// `category` acts as a pure candidate filter when supplied — it never
    /// re-ranks. An empty knowledge base or no candidate clearing
    /// `min_similarity` yields an empty list; callers treat that as "needs
    /// human review", not as an error.
    pub fn recommend(
        &self,
        issue_text: &str,
        category: Option<IssueCategory>,
        context: Option<&SolutionContext>,
        top_k: usize,
        min_similarity: f32,
    ) -> RecommendationList {
        if self.knowledge_base.is_empty() {
            debug!("knowledge base empty, no recommendations");
            return RecommendationList::empty(issue_text);
        }

        // Generate candidates from the whole base, then filter; the filters
        // only ever exclude, so over-fetching is safe.
        let candidates = self
            .knowledge_base
            .search(issue_text, usize::MAX, min_similarity);

        let mut ranked: Vec<Recommendation> = candidates
            .into_iter()
            .filter(|(solution, _)| {
                category.map_or(true, |c| solution.applies_to_category(c))
            })
            .filter(|(solution, _)| match context {
                Some(ctx) => {
                    ctx.module_name
                        .as_deref()
                        .map_or(true, |m| solution.applies_to_module(m))
                        && ctx
                            .baseline_version
                            .as_deref()
                            .map_or(true, |b| solution.applies_to_baseline(b))
                }
                None => true,
            })
            .map(|(solution, similarity)| {
                let rank_score = self.config.similarity_weight * similarity
                    + self.config.confidence_weight * solution.confidence;
                Recommendation {
                    solution,
                    similarity,
                    rank_score,
                    auto_applicable: false,
                }
            })
            .collect();

        ranked.sort_by(|a, b| {
            b.rank_score
                .partial_cmp(&a.rank_score)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| {
                    b.similarity
                        .partial_cmp(&a.similarity)
                        .unwrap_or(std::cmp::Ordering::Equal)
                })
                .then_with(|| a.solution.id.cmp(&b.solution.id))
        });
        ranked.truncate(top_k);

        // Triple gate: similarity and confidence must both clear their
        // thresholds, and only the top-ranked candidate is eligible.
        if let Some(top) = ranked.first_mut() {
            top.auto_applicable = top.similarity >= self.config.auto_apply_similarity
                && top.solution.confidence >= self.config.auto_apply_confidence;
        }

        let best_similarity = ranked.first().map(|r| r.similarity).unwrap_or(0.0);
        let avg_similarity = if ranked.is_empty() {
            0.0
        } else {
            ranked.iter().map(|r| r.similarity).sum::<f32>() / ranked.len() as f32
        };

        info!(
            candidates = ranked.len(),
            best_similarity,
            auto = ranked.first().map(|r| r.auto_applicable).unwrap_or(false),
            "recommendation complete"
        );

        RecommendationList {
            query: issue_text.to_string(),
            recommendations: ranked,
            best_similarity,
            avg_similarity,
        }
    }

    /// Recommend with the configured default top_k and similarity floor
    pub fn recommend_default(
        &self,
        issue_text: &str,
        category: Option<IssueCategory>,
        context: Option<&SolutionContext>,
    ) -> RecommendationList {
        self.recommend(
            issue_text,
            category,
            context,
            self.config.default_top_k,
            self.config.default_min_similarity,
        )
    }
}
