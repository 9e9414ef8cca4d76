//! Solution knowledge base, recommendation, and outcome tracking

pub mod base;
pub mod models;
pub mod outcomes;
pub mod recommender;

pub use base::KnowledgeBase;
pub use models::{
    KnowledgeBaseStats, Recommendation, RecommendationList, Solution, SolutionContext,
};
pub use outcomes::OutcomeTracker;
pub use recommender::SolutionRecommender;
