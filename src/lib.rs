//! Remediation engine for test-program regression failures
//!
//! Classifies free-text issue descriptions from failed validation runs into
//! operational failure categories and recommends remediation steps from a
//! knowledge base of previously successful solutions. Classification blends
//! a keyword rule layer with a trainable statistical ensemble; recommendation
//! blends text similarity with historical success rates and gates
//! auto-application behind conservative thresholds.
//!
//! The crate is the in-process decision core of a larger remediation
//! pipeline. It owns no storage and no transport; callers feed it text and
//! labeled history, and persist its exported snapshots and model blobs
//! through a [`engine::PersistenceHook`].

pub mod classify;
pub mod config;
pub mod engine;
pub mod error;
pub mod knowledge;
pub mod text;

pub use classify::{
    ClassificationResult, ClassifierSource, IssueCategory, IssueClassifier, LabeledExample,
    ModelInfo, TrainingReport,
};
pub use config::{ClassifierConfig, EngineConfig, RecommenderConfig};
pub use engine::{PersistenceHook, RemediationEngine};
pub use error::{EngineError, Result};
pub use knowledge::{
    KnowledgeBase, KnowledgeBaseStats, Recommendation, RecommendationList, Solution,
    SolutionContext, SolutionRecommender,
};
