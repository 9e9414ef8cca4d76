//! Engine facade
//!
//! Composes the classifier, knowledge base, recommender, and outcome
//! tracker behind the four operations the API layer consumes, plus the
//! lifecycle operations the storage layer needs (snapshot export/import,
//! model blob export/load). The engine itself performs no I/O; an optional
//! persistence hook is invoked synchronously after each mutation so the
//! external storage layer can save.

use crate::classify::{
    ClassificationResult, IssueCategory, IssueClassifier, LabeledExample, ModelInfo,
    TrainingReport,
};
use crate::config::EngineConfig;
use crate::error::Result;
use crate::knowledge::{
    KnowledgeBase, KnowledgeBaseStats, OutcomeTracker, RecommendationList, Solution,
    SolutionContext, SolutionRecommender,
};
use std::sync::Arc;
use tracing::{info, warn};

/// Hook results carry a plain message; the engine only logs them.
pub type HookResult = std::result::Result<(), String>;

/// Callbacks through which the external storage layer persists engine
/// state after mutations. Implementations must be cheap to call; failures
/// are logged, never surfaced into the mutating operation's result.
pub trait PersistenceHook: Send + Sync {
    /// Called after the knowledge base changes (solution added, outcome
    /// recorded) with a full snapshot.
    fn persist_solutions(&self, snapshot: &[Solution]) -> HookResult;

    /// Called after a successful training run with the versioned model blob.
    fn persist_model(&self, blob: &[u8]) -> HookResult;
}

/// The issue classification + solution recommendation engine
pub struct RemediationEngine {
    config: EngineConfig,
    classifier: IssueClassifier,
    knowledge_base: Arc<KnowledgeBase>,
    recommender: SolutionRecommender,
    tracker: OutcomeTracker,
    hook: Option<Arc<dyn PersistenceHook>>,
}

impl RemediationEngine {
    /// Create an engine with the given configuration.
    ///
    /// Fails fast on invalid configuration (bad blend weights, zero
    /// thresholds) rather than degrading at call time.
    pub fn new(config: EngineConfig) -> Result<Self> {
        config.validate()?;
        let knowledge_base = Arc::new(KnowledgeBase::new());
        Ok(Self {
            classifier: IssueClassifier::new(config.classifier.clone()),
            recommender: SolutionRecommender::new(
                knowledge_base.clone(),
                config.recommender.clone(),
            ),
            tracker: OutcomeTracker::new(knowledge_base.clone()),
            knowledge_base,
            config,
            hook: None,
        })
    }

    /// Create with default configuration
    pub fn with_defaults() -> Result<Self> {
        Self::new(EngineConfig::default())
    }

    /// Attach a persistence hook invoked after mutations
    pub fn with_persistence(mut self, hook: Arc<dyn PersistenceHook>) -> Self {
        self.hook = Some(hook);
        self
    }

    /// Classify an issue description into ranked categories
    pub fn classify(&self, text: &str) -> ClassificationResult {
        self.classifier.classify(text)
    }

    /// Train the statistical classifier from labeled examples.
    ///
    /// Classification keeps serving the previous model until the new one
    /// swaps in; the trained blob is handed to the persistence hook.
    pub fn train(&self, examples: &[LabeledExample]) -> Result<TrainingReport> {
        let report = self.classifier.train(examples)?;
        if let Some(hook) = &self.hook {
            match self.classifier.export_model() {
                Ok(blob) => {
                    if let Err(message) = hook.persist_model(&blob) {
                        warn!(%message, "model persistence hook failed");
                    }
                }
                Err(error) => warn!(%error, "model export for persistence failed"),
            }
        }
        Ok(report)
    }

    /// Recommend solutions for an issue description
    pub fn recommend(
        &self,
        issue_text: &str,
        category: Option<IssueCategory>,
        context: Option<&SolutionContext>,
        top_k: usize,
        min_similarity: f32,
    ) -> RecommendationList {
        self.recommender
            .recommend(issue_text, category, context, top_k, min_similarity)
    }

    /// Recommend with configured defaults (top_k, similarity floor)
    pub fn recommend_default(
        &self,
        issue_text: &str,
        category: Option<IssueCategory>,
        context: Option<&SolutionContext>,
    ) -> RecommendationList {
        self.recommender.recommend_default(issue_text, category, context)
    }

    /// Record the outcome of an applied solution
    pub fn record_outcome(&self, solution_id: &str, succeeded: bool) -> Result<()> {
        self.tracker.record_outcome(solution_id, succeeded)?;
        self.persist_solutions();
        Ok(())
    }

    /// Add a confirmed solution to the knowledge base
    pub fn add_solution(&self, solution: Solution) -> Result<()> {
        self.knowledge_base.add(solution)?;
        self.persist_solutions();
        Ok(())
    }

    /// Bulk-load solutions at startup
    pub fn load_solutions(&self, solutions: Vec<Solution>) -> Result<usize> {
        self.knowledge_base.import(solutions)
    }

    /// Snapshot of the knowledge base for the storage layer
    pub fn export_solutions(&self) -> Vec<Solution> {
        self.knowledge_base.export()
    }

    /// Load a previously trained model blob; rejects mismatched schema
    /// versions. Until a model loads, classification runs rules-only.
    pub fn load_model(&self, blob: &[u8]) -> Result<()> {
        self.classifier.load_model(blob)
    }

    /// Export the trained model as a versioned blob
    pub fn export_model(&self) -> Result<Vec<u8>> {
        self.classifier.export_model()
    }

    /// Metadata about the loaded statistical model
    pub fn model_info(&self) -> ModelInfo {
        self.classifier.model_info()
    }

    /// Aggregate knowledge-base statistics
    pub fn knowledge_stats(&self) -> KnowledgeBaseStats {
        self.knowledge_base.stats()
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    fn persist_solutions(&self) {
        if let Some(hook) = &self.hook {
            let snapshot = self.knowledge_base.export();
            if let Err(message) = hook.persist_solutions(&snapshot) {
                warn!(%message, "solution persistence hook failed");
            } else {
                info!(solutions = snapshot.len(), "knowledge base persisted");
            }
        }
    }
}
