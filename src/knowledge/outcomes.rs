//! Outcome tracking
//!
//! The sole learning mechanism for recommendation ranking: applied-solution
//! outcomes accumulate on the solution's counters and shift its derived
//! confidence. The statistical classifier learns only through explicit
//! `train()` calls, never through this path.

use super::base::KnowledgeBase;
use super::models::Solution;
use crate::error::Result;
use std::sync::Arc;
use tracing::info;

/// Records application outcomes back into the knowledge base
pub struct OutcomeTracker {
    knowledge_base: Arc<KnowledgeBase>,
}

impl OutcomeTracker {
    pub fn new(knowledge_base: Arc<KnowledgeBase>) -> Self {
        Self { knowledge_base }
    }

    /// Record the result of applying a solution.
    ///
    /// Fails with `SolutionNotFound` for unknown ids, leaving the base
    /// unmodified. Returns the updated solution.
    pub fn record_outcome(&self, solution_id: &str, succeeded: bool) -> Result<Solution> {
        let updated = self.knowledge_base.record_outcome(solution_id, succeeded)?;
        info!(
            id = solution_id,
            succeeded,
            successes = updated.success_count,
            failures = updated.failure_count,
            confidence = updated.confidence,
            "outcome recorded"
        );
        Ok(updated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::EngineError;

    fn tracker_with_solution() -> (OutcomeTracker, Arc<KnowledgeBase>) {
        let kb = Arc::new(KnowledgeBase::new());
        kb.add(Solution::new("Extend timeout", "Raise the execution limit").with_id("sol-1"))
            .unwrap();
        (OutcomeTracker::new(kb.clone()), kb)
    }

    #[test]
    fn test_success_and_failure_counted() {
        let (tracker, kb) = tracker_with_solution();
        tracker.record_outcome("sol-1", true).unwrap();
        tracker.record_outcome("sol-1", true).unwrap();
        tracker.record_outcome("sol-1", false).unwrap();
        let solution = kb.get("sol-1").unwrap();
        assert_eq!(solution.success_count, 2);
        assert_eq!(solution.failure_count, 1);
    }

    #[test]
    fn test_unknown_id_is_an_error_and_mutates_nothing() {
        let (tracker, kb) = tracker_with_solution();
        let before = kb.get("sol-1").unwrap();
        assert!(matches!(
            tracker.record_outcome("missing", true),
            Err(EngineError::SolutionNotFound(_))
        ));
        let after = kb.get("sol-1").unwrap();
        assert_eq!(before.success_count, after.success_count);
        assert_eq!(before.failure_count, after.failure_count);
    }

    #[test]
    fn test_confidence_tracks_outcomes() {
        let (tracker, _) = tracker_with_solution();
        let mut last = 0.5;
        for _ in 0..12 {
            let updated = tracker.record_outcome("sol-1", true).unwrap();
            assert!(updated.confidence >= last);
            last = updated.confidence;
        }
        assert!(last > 0.9);
    }
}
