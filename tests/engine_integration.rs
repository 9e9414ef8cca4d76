//! Integration tests for the remediation engine
//!
//! These tests exercise the full classify/train/recommend/record-outcome
//! cycle through the public engine facade, the way the surrounding
//! remediation pipeline drives it.

use remediation_engine::{
    ClassifierSource, EngineConfig, IssueCategory, LabeledExample, RemediationEngine, Solution,
    SolutionContext,
};
use std::sync::Once;

static TRACING: Once = Once::new();

fn init_tracing() {
    TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::from_default_env(),
            )
            .with_test_writer()
            .try_init();
    });
}

fn trained_engine() -> RemediationEngine {
    init_tracing();
    let engine = RemediationEngine::with_defaults().unwrap();
    engine
        .train(&remediation_engine::classify::dataset::seed_examples())
        .unwrap();
    engine
}

#[test]
fn test_known_failure_full_cycle() {
    // A familiar timeout failure with a proven fix on record: classify,
    // recommend, auto-apply, report success.
    let engine = trained_engine();
    engine
        .add_solution(
            Solution::new(
                "Extend test execution timeout",
                "Raise the execution timeout limit so the long measurement sequence can complete",
            )
            .with_id("sol-timeout")
            .with_categories(vec![IssueCategory::Timeout])
            .with_outcomes(8, 2),
        )
        .unwrap();

    let result = engine.classify("test execution exceeded the timeout limit");
    assert_eq!(result.primary, Some(IssueCategory::Timeout));
    assert_eq!(result.source, ClassifierSource::Blended);

    let list = engine.recommend(
        "test execution exceeded the timeout limit",
        result.primary,
        None,
        5,
        0.05,
    );
    assert!(!list.is_empty());
    assert_eq!(list.top().unwrap().solution.id, "sol-timeout");

    engine.record_outcome("sol-timeout", true).unwrap();
    let updated = engine
        .export_solutions()
        .into_iter()
        .find(|s| s.id == "sol-timeout")
        .unwrap();
    assert_eq!(updated.success_count, 9);
    assert!(updated.confidence > 0.8);
}

#[test]
fn test_confidence_is_raw_rate_past_cutoff() {
    // Eight successes and two failures is past the smoothing cutoff, so
    // the derived confidence is the raw success rate.
    let engine = RemediationEngine::with_defaults().unwrap();
    engine
        .add_solution(
            Solution::new("Re-seat probe card", "Re-seat the probe card and re-run contact check")
                .with_id("sol-reseat")
                .with_outcomes(8, 2),
        )
        .unwrap();
    let solution = engine
        .export_solutions()
        .into_iter()
        .find(|s| s.id == "sol-reseat")
        .unwrap();
    assert!((solution.confidence - 0.8).abs() < 1e-6);
}

#[test]
fn test_untrained_engine_classifies_with_rules() {
    // No model trained or loaded: keyword rules still produce a ranking
    // and the result is marked as rules-sourced.
    let engine = RemediationEngine::with_defaults().unwrap();
    assert!(!engine.model_info().trained);

    let result = engine.classify("undefined reference during linking stage");
    assert_eq!(result.source, ClassifierSource::Rules);
    assert_eq!(result.primary, Some(IssueCategory::LinkingError));
}

#[test]
fn test_unknown_solution_id_rejected() {
    let engine = RemediationEngine::with_defaults().unwrap();
    assert!(engine.record_outcome("no-such-solution", true).is_err());
}

#[test]
fn test_empty_knowledge_base_yields_empty_list() {
    let engine = trained_engine();
    let list = engine.recommend_default("contact failure on pin 12", None, None);
    assert!(list.is_empty());
    assert!(list.auto_applicable().is_none());
}

#[test]
fn test_classification_ranking_sorted_and_idempotent() {
    let engine = trained_engine();
    let text = "calibration reference drift outside tolerance";

    let first = engine.classify(text);
    for pair in first.ranked.windows(2) {
        assert!(pair[0].confidence >= pair[1].confidence);
    }
    for score in &first.ranked {
        assert!((0.0..=1.0).contains(&score.confidence));
    }

    let second = engine.classify(text);
    assert_eq!(first.primary, second.primary);
    assert_eq!(first.ranked.len(), second.ranked.len());
    for (a, b) in first.ranked.iter().zip(&second.ranked) {
        assert_eq!(a.category, b.category);
        assert_eq!(a.confidence, b.confidence);
    }
}

#[test]
fn test_outcomes_shift_future_ranking() {
    // Two near-identical solutions; a run of failures on one must drop it
    // below the other on the next recommendation.
    let engine = RemediationEngine::with_defaults().unwrap();
    for id in ["sol-a", "sol-b"] {
        engine
            .add_solution(
                Solution::new(
                    "Adjust contact force",
                    "Adjust the probe contact force to restore margins",
                )
                .with_id(id),
            )
            .unwrap();
    }
    for _ in 0..10 {
        engine.record_outcome("sol-a", false).unwrap();
        engine.record_outcome("sol-b", true).unwrap();
    }

    let list = engine.recommend("adjust contact force margins", None, None, 5, 0.0);
    assert_eq!(list.top().unwrap().solution.id, "sol-b");
}

#[test]
fn test_context_excludes_incompatible_solutions() {
    let engine = RemediationEngine::with_defaults().unwrap();
    engine
        .add_solution(
            Solution::new("Retune leakage test", "Retune the leakage measurement ranges")
                .with_id("sol-scoped")
                .with_modules(vec!["leakage_tests".to_string()])
                .with_baselines(vec!["2.4.*".to_string()]),
        )
        .unwrap();

    let mut context = SolutionContext::for_module("leakage_tests");
    context.baseline_version = Some("2.4.7".to_string());
    let list = engine.recommend("leakage measurement out of range", None, Some(&context), 5, 0.0);
    assert!(!list.is_empty());

    context.baseline_version = Some("3.0.1".to_string());
    let list = engine.recommend("leakage measurement out of range", None, Some(&context), 5, 0.0);
    assert!(list.is_empty());
}

#[test]
fn test_at_most_one_auto_applicable_and_gated() {
    let engine = RemediationEngine::with_defaults().unwrap();
    engine
        .add_solution(
            Solution::new("Restart device controller", "restart the device controller service")
                .with_id("sol-proven")
                .with_outcomes(19, 1),
        )
        .unwrap();
    engine
        .add_solution(
            Solution::new("Restart device host", "restart the device controller host machine")
                .with_id("sol-risky")
                .with_outcomes(2, 8),
        )
        .unwrap();

    let list = engine.recommend("restart the device controller service", None, None, 5, 0.0);
    let auto: Vec<_> = list
        .recommendations
        .iter()
        .filter(|r| r.auto_applicable)
        .collect();
    assert!(auto.len() <= 1);
    if let Some(auto) = list.auto_applicable() {
        assert_eq!(auto.solution.id, list.top().unwrap().solution.id);
        assert!(auto.similarity >= 0.8);
        assert!(auto.solution.confidence >= 0.8);
    }
}

#[test]
fn test_model_export_reload_preserves_predictions() {
    let trained = trained_engine();
    let blob = trained.export_model().unwrap();

    let restored = RemediationEngine::with_defaults().unwrap();
    restored.load_model(&blob).unwrap();
    assert!(restored.model_info().trained);

    let text = "compilation failed with undefined symbol";
    assert_eq!(trained.classify(text).primary, restored.classify(text).primary);
}

#[test]
fn test_training_rejects_single_class() {
    let engine = RemediationEngine::with_defaults().unwrap();
    let examples = vec![
        LabeledExample {
            text: "timeout waiting for measurement".to_string(),
            category: IssueCategory::Timeout,
        },
        LabeledExample {
            text: "execution exceeded time limit".to_string(),
            category: IssueCategory::Timeout,
        },
    ];
    assert!(engine.train(&examples).is_err());
    assert!(!engine.model_info().trained);
}

#[test]
fn test_solution_snapshot_roundtrip() -> anyhow::Result<()> {
    let engine = RemediationEngine::with_defaults()?;
    engine.add_solution(
        Solution::new("Fix fixture ground", "Re-crimp the fixture ground strap")
            .with_id("sol-ground")
            .with_outcomes(3, 1),
    )?;
    let snapshot = engine.export_solutions();

    let restored = RemediationEngine::new(EngineConfig::default())?;
    let loaded = restored.load_solutions(snapshot)?;
    assert_eq!(loaded, 1);
    let solution = restored
        .export_solutions()
        .into_iter()
        .find(|s| s.id == "sol-ground")
        .unwrap();
    assert_eq!(solution.success_count, 3);
    assert_eq!(solution.failure_count, 1);
    Ok(())
}
