//! Knowledge base: solution store and similarity search
//!
//! Solutions live in a `DashMap` so mutations to different records proceed
//! concurrently while updates to one record serialize on its entry lock.
//! Similarity search runs over a TF-IDF index of title+description that is
//! rebuilt lazily whenever the indexed text has changed; a search sees
//! either a fully inserted solution or none of it, never a partial record.

use super::models::{KnowledgeBaseStats, Solution};
use crate::error::{EngineError, Result};
use crate::text::{cosine_similarity, SparseVector, TfIdfVectorizer};
use dashmap::DashMap;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::RwLock;
use tracing::{debug, info};

/// Vocabulary settings for the search index; solution descriptions are
/// short, so bigrams are enough.
const INDEX_MAX_FEATURES: usize = 500;
const INDEX_NGRAM_MAX: usize = 2;

struct SearchIndex {
    vectorizer: TfIdfVectorizer,
    vectors: HashMap<String, SparseVector>,
    /// Text version this index was built from
    version: u64,
}

/// Durable collection of solutions keyed by unique id
pub struct KnowledgeBase {
    solutions: DashMap<String, Solution>,
    index: RwLock<Option<SearchIndex>>,
    /// Bumped whenever indexed text changes (add/update), not on outcome
    /// counter updates
    text_version: AtomicU64,
}

impl KnowledgeBase {
    pub fn new() -> Self {
        Self {
            solutions: DashMap::new(),
            index: RwLock::new(None),
            text_version: AtomicU64::new(0),
        }
    }

    /// Add a new solution.
    ///
    /// Fails with `DuplicateId` if the id is already present and with
    /// `InvalidInput` if there is no text to index.
    pub fn add(&self, solution: Solution) -> Result<()> {
        if solution.title.trim().is_empty() && solution.description.trim().is_empty() {
            return Err(EngineError::InvalidInput(
                "solution needs a title or description".to_string(),
            ));
        }
        match self.solutions.entry(solution.id.clone()) {
            dashmap::mapref::entry::Entry::Occupied(_) => {
                Err(EngineError::DuplicateId(solution.id))
            }
            dashmap::mapref::entry::Entry::Vacant(entry) => {
                info!(id = %solution.id, title = %solution.title, "solution added");
                entry.insert(solution);
                self.text_version.fetch_add(1, Ordering::SeqCst);
                Ok(())
            }
        }
    }

    /// Replace an existing solution; fails with `SolutionNotFound` if absent
    pub fn update(&self, solution: Solution) -> Result<()> {
        match self.solutions.entry(solution.id.clone()) {
            dashmap::mapref::entry::Entry::Occupied(mut entry) => {
                entry.insert(solution);
                self.text_version.fetch_add(1, Ordering::SeqCst);
                Ok(())
            }
            dashmap::mapref::entry::Entry::Vacant(_) => {
                Err(EngineError::SolutionNotFound(solution.id))
            }
        }
    }

    /// Fetch a solution by id
    pub fn get(&self, id: &str) -> Result<Solution> {
        self.solutions
            .get(id)
            .map(|entry| entry.clone())
            .ok_or_else(|| EngineError::SolutionNotFound(id.to_string()))
    }

    /// Record an application outcome on the referenced solution.
    ///
    /// The increment happens under the record's entry lock, so concurrent
    /// updates to the same id never lose a count.
    pub fn record_outcome(&self, id: &str, succeeded: bool) -> Result<Solution> {
        let mut entry = self
            .solutions
            .get_mut(id)
            .ok_or_else(|| EngineError::SolutionNotFound(id.to_string()))?;
        entry.record_outcome(succeeded);
        Ok(entry.clone())
    }

    /// Similarity search over title+description.
    ///
    /// Returns up to `top_k` solutions with cosine similarity ≥
    /// `min_similarity`, ordered by similarity, then historical confidence,
    /// then recency, then id — a total order, so results are deterministic
    /// for identical contents.
    pub fn search(&self, query: &str, top_k: usize, min_similarity: f32) -> Vec<(Solution, f32)> {
        if self.solutions.is_empty() {
            return Vec::new();
        }
        self.ensure_index();

        let guard = match self.index.read() {
            Ok(guard) => guard,
            Err(_) => return Vec::new(),
        };
        let Some(index) = guard.as_ref() else {
            return Vec::new();
        };

        let query_vector = index.vectorizer.transform(query);
        if query_vector.is_empty() {
            return Vec::new();
        }

        let mut scored: Vec<(Solution, f32)> = Vec::new();
        for entry in self.solutions.iter() {
            let Some(vector) = index.vectors.get(entry.key()) else {
                // Added after the index was built; skipping is allowed by
                // the snapshot contract and the next search will see it.
                continue;
            };
            let similarity = cosine_similarity(&query_vector, vector);
            if similarity >= min_similarity {
                scored.push((entry.value().clone(), similarity));
            }
        }

        scored.sort_by(|a, b| {
            b.1.partial_cmp(&a.1)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| {
                    b.0.confidence
                        .partial_cmp(&a.0.confidence)
                        .unwrap_or(std::cmp::Ordering::Equal)
                })
                .then_with(|| b.0.last_updated_at.cmp(&a.0.last_updated_at))
                .then_with(|| a.0.id.cmp(&b.0.id))
        });
        scored.truncate(top_k);

        debug!(
            query_len = query.len(),
            results = scored.len(),
            "similarity search complete"
        );
        scored
    }

    /// Rebuild the search index if the stored text has changed since the
    /// last build.
    fn ensure_index(&self) {
        let current = self.text_version.load(Ordering::SeqCst);
        if let Ok(guard) = self.index.read() {
            if guard.as_ref().map(|i| i.version) == Some(current) {
                return;
            }
        }

        let Ok(mut guard) = self.index.write() else {
            return;
        };
        // Another thread may have rebuilt while we waited for the lock
        if guard.as_ref().map(|i| i.version) == Some(current) {
            return;
        }

        let entries: Vec<(String, String)> = self
            .solutions
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().search_text()))
            .collect();
        let documents: Vec<String> = entries.iter().map(|(_, text)| text.clone()).collect();
        let vectorizer = TfIdfVectorizer::fit(&documents, INDEX_MAX_FEATURES, INDEX_NGRAM_MAX);
        let vectors = entries
            .into_iter()
            .map(|(id, text)| {
                let vector = vectorizer.transform(&text);
                (id, vector)
            })
            .collect();

        debug!(
            solutions = documents.len(),
            features = vectorizer.feature_count(),
            "search index rebuilt"
        );
        *guard = Some(SearchIndex {
            vectorizer,
            vectors,
            version: current,
        });
    }

    pub fn len(&self) -> usize {
        self.solutions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.solutions.is_empty()
    }

    /// Snapshot of every solution, for the external persistence layer
    pub fn export(&self) -> Vec<Solution> {
        let mut all: Vec<Solution> = self
            .solutions
            .iter()
            .map(|entry| entry.value().clone())
            .collect();
        all.sort_by(|a, b| a.id.cmp(&b.id));
        all
    }

    /// Bulk-load solutions at startup; duplicate ids are rejected
    pub fn import(&self, solutions: Vec<Solution>) -> Result<usize> {
        let count = solutions.len();
        for solution in solutions {
            self.add(solution)?;
        }
        info!(count, "knowledge base loaded");
        Ok(count)
    }

    /// Aggregate statistics over the stored solutions
    pub fn stats(&self) -> KnowledgeBaseStats {
        let mut total_applications = 0u64;
        let mut successful_applications = 0u64;
        let mut category_distribution = std::collections::BTreeMap::new();

        for entry in self.solutions.iter() {
            let solution = entry.value();
            total_applications += (solution.success_count + solution.failure_count) as u64;
            successful_applications += solution.success_count as u64;
            for &category in &solution.categories {
                *category_distribution.entry(category).or_insert(0) += 1;
            }
        }

        KnowledgeBaseStats {
            total_solutions: self.solutions.len(),
            total_applications,
            successful_applications,
            overall_success_rate: if total_applications > 0 {
                successful_applications as f32 / total_applications as f32
            } else {
                0.0
            },
            category_distribution,
        }
    }
}

impl Default for KnowledgeBase {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::IssueCategory;

    fn contact_solution() -> Solution {
        Solution::new(
            "Increase contact force",
            "Raise the probe contact force to restore contact resistance margins",
        )
        .with_id("sol-contact-force")
        .with_categories(vec![IssueCategory::ContactFailure])
    }

    #[test]
    fn test_add_and_get() {
        let kb = KnowledgeBase::new();
        kb.add(contact_solution()).unwrap();
        let fetched = kb.get("sol-contact-force").unwrap();
        assert_eq!(fetched.title, "Increase contact force");
    }

    #[test]
    fn test_duplicate_id_rejected() {
        let kb = KnowledgeBase::new();
        kb.add(contact_solution()).unwrap();
        assert!(matches!(
            kb.add(contact_solution()),
            Err(EngineError::DuplicateId(_))
        ));
        assert_eq!(kb.len(), 1);
    }

    #[test]
    fn test_get_unknown_id() {
        let kb = KnowledgeBase::new();
        assert!(matches!(
            kb.get("missing"),
            Err(EngineError::SolutionNotFound(_))
        ));
    }

    #[test]
    fn test_blank_solution_rejected() {
        let kb = KnowledgeBase::new();
        let blank = Solution::new("", "  ");
        assert!(matches!(kb.add(blank), Err(EngineError::InvalidInput(_))));
    }

    #[test]
    fn test_update_requires_existing() {
        let kb = KnowledgeBase::new();
        assert!(matches!(
            kb.update(contact_solution()),
            Err(EngineError::SolutionNotFound(_))
        ));
        kb.add(contact_solution()).unwrap();
        let mut revised = contact_solution();
        revised.description = "Also clean probe tips".to_string();
        kb.update(revised).unwrap();
        assert!(kb.get("sol-contact-force").unwrap().description.contains("probe tips"));
    }

    #[test]
    fn test_search_empty_base() {
        let kb = KnowledgeBase::new();
        assert!(kb.search("contact failure pin 5", 5, 0.1).is_empty());
    }

    #[test]
    fn test_search_finds_similar_solution() {
        let kb = KnowledgeBase::new();
        kb.add(contact_solution()).unwrap();
        kb.add(
            Solution::new("Extend timeout", "Raise the test execution timeout limit")
                .with_id("sol-timeout"),
        )
        .unwrap();

        let results = kb.search("contact resistance out of spec", 5, 0.05);
        assert!(!results.is_empty());
        assert_eq!(results[0].0.id, "sol-contact-force");
    }

    #[test]
    fn test_search_respects_min_similarity() {
        let kb = KnowledgeBase::new();
        kb.add(contact_solution()).unwrap();
        let results = kb.search("contact resistance out of spec", 5, 0.999);
        for (_, similarity) in &results {
            assert!(*similarity >= 0.999);
        }
    }

    #[test]
    fn test_search_sees_solutions_added_later() {
        let kb = KnowledgeBase::new();
        kb.add(contact_solution()).unwrap();
        let _ = kb.search("contact", 5, 0.0);
        kb.add(
            Solution::new("Remount device", "Reseat the device in the socket")
                .with_id("sol-remount"),
        )
        .unwrap();
        let results = kb.search("reseat device socket", 5, 0.05);
        assert!(results.iter().any(|(s, _)| s.id == "sol-remount"));
    }

    #[test]
    fn test_record_outcome_updates_counts() {
        let kb = KnowledgeBase::new();
        kb.add(contact_solution()).unwrap();
        let updated = kb.record_outcome("sol-contact-force", true).unwrap();
        assert_eq!(updated.success_count, 1);
        assert!(matches!(
            kb.record_outcome("missing", true),
            Err(EngineError::SolutionNotFound(_))
        ));
    }

    #[test]
    fn test_export_import_roundtrip() {
        let kb = KnowledgeBase::new();
        kb.add(contact_solution()).unwrap();
        let snapshot = kb.export();

        let restored = KnowledgeBase::new();
        restored.import(snapshot).unwrap();
        assert_eq!(restored.len(), 1);
        assert!(restored.get("sol-contact-force").is_ok());
    }

    #[test]
    fn test_stats() {
        let kb = KnowledgeBase::new();
        kb.add(contact_solution().with_outcomes(8, 2)).unwrap();
        let stats = kb.stats();
        assert_eq!(stats.total_solutions, 1);
        assert_eq!(stats.total_applications, 10);
        assert!((stats.overall_success_rate - 0.8).abs() < 1e-6);
        assert_eq!(
            stats.category_distribution[&IssueCategory::ContactFailure],
            1
        );
    }
}
