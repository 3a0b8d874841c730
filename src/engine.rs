//! Analysis engine facade.
//!
//! [`AnalysisEngine`] is the single entry point the platform calls: it
//! validates the request, dispatches to the chosen backend, persists the
//! run, and normalizes every outcome into the [`ApiResponse`] envelope the
//! dashboard consumes. Nothing is persisted on failure.
//!
//! # Example
//!
//! ```rust
//! use cohort::engine::AnalysisEngine;
//! use cohort::backend::BackendKind;
//! use cohort::model::{Category, LearnerRecord};
//! use cohort::store::ResultStore;
//!
//! let engine = AnalysisEngine::new(ResultStore::in_memory()).with_seed(42);
//! let learners: Vec<LearnerRecord> = vec![/* from the learner store */];
//!
//! let response = engine.run(&learners, Category::All, 3, BackendKind::Simple);
//! assert!(!response.success); // no learners yet
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::backend::{
    BackendKind, Dispatcher, EnhancedBackend, ProcessBackend, ProcessConfig, ServiceBackend,
    ServiceConfig,
};
use crate::error::Result;
use crate::model::{ApiResponse, Category, ClusteringRun, LearnerRecord, Report};
use crate::store::{self, ResultStore};

/// Scheduling and last-run information for one category.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClusteringStatus {
    /// When the current run was produced, if any
    pub last_run_at: Option<DateTime<Utc>>,
    /// Completed game sessions since the last run
    pub new_games_since_last: u64,
    /// Whether a new run is due
    pub should_run: bool,
}

/// Top-level clustering analysis engine.
pub struct AnalysisEngine {
    dispatcher: Dispatcher,
    store: ResultStore,
}

impl AnalysisEngine {
    /// Engine with the built-in backends and the given result store
    pub fn new(store: ResultStore) -> Self {
        Self {
            dispatcher: Dispatcher::new(EnhancedBackend::default()),
            store,
        }
    }

    /// Fix the K-Means PRNG seed for reproducible enhanced runs
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.dispatcher = self
            .dispatcher
            .with_enhanced(EnhancedBackend::default().with_seed(seed));
        self
    }

    /// Enable the external-process backend
    pub fn with_process(mut self, config: ProcessConfig) -> Self {
        self.dispatcher = self.dispatcher.with_process(ProcessBackend::new(config));
        self
    }

    /// Enable the remote-service backend
    pub fn with_service(mut self, config: ServiceConfig) -> Result<Self> {
        self.dispatcher = self.dispatcher.with_service(ServiceBackend::new(config)?);
        Ok(self)
    }

    /// Run a clustering analysis and persist the result.
    ///
    /// Every error is normalized into a failure envelope; a successful
    /// response carries the report, category, and algorithm name.
    pub fn run(
        &self,
        learners: &[LearnerRecord],
        category: Category,
        k: usize,
        backend: BackendKind,
    ) -> ApiResponse {
        match self.execute(learners, category, k, backend) {
            Ok(report) => {
                let message = format!(
                    "{} clustering completed successfully",
                    category.display_name()
                );
                info!(category = %category, backend = %backend, "{}", message);
                ApiResponse::completed(message, report, category, backend.algorithm_name())
            }
            Err(e) => {
                warn!(category = %category, backend = %backend, error = %e, "clustering run failed");
                ApiResponse::failure(e.to_string())
            }
        }
    }

    fn execute(
        &self,
        learners: &[LearnerRecord],
        category: Category,
        k: usize,
        backend: BackendKind,
    ) -> Result<Report> {
        let assignments = self.dispatcher.run(backend, learners, category, k)?;
        // The rule-based backend ignores the requested k and always emits
        // the three fixed tiers; record and report the count it produced.
        let k = backend.effective_k(k);
        let report = store::build_report(learners.len(), k, &assignments);

        let run = ClusteringRun {
            category,
            k,
            backend,
            analyzed_at: report.analysis_date,
            assignments,
            is_current: true,
        };
        self.store.save(run, report.clone())?;
        Ok(report)
    }

    /// Scheduling status for a category, given the number of game sessions
    /// completed since the last run (counted by the session tracker).
    pub fn status(&self, category: Category, new_completed_games: u64) -> ClusteringStatus {
        let last_run_at = self.store.last_run_at(category);
        ClusteringStatus {
            last_run_at,
            new_games_since_last: new_completed_games,
            should_run: store::should_run(last_run_at, new_completed_games),
        }
    }

    /// The authoritative run for a category (dashboard read path)
    pub fn current_run(&self, category: Category) -> Option<ClusteringRun> {
        self.store.current_run(category)
    }

    /// The most recent report for a category (dashboard read path)
    pub fn latest_report(&self, category: Category) -> Option<Report> {
        self.store.latest_report(category)
    }

    /// Whether the process backend's executable resolves; `None` when that
    /// backend is not configured
    pub fn process_available(&self) -> Option<bool> {
        self.dispatcher.process_available()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn learner(id: &str, lit: f64, math: f64) -> LearnerRecord {
        LearnerRecord {
            id: id.into(),
            literacy_score: lit,
            math_score: math,
            total_score: lit + math,
            games_played: 4,
        }
    }

    fn six_learners() -> Vec<LearnerRecord> {
        vec![
            learner("s1", 90.0, 85.0),
            learner("s2", 88.0, 80.0),
            learner("s3", 50.0, 55.0),
            learner("s4", 48.0, 52.0),
            learner("s5", 10.0, 15.0),
            learner("s6", 12.0, 18.0),
        ]
    }

    #[test]
    fn test_successful_run_envelope() {
        let engine = AnalysisEngine::new(ResultStore::in_memory()).with_seed(42);
        let response = engine.run(&six_learners(), Category::All, 3, BackendKind::Enhanced);

        assert!(response.success);
        assert_eq!(response.message, "Overall clustering completed successfully");
        assert_eq!(response.algorithm.as_deref(), Some("Enhanced K-Means"));
        assert_eq!(response.category, Some(Category::All));
        let report = response.report.unwrap();
        assert_eq!(report.total_learners, 6);
        assert_eq!(report.num_clusters, 3);
    }

    #[test]
    fn test_insufficient_data_leaves_no_state() {
        let engine = AnalysisEngine::new(ResultStore::in_memory());
        let two = vec![learner("a", 50.0, 50.0), learner("b", 60.0, 60.0)];
        let response = engine.run(&two, Category::All, 3, BackendKind::Enhanced);

        assert!(!response.success);
        assert!(response.message.contains("at least 3"));
        assert!(response.report.is_none());
        assert!(engine.current_run(Category::All).is_none());
        assert!(engine.latest_report(Category::All).is_none());
    }

    #[test]
    fn test_simple_backend_persists_regardless_of_requested_k() {
        // The rule classifier always buckets into the three tiers, so a run
        // requested with k=2 must still persist with the tier count it
        // actually produced.
        let engine = AnalysisEngine::new(ResultStore::in_memory());
        let low = vec![learner("a", 40.0, 40.0), learner("b", 45.0, 45.0)];
        let response = engine.run(&low, Category::All, 2, BackendKind::Simple);

        assert!(response.success, "{}", response.message);
        let run = engine.current_run(Category::All).unwrap();
        assert_eq!(run.k, 3);
        assert!(run.assignments.iter().all(|a| a.cluster < run.k));

        // Both learners land in the bottom tier; the other tiers report
        // zero members under their own labels.
        let report = response.report.unwrap();
        assert_eq!(report.num_clusters, 3);
        assert_eq!(report.clusters[0].label, "High Achievers");
        assert_eq!(report.clusters[0].count, 0);
        assert_eq!(report.clusters[1].label, "Average Performers");
        assert_eq!(report.clusters[1].count, 0);
        assert_eq!(report.clusters[2].label, "Needs Support");
        assert_eq!(report.clusters[2].count, 2);
    }

    #[test]
    fn test_failed_run_preserves_prior_current_run() {
        let engine = AnalysisEngine::new(ResultStore::in_memory()).with_seed(1);
        let learners = six_learners();
        assert!(engine.run(&learners, Category::All, 3, BackendKind::Enhanced).success);
        let before = engine.current_run(Category::All).unwrap();

        let two = vec![learner("a", 50.0, 50.0), learner("b", 60.0, 60.0)];
        assert!(!engine.run(&two, Category::All, 3, BackendKind::Enhanced).success);

        let after = engine.current_run(Category::All).unwrap();
        assert_eq!(before.analyzed_at, after.analyzed_at);
        assert_eq!(before.assignments.len(), after.assignments.len());
    }

    #[test]
    fn test_status_reflects_store() {
        let engine = AnalysisEngine::new(ResultStore::in_memory()).with_seed(1);

        let status = engine.status(Category::All, 0);
        assert!(status.last_run_at.is_none());
        assert!(status.should_run);

        engine.run(&six_learners(), Category::All, 3, BackendKind::Enhanced);
        let status = engine.status(Category::All, 4);
        assert!(status.last_run_at.is_some());
        assert!(!status.should_run);

        let status = engine.status(Category::All, 12);
        assert!(status.should_run);
    }

    #[test]
    fn test_process_availability_probe() {
        let engine = AnalysisEngine::new(ResultStore::in_memory());
        assert_eq!(engine.process_available(), None);

        let engine = AnalysisEngine::new(ResultStore::in_memory())
            .with_process(ProcessConfig::new("/nonexistent/tool"));
        assert_eq!(engine.process_available(), Some(false));
    }
}
