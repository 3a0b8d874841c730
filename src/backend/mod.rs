//! Clustering backends and dispatch.
//!
//! Every backend satisfies the same contract: take learners, a category, and
//! a cluster count, and return one [`ClusterAssignment`] per learner. The
//! set of backends is closed — [`BackendKind`] is an enum, not a string — so
//! an unknown selection is unrepresentable and no request can silently fall
//! through to a default. The caller's choice is final; the dispatcher never
//! falls back from one backend to another.

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{CohortError, Result};
use crate::labeling::TIER_LABELS;
use crate::model::{Category, ClusterAssignment, LearnerRecord};

pub mod enhanced;
pub mod process;
pub mod service;
pub mod simple;

pub use enhanced::EnhancedBackend;
pub use process::{ProcessBackend, ProcessConfig};
pub use service::{ServiceBackend, ServiceConfig};
pub use simple::SimpleBackend;

/// The closed set of clustering backend implementations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// Fixed-threshold rule classifier; ignores `k`
    Simple,
    /// In-process K-Means++ / Lloyd pipeline
    Enhanced,
    /// External clustering executable over a file protocol
    Process,
    /// Remote clustering service over HTTP
    Service,
}

impl BackendKind {
    /// Wire identifier
    pub fn as_str(&self) -> &'static str {
        match self {
            BackendKind::Simple => "simple",
            BackendKind::Enhanced => "enhanced",
            BackendKind::Process => "process",
            BackendKind::Service => "service",
        }
    }

    /// Parse a backend from its wire identifier
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "simple" => Some(BackendKind::Simple),
            "enhanced" => Some(BackendKind::Enhanced),
            "process" => Some(BackendKind::Process),
            "service" => Some(BackendKind::Service),
            _ => None,
        }
    }

    /// Number of clusters a run with the requested `k` actually produces.
    ///
    /// The rule-based backend ignores `k` and always emits the three fixed
    /// tiers; every other backend honors the request. Runs are recorded and
    /// validated against this count, not the requested one.
    pub fn effective_k(&self, requested: usize) -> usize {
        match self {
            BackendKind::Simple => TIER_LABELS.len(),
            _ => requested,
        }
    }

    /// Algorithm name shown on the dashboard
    pub fn algorithm_name(&self) -> &'static str {
        match self {
            BackendKind::Simple => "Rule-Based Thresholds",
            BackendKind::Enhanced => "Enhanced K-Means",
            BackendKind::Process => "External K-Means",
            BackendKind::Service => "Remote K-Means Service",
        }
    }
}

impl std::fmt::Display for BackendKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Uniform contract satisfied by every clustering backend.
pub trait ClusteringBackend: Send + Sync {
    /// Which backend variant this is
    fn kind(&self) -> BackendKind;

    /// Cluster `learners` into `k` groups for `category`.
    ///
    /// Callers guarantee `learners.len() >= k`; the dispatcher enforces it.
    fn run(
        &self,
        learners: &[LearnerRecord],
        category: Category,
        k: usize,
    ) -> Result<Vec<ClusterAssignment>>;
}

/// Routes a request to the caller's chosen backend.
///
/// The process and service backends require configuration; selecting one
/// that was never configured is a [`CohortError::InvalidConfig`], not a
/// fallback to another backend.
pub struct Dispatcher {
    simple: SimpleBackend,
    enhanced: EnhancedBackend,
    process: Option<ProcessBackend>,
    service: Option<ServiceBackend>,
}

impl Dispatcher {
    /// Dispatcher with only the built-in backends available
    pub fn new(enhanced: EnhancedBackend) -> Self {
        Self {
            simple: SimpleBackend,
            enhanced,
            process: None,
            service: None,
        }
    }

    /// Replace the enhanced backend (e.g. to fix its seed)
    pub fn with_enhanced(mut self, enhanced: EnhancedBackend) -> Self {
        self.enhanced = enhanced;
        self
    }

    /// Enable the external-process backend
    pub fn with_process(mut self, process: ProcessBackend) -> Self {
        self.process = Some(process);
        self
    }

    /// Enable the remote-service backend
    pub fn with_service(mut self, service: ServiceBackend) -> Self {
        self.service = Some(service);
        self
    }

    /// Whether the process backend is configured and its executable
    /// resolves. `None` when the backend was never configured.
    pub fn process_available(&self) -> Option<bool> {
        self.process.as_ref().map(ProcessBackend::is_available)
    }

    /// Run the chosen backend.
    ///
    /// Validates `k >= 1` and `learners.len() >= k` before delegating, so
    /// every backend sees the same preconditions.
    pub fn run(
        &self,
        kind: BackendKind,
        learners: &[LearnerRecord],
        category: Category,
        k: usize,
    ) -> Result<Vec<ClusterAssignment>> {
        if k == 0 {
            return Err(CohortError::InvalidConfig("k must be at least 1".into()));
        }
        if learners.len() < k {
            return Err(CohortError::InsufficientData {
                needed: k,
                got: learners.len(),
            });
        }

        let backend: &dyn ClusteringBackend = match kind {
            BackendKind::Simple => &self.simple,
            BackendKind::Enhanced => &self.enhanced,
            BackendKind::Process => self.process.as_ref().ok_or_else(|| {
                CohortError::InvalidConfig("process backend is not configured".into())
            })?,
            BackendKind::Service => self.service.as_ref().ok_or_else(|| {
                CohortError::InvalidConfig("service backend is not configured".into())
            })?,
        };

        info!(
            backend = %kind,
            category = %category,
            learners = learners.len(),
            k,
            "dispatching clustering run"
        );
        backend.run(learners, category, k)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn learners(n: usize) -> Vec<LearnerRecord> {
        (0..n)
            .map(|i| LearnerRecord {
                id: format!("s{}", i),
                literacy_score: 10.0 * i as f64,
                math_score: 8.0 * i as f64,
                total_score: 100.0 * i as f64,
                games_played: i as u32 + 1,
            })
            .collect()
    }

    #[test]
    fn test_backend_kind_roundtrip() {
        for kind in [
            BackendKind::Simple,
            BackendKind::Enhanced,
            BackendKind::Process,
            BackendKind::Service,
        ] {
            assert_eq!(BackendKind::parse(kind.as_str()), Some(kind));
        }
        assert_eq!(BackendKind::parse("weka"), None);
    }

    #[test]
    fn test_dispatcher_rejects_insufficient_data() {
        let dispatcher = Dispatcher::new(EnhancedBackend::default());
        let result = dispatcher.run(BackendKind::Enhanced, &learners(2), Category::All, 3);
        assert!(matches!(
            result,
            Err(CohortError::InsufficientData { needed: 3, got: 2 })
        ));
    }

    #[test]
    fn test_dispatcher_rejects_zero_k() {
        let dispatcher = Dispatcher::new(EnhancedBackend::default());
        let result = dispatcher.run(BackendKind::Simple, &learners(4), Category::All, 0);
        assert!(matches!(result, Err(CohortError::InvalidConfig(_))));
    }

    #[test]
    fn test_unconfigured_backend_is_an_error_not_a_fallback() {
        let dispatcher = Dispatcher::new(EnhancedBackend::default());
        let result = dispatcher.run(BackendKind::Process, &learners(5), Category::All, 3);
        assert!(matches!(result, Err(CohortError::InvalidConfig(_))));

        let result = dispatcher.run(BackendKind::Service, &learners(5), Category::All, 3);
        assert!(matches!(result, Err(CohortError::InvalidConfig(_))));
    }

    #[test]
    fn test_dispatch_reaches_simple_backend() {
        let dispatcher = Dispatcher::new(EnhancedBackend::default());
        let out = dispatcher
            .run(BackendKind::Simple, &learners(4), Category::All, 3)
            .unwrap();
        assert_eq!(out.len(), 4);
    }
}
