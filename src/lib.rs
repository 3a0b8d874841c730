//! # Cohort - Learner Performance Clustering Engine
//!
//! Cohort groups learners into performance tiers for a teacher-facing
//! dashboard. It turns raw per-learner aggregate metrics into labeled
//! clusters through a pluggable-backend pipeline: the same contract is
//! satisfied by a rule-based classifier, an in-process K-Means
//! implementation, an external clustering executable, or a remote
//! clustering service.
//!
//! ## Quick Start
//!
//! ```rust
//! use cohort::{AnalysisEngine, BackendKind, Category, LearnerRecord, ResultStore};
//!
//! let learners = vec![
//!     LearnerRecord { id: "s1".into(), literacy_score: 90.0, math_score: 85.0, total_score: 700.0, games_played: 9 },
//!     LearnerRecord { id: "s2".into(), literacy_score: 50.0, math_score: 55.0, total_score: 400.0, games_played: 6 },
//!     LearnerRecord { id: "s3".into(), literacy_score: 10.0, math_score: 15.0, total_score: 100.0, games_played: 3 },
//! ];
//!
//! let engine = AnalysisEngine::new(ResultStore::in_memory()).with_seed(42);
//! let response = engine.run(&learners, Category::All, 3, BackendKind::Enhanced);
//!
//! assert!(response.success);
//! let report = response.report.unwrap();
//! assert_eq!(report.total_learners, 3);
//! ```
//!
//! ## Backends
//!
//! - **Simple**: fixed thresholds on combined literacy+math score; ignores
//!   `k`, cannot fail.
//! - **Enhanced**: feature extraction → min-max normalization → K-Means++
//!   seeding → Lloyd iteration → tier labeling, all in process.
//! - **Process**: hands normalized features to an external executable over
//!   a positional file protocol, bounded by a wall-clock timeout.
//! - **Service**: blocking HTTP POST to a remote clustering service, joined
//!   back by learner id.
//!
//! The backend set is closed and the caller's choice is final; the engine
//! never falls back between backends.
//!
//! ## Persistence
//!
//! ```rust,no_run
//! use cohort::{AnalysisEngine, ResultStore};
//!
//! fn main() -> cohort::Result<()> {
//!     // File-backed store: runs and reports survive restarts.
//!     let store = ResultStore::open("clustering.json")?;
//!     let engine = AnalysisEngine::new(store);
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]

// ── Core ──────────────────────────────────────────────────────────────────────
// Fundamental types: learner records, errors, and the analysis data model.
pub mod error;
pub mod model;

// ── Clustering Pipeline ──────────────────────────────────────────────────────
// Pure stages composed by the enhanced backend.
pub mod features;
pub mod kmeans;
pub mod labeling;

// ── Backends & Dispatch ──────────────────────────────────────────────────────
pub mod backend;

// ── Persistence & Facade ─────────────────────────────────────────────────────
pub mod engine;
pub mod store;

// ── Stable API ───────────────────────────────────────────────────────────────
// These types form the core stable API surface.
pub use backend::{
    BackendKind, ClusteringBackend, Dispatcher, EnhancedBackend, ProcessBackend, ProcessConfig,
    ServiceBackend, ServiceConfig, SimpleBackend,
};
pub use engine::{AnalysisEngine, ClusteringStatus};
pub use error::{CohortError, ErrorCode, Result};
pub use kmeans::{KMeans, KMeansConfig, KMeansFit};
pub use model::{
    ApiResponse, Category, ClusterAssignment, ClusterSummary, ClusteringRun, LearnerRecord, Report,
};
pub use store::{build_report, should_run, ResultStore};
