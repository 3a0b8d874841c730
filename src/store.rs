//! Result persistence and reporting.
//!
//! [`ResultStore`] keeps clustering runs and their reports, enforcing the
//! one-current-run-per-category invariant. A save is a single critical
//! section: demote prior runs, insert the new one, record the report — all
//! under one write lock, all-or-nothing. Stores can be purely in-memory or
//! backed by a JSON snapshot file written with write-to-temp-then-rename so
//! a crash never leaves a half-written file behind.

use std::path::PathBuf;

use chrono::{DateTime, Duration, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{CohortError, Result};
use crate::model::{Category, ClusterAssignment, ClusterSummary, ClusteringRun, Report};

/// Hours after which a new run is due regardless of activity
const STALE_AFTER_HOURS: i64 = 24;
/// Completed games since the last run that force a new run
const GAMES_PER_RUN: u64 = 10;

#[derive(Debug, Default, Clone, Serialize, Deserialize)]
struct StoreState {
    runs: Vec<ClusteringRun>,
    reports: Vec<StoredReport>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct StoredReport {
    category: Category,
    report: Report,
}

/// Persistent store for clustering runs and reports.
pub struct ResultStore {
    state: RwLock<StoreState>,
    path: Option<PathBuf>,
}

impl ResultStore {
    /// Ephemeral store for testing or one-shot analysis
    pub fn in_memory() -> Self {
        Self {
            state: RwLock::new(StoreState::default()),
            path: None,
        }
    }

    /// Open a file-backed store, loading the snapshot if it exists.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let state = if path.exists() {
            let raw = std::fs::read_to_string(&path)?;
            serde_json::from_str(&raw)?
        } else {
            StoreState::default()
        };
        Ok(Self {
            state: RwLock::new(state),
            path: Some(path),
        })
    }

    /// Persist a run and its report atomically.
    ///
    /// Demotes every prior run for the run's category, inserts `run` as
    /// current, and records `report` — one critical section, so concurrent
    /// saves cannot interleave and leave two current runs. If the snapshot
    /// write fails, the in-memory state is rolled back and the prior current
    /// run stays untouched.
    pub fn save(&self, mut run: ClusteringRun, report: Report) -> Result<()> {
        for assignment in &run.assignments {
            if assignment.cluster >= run.k {
                return Err(CohortError::Persistence(format!(
                    "assignment cluster {} out of range for k={}",
                    assignment.cluster, run.k
                )));
            }
        }

        let mut state = self.state.write();
        let rollback = state.clone();

        for prior in state.runs.iter_mut().filter(|r| r.category == run.category) {
            prior.is_current = false;
        }
        run.is_current = true;
        let category = run.category;
        state.runs.push(run);
        state.reports.push(StoredReport { category, report });

        if let Err(e) = self.write_snapshot(&state) {
            *state = rollback;
            return Err(CohortError::Persistence(format!(
                "snapshot write failed: {}",
                e
            )));
        }

        info!(category = %category, "clustering run persisted");
        Ok(())
    }

    /// The authoritative run for a category, if any.
    pub fn current_run(&self, category: Category) -> Option<ClusteringRun> {
        self.state
            .read()
            .runs
            .iter()
            .rev()
            .find(|r| r.category == category && r.is_current)
            .cloned()
    }

    /// The most recent report for a category, if any.
    pub fn latest_report(&self, category: Category) -> Option<Report> {
        self.state
            .read()
            .reports
            .iter()
            .rev()
            .find(|r| r.category == category)
            .map(|r| r.report.clone())
    }

    /// When the current run for a category was produced.
    pub fn last_run_at(&self, category: Category) -> Option<DateTime<Utc>> {
        self.current_run(category).map(|r| r.analyzed_at)
    }

    fn write_snapshot(&self, state: &StoreState) -> std::io::Result<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        let bytes = serde_json::to_vec_pretty(state)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        let tmp = path.with_extension("tmp");
        std::fs::write(&tmp, bytes)?;
        std::fs::rename(&tmp, path)?;
        debug!(path = %path.display(), "store snapshot written");
        Ok(())
    }
}

/// Build the per-cluster summary report for a completed run.
///
/// Pure function: counts learners per cluster index and computes each
/// cluster's share of the total, rounded to 1 decimal place. Every one of
/// the run's `num_clusters` clusters is reported in index order, empty ones
/// included — an unpopulated tier shows up with its label and a count of
/// zero rather than vanishing from the report.
pub fn build_report(
    total_learners: usize,
    num_clusters: usize,
    assignments: &[ClusterAssignment],
) -> Report {
    let labels = crate::labeling::report_labels(assignments, num_clusters);

    let mut clusters = Vec::with_capacity(num_clusters);
    for (cluster, label) in labels.into_iter().enumerate() {
        let count = assignments.iter().filter(|a| a.cluster == cluster).count();
        let percentage = if total_learners > 0 {
            (count as f64 / total_learners as f64 * 1000.0).round() / 10.0
        } else {
            0.0
        };
        clusters.push(ClusterSummary {
            label,
            count,
            percentage,
        });
    }

    Report {
        analysis_date: Utc::now(),
        total_learners,
        num_clusters,
        clusters,
    }
}

/// Whether a new clustering run is due.
///
/// True when no prior run exists, when the last run is at least 24 hours
/// old, or when at least 10 game sessions completed since it.
pub fn should_run(last_run_at: Option<DateTime<Utc>>, new_completed_games: u64) -> bool {
    match last_run_at {
        None => true,
        Some(at) => {
            Utc::now() - at >= Duration::hours(STALE_AFTER_HOURS)
                || new_completed_games >= GAMES_PER_RUN
        }
    }
}
