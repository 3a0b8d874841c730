//! Core data model: learner records, categories, cluster assignments,
//! clustering runs, and dashboard reports.
//!
//! [`LearnerRecord`] is read-only input owned by the platform's learner
//! store; everything else is produced by the engine. Feature vectors and
//! centroids are ephemeral and live in [`crate::kmeans`]; the types here are
//! the ones that cross the API boundary and get persisted.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::backend::BackendKind;

/// Aggregate gameplay metrics for one learner.
///
/// Scores are percentages in [0, 100] maintained by the game session
/// tracker; `games_played` counts completed sessions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LearnerRecord {
    /// Stable learner identifier
    pub id: String,
    /// Literacy progress score
    pub literacy_score: f64,
    /// Math progress score
    pub math_score: f64,
    /// Cumulative score across all games
    pub total_score: f64,
    /// Number of completed game sessions
    pub games_played: u32,
}

impl LearnerRecord {
    /// Display score for a category, computed from raw fields.
    ///
    /// For [`Category::All`] this is the literacy/math average; for the
    /// single-subject categories it is that subject's raw score. This is the
    /// per-learner score stored on assignments and shown on the dashboard,
    /// distinct from the centroid-derived ranking score used to order
    /// cluster labels.
    pub fn display_score(&self, category: Category) -> f64 {
        match category {
            Category::Literacy => self.literacy_score,
            Category::Math => self.math_score,
            Category::All => (self.literacy_score + self.math_score) / 2.0,
        }
    }
}

/// Which subject area a clustering run analyzes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    /// All subjects combined (4-dimensional features)
    #[default]
    All,
    /// Literacy games only (3-dimensional features)
    Literacy,
    /// Math games only (3-dimensional features)
    Math,
}

impl Category {
    /// Wire/storage identifier
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::All => "all",
            Category::Literacy => "literacy",
            Category::Math => "math",
        }
    }

    /// Human-readable name used in dashboard messages
    pub fn display_name(&self) -> &'static str {
        match self {
            Category::All => "Overall",
            Category::Literacy => "Literacy",
            Category::Math => "Math",
        }
    }

    /// Parse a category from its wire identifier
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "all" => Some(Category::All),
            "literacy" => Some(Category::Literacy),
            "math" => Some(Category::Math),
            _ => None,
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One learner's placement in a clustering run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClusterAssignment {
    /// Learner this assignment belongs to
    pub learner_id: String,
    /// Cluster index in [0, k)
    pub cluster: usize,
    /// Tier label of the cluster ("High Achievers", ...)
    pub label: String,
    /// Category-specific display score (see [`LearnerRecord::display_score`])
    pub score: f64,
    /// Raw literacy score at analysis time
    pub literacy_score: f64,
    /// Raw math score at analysis time
    pub math_score: f64,
}

/// A completed clustering analysis for one category.
///
/// At most one run per category is current at any time; the result store
/// enforces this during [`crate::store::ResultStore::save`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClusteringRun {
    /// Category analyzed
    pub category: Category,
    /// Number of clusters the run produced; the rule-based backend always
    /// yields the three fixed tiers regardless of the requested count
    pub k: usize,
    /// Backend that produced the run
    pub backend: BackendKind,
    /// When the analysis completed
    pub analyzed_at: DateTime<Utc>,
    /// One assignment per learner
    pub assignments: Vec<ClusterAssignment>,
    /// Whether this is the authoritative run for its category
    pub is_current: bool,
}

/// Per-cluster slice of a [`Report`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClusterSummary {
    /// Tier label
    pub label: String,
    /// Number of learners in the cluster
    pub count: usize,
    /// Share of all learners, rounded to 1 decimal place
    pub percentage: f64,
}

/// Summary report for the admin dashboard.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Report {
    /// When the analysis completed
    pub analysis_date: DateTime<Utc>,
    /// Total learners included in the run
    pub total_learners: usize,
    /// Number of clusters produced
    pub num_clusters: usize,
    /// Per-cluster label, count, and percentage
    pub clusters: Vec<ClusterSummary>,
}

/// API envelope returned to the dashboard.
///
/// Every engine outcome, including errors, is normalized into this shape;
/// callers never see a raw error type.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse {
    /// Whether the operation succeeded
    pub success: bool,
    /// Human-readable status or failure message
    pub message: String,
    /// Summary report (success only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub report: Option<Report>,
    /// Category analyzed (success only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<Category>,
    /// Display name of the algorithm used (success only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub algorithm: Option<String>,
}

impl ApiResponse {
    /// Successful run envelope
    pub fn completed(message: String, report: Report, category: Category, algorithm: &str) -> Self {
        Self {
            success: true,
            message,
            report: Some(report),
            category: Some(category),
            algorithm: Some(algorithm.to_string()),
        }
    }

    /// Failure envelope
    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            report: None,
            category: None,
            algorithm: None,
        }
    }
}
