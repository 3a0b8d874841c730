//! Rule-based classifier backend.
//!
//! Buckets learners into the three fixed tiers by thresholds on the sum of
//! literacy and math scores. Ignores `k`, is fully deterministic, and cannot
//! fail once the dispatcher's preconditions hold.

use tracing::debug;

use crate::error::Result;
use crate::labeling::TIER_LABELS;
use crate::model::{Category, ClusterAssignment, LearnerRecord};

use super::{BackendKind, ClusteringBackend};

/// Combined-score threshold for the High Achievers tier
const HIGH_THRESHOLD: f64 = 150.0;
/// Combined-score threshold for the Average Performers tier
const AVERAGE_THRESHOLD: f64 = 100.0;

/// Fixed-threshold classifier over `literacy_score + math_score`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SimpleBackend;

impl ClusteringBackend for SimpleBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::Simple
    }

    fn run(
        &self,
        learners: &[LearnerRecord],
        category: Category,
        _k: usize,
    ) -> Result<Vec<ClusterAssignment>> {
        debug!(learners = learners.len(), "running rule-based classifier");

        Ok(learners
            .iter()
            .map(|learner| {
                let combined = learner.literacy_score + learner.math_score;
                let cluster = if combined >= HIGH_THRESHOLD {
                    0
                } else if combined >= AVERAGE_THRESHOLD {
                    1
                } else {
                    2
                };

                ClusterAssignment {
                    learner_id: learner.id.clone(),
                    cluster,
                    label: TIER_LABELS[cluster].to_string(),
                    score: learner.display_score(category),
                    literacy_score: learner.literacy_score,
                    math_score: learner.math_score,
                }
            })
            .collect())
    }
}
