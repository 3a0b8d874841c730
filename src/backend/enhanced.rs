//! In-process K-Means pipeline backend.
//!
//! Composes the full analysis chain: feature extraction → min-max
//! normalization → K-Means++ seeding → Lloyd iteration → tier labeling.
//! Deterministic whenever the configured seed is fixed.

use tracing::debug;

use crate::error::Result;
use crate::features;
use crate::kmeans::{KMeans, KMeansConfig};
use crate::labeling;
use crate::model::{Category, ClusterAssignment, LearnerRecord};

use super::{BackendKind, ClusteringBackend};

/// K-Means++ / Lloyd clustering over normalized learner features.
#[derive(Debug, Clone, Default)]
pub struct EnhancedBackend {
    config: KMeansConfig,
}

impl EnhancedBackend {
    /// Backend with an explicit K-Means configuration
    pub fn new(config: KMeansConfig) -> Self {
        Self { config }
    }

    /// Fix the PRNG seed for reproducible runs
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.config.seed = Some(seed);
        self
    }
}

impl ClusteringBackend for EnhancedBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::Enhanced
    }

    fn run(
        &self,
        learners: &[LearnerRecord],
        category: Category,
        k: usize,
    ) -> Result<Vec<ClusterAssignment>> {
        let features = features::extract(learners, category);
        let normalized = features::normalize(&features);

        let fit = KMeans::fit(&normalized, k, &self.config)?;
        debug!(
            iterations = fit.iterations,
            inertia = fit.inertia,
            "k-means pipeline finished"
        );

        Ok(labeling::build_assignments(
            learners,
            &fit.assignments,
            &fit.centroids,
            category,
        ))
    }
}
