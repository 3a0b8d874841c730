//! K-Means clustering over normalized feature vectors.
//!
//! Implements K-Means++ seeding and Lloyd's assign/update/converge loop.
//! Convergence is declared when every centroid moves less than the
//! configured tolerance between iterations (in normalized-feature units).
//!
//! K-Means is a local-minimum heuristic; no global optimum is guaranteed.
//! Seeding degenerates when `k` exceeds the number of distinct points: the
//! cumulative walk can only land on duplicates once all distinct points sit
//! at zero distance from a chosen centroid.
//!
//! # Example
//!
//! ```rust
//! use cohort::kmeans::{KMeans, KMeansConfig};
//!
//! let points = vec![
//!     vec![0.0, 0.0],
//!     vec![0.1, 0.1],
//!     vec![0.9, 1.0],
//!     vec![1.0, 0.9],
//! ];
//! let fit = KMeans::fit(&points, 2, &KMeansConfig::default().with_seed(42)).unwrap();
//! assert_eq!(fit.assignments.len(), 4);
//! assert_eq!(fit.assignments[0], fit.assignments[1]);
//! ```

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{CohortError, Result};

/// Configuration for a K-Means fit
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KMeansConfig {
    /// Maximum Lloyd iterations before giving up on convergence
    pub max_iterations: usize,
    /// Convergence threshold on per-centroid movement
    pub tolerance: f64,
    /// Random seed for reproducible seeding; `None` draws from entropy
    pub seed: Option<u64>,
}

impl Default for KMeansConfig {
    fn default() -> Self {
        Self {
            max_iterations: 100,
            tolerance: 0.01,
            seed: None,
        }
    }
}

impl KMeansConfig {
    /// Set the random seed
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Set the iteration cap
    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    fn rng(&self) -> StdRng {
        match self.seed {
            Some(s) => StdRng::seed_from_u64(s),
            None => StdRng::from_entropy(),
        }
    }
}

/// Result of a converged (or iteration-capped) K-Means fit
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KMeansFit {
    /// Final centroids, one per cluster
    pub centroids: Vec<Vec<f64>>,
    /// Cluster index in [0, k) for each input point, in input order
    pub assignments: Vec<usize>,
    /// Iterations executed
    pub iterations: usize,
    /// Total within-cluster squared distance
    pub inertia: f64,
    /// Inertia after each update step, one entry per iteration
    pub inertia_trace: Vec<f64>,
}

/// K-Means fitting entry point
pub struct KMeans;

impl KMeans {
    /// Fit K-Means to `points`, producing exactly `k` clusters.
    ///
    /// Fails on `k == 0`, `k > points.len()`, or mixed dimensionality.
    pub fn fit(points: &[Vec<f64>], k: usize, config: &KMeansConfig) -> Result<KMeansFit> {
        if k == 0 {
            return Err(CohortError::InvalidConfig("k must be at least 1".into()));
        }
        if points.len() < k {
            return Err(CohortError::InsufficientData {
                needed: k,
                got: points.len(),
            });
        }
        let dims = points[0].len();
        for (i, p) in points.iter().enumerate() {
            if p.len() != dims {
                return Err(CohortError::InvalidConfig(format!(
                    "point {} has {} dimensions, expected {}",
                    i,
                    p.len(),
                    dims
                )));
            }
        }

        let mut rng = config.rng();
        let mut centroids = Self::seed_centroids(points, k, &mut rng);

        let mut iterations = 0;
        let mut assignments = vec![0usize; points.len()];
        let mut inertia_trace = Vec::new();

        for iter in 0..config.max_iterations {
            iterations = iter + 1;

            for (i, point) in points.iter().enumerate() {
                assignments[i] = Self::nearest_centroid(point, &centroids);
            }

            let new_centroids = Self::update_centroids(points, &assignments, &centroids);

            let converged = centroids
                .iter()
                .zip(new_centroids.iter())
                .all(|(old, new)| euclidean(old, new) < config.tolerance);

            centroids = new_centroids;
            inertia_trace.push(inertia(points, &centroids, &assignments));

            if converged {
                debug!(iterations, "k-means converged");
                break;
            }
        }

        // Final assignment against the last centroid update
        for (i, point) in points.iter().enumerate() {
            assignments[i] = Self::nearest_centroid(point, &centroids);
        }

        let inertia = inertia(points, &centroids, &assignments);

        Ok(KMeansFit {
            centroids,
            assignments,
            iterations,
            inertia,
            inertia_trace,
        })
    }

    /// K-Means++ seeding: first centroid uniform, the rest drawn with
    /// probability proportional to distance from the nearest chosen centroid.
    fn seed_centroids(points: &[Vec<f64>], k: usize, rng: &mut StdRng) -> Vec<Vec<f64>> {
        let mut centroids = Vec::with_capacity(k);
        centroids.push(points[rng.gen_range(0..points.len())].clone());

        for _ in 1..k {
            let distances: Vec<f64> = points
                .iter()
                .map(|p| {
                    centroids
                        .iter()
                        .map(|c| euclidean(p, c))
                        .fold(f64::MAX, f64::min)
                })
                .collect();

            let total: f64 = distances.iter().sum();
            if total == 0.0 {
                // Every point already coincides with a centroid
                centroids.push(points[rng.gen_range(0..points.len())].clone());
                continue;
            }

            let threshold = rng.gen::<f64>() * total;
            let mut cumulative = 0.0;
            let mut selected = points.len() - 1;
            for (i, &d) in distances.iter().enumerate() {
                cumulative += d;
                if cumulative >= threshold {
                    selected = i;
                    break;
                }
            }
            centroids.push(points[selected].clone());
        }

        centroids
    }

    /// Recompute each centroid as the mean of its members.
    ///
    /// A cluster left empty is reseeded to the point farthest from its
    /// assigned centroid, keeping the fit deterministic for a fixed seed.
    fn update_centroids(
        points: &[Vec<f64>],
        assignments: &[usize],
        previous: &[Vec<f64>],
    ) -> Vec<Vec<f64>> {
        let k = previous.len();
        let dims = points[0].len();

        let mut sums = vec![vec![0.0; dims]; k];
        let mut counts = vec![0usize; k];
        for (point, &cluster) in points.iter().zip(assignments.iter()) {
            counts[cluster] += 1;
            for (d, &v) in point.iter().enumerate() {
                sums[cluster][d] += v;
            }
        }

        let mut centroids = Vec::with_capacity(k);
        for (cluster, (sum, &count)) in sums.iter().zip(counts.iter()).enumerate() {
            if count > 0 {
                centroids.push(sum.iter().map(|s| s / count as f64).collect());
            } else {
                let idx = Self::farthest_point(points, assignments, previous);
                debug!(cluster, point = idx, "reseeding empty cluster");
                centroids.push(points[idx].clone());
            }
        }
        centroids
    }

    /// Index of the point farthest from the centroid it is assigned to.
    fn farthest_point(points: &[Vec<f64>], assignments: &[usize], centroids: &[Vec<f64>]) -> usize {
        let mut best = 0;
        let mut best_dist = -1.0;
        for (i, (point, &cluster)) in points.iter().zip(assignments.iter()).enumerate() {
            let d = euclidean(point, &centroids[cluster]);
            if d > best_dist {
                best_dist = d;
                best = i;
            }
        }
        best
    }

    /// Index of the nearest centroid; ties break toward the lowest index.
    fn nearest_centroid(point: &[f64], centroids: &[Vec<f64>]) -> usize {
        let mut nearest = 0;
        let mut min_dist = f64::MAX;
        for (i, centroid) in centroids.iter().enumerate() {
            let d = euclidean(point, centroid);
            if d < min_dist {
                min_dist = d;
                nearest = i;
            }
        }
        nearest
    }
}

/// Euclidean distance between two points
pub fn euclidean(a: &[f64], b: &[f64]) -> f64 {
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| (x - y) * (x - y))
        .sum::<f64>()
        .sqrt()
}

/// Total within-cluster squared distance
pub fn inertia(points: &[Vec<f64>], centroids: &[Vec<f64>], assignments: &[usize]) -> f64 {
    points
        .iter()
        .zip(assignments.iter())
        .map(|(p, &c)| {
            let d = euclidean(p, &centroids[c]);
            d * d
        })
        .sum()
}
