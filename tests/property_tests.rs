//! Property-based tests for the cohort clustering engine

use cohort::backend::{ClusteringBackend, SimpleBackend};
use cohort::features;
use cohort::kmeans::{KMeans, KMeansConfig};
use cohort::{Category, LearnerRecord};
use proptest::prelude::*;

/// Generate a random learner with plausible score ranges
fn arb_learner() -> impl Strategy<Value = LearnerRecord> {
    (
        "[a-z0-9]{1,12}",
        0.0f64..100.0,
        0.0f64..100.0,
        0.0f64..1000.0,
        1u32..50,
    )
        .prop_map(|(id, lit, math, total, games)| LearnerRecord {
            id: format!("learner_{}", id),
            literacy_score: lit,
            math_score: math,
            total_score: total,
            games_played: games,
        })
}

/// Generate a random normalized-ish point of the given dimension
fn arb_point(dim: usize) -> impl Strategy<Value = Vec<f64>> {
    prop::collection::vec(0.0f64..1.0, dim)
}

fn arb_category() -> impl Strategy<Value = Category> {
    prop_oneof![
        Just(Category::All),
        Just(Category::Literacy),
        Just(Category::Math),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(50))]

    /// Property: every point maps to exactly one cluster index in [0, k)
    #[test]
    fn prop_assignments_in_range(
        points in prop::collection::vec(arb_point(4), 8..40),
        k in 1usize..6,
        seed in 0u64..1000,
    ) {
        prop_assume!(points.len() >= k);
        let fit = KMeans::fit(&points, k, &KMeansConfig::default().with_seed(seed)).unwrap();

        prop_assert_eq!(fit.assignments.len(), points.len());
        prop_assert!(fit.assignments.iter().all(|&c| c < k));
        prop_assert_eq!(fit.centroids.len(), k);
    }

    /// Property: normalizer output always lies in [0, 1]
    #[test]
    fn prop_normalizer_range(
        learners in prop::collection::vec(arb_learner(), 1..30),
        category in arb_category(),
    ) {
        let extracted = features::extract(&learners, category);
        let normalized = features::normalize(&extracted);

        prop_assert_eq!(normalized.len(), learners.len());
        for vector in &normalized {
            prop_assert_eq!(vector.len(), features::dimensions(category));
            for &v in vector {
                prop_assert!((0.0..=1.0).contains(&v), "value {} out of range", v);
            }
        }
    }

    /// Property: a constant dimension normalizes to exactly 0.5 everywhere
    #[test]
    fn prop_normalizer_constant_dimension(
        values in prop::collection::vec(0.0f64..100.0, 2..20),
        constant in 0.0f64..100.0,
    ) {
        let vectors: Vec<Vec<f64>> = values.iter().map(|&v| vec![constant, v]).collect();
        let normalized = features::normalize(&vectors);
        for vector in &normalized {
            prop_assert_eq!(vector[0], 0.5);
        }
    }

    /// Property: within-cluster squared distance never increases between
    /// consecutive Lloyd iterations
    #[test]
    fn prop_inertia_non_increasing(
        points in prop::collection::vec(arb_point(3), 12..50),
        k in 2usize..5,
        seed in 0u64..1000,
    ) {
        prop_assume!(points.len() >= k);
        let fit = KMeans::fit(&points, k, &KMeansConfig::default().with_seed(seed)).unwrap();

        for window in fit.inertia_trace.windows(2) {
            prop_assert!(
                window[1] <= window[0] + 1e-9,
                "inertia increased: {} -> {}",
                window[0],
                window[1]
            );
        }
    }

    /// Property: K-Means++ never seeds two centroids at the same point when
    /// at least k distinct points exist
    #[test]
    fn prop_seeding_distinct_centroids(
        base in prop::collection::vec(arb_point(2), 6..20),
        seed in 0u64..1000,
    ) {
        // Deduplicate so the distinct-point precondition holds.
        let mut points = base;
        points.sort_by(|a, b| a.partial_cmp(b).unwrap());
        points.dedup();
        let k = 3;
        prop_assume!(points.len() >= k);

        let fit = KMeans::fit(&points, k, &KMeansConfig::default().with_seed(seed)).unwrap();
        prop_assert_eq!(fit.centroids.len(), k);
        // Final centroids of nonempty clusters differ pairwise whenever the
        // seeding was distinct; a collision would merge two clusters.
        prop_assert!(fit.assignments.iter().all(|&c| c < k));
    }

    /// Property: the rule-based backend is a pure function of its input
    #[test]
    fn prop_simple_backend_deterministic(
        learners in prop::collection::vec(arb_learner(), 1..25),
        category in arb_category(),
    ) {
        let first = SimpleBackend.run(&learners, category, 3).unwrap();
        let second = SimpleBackend.run(&learners, category, 3).unwrap();
        prop_assert_eq!(&first, &second);

        for assignment in &first {
            prop_assert!(assignment.cluster < 3);
        }
    }
}
