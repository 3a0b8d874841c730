//! Cluster ranking and tier label assignment.
//!
//! Clusters are ordered by a ranking score derived from the centroid's first
//! feature dimension (the category's primary score), de-normalized back to a
//! percentage scale. The top three clusters receive the fixed tier
//! vocabulary; any further clusters get a generic label.
//!
//! The ranking score orders labels and nothing else. The score stored on
//! each [`ClusterAssignment`](crate::model::ClusterAssignment) is the
//! learner's display score, computed from raw fields by
//! [`LearnerRecord::display_score`](crate::model::LearnerRecord::display_score);
//! the two coincide only for single-subject categories and are kept apart
//! deliberately.

use crate::model::{Category, ClusterAssignment, LearnerRecord};

/// Ordered tier vocabulary, best first
pub const TIER_LABELS: [&str; 3] = ["High Achievers", "Average Performers", "Needs Support"];

/// Label for the cluster at descending rank `rank`, given its original index.
fn label_for_rank(rank: usize, cluster: usize) -> String {
    match TIER_LABELS.get(rank) {
        Some(label) => (*label).to_string(),
        None => format!("Cluster {}", cluster),
    }
}

/// Map each cluster index to its tier label.
///
/// Ranking score per cluster is `centroid[0] * 100`; clusters are labeled in
/// descending ranking order.
pub fn label_clusters(centroids: &[Vec<f64>]) -> Vec<String> {
    let mut ranked: Vec<(usize, f64)> = centroids
        .iter()
        .enumerate()
        .map(|(i, c)| (i, c.first().copied().unwrap_or(0.0) * 100.0))
        .collect();
    ranked.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));

    let mut labels = vec![String::new(); centroids.len()];
    for (rank, &(cluster, _)) in ranked.iter().enumerate() {
        labels[cluster] = label_for_rank(rank, cluster);
    }
    labels
}

/// Per-cluster labels for a completed run's report.
///
/// Non-empty clusters take the label their members carry. Empty clusters
/// still need one: tier labels no member carries are handed to empty
/// clusters in vocabulary order, and any empty cluster beyond the
/// vocabulary keeps the generic label. The rule-based backend's cluster
/// indices are vocabulary ranks, so an unpopulated tier reports its proper
/// name with a count of zero.
pub fn report_labels(assignments: &[ClusterAssignment], num_clusters: usize) -> Vec<String> {
    let mut labels: Vec<Option<String>> = vec![None; num_clusters];
    for a in assignments {
        if a.cluster < num_clusters && labels[a.cluster].is_none() {
            labels[a.cluster] = Some(a.label.clone());
        }
    }

    let mut unused = TIER_LABELS
        .iter()
        .filter(|tier| labels.iter().flatten().all(|l| l.as_str() != **tier))
        .map(|tier| (*tier).to_string())
        .collect::<Vec<_>>()
        .into_iter();

    labels
        .into_iter()
        .enumerate()
        .map(|(cluster, label)| {
            label
                .or_else(|| unused.next())
                .unwrap_or_else(|| format!("Cluster {}", cluster))
        })
        .collect()
}

/// Join cluster indices back to learners, attaching labels and display
/// scores. `assignments[i]` must be the cluster of `learners[i]`.
pub fn build_assignments(
    learners: &[LearnerRecord],
    assignments: &[usize],
    centroids: &[Vec<f64>],
    category: Category,
) -> Vec<ClusterAssignment> {
    let labels = label_clusters(centroids);

    learners
        .iter()
        .zip(assignments.iter())
        .map(|(learner, &cluster)| ClusterAssignment {
            learner_id: learner.id.clone(),
            cluster,
            label: labels[cluster].clone(),
            score: learner.display_score(category),
            literacy_score: learner.literacy_score,
            math_score: learner.math_score,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_labels_follow_descending_ranking() {
        // Cluster 0 is weakest, cluster 2 strongest.
        let centroids = vec![vec![0.1, 0.5], vec![0.5, 0.5], vec![0.9, 0.5]];
        let labels = label_clusters(&centroids);
        assert_eq!(labels[2], "High Achievers");
        assert_eq!(labels[1], "Average Performers");
        assert_eq!(labels[0], "Needs Support");
    }

    #[test]
    fn test_generic_labels_beyond_vocabulary() {
        let centroids = vec![vec![0.9], vec![0.7], vec![0.5], vec![0.3], vec![0.1]];
        let labels = label_clusters(&centroids);
        assert_eq!(labels[0], "High Achievers");
        assert_eq!(labels[3], "Cluster 3");
        assert_eq!(labels[4], "Cluster 4");
    }

    #[test]
    fn test_report_labels_recover_unpopulated_tiers() {
        let member = |id: &str, cluster: usize, label: &str| ClusterAssignment {
            learner_id: id.into(),
            cluster,
            label: label.into(),
            score: 50.0,
            literacy_score: 50.0,
            math_score: 50.0,
        };
        // Only the top and bottom tiers have members.
        let assignments = vec![
            member("a", 0, "High Achievers"),
            member("b", 2, "Needs Support"),
            member("c", 2, "Needs Support"),
        ];
        let labels = report_labels(&assignments, 3);
        assert_eq!(
            labels,
            vec!["High Achievers", "Average Performers", "Needs Support"]
        );
    }

    #[test]
    fn test_report_labels_generic_beyond_vocabulary() {
        let labels = report_labels(&[], 5);
        assert_eq!(labels[0], "High Achievers");
        assert_eq!(labels[2], "Needs Support");
        assert_eq!(labels[3], "Cluster 3");
        assert_eq!(labels[4], "Cluster 4");
    }

    #[test]
    fn test_build_assignments_uses_display_score() {
        let learners = vec![LearnerRecord {
            id: "s1".into(),
            literacy_score: 80.0,
            math_score: 40.0,
            total_score: 300.0,
            games_played: 6,
        }];
        let centroids = vec![vec![0.9, 0.4, 0.5, 0.5]];
        let out = build_assignments(&learners, &[0], &centroids, Category::All);

        assert_eq!(out.len(), 1);
        assert_eq!(out[0].cluster, 0);
        // Display score is (80 + 40) / 2, not the centroid-derived 90.
        assert_eq!(out[0].score, 60.0);
        assert_eq!(out[0].literacy_score, 80.0);
        assert_eq!(out[0].math_score, 40.0);
    }
}
