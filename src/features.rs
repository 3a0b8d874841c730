//! Feature extraction and normalization.
//!
//! Turns [`LearnerRecord`]s into fixed-dimension feature vectors for one
//! category and min-max scales them to [0, 1] per dimension. Both steps are
//! pure; vectors are ephemeral and scoped to a single run.

use crate::model::{Category, LearnerRecord};

/// Feature dimensionality for a category.
///
/// Single-subject categories use [score, games_played, total_score];
/// [`Category::All`] adds the second subject score.
pub fn dimensions(category: Category) -> usize {
    match category {
        Category::Literacy | Category::Math => 3,
        Category::All => 4,
    }
}

/// Attribute names for a category's feature dimensions, in vector order.
///
/// Used by the process-backend request file, which declares one attribute
/// per dimension.
pub fn attribute_names(category: Category) -> &'static [&'static str] {
    match category {
        Category::Literacy => &["literacy_score", "games_played", "total_score"],
        Category::Math => &["math_score", "games_played", "total_score"],
        Category::All => &["literacy_score", "math_score", "games_played", "total_score"],
    }
}

/// Build one feature vector per learner, in input order.
pub fn extract(learners: &[LearnerRecord], category: Category) -> Vec<Vec<f64>> {
    learners
        .iter()
        .map(|l| match category {
            Category::Literacy => vec![l.literacy_score, l.games_played as f64, l.total_score],
            Category::Math => vec![l.math_score, l.games_played as f64, l.total_score],
            Category::All => vec![
                l.literacy_score,
                l.math_score,
                l.games_played as f64,
                l.total_score,
            ],
        })
        .collect()
}

/// Min-max normalize each dimension to [0, 1] across all vectors.
///
/// A dimension with no variation maps to 0.5 for every vector: a constant
/// that cannot dominate the distance computation, where 0.0 would pull every
/// point toward the origin. Empty input yields empty output.
pub fn normalize(features: &[Vec<f64>]) -> Vec<Vec<f64>> {
    let Some(first) = features.first() else {
        return Vec::new();
    };
    let dims = first.len();

    let mut mins = vec![f64::MAX; dims];
    let mut maxs = vec![f64::MIN; dims];
    for vector in features {
        for (d, &v) in vector.iter().enumerate() {
            mins[d] = mins[d].min(v);
            maxs[d] = maxs[d].max(v);
        }
    }

    features
        .iter()
        .map(|vector| {
            vector
                .iter()
                .enumerate()
                .map(|(d, &v)| {
                    let range = maxs[d] - mins[d];
                    if range > 0.0 {
                        (v - mins[d]) / range
                    } else {
                        0.5
                    }
                })
                .collect()
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn learner(id: &str, lit: f64, math: f64, games: u32, total: f64) -> LearnerRecord {
        LearnerRecord {
            id: id.into(),
            literacy_score: lit,
            math_score: math,
            total_score: total,
            games_played: games,
        }
    }

    #[test]
    fn test_extract_dimensions() {
        let learners = vec![learner("a", 80.0, 60.0, 5, 400.0)];
        assert_eq!(extract(&learners, Category::Literacy)[0], vec![80.0, 5.0, 400.0]);
        assert_eq!(extract(&learners, Category::Math)[0], vec![60.0, 5.0, 400.0]);
        assert_eq!(
            extract(&learners, Category::All)[0],
            vec![80.0, 60.0, 5.0, 400.0]
        );
        for cat in [Category::All, Category::Literacy, Category::Math] {
            assert_eq!(extract(&learners, cat)[0].len(), dimensions(cat));
            assert_eq!(attribute_names(cat).len(), dimensions(cat));
        }
    }

    #[test]
    fn test_extract_preserves_order() {
        let learners = vec![
            learner("a", 10.0, 0.0, 1, 10.0),
            learner("b", 20.0, 0.0, 1, 20.0),
            learner("c", 30.0, 0.0, 1, 30.0),
        ];
        let features = extract(&learners, Category::Literacy);
        assert_eq!(features[0][0], 10.0);
        assert_eq!(features[1][0], 20.0);
        assert_eq!(features[2][0], 30.0);
    }

    #[test]
    fn test_normalize_range() {
        let features = vec![
            vec![0.0, 100.0],
            vec![50.0, 200.0],
            vec![100.0, 300.0],
        ];
        let normalized = normalize(&features);
        assert_eq!(normalized[0], vec![0.0, 0.0]);
        assert_eq!(normalized[1], vec![0.5, 0.5]);
        assert_eq!(normalized[2], vec![1.0, 1.0]);
    }

    #[test]
    fn test_normalize_constant_dimension() {
        let features = vec![vec![7.0, 1.0], vec![7.0, 2.0], vec![7.0, 3.0]];
        let normalized = normalize(&features);
        for vector in &normalized {
            assert_eq!(vector[0], 0.5);
        }
    }

    #[test]
    fn test_normalize_empty() {
        assert!(normalize(&[]).is_empty());
    }
}
