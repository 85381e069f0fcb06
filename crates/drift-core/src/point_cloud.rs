//! Embedded point clouds and the drift scalar.
//!
//! The embedding step projects each distance matrix into one 3-D point per
//! branch. Drift is the mean Euclidean distance from each point to the
//! marginal median point (median taken independently per axis), a cheap
//! proxy for the geometric median.

use serde::Serialize;

/// One embedded point per branch, in the same order as the source matrix's
/// branch list.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PointCloud {
    /// The 3-D points as `(x, y, z)` triples.
    pub points: Vec<(f32, f32, f32)>,
    /// Branch ordering the points correspond to.
    pub sorted_branches: Vec<String>,
}

impl PointCloud {
    /// Empty cloud over a branch list.
    pub fn new(sorted_branches: Vec<String>) -> Self {
        Self {
            points: Vec::new(),
            sorted_branches,
        }
    }

    /// Append one point.
    pub fn add_point(&mut self, x: f32, y: f32, z: f32) {
        self.points.push((x, y, z));
    }

    /// Pairwise Euclidean distances between all points, in row order.
    ///
    /// Useful to validate how much distortion the embedding introduced
    /// against the source matrix.
    pub fn reconstruct_distances(&self) -> Vec<(String, String, f32)> {
        let mut distances = Vec::with_capacity(self.points.len() * self.points.len());
        for (i, a) in self.points.iter().enumerate() {
            for (j, b) in self.points.iter().enumerate() {
                distances.push((
                    self.sorted_branches[i].clone(),
                    self.sorted_branches[j].clone(),
                    euclidean(*a, *b),
                ));
            }
        }
        distances
    }

    /// Mean Euclidean distance of all points to the coordinate-wise median
    /// point. Zero for an empty or single-point cloud.
    pub fn drift(&self) -> f64 {
        if self.points.len() < 2 {
            return 0.0;
        }
        let center = (
            median(self.points.iter().map(|p| p.0)),
            median(self.points.iter().map(|p| p.1)),
            median(self.points.iter().map(|p| p.2)),
        );
        let total: f64 = self
            .points
            .iter()
            .map(|p| euclidean(*p, center) as f64)
            .sum();
        total / self.points.len() as f64
    }
}

/// Median of a value sequence: the middle element after sorting, or the mean
/// of the two central elements for even counts. Zero for an empty sequence.
pub fn median(values: impl Iterator<Item = f32>) -> f32 {
    let mut values: Vec<f32> = values.collect();
    if values.is_empty() {
        return 0.0;
    }
    values.sort_by(f32::total_cmp);
    let mid = values.len() / 2;
    if values.len() % 2 == 1 {
        values[mid]
    } else {
        (values[mid - 1] + values[mid]) / 2.0
    }
}

fn euclidean(a: (f32, f32, f32), b: (f32, f32, f32)) -> f32 {
    ((a.0 - b.0).powi(2) + (a.1 - b.1).powi(2) + (a.2 - b.2).powi(2)).sqrt()
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_median_odd_count() {
        assert_eq!(median([1.0, 8.0, 3.0, -4.0, 5.0].into_iter()), 3.0);
    }

    #[test]
    fn test_median_even_count_averages_central_values() {
        assert_eq!(median([1.0, 8.0, 3.0, -4.0, 5.0, 9.5].into_iter()), 4.0);
    }

    #[test]
    fn test_median_empty_is_zero() {
        assert_eq!(median(std::iter::empty()), 0.0);
    }

    #[test]
    fn test_drift_empty_cloud_is_zero() {
        let cloud = PointCloud::new(vec![]);
        assert_eq!(cloud.drift(), 0.0);
    }

    #[test]
    fn test_drift_single_point_is_zero() {
        let mut cloud = PointCloud::new(vec!["a".to_string()]);
        cloud.add_point(1.0, 2.0, 3.0);
        assert_eq!(cloud.drift(), 0.0);
    }

    #[test]
    fn test_drift_two_points_measures_against_marginal_median() {
        let mut cloud = PointCloud::new(vec!["a".to_string(), "b".to_string()]);
        cloud.add_point(1.0, 2.0, 3.0);
        cloud.add_point(4.0, 5.0, 6.0);

        // Marginal median is (2.5, 3.5, 4.5); both points are equidistant.
        let expected = ((1.0_f64 - 2.5).powi(2) + (2.0_f64 - 3.5).powi(2)
            + (3.0_f64 - 4.5).powi(2))
        .sqrt();
        assert!((cloud.drift() - expected).abs() < 1e-4);
    }

    #[test]
    fn test_drift_three_points() {
        let points = [(1.0, 2.0, 3.0), (4.0, 5.0, 6.0), (7.0, -8.0, -9.0)];
        let mut cloud = PointCloud::new(vec![
            "a".to_string(),
            "b".to_string(),
            "c".to_string(),
        ]);
        for (x, y, z) in points {
            cloud.add_point(x, y, z);
        }

        let center = (4.0_f64, 2.0_f64, 3.0_f64);
        let expected: f64 = points
            .iter()
            .map(|p| {
                ((p.0 as f64 - center.0).powi(2)
                    + (p.1 as f64 - center.1).powi(2)
                    + (p.2 as f64 - center.2).powi(2))
                .sqrt()
            })
            .sum::<f64>()
            / 3.0;
        assert!((cloud.drift() - expected).abs() < 1e-4);
    }

    #[test]
    fn test_reconstruct_distances_square() {
        let mut cloud = PointCloud::new(vec!["a".to_string(), "b".to_string()]);
        cloud.add_point(0.0, 0.0, 0.0);
        cloud.add_point(3.0, 4.0, 0.0);

        let distances = cloud.reconstruct_distances();
        assert_eq!(distances.len(), 4);
        assert_eq!(distances[0].2, 0.0);
        assert!((distances[1].2 - 5.0).abs() < 1e-6);
        assert!((distances[2].2 - 5.0).abs() < 1e-6);
        assert_eq!(distances[3].2, 0.0);
    }
}
