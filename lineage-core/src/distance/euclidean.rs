//! Euclidean distances between points and between bare centroids.

use crate::{centroid::Centroid, distance::matrix::DistanceMatrix};

/// Computes the Euclidean distance between two equally sized vectors.
///
/// # Examples
///
/// ```
/// use lineage_core::euclidean_distance;
///
/// let distance = euclidean_distance(&[1.0, 2.0, 3.0], &[4.0, 6.0, 8.0]);
/// assert!((distance - 50.0_f64.sqrt()).abs() < 1e-12);
/// ```
#[must_use]
pub fn euclidean_distance(left: &[f64], right: &[f64]) -> f64 {
    squared_euclidean(left, right).sqrt()
}

/// Computes the squared Euclidean distance between two equally sized vectors.
#[must_use]
pub fn squared_euclidean(left: &[f64], right: &[f64]) -> f64 {
    left.iter()
        .zip(right)
        .map(|(l, r)| {
            let diff = l - r;
            diff * diff
        })
        .sum()
}

/// Pairwise Euclidean distances between centroids.
pub(crate) fn simple_distances(centroids: &[Centroid]) -> DistanceMatrix {
    let mut matrix = DistanceMatrix::zeros(centroids.iter().map(Centroid::shared_label).collect());
    for (row, left) in centroids.iter().enumerate() {
        for (offset, right) in centroids.iter().skip(row + 1).enumerate() {
            let column = row + 1 + offset;
            matrix.set_symmetric(
                row,
                column,
                euclidean_distance(left.coordinates(), right.coordinates()),
            );
        }
    }
    matrix
}
