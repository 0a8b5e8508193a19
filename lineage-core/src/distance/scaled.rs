//! Covariance-scaled centroid distances.
//!
//! The distance between clusters `i` and `j` is
//! `sqrt(δᵀ (Σᵢ + Σⱼ)⁻¹ δ)` with `δ = μᵢ − μⱼ`. The diagonal variant keeps
//! only the variances; the full variant solves the dense system with a
//! fully pivoted LU factorisation.

use std::sync::Arc;

use faer::{Mat, prelude::*};

use crate::{
    centroid::{Centroid, weighted_mean},
    distance::matrix::DistanceMatrix,
    error::{LineageError, Result},
    points::{ClusterMembers, Membership, PointSet},
};

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) enum Scaling {
    Diagonal,
    Full,
    /// Full unless either cluster has no more members than dimensions.
    Adaptive,
}

/// Solutions whose implied condition number exceeds this are rejected.
const CONDITION_LIMIT: f64 = 1e12;

/// Weighted covariance of one cluster.
#[derive(Clone, Debug)]
pub(crate) struct Spread {
    label: Arc<str>,
    members: usize,
    covariance: Mat<f64>,
}

impl Spread {
    pub(crate) fn of(points: &PointSet, cluster: &ClusterMembers) -> Self {
        Self {
            label: Arc::clone(&cluster.label),
            members: cluster.count(),
            covariance: weighted_covariance(points, cluster),
        }
    }

    fn supports_full(&self, dimension: usize) -> bool {
        self.members > dimension
    }
}

/// Unbiased weighted covariance `Σ ŵ (x − μ)(x − μ)ᵀ / (1 − Σ ŵ²)`.
pub(crate) fn weighted_covariance(points: &PointSet, cluster: &ClusterMembers) -> Mat<f64> {
    let dimension = points.dimension();
    let mut covariance = Mat::<f64>::zeros(dimension, dimension);
    let total = cluster.total_weight();
    if total <= 0.0 {
        return covariance;
    }
    let mean = weighted_mean(points, cluster);
    let mut squared_weights = 0.0_f64;
    let mut centred = vec![0.0_f64; dimension];
    for &(row, weight) in cluster.members.iter().filter(|(_, weight)| *weight > 0.0) {
        let Some(coordinates) = points.row(row) else {
            continue;
        };
        let normalised = weight / total;
        squared_weights += normalised * normalised;
        for ((slot, value), centre) in centred.iter_mut().zip(coordinates).zip(&mean) {
            *slot = value - centre;
        }
        for (left, &left_value) in centred.iter().enumerate() {
            for (right, &right_value) in centred.iter().enumerate() {
                covariance[(left, right)] += normalised * left_value * right_value;
            }
        }
    }
    let correction = 1.0 - squared_weights;
    if correction <= f64::EPSILON {
        return Mat::<f64>::zeros(dimension, dimension);
    }
    Mat::from_fn(dimension, dimension, |row, column| {
        covariance[(row, column)] / correction
    })
}

/// Builds the covariance-scaled distance matrix for `centroids`.
///
/// Centroids are expected in the cluster order of `membership`.
pub(crate) fn scaled_distances(
    points: &PointSet,
    membership: &Membership,
    centroids: &[Centroid],
    scaling: Scaling,
) -> Result<DistanceMatrix> {
    let dimension = points.dimension();
    let spreads: Vec<Spread> = membership
        .clusters()
        .iter()
        .map(|cluster| Spread::of(points, cluster))
        .collect();

    if scaling == Scaling::Full
        && let Some(small) = spreads.iter().find(|spread| !spread.supports_full(dimension))
    {
        return Err(LineageError::InsufficientClusterSize {
            cluster: Arc::clone(&small.label),
            members: small.members,
            dimension,
        });
    }

    let mut matrix = DistanceMatrix::zeros(centroids.iter().map(Centroid::shared_label).collect());
    for row in 0..centroids.len() {
        for column in (row + 1)..centroids.len() {
            let left = &spreads[row];
            let right = &spreads[column];
            let full = match scaling {
                Scaling::Diagonal => false,
                Scaling::Full => true,
                Scaling::Adaptive => {
                    left.supports_full(dimension) && right.supports_full(dimension)
                }
            };
            let distance = pair_distance(
                centroids[row].coordinates(),
                centroids[column].coordinates(),
                left,
                right,
                full,
            )?;
            matrix.set_symmetric(row, column, distance);
        }
    }
    Ok(matrix)
}

fn pair_distance(
    left_centre: &[f64],
    right_centre: &[f64],
    left: &Spread,
    right: &Spread,
    full: bool,
) -> Result<f64> {
    let dimension = left_centre.len();
    let delta = Mat::from_fn(dimension, 1, |row, _| left_centre[row] - right_centre[row]);
    let summed = Mat::from_fn(dimension, dimension, |row, column| {
        left.covariance[(row, column)] + right.covariance[(row, column)]
    });
    let singular = || LineageError::SingularCovariance {
        left: Arc::clone(&left.label),
        right: Arc::clone(&right.label),
    };

    let quadratic = if full {
        let solution = solve_covariance(&summed, &delta).ok_or_else(singular)?;
        (0..dimension)
            .map(|row| delta[(row, 0)] * solution[(row, 0)])
            .sum::<f64>()
    } else {
        let mut sum = 0.0_f64;
        for index in 0..dimension {
            let variance = summed[(index, index)];
            if variance <= 0.0 {
                return Err(singular());
            }
            sum += delta[(index, 0)] * delta[(index, 0)] / variance;
        }
        sum
    };
    Ok(quadratic.max(0.0).sqrt())
}

fn max_abs(matrix: &Mat<f64>) -> f64 {
    let mut largest = 0.0_f64;
    for column in 0..matrix.ncols() {
        for row in 0..matrix.nrows() {
            largest = largest.max(matrix[(row, column)].abs());
        }
    }
    largest
}

/// Solves `summed · x = delta`, returning `None` when `summed` is singular.
///
/// An exactly singular factorisation yields non-finite entries. A nearly
/// singular one is caught through `‖A‖·‖x‖ / ‖δ‖`, a lower bound on the
/// condition number of `A`.
fn solve_covariance(summed: &Mat<f64>, delta: &Mat<f64>) -> Option<Mat<f64>> {
    let scale = max_abs(summed);
    if scale == 0.0 || !scale.is_finite() {
        return None;
    }
    let solution = summed.full_piv_lu().solve(delta);
    if (0..solution.nrows()).any(|row| !solution[(row, 0)].is_finite()) {
        return None;
    }
    let rhs = max_abs(delta);
    if rhs > 0.0 && scale * max_abs(&solution) / rhs > CONDITION_LIMIT {
        return None;
    }
    Some(solution)
}

#[cfg(test)]
mod tests {
    use super::*;

    use rstest::rstest;

    use crate::{
        centroid::{Aggregation, summarise},
        points::ClusterAssignment,
    };

    fn blobs() -> (PointSet, Membership) {
        let points = PointSet::try_from_rows(vec![
            vec![0.0, 0.0],
            vec![2.0, 0.0],
            vec![0.0, 2.0],
            vec![2.0, 2.0],
            vec![10.0, 0.0],
            vec![12.0, 0.0],
            vec![10.0, 2.0],
            vec![12.0, 2.0],
        ])
        .expect("valid points");
        let labels = ["a", "a", "a", "a", "b", "b", "b", "b"]
            .map(String::from)
            .to_vec();
        let membership = Membership::resolve(&points, &ClusterAssignment::Hard(labels))
            .expect("valid assignment");
        (points, membership)
    }

    #[test]
    fn covariance_matches_sample_variance() {
        let (points, membership) = blobs();
        let covariance = weighted_covariance(&points, &membership.clusters()[0]);
        // Each coordinate takes the values {0, 2} twice: sample variance 4/3.
        assert!((covariance[(0, 0)] - 4.0 / 3.0).abs() < 1e-12);
        assert!((covariance[(1, 1)] - 4.0 / 3.0).abs() < 1e-12);
        assert!(covariance[(0, 1)].abs() < 1e-12);
    }

    fn matrix(rows: &[[f64; 2]; 2]) -> Mat<f64> {
        Mat::from_fn(2, 2, |row, column| rows[row][column])
    }

    fn column(values: [f64; 2]) -> Mat<f64> {
        Mat::from_fn(2, 1, |row, _| values[row])
    }

    #[test]
    fn solves_well_conditioned_system() {
        let solution = solve_covariance(&matrix(&[[2.0, 1.0], [1.0, 3.0]]), &column([3.0, 5.0]))
            .expect("invertible");
        assert!((solution[(0, 0)] - 0.8).abs() < 1e-12);
        assert!((solution[(1, 0)] - 1.4).abs() < 1e-12);
    }

    #[test]
    fn pivots_past_leading_zero() {
        let solution = solve_covariance(&matrix(&[[0.0, 1.0], [1.0, 0.0]]), &column([2.0, 3.0]))
            .expect("invertible");
        assert!((solution[(0, 0)] - 3.0).abs() < 1e-12);
        assert!((solution[(1, 0)] - 2.0).abs() < 1e-12);
    }

    #[rstest]
    #[case::rank_one([[1.0, 2.0], [2.0, 4.0]], [1.0, 1.0])]
    #[case::zero([[0.0, 0.0], [0.0, 0.0]], [1.0, 1.0])]
    #[case::nearly_rank_one([[1.0, 1.0], [1.0, 1.0 + 1e-15]], [1.0, -1.0])]
    fn reports_singular_system(#[case] rows: [[f64; 2]; 2], #[case] rhs: [f64; 2]) {
        assert!(solve_covariance(&matrix(&rows), &column(rhs)).is_none());
    }

    #[test]
    fn full_scaling_rejects_collinear_clusters() {
        // Every point lies on y = x, so Σᵢ + Σⱼ has rank one.
        let points = PointSet::try_from_rows(vec![
            vec![0.0, 0.0],
            vec![1.0, 1.0],
            vec![2.0, 2.0],
            vec![5.0, 5.0],
            vec![6.0, 6.0],
            vec![7.0, 7.0],
        ])
        .expect("valid points");
        let labels = ["a", "a", "a", "b", "b", "b"].map(String::from).to_vec();
        let membership = Membership::resolve(&points, &ClusterAssignment::Hard(labels))
            .expect("valid assignment");
        let centroids = summarise(&points, &membership, Aggregation::Mean);
        let err = scaled_distances(&points, &membership, &centroids, Scaling::Full)
            .expect_err("rank-deficient covariance must fail");
        assert!(matches!(err, LineageError::SingularCovariance { .. }));
    }

    #[rstest]
    #[case::diagonal(Scaling::Diagonal)]
    #[case::full(Scaling::Full)]
    #[case::adaptive(Scaling::Adaptive)]
    fn isotropic_clusters_agree_across_scalings(#[case] scaling: Scaling) {
        let (points, membership) = blobs();
        let centroids = summarise(&points, &membership, Aggregation::Mean);
        let matrix =
            scaled_distances(&points, &membership, &centroids, scaling).expect("well conditioned");
        // δ = (10, 0), Σᵢ + Σⱼ = (8/3) I.
        let expected = (100.0_f64 * 3.0 / 8.0).sqrt();
        assert!((matrix.get(0, 1) - expected).abs() < 1e-9);
        assert_eq!(matrix.get(0, 1), matrix.get(1, 0));
    }

    #[test]
    fn full_scaling_rejects_undersized_clusters() {
        let points =
            PointSet::try_from_rows(vec![vec![0.0, 0.0], vec![1.0, 1.0], vec![5.0, 5.0]])
                .expect("valid points");
        let labels = ["a", "a", "b"].map(String::from).to_vec();
        let membership = Membership::resolve(&points, &ClusterAssignment::Hard(labels))
            .expect("valid assignment");
        let centroids = summarise(&points, &membership, Aggregation::Mean);
        let err = scaled_distances(&points, &membership, &centroids, Scaling::Full)
            .expect_err("two members in two dimensions is too few");
        assert!(matches!(
            err,
            LineageError::InsufficientClusterSize { members: 2, dimension: 2, .. }
        ));
    }

    #[rstest]
    #[case::diagonal(Scaling::Diagonal)]
    #[case::full(Scaling::Full)]
    fn zero_variance_is_singular(#[case] scaling: Scaling) {
        let points = PointSet::try_from_rows(vec![vec![0.0], vec![0.0], vec![3.0], vec![3.0]])
            .expect("valid points");
        let labels = ["a", "a", "b", "b"].map(String::from).to_vec();
        let membership = Membership::resolve(&points, &ClusterAssignment::Hard(labels))
            .expect("valid assignment");
        let centroids = summarise(&points, &membership, Aggregation::Mean);
        let err = scaled_distances(&points, &membership, &centroids, scaling)
            .expect_err("zero variance must fail");
        assert_eq!(
            err,
            LineageError::SingularCovariance {
                left: Arc::from("a"),
                right: Arc::from("b"),
            }
        );
    }
}
