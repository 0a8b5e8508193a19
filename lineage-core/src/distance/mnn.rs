//! Mutual-nearest-neighbour cluster distances.

use std::{num::NonZeroUsize, sync::Arc};

#[cfg(feature = "cpu")]
use rayon::prelude::*;
use tracing::debug;

use crate::{
    distance::{euclidean::squared_euclidean, matrix::DistanceMatrix},
    error::{LineageError, Result},
    neighbours::{ExactIndex, NeighbourIndex, mutual_nearest_neighbours},
    points::{Membership, PointSet},
};

/// Builds the MNN distance matrix: for each cluster pair, the square root of
/// the median squared distance across all mutually nearest point pairs.
///
/// Soft memberships are read through each row's highest-weight cluster.
pub(crate) fn mnn_distances(
    points: &PointSet,
    membership: &Membership,
    k: NonZeroUsize,
) -> Result<DistanceMatrix> {
    let labels: Vec<Arc<str>> = membership
        .clusters()
        .iter()
        .map(|cluster| Arc::clone(&cluster.label))
        .collect();
    let members = membership.hard_members();
    let indices = build_indices(points, &members);

    let size = labels.len();
    let pairs: Vec<(usize, usize)> = (0..size)
        .flat_map(|row| ((row + 1)..size).map(move |column| (row, column)))
        .collect();
    let pair_distance = |&(row, column): &(usize, usize)| {
        median_mnn_distance(&indices[row], &indices[column], k.get()).ok_or_else(|| {
            LineageError::NoMutualNeighbours {
                left: Arc::clone(&labels[row]),
                right: Arc::clone(&labels[column]),
            }
        })
    };

    #[cfg(feature = "cpu")]
    let distances: Vec<f64> = pairs.par_iter().map(pair_distance).collect::<Result<_>>()?;
    #[cfg(not(feature = "cpu"))]
    let distances: Vec<f64> = pairs.iter().map(pair_distance).collect::<Result<_>>()?;

    let mut matrix = DistanceMatrix::zeros(labels);
    for (&(row, column), distance) in pairs.iter().zip(distances) {
        matrix.set_symmetric(row, column, distance);
    }
    debug!(clusters = size, pairs = pairs.len(), k = k.get(), "mnn distances computed");
    Ok(matrix)
}

#[cfg(feature = "cpu")]
fn build_indices(points: &PointSet, members: &[Vec<usize>]) -> Vec<ExactIndex> {
    members
        .par_iter()
        .map(|rows| member_index(points, rows))
        .collect()
}

#[cfg(not(feature = "cpu"))]
fn build_indices(points: &PointSet, members: &[Vec<usize>]) -> Vec<ExactIndex> {
    members
        .iter()
        .map(|rows| member_index(points, rows))
        .collect()
}

fn member_index(points: &PointSet, rows: &[usize]) -> ExactIndex {
    let values = rows
        .iter()
        .filter_map(|&row| points.row(row))
        .flatten()
        .copied()
        .collect();
    ExactIndex::new(points.dimension(), values)
}

fn median_mnn_distance(left: &ExactIndex, right: &ExactIndex, k: usize) -> Option<f64> {
    let mut squared: Vec<f64> = mutual_nearest_neighbours(left, right, k)
        .into_iter()
        .filter_map(|(a, b)| Some(squared_euclidean(left.point(a)?, right.point(b)?)))
        .collect();
    if squared.is_empty() {
        return None;
    }
    squared.sort_by(f64::total_cmp);
    let middle = squared.len() / 2;
    let median = if squared.len() % 2 == 0 {
        (squared[middle - 1] + squared[middle]) / 2.0
    } else {
        squared[middle]
    };
    Some(median.sqrt())
}
