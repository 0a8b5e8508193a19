//! Inter-cluster distance models.
//!
//! Every model produces a [`DistanceMatrix`] labelled in cluster order. The
//! positivity floor is applied once here, before endpoint enforcement or
//! outgroup augmentation see the matrix.

mod euclidean;
mod matrix;
mod method;
mod mnn;
mod scaled;

use std::num::NonZeroUsize;

use tracing::debug;

pub use self::{
    euclidean::{euclidean_distance, squared_euclidean},
    matrix::DistanceMatrix,
    method::DistanceMethod,
};
use self::scaled::Scaling;
use crate::{
    centroid::Centroid,
    error::Result,
    points::{Membership, PointSet},
};

/// Distances computed from bare centroids.
pub(crate) fn centroid_distances(centroids: &[Centroid]) -> DistanceMatrix {
    let mut matrix = euclidean::simple_distances(centroids);
    matrix.apply_positivity_floor();
    matrix
}

/// Distances computed from clustered points under `method`.
///
/// `centroids` must follow the cluster order of `membership`.
pub(crate) fn cluster_distances(
    points: &PointSet,
    membership: &Membership,
    centroids: &[Centroid],
    method: DistanceMethod,
    mnn_k: NonZeroUsize,
) -> Result<DistanceMatrix> {
    let mut matrix = match method {
        DistanceMethod::Simple => euclidean::simple_distances(centroids),
        DistanceMethod::ScaledDiagonal => {
            scaled::scaled_distances(points, membership, centroids, Scaling::Diagonal)?
        }
        DistanceMethod::ScaledFull => {
            scaled::scaled_distances(points, membership, centroids, Scaling::Full)?
        }
        DistanceMethod::Adaptive => {
            scaled::scaled_distances(points, membership, centroids, Scaling::Adaptive)?
        }
        DistanceMethod::Mnn => mnn::mnn_distances(points, membership, mnn_k)?,
    };
    matrix.apply_positivity_floor();
    debug!(method = %method, clusters = matrix.len(), "distance matrix computed");
    Ok(matrix)
}
