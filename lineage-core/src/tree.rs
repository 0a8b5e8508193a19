//! Lineage tree construction.
//!
//! [`ClusterTree::run`] drives the full pipeline: centroids, distances,
//! endpoint constraints, outgroup augmentation, spanning tree, edge
//! confidence and final assembly.

use std::{borrow::Cow, num::NonZeroUsize, sync::Arc};

use tracing::{debug, info, instrument, warn};

use crate::{
    Result,
    centroid::{Aggregation, Centroid, centroids_from_rows, summarise},
    confidence,
    distance::{self, DistanceMatrix, DistanceMethod},
    endpoints,
    error::LineageError,
    graph::{LineageGraph, assemble},
    outgroup::{self, OutgroupSpec},
    points::{ClusterAssignment, Membership, PointSet},
};

/// Input accepted by [`ClusterTree::run`].
#[derive(Clone, Copy, Debug)]
pub enum TreeInput<'a> {
    /// Observations with an optional cluster assignment. Without one, each
    /// named row is used as a centroid.
    Points {
        /// The observations.
        points: &'a PointSet,
        /// How observations map onto clusters.
        clusters: Option<&'a ClusterAssignment>,
    },
    /// A caller-supplied distance matrix; centroid and distance computation
    /// are skipped.
    Precomputed {
        /// Distances between the clusters.
        distances: &'a DistanceMatrix,
        /// Optional centroids attached to the output nodes, in matrix order.
        centroids: Option<&'a [Centroid]>,
    },
}

/// Builds lineage graphs with a fixed configuration.
///
/// # Examples
/// ```
/// use lineage_core::{ClusterTreeBuilder, PointSet, TreeInput};
///
/// let points = PointSet::try_from_rows(vec![
///     vec![0.0, 0.0],
///     vec![0.0, -1.0],
///     vec![1.0, 1.0],
///     vec![-1.0, 1.0],
/// ])?
/// .with_row_names(vec!["0".into(), "1".into(), "2".into(), "3".into()])?;
///
/// let tree = ClusterTreeBuilder::new().build()?;
/// let graph = tree.run(&TreeInput::Points { points: &points, clusters: None })?;
/// assert_eq!(graph.edges().len(), 3);
/// assert_eq!(graph.degree(0), 3);
/// # Ok::<(), lineage_core::LineageError>(())
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct ClusterTree {
    aggregation: Aggregation,
    distance_method: DistanceMethod,
    mnn_k: NonZeroUsize,
    outgroup: OutgroupSpec,
    outscale: f64,
    endpoints: Vec<Arc<str>>,
    allow_dyads: bool,
}

impl ClusterTree {
    pub(crate) fn new(
        aggregation: Aggregation,
        distance_method: DistanceMethod,
        mnn_k: NonZeroUsize,
        outgroup: OutgroupSpec,
        outscale: f64,
        endpoints: Vec<Arc<str>>,
        allow_dyads: bool,
    ) -> Self {
        Self {
            aggregation,
            distance_method,
            mnn_k,
            outgroup,
            outscale,
            endpoints,
            allow_dyads,
        }
    }

    /// Returns the centroid aggregation.
    #[must_use]
    pub fn aggregation(&self) -> Aggregation {
        self.aggregation
    }

    /// Returns the distance model, after any legacy override.
    #[must_use]
    pub fn distance_method(&self) -> DistanceMethod {
        self.distance_method
    }

    /// Returns the MNN neighbour count.
    #[must_use]
    pub fn mnn_k(&self) -> NonZeroUsize {
        self.mnn_k
    }

    /// Returns the outgroup stage.
    #[must_use]
    pub fn outgroup(&self) -> OutgroupSpec {
        self.outgroup
    }

    /// Returns the outgroup multiplier.
    #[must_use]
    pub fn outscale(&self) -> f64 {
        self.outscale
    }

    /// Returns the endpoint labels in search order.
    #[must_use]
    pub fn endpoints(&self) -> &[Arc<str>] {
        &self.endpoints
    }

    /// Returns whether endpoint dyads are allowed.
    #[must_use]
    pub fn allows_dyads(&self) -> bool {
        self.allow_dyads
    }

    /// Builds the lineage graph for `input`.
    ///
    /// # Errors
    /// Returns a [`LineageError`] of kind
    /// [`Configuration`](crate::ErrorKind::Configuration) for malformed input
    /// (unnamed centroid rows, a clustered distance model without clusters,
    /// unknown endpoints, mismatched centroids),
    /// [`Numerical`](crate::ErrorKind::Numerical) for degenerate covariance or
    /// missing mutual neighbours, and
    /// [`UnsatisfiableConstraint`](crate::ErrorKind::UnsatisfiableConstraint)
    /// when no endpoint assignment exists.
    #[instrument(
        name = "core.run",
        err,
        skip(self, input),
        fields(
            method = %self.distance_method,
            endpoints = self.endpoints.len(),
            outgroup = ?self.outgroup,
        ),
    )]
    pub fn run(&self, input: &TreeInput<'_>) -> Result<LineageGraph> {
        let (matrix, centroids) = self.distances(input)?;
        let matrix = self.constrain(matrix)?;

        let augmented = outgroup::augment(matrix, self.outgroup, self.outscale)?;
        let scored = confidence::score(&augmented.matrix)?;
        debug!(
            tree_weight = scored.forest.total_weight(),
            "spanning forest scored"
        );
        let graph = assemble(
            &augmented.matrix,
            augmented.outgroup,
            &scored,
            centroids.as_deref(),
        );

        info!(
            nodes = graph.nodes().len(),
            edges = graph.edges().len(),
            components = graph.component_count(),
            omega = augmented.threshold,
            "lineage graph built"
        );
        Ok(graph)
    }

    #[instrument(name = "core.distances", err, level = "debug", skip_all)]
    fn distances<'a>(
        &self,
        input: &TreeInput<'a>,
    ) -> Result<(DistanceMatrix, Option<Cow<'a, [Centroid]>>)> {
        match *input {
            TreeInput::Points {
                points,
                clusters: Some(clusters),
            } => {
                let membership = Membership::resolve(points, clusters)?;
                if self.aggregation == Aggregation::Median && self.distance_method.uses_covariance() {
                    warn!(
                        method = %self.distance_method,
                        "median centroids combined with covariance scaling; distances assume mean centres"
                    );
                }
                let centroids = summarise(points, &membership, self.aggregation);
                let matrix = distance::cluster_distances(
                    points,
                    &membership,
                    &centroids,
                    self.distance_method,
                    self.mnn_k,
                )?;
                debug!(clusters = membership.len(), "centroids summarised");
                Ok((matrix, Some(Cow::Owned(centroids))))
            }
            TreeInput::Points {
                points,
                clusters: None,
            } => {
                if self.distance_method.requires_clusters() {
                    return Err(LineageError::ClustersRequired {
                        method: self.distance_method.as_str(),
                    });
                }
                let centroids = centroids_from_rows(points)?;
                let matrix = distance::centroid_distances(&centroids);
                Ok((matrix, Some(Cow::Owned(centroids))))
            }
            TreeInput::Precomputed {
                distances,
                centroids,
            } => {
                if let Some(centroids) = centroids {
                    let aligned = centroids.len() == distances.len()
                        && centroids
                            .iter()
                            .zip(distances.labels())
                            .all(|(centroid, label)| centroid.label() == &**label);
                    if !aligned {
                        return Err(LineageError::CentroidLabelMismatch);
                    }
                }
                let mut matrix = distances.clone();
                matrix.apply_positivity_floor();
                Ok((matrix, centroids.map(Cow::Borrowed)))
            }
        }
    }

    fn constrain(&self, matrix: DistanceMatrix) -> Result<DistanceMatrix> {
        if self.endpoints.is_empty() {
            return Ok(matrix);
        }
        let indices = self
            .endpoints
            .iter()
            .map(|label| {
                matrix
                    .index_of(label)
                    .ok_or_else(|| LineageError::UnknownEndpoint {
                        label: Arc::clone(label),
                    })
            })
            .collect::<Result<Vec<_>>>()?;
        match endpoints::solve(&matrix, &indices, self.allow_dyads)? {
            Some(solution) => {
                debug!(
                    cost = solution.cost,
                    branches = solution.branches,
                    "endpoint constraints applied"
                );
                Ok(endpoints::enforce(&matrix, &solution))
            }
            None => Ok(matrix),
        }
    }
}
