//! Canonical point and cluster-assignment inputs.
//!
//! Callers convert whatever container they hold into a [`PointSet`] (rows
//! are observations) plus an optional [`ClusterAssignment`] before the
//! builder runs. Both types validate their invariants on construction.

use std::{collections::HashMap, sync::Arc};

use crate::error::{LineageError, Result};

/// Tolerance applied when checking that soft assignment rows sum to one.
const ROW_SUM_TOLERANCE: f64 = 1e-6;

/// Dense, row-major matrix of observations.
///
/// # Examples
/// ```
/// use lineage_core::PointSet;
///
/// let points = PointSet::try_from_rows(vec![vec![0.0, 1.0], vec![2.0, 3.0]])?;
/// assert_eq!(points.len(), 2);
/// assert_eq!(points.dimension(), 2);
/// assert_eq!(points.row(1), Some(&[2.0, 3.0][..]));
/// # Ok::<(), lineage_core::LineageError>(())
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct PointSet {
    rows: usize,
    dimension: usize,
    values: Vec<f64>,
    names: Option<Vec<String>>,
}

impl PointSet {
    /// Builds a point set from one vector per observation.
    ///
    /// # Errors
    /// Returns [`LineageError::EmptyPoints`] for no rows,
    /// [`LineageError::ZeroDimension`] for empty rows,
    /// [`LineageError::RaggedPoints`] when row lengths differ and
    /// [`LineageError::NonFiniteCoordinate`] for NaN or infinite values.
    pub fn try_from_rows(rows: Vec<Vec<f64>>) -> Result<Self> {
        let dimension = rows.first().map(Vec::len).ok_or(LineageError::EmptyPoints)?;
        let mut values = Vec::with_capacity(rows.len().saturating_mul(dimension));
        for (row, coordinates) in rows.iter().enumerate() {
            if coordinates.len() != dimension {
                return Err(LineageError::RaggedPoints {
                    row,
                    expected: dimension,
                    actual: coordinates.len(),
                });
            }
            values.extend_from_slice(coordinates);
        }
        Self::from_row_major(rows.len(), dimension, values)
    }

    /// Builds a point set from a contiguous row-major buffer.
    ///
    /// # Errors
    /// Returns the same errors as [`Self::try_from_rows`]; a buffer whose
    /// length is not `rows * dimension` is reported as
    /// [`LineageError::RaggedPoints`] on the first incomplete row.
    pub fn from_row_major(rows: usize, dimension: usize, values: Vec<f64>) -> Result<Self> {
        if rows == 0 {
            return Err(LineageError::EmptyPoints);
        }
        if dimension == 0 {
            return Err(LineageError::ZeroDimension);
        }
        let expected = rows.saturating_mul(dimension);
        if values.len() != expected {
            let row = values.len() / dimension;
            return Err(LineageError::RaggedPoints {
                row,
                expected: dimension,
                actual: values.len() % dimension,
            });
        }
        if let Some(index) = values.iter().position(|value| !value.is_finite()) {
            return Err(LineageError::NonFiniteCoordinate {
                row: index / dimension,
                dimension: index % dimension,
            });
        }
        Ok(Self {
            rows,
            dimension,
            values,
            names: None,
        })
    }

    /// Attaches one unique name per row.
    ///
    /// Names are required when the rows are themselves centroids.
    ///
    /// # Errors
    /// Returns [`LineageError::RowNameCountMismatch`] when the count differs
    /// from the number of rows and [`LineageError::DuplicateLabel`] when a
    /// name repeats.
    pub fn with_row_names(mut self, names: Vec<String>) -> Result<Self> {
        if names.len() != self.rows {
            return Err(LineageError::RowNameCountMismatch {
                expected: self.rows,
                actual: names.len(),
            });
        }
        ensure_unique(&names)?;
        self.names = Some(names);
        Ok(self)
    }

    /// Returns the number of observations.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.rows
    }

    /// Returns `true` when the set holds no rows. Validated sets are never empty.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.rows == 0
    }

    /// Returns the number of coordinates per observation.
    #[must_use]
    pub const fn dimension(&self) -> usize {
        self.dimension
    }

    /// Returns the row names, if any.
    #[must_use]
    pub fn row_names(&self) -> Option<&[String]> {
        self.names.as_deref()
    }

    /// Returns the coordinates of row `index`.
    #[must_use]
    pub fn row(&self, index: usize) -> Option<&[f64]> {
        let start = index.checked_mul(self.dimension)?;
        let end = start.checked_add(self.dimension)?;
        self.values.get(start..end)
    }

    /// Iterates over all rows in order.
    pub fn rows(&self) -> impl Iterator<Item = &[f64]> {
        self.values.chunks_exact(self.dimension)
    }

    /// Projects the point set onto the requested columns, in the given order.
    ///
    /// # Errors
    /// Returns [`LineageError::DimensionNotFound`] for an out-of-range index
    /// and [`LineageError::ZeroDimension`] when `dimensions` is empty.
    ///
    /// # Examples
    /// ```
    /// use lineage_core::{LineageError, PointSet};
    ///
    /// let points = PointSet::try_from_rows(vec![vec![1.0, 2.0, 3.0]])?;
    /// let projected = points.select_dimensions(&[2, 0])?;
    /// assert_eq!(projected.row(0), Some(&[3.0, 1.0][..]));
    /// assert!(matches!(
    ///     points.select_dimensions(&[3]),
    ///     Err(LineageError::DimensionNotFound { requested: 3, available: 3 })
    /// ));
    /// # Ok::<(), LineageError>(())
    /// ```
    pub fn select_dimensions(&self, dimensions: &[usize]) -> Result<Self> {
        if let Some(&requested) = dimensions.iter().find(|&&dim| dim >= self.dimension) {
            return Err(LineageError::DimensionNotFound {
                requested,
                available: self.dimension,
            });
        }
        let mut values = Vec::with_capacity(self.rows.saturating_mul(dimensions.len()));
        for row in self.rows() {
            values.extend(dimensions.iter().map(|&dim| row[dim]));
        }
        let projected = Self::from_row_major(self.rows, dimensions.len(), values)?;
        Ok(Self {
            names: self.names.clone(),
            ..projected
        })
    }
}

/// Soft cluster membership: one weight per (observation, cluster).
#[derive(Clone, Debug, PartialEq)]
pub struct SoftAssignment {
    labels: Vec<String>,
    rows: usize,
    weights: Vec<f64>,
}

impl SoftAssignment {
    /// Builds a soft assignment from cluster labels and a row-major weight
    /// matrix with `labels.len()` columns.
    ///
    /// # Errors
    /// Returns [`LineageError::DuplicateLabel`] for repeated labels,
    /// [`LineageError::AssignmentLengthMismatch`] when the buffer is not
    /// rectangular and [`LineageError::InvalidWeights`] when a weight is
    /// negative or non-finite or a row does not sum to one.
    pub fn try_new(labels: Vec<String>, weights: Vec<f64>) -> Result<Self> {
        ensure_unique(&labels)?;
        let clusters = labels.len();
        if clusters == 0 || weights.len() % clusters != 0 {
            return Err(LineageError::AssignmentLengthMismatch {
                expected: weights.len(),
                actual: clusters,
            });
        }
        let rows = weights.len() / clusters;
        for (row, chunk) in weights.chunks_exact(clusters).enumerate() {
            if chunk.iter().any(|weight| !weight.is_finite() || *weight < 0.0) {
                return Err(LineageError::InvalidWeights {
                    row,
                    reason: "weights must be finite and non-negative",
                });
            }
            let sum: f64 = chunk.iter().sum();
            if (sum - 1.0).abs() > ROW_SUM_TOLERANCE {
                return Err(LineageError::InvalidWeights {
                    row,
                    reason: "weights must sum to one",
                });
            }
        }
        Ok(Self {
            labels,
            rows,
            weights,
        })
    }

    /// Returns the cluster labels in column order.
    #[must_use]
    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    /// Returns the number of observations covered.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.rows
    }

    /// Returns `true` when no observations are covered.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.rows == 0
    }

    /// Returns the weight of observation `row` in cluster `cluster`.
    #[must_use]
    pub fn weight(&self, row: usize, cluster: usize) -> Option<f64> {
        if cluster >= self.labels.len() {
            return None;
        }
        self.weights
            .get(row.checked_mul(self.labels.len())?.checked_add(cluster)?)
            .copied()
    }
}

/// How observations map onto clusters.
#[derive(Clone, Debug, PartialEq)]
pub enum ClusterAssignment {
    /// One label per observation.
    Hard(Vec<String>),
    /// Per-observation weights across all clusters.
    Soft(SoftAssignment),
}

impl ClusterAssignment {
    /// Returns the number of observations covered.
    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            Self::Hard(labels) => labels.len(),
            Self::Soft(soft) => soft.len(),
        }
    }

    /// Returns `true` when no observations are covered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Weighted member list for one cluster.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct ClusterMembers {
    pub(crate) label: Arc<str>,
    pub(crate) members: Vec<(usize, f64)>,
}

impl ClusterMembers {
    /// Number of observations carrying positive weight.
    pub(crate) fn count(&self) -> usize {
        self.members.iter().filter(|(_, weight)| *weight > 0.0).count()
    }

    pub(crate) fn total_weight(&self) -> f64 {
        self.members.iter().map(|(_, weight)| weight).sum()
    }
}

/// Resolved membership of every cluster, in cluster order.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct Membership {
    clusters: Vec<ClusterMembers>,
    hard: Vec<usize>,
}

impl Membership {
    /// Resolves an assignment against `points`.
    ///
    /// Hard clusters are ordered by first appearance; soft clusters keep
    /// their column order.
    pub(crate) fn resolve(points: &PointSet, assignment: &ClusterAssignment) -> Result<Self> {
        if assignment.len() != points.len() {
            return Err(LineageError::AssignmentLengthMismatch {
                expected: points.len(),
                actual: assignment.len(),
            });
        }
        let membership = match assignment {
            ClusterAssignment::Hard(labels) => Self::from_hard(labels),
            ClusterAssignment::Soft(soft) => Self::from_soft(soft),
        };
        if let Some(empty) = membership
            .clusters
            .iter()
            .find(|cluster| cluster.total_weight() <= 0.0)
        {
            return Err(LineageError::EmptyCluster {
                cluster: Arc::clone(&empty.label),
            });
        }
        Ok(membership)
    }

    fn from_hard(labels: &[String]) -> Self {
        let mut index: HashMap<&str, usize> = HashMap::new();
        let mut clusters: Vec<ClusterMembers> = Vec::new();
        let mut hard = Vec::with_capacity(labels.len());
        for (row, label) in labels.iter().enumerate() {
            let cluster = *index.entry(label.as_str()).or_insert_with(|| {
                clusters.push(ClusterMembers {
                    label: Arc::from(label.as_str()),
                    members: Vec::new(),
                });
                clusters.len() - 1
            });
            clusters[cluster].members.push((row, 1.0));
            hard.push(cluster);
        }
        Self { clusters, hard }
    }

    fn from_soft(soft: &SoftAssignment) -> Self {
        let mut clusters: Vec<ClusterMembers> = soft
            .labels()
            .iter()
            .map(|label| ClusterMembers {
                label: Arc::from(label.as_str()),
                members: Vec::new(),
            })
            .collect();
        let mut hard = Vec::with_capacity(soft.len());
        for (row, chunk) in soft.weights.chunks_exact(clusters.len()).enumerate() {
            let mut best = 0;
            for (cluster, &weight) in chunk.iter().enumerate() {
                if weight > 0.0 {
                    clusters[cluster].members.push((row, weight));
                }
                if weight > chunk[best] {
                    best = cluster;
                }
            }
            hard.push(best);
        }
        Self { clusters, hard }
    }

    pub(crate) fn clusters(&self) -> &[ClusterMembers] {
        &self.clusters
    }

    pub(crate) fn len(&self) -> usize {
        self.clusters.len()
    }

    /// Members of each cluster under a hard (highest-weight) reading.
    pub(crate) fn hard_members(&self) -> Vec<Vec<usize>> {
        let mut members = vec![Vec::new(); self.clusters.len()];
        for (row, &cluster) in self.hard.iter().enumerate() {
            members[cluster].push(row);
        }
        members
    }
}

pub(crate) fn ensure_unique(labels: &[String]) -> Result<()> {
    let mut seen = std::collections::HashSet::with_capacity(labels.len());
    for label in labels {
        if !seen.insert(label.as_str()) {
            return Err(LineageError::DuplicateLabel {
                label: Arc::from(label.as_str()),
            });
        }
    }
    Ok(())
}
