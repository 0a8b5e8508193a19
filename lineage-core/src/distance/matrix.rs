//! Labelled symmetric distance matrix between cluster centroids.

use std::sync::Arc;

use crate::error::{LineageError, Result};

/// Relative tolerance used when checking symmetry of caller-supplied matrices.
const SYMMETRY_TOLERANCE: f64 = 1e-9;

/// Ratio between the smallest positive distance and the positivity floor.
const FLOOR_RATIO: f64 = 1e6;

/// Floor used when a matrix holds no positive distance at all.
const FALLBACK_FLOOR: f64 = 1e-6;

/// Square, symmetric, non-negative matrix of distances between labelled nodes.
///
/// The diagonal is always exactly zero. Off-diagonal zeros mean "no edge"
/// once the matrix is handed to the MST builder, so distance models call
/// [`Self::apply_positivity_floor`] before any edge pruning happens.
///
/// # Examples
/// ```
/// use lineage_core::DistanceMatrix;
///
/// let mut matrix = DistanceMatrix::try_new(
///     vec!["a".into(), "b".into()],
///     vec![0.0, 0.0, 0.0, 0.0],
/// )?;
/// matrix.apply_positivity_floor();
/// assert!(matrix.get(0, 1) > 0.0);
/// assert_eq!(matrix.get(0, 1), matrix.get(1, 0));
/// assert_eq!(matrix.get(1, 1), 0.0);
/// # Ok::<(), lineage_core::LineageError>(())
/// ```
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct DistanceMatrix {
    labels: Vec<Arc<str>>,
    values: Vec<f64>,
}

impl DistanceMatrix {
    /// Validates and wraps a row-major `n × n` matrix.
    ///
    /// The lower triangle is mirrored from the upper triangle once symmetry
    /// has been checked.
    ///
    /// # Errors
    /// Returns [`LineageError::InvalidDistanceMatrix`] when the matrix is
    /// empty, not square, holds a negative or non-finite entry, has a
    /// non-zero diagonal, or is not symmetric; [`LineageError::DuplicateLabel`]
    /// when labels repeat.
    pub fn try_new(labels: Vec<String>, values: Vec<f64>) -> Result<Self> {
        crate::points::ensure_unique(&labels)?;
        let size = labels.len();
        if size == 0 {
            return Err(invalid("matrix has no nodes"));
        }
        if values.len() != size.saturating_mul(size) {
            return Err(invalid(format!(
                "expected {} entries for {size} labels but found {}",
                size.saturating_mul(size),
                values.len()
            )));
        }
        if let Some(index) = values
            .iter()
            .position(|value| !value.is_finite() || *value < 0.0)
        {
            return Err(invalid(format!(
                "entry ({}, {}) must be finite and non-negative",
                index / size,
                index % size
            )));
        }
        if let Some(row) = (0..size).find(|&row| values[row * size + row] != 0.0) {
            return Err(invalid(format!("diagonal entry ({row}, {row}) must be zero")));
        }
        let mut matrix = Self {
            labels: labels.into_iter().map(Arc::from).collect(),
            values,
        };
        for row in 0..size {
            for column in (row + 1)..size {
                let upper = matrix.get(row, column);
                let lower = matrix.get(column, row);
                let scale = upper.abs().max(lower.abs()).max(1.0);
                if (upper - lower).abs() > SYMMETRY_TOLERANCE * scale {
                    return Err(invalid(format!(
                        "entries ({row}, {column}) and ({column}, {row}) differ"
                    )));
                }
                matrix.set_symmetric(row, column, upper);
            }
        }
        Ok(matrix)
    }

    /// Builds a zero matrix for the given labels.
    pub(crate) fn zeros(labels: Vec<Arc<str>>) -> Self {
        let size = labels.len();
        Self {
            labels,
            values: vec![0.0; size.saturating_mul(size)],
        }
    }

    /// Returns the number of nodes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    /// Returns `true` when the matrix has no nodes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Returns the node labels in index order.
    #[must_use]
    pub fn labels(&self) -> &[Arc<str>] {
        &self.labels
    }

    /// Returns the index of `label`, if present.
    #[must_use]
    pub fn index_of(&self, label: &str) -> Option<usize> {
        self.labels.iter().position(|candidate| &**candidate == label)
    }

    /// Returns the distance between nodes `row` and `column`.
    ///
    /// # Panics
    /// Panics when either index is out of bounds.
    #[must_use]
    pub fn get(&self, row: usize, column: usize) -> f64 {
        self.values[row * self.len() + column]
    }

    /// Writes `value` to both `(row, column)` and `(column, row)`.
    pub(crate) fn set_symmetric(&mut self, row: usize, column: usize, value: f64) {
        let size = self.len();
        self.values[row * size + column] = value;
        self.values[column * size + row] = value;
    }

    /// Returns the smallest strictly positive off-diagonal entry.
    #[must_use]
    pub fn min_positive(&self) -> Option<f64> {
        let size = self.len();
        (0..size)
            .flat_map(|row| ((row + 1)..size).map(move |column| (row, column)))
            .map(|(row, column)| self.get(row, column))
            .filter(|value| *value > 0.0)
            .min_by(f64::total_cmp)
    }

    /// Replaces every off-diagonal entry `<= 0` with the smallest positive
    /// entry divided by 10⁶, and forces the diagonal to zero.
    ///
    /// A matrix without any positive entry uses a floor of 10⁻⁶.
    pub fn apply_positivity_floor(&mut self) {
        let floor = self
            .min_positive()
            .map_or(FALLBACK_FLOOR, |min| min / FLOOR_RATIO);
        let size = self.len();
        for row in 0..size {
            for column in 0..size {
                let index = row * size + column;
                if row == column {
                    self.values[index] = 0.0;
                } else if self.values[index] <= 0.0 {
                    self.values[index] = floor;
                }
            }
        }
    }

    /// Returns a copy extended by one node whose distance to every existing
    /// node is `weight`.
    pub(crate) fn extended(&self, label: Arc<str>, weight: f64) -> Self {
        let size = self.len();
        let grown = size + 1;
        let mut values = vec![0.0; grown * grown];
        for row in 0..size {
            let source = &self.values[row * size..(row + 1) * size];
            values[row * grown..row * grown + size].copy_from_slice(source);
            values[row * grown + size] = weight;
            values[size * grown + row] = weight;
        }
        let mut labels = self.labels.clone();
        labels.push(label);
        Self { labels, values }
    }
}

fn invalid(reason: impl Into<String>) -> LineageError {
    LineageError::InvalidDistanceMatrix {
        reason: reason.into(),
    }
}
