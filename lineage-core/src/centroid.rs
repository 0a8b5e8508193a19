//! Cluster centroid summarisation.
//!
//! Reduces a point set to one coordinate vector per cluster using a
//! (weighted) mean or a coordinate-wise (weighted) median.

use std::{cmp::Ordering, sync::Arc};

use crate::{
    error::{LineageError, Result},
    points::{ClusterMembers, Membership, PointSet},
};

/// Selects how member coordinates are reduced to a centroid.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum Aggregation {
    /// Weighted arithmetic mean.
    #[default]
    Mean,
    /// Coordinate-wise weighted median.
    Median,
}

/// A named representative coordinate vector for one cluster.
///
/// # Examples
/// ```
/// use lineage_core::Centroid;
///
/// let centroid = Centroid::new("root", vec![0.0, 1.0]);
/// assert_eq!(centroid.label(), "root");
/// assert_eq!(centroid.coordinates(), &[0.0, 1.0]);
/// ```
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Centroid {
    label: Arc<str>,
    coordinates: Vec<f64>,
}

impl Centroid {
    /// Creates a centroid from a label and coordinates.
    #[must_use]
    pub fn new(label: impl Into<Arc<str>>, coordinates: Vec<f64>) -> Self {
        Self {
            label: label.into(),
            coordinates,
        }
    }

    /// Returns the cluster label.
    #[must_use]
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Returns the shared cluster label.
    #[must_use]
    pub fn shared_label(&self) -> Arc<str> {
        Arc::clone(&self.label)
    }

    /// Returns the centroid coordinates.
    #[must_use]
    pub fn coordinates(&self) -> &[f64] {
        &self.coordinates
    }
}

/// Uses each named row of `points` as a centroid.
///
/// # Errors
/// Returns [`LineageError::UnnamedCentroids`] when the rows carry no names.
pub fn centroids_from_rows(points: &PointSet) -> Result<Vec<Centroid>> {
    let names = points.row_names().ok_or(LineageError::UnnamedCentroids)?;
    Ok(names
        .iter()
        .zip(points.rows())
        .map(|(name, row)| Centroid::new(name.as_str(), row.to_vec()))
        .collect())
}

/// Computes one centroid per cluster of `membership`.
pub(crate) fn summarise(
    points: &PointSet,
    membership: &Membership,
    aggregation: Aggregation,
) -> Vec<Centroid> {
    membership
        .clusters()
        .iter()
        .map(|cluster| {
            let coordinates = match aggregation {
                Aggregation::Mean => weighted_mean(points, cluster),
                Aggregation::Median => weighted_median(points, cluster),
            };
            Centroid {
                label: Arc::clone(&cluster.label),
                coordinates,
            }
        })
        .collect()
}

/// Weighted mean `Σ w·x / Σ w` of the cluster members.
pub(crate) fn weighted_mean(points: &PointSet, cluster: &ClusterMembers) -> Vec<f64> {
    let mut sums = vec![0.0_f64; points.dimension()];
    let mut total = 0.0_f64;
    for (row, weight) in member_rows(points, cluster) {
        for (sum, value) in sums.iter_mut().zip(row) {
            *sum += weight * value;
        }
        total += weight;
    }
    if total > 0.0 {
        for sum in &mut sums {
            *sum /= total;
        }
    }
    sums
}

fn weighted_median(points: &PointSet, cluster: &ClusterMembers) -> Vec<f64> {
    (0..points.dimension())
        .map(|dimension| {
            let mut column: Vec<(f64, f64)> = member_rows(points, cluster)
                .map(|(row, weight)| (row[dimension], weight))
                .collect();
            median_of(&mut column)
        })
        .collect()
}

/// Smallest value whose cumulative weight reaches half the total; an exact
/// half averages with the next value.
fn median_of(values: &mut [(f64, f64)]) -> f64 {
    values.sort_by(|left, right| left.0.partial_cmp(&right.0).unwrap_or(Ordering::Equal));
    let total: f64 = values.iter().map(|(_, weight)| weight).sum();
    let half = total / 2.0;
    let mut cumulative = 0.0_f64;
    for (index, &(value, weight)) in values.iter().enumerate() {
        cumulative += weight;
        if (cumulative - half).abs() <= f64::EPSILON * total.max(1.0) {
            let next = values.get(index + 1).map_or(value, |&(next, _)| next);
            return (value + next) / 2.0;
        }
        if cumulative > half {
            return value;
        }
    }
    values.last().map_or(0.0, |&(value, _)| value)
}

fn member_rows<'a>(
    points: &'a PointSet,
    cluster: &'a ClusterMembers,
) -> impl Iterator<Item = (&'a [f64], f64)> + 'a {
    cluster
        .members
        .iter()
        .filter(|(_, weight)| *weight > 0.0)
        .filter_map(|&(row, weight)| points.row(row).map(|coordinates| (coordinates, weight)))
}
