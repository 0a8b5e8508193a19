//! Reproducible Gaussian blob embeddings.
//!
//! Cluster centres sit on a circle in the first two dimensions, with the
//! remaining dimensions jittered, so neighbouring clusters along the circle
//! form a chain the spanning tree recovers.

use std::f64::consts::PI;

use lineage_core::{ClusterAssignment, DistanceMatrix, PointSet, euclidean_distance};
use rand::{Rng, SeedableRng, rngs::SmallRng};

use crate::error::{BenchSetupError, SyntheticError};

/// Shape of a synthetic embedding.
#[derive(Clone, Debug, PartialEq)]
pub struct BlobConfig {
    /// Number of clusters.
    pub clusters: usize,
    /// Points drawn around each centre.
    pub points_per_cluster: usize,
    /// Coordinates per point.
    pub dimensions: usize,
    /// Radius of the circle the centres sit on.
    pub separation: f64,
    /// Standard deviation of each blob.
    pub spread: f64,
    /// Random seed.
    pub seed: u64,
}

impl Default for BlobConfig {
    fn default() -> Self {
        Self {
            clusters: 8,
            points_per_cluster: 32,
            dimensions: 4,
            separation: 20.0,
            spread: 1.0,
            seed: 42,
        }
    }
}

/// Points and their hard cluster labels (`c0`, `c1`, ...).
#[derive(Clone, Debug)]
pub struct BlobDataset {
    /// Generated observations, cluster by cluster.
    pub points: PointSet,
    /// One label per observation.
    pub clusters: ClusterAssignment,
}

impl BlobDataset {
    /// Draws a dataset for `config`.
    ///
    /// # Errors
    /// Returns [`BenchSetupError`] when a count is zero, a float parameter
    /// is not finite and positive, or the core rejects the points.
    pub fn generate(config: &BlobConfig) -> Result<Self, BenchSetupError> {
        validate(config)?;
        let mut rng = SmallRng::seed_from_u64(config.seed);
        let rows = config.clusters * config.points_per_cluster;
        let mut values = Vec::with_capacity(rows * config.dimensions);
        let mut labels = Vec::with_capacity(rows);
        for (index, centre) in centres(config, &mut rng).iter().enumerate() {
            for _ in 0..config.points_per_cluster {
                for coordinate in centre {
                    values.push(coordinate + standard_normal(&mut rng)? * config.spread);
                }
                labels.push(format!("c{index}"));
            }
        }
        Ok(Self {
            points: PointSet::from_row_major(rows, config.dimensions, values)?,
            clusters: ClusterAssignment::Hard(labels),
        })
    }
}

/// Builds a labelled Euclidean distance matrix over `nodes` random points.
///
/// # Errors
/// Returns [`BenchSetupError`] when `nodes` or `dimensions` is zero.
pub fn random_matrix(
    nodes: usize,
    dimensions: usize,
    seed: u64,
) -> Result<DistanceMatrix, BenchSetupError> {
    if nodes == 0 {
        return Err(SyntheticError::ZeroPoints.into());
    }
    if dimensions == 0 {
        return Err(SyntheticError::ZeroDimensions.into());
    }
    let mut rng = SmallRng::seed_from_u64(seed);
    let points: Vec<Vec<f64>> = (0..nodes)
        .map(|_| (0..dimensions).map(|_| rng.gen_range(-1.0..1.0)).collect())
        .collect();
    let values = points
        .iter()
        .flat_map(|row| points.iter().map(move |column| euclidean_distance(row, column)))
        .collect();
    let labels = (0..nodes).map(|index| format!("n{index}")).collect();
    Ok(DistanceMatrix::try_new(labels, values)?)
}

fn validate(config: &BlobConfig) -> Result<(), SyntheticError> {
    if config.clusters == 0 {
        return Err(SyntheticError::ZeroClusters);
    }
    if config.points_per_cluster == 0 {
        return Err(SyntheticError::ZeroPoints);
    }
    if config.dimensions == 0 {
        return Err(SyntheticError::ZeroDimensions);
    }
    if !(config.separation.is_finite() && config.separation > 0.0) {
        return Err(SyntheticError::InvalidFloatParameter {
            parameter: "separation",
        });
    }
    if !(config.spread.is_finite() && config.spread > 0.0) {
        return Err(SyntheticError::InvalidFloatParameter {
            parameter: "spread",
        });
    }
    Ok(())
}

#[expect(
    clippy::cast_precision_loss,
    reason = "cluster indices are small and only place centres on a circle"
)]
fn centres(config: &BlobConfig, rng: &mut SmallRng) -> Vec<Vec<f64>> {
    (0..config.clusters)
        .map(|index| {
            let angle = (index as f64 / config.clusters as f64) * (2.0 * PI);
            let mut centre = vec![0.0_f64; config.dimensions];
            if let Some(value) = centre.get_mut(0) {
                *value = config.separation * angle.cos();
            }
            if let Some(value) = centre.get_mut(1) {
                *value = config.separation * angle.sin();
            }
            let jitter = 0.1 * config.separation;
            for value in centre.iter_mut().skip(2) {
                *value = rng.gen_range(-jitter..jitter);
            }
            centre
        })
        .collect()
}

/// Box-Muller transform.
fn standard_normal(rng: &mut SmallRng) -> Result<f64, SyntheticError> {
    let u1 = rng.gen_range(0.0_f64..1.0).max(f64::EPSILON);
    let u2 = rng.gen_range(0.0_f64..1.0);
    let sample = (-2.0 * u1.ln()).sqrt() * (2.0 * PI * u2).cos();
    if sample.is_finite() {
        Ok(sample)
    } else {
        Err(SyntheticError::InvalidFloatParameter {
            parameter: "standard_normal",
        })
    }
}
