//! Benchmark setup errors.
//!
//! Lets setup code propagate failures with `?` rather than panicking inside
//! Criterion closures.

use lineage_core::LineageError;

/// Invalid synthetic data parameters.
#[derive(Debug, thiserror::Error)]
pub enum SyntheticError {
    /// No clusters were requested.
    #[error("cluster count must be greater than zero")]
    ZeroClusters,
    /// Clusters would be empty.
    #[error("points per cluster must be greater than zero")]
    ZeroPoints,
    /// Points would have no coordinates.
    #[error("dimension count must be greater than zero")]
    ZeroDimensions,
    /// A floating-point parameter was non-finite or out of range.
    #[error("invalid floating-point parameter `{parameter}`")]
    InvalidFloatParameter {
        /// Name of the invalid parameter.
        parameter: &'static str,
    },
}

/// Errors that may occur while preparing a benchmark.
#[derive(Debug, thiserror::Error)]
pub enum BenchSetupError {
    /// Synthetic data generation failed.
    #[error("synthetic data generation failed: {0}")]
    Synthetic(#[from] SyntheticError),
    /// The lineage core rejected the generated input.
    #[error("lineage operation failed: {0}")]
    Lineage(#[from] LineageError),
}
