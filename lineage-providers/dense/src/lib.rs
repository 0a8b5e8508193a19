//! Dense embedding provider reading cluster coordinates from Arrow/Parquet.
//!
//! Converts a `FixedSizeList<Float32, D>` coordinate column, with optional
//! cluster-label and row-name columns, into the [`lineage_core::PointSet`]
//! and [`lineage_core::ClusterAssignment`] the tree builder consumes.

mod errors;
mod ingest;
mod provider;

pub use errors::EmbeddingProviderError;
pub use provider::{EmbeddingColumns, EmbeddingProvider};

#[cfg(test)]
mod tests;
