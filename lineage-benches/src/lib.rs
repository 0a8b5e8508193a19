//! Benchmark support crate for lineage.
//!
//! Generates reproducible Gaussian blob embeddings and parameter labels for
//! the Criterion benchmarks covering tree construction and the spanning
//! forest.

pub mod blobs;
pub mod error;
pub mod params;
