//! Benchmark parameter labels.

use std::fmt;

use lineage_core::DistanceMethod;

/// Parameters of one tree-construction benchmark.
#[derive(Clone, Debug)]
pub struct TreeBenchParams {
    /// Number of clusters.
    pub clusters: usize,
    /// Distance model under test.
    pub method: DistanceMethod,
}

impl fmt::Display for TreeBenchParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "k={},{}", self.clusters, self.method)
    }
}

/// Parameters of one spanning-forest benchmark.
#[derive(Clone, Debug)]
pub struct ForestBenchParams {
    /// Number of matrix nodes.
    pub nodes: usize,
}

impl fmt::Display for ForestBenchParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "n={}", self.nodes)
    }
}
