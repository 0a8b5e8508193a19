//! Builder for configuring lineage tree construction.
//!
//! Collects the optional stages (outgroup, endpoint constraints, distance
//! model) and validates them before constructing an immutable
//! [`ClusterTree`] runner.

use std::{num::NonZeroUsize, sync::Arc};

use tracing::warn;

use crate::{
    Result,
    centroid::Aggregation,
    distance::DistanceMethod,
    error::LineageError,
    outgroup::OutgroupSpec,
    tree::ClusterTree,
};

/// Default number of neighbours searched by the MNN distance model.
pub const DEFAULT_MNN_K: usize = 50;

/// Default multiplier applied to the median MST edge weight for `ω`.
pub const DEFAULT_OUTSCALE: f64 = 1.5;

/// Configures and constructs [`ClusterTree`] instances.
///
/// # Examples
/// ```
/// use lineage_core::{ClusterTreeBuilder, DistanceMethod, OutgroupSpec};
///
/// let tree = ClusterTreeBuilder::new()
///     .with_distance_method(DistanceMethod::Adaptive)
///     .with_outgroup(OutgroupSpec::Auto)
///     .with_endpoints(["early", "late"])
///     .build()?;
/// assert_eq!(tree.distance_method(), DistanceMethod::Adaptive);
/// assert_eq!(tree.endpoints().len(), 2);
/// # Ok::<(), lineage_core::LineageError>(())
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct ClusterTreeBuilder {
    aggregation: Aggregation,
    distance_method: DistanceMethod,
    mnn_k: usize,
    legacy_mnn: bool,
    outgroup: OutgroupSpec,
    outscale: f64,
    endpoints: Vec<String>,
    allow_dyads: bool,
}

impl Default for ClusterTreeBuilder {
    fn default() -> Self {
        Self {
            aggregation: Aggregation::Mean,
            distance_method: DistanceMethod::Simple,
            mnn_k: DEFAULT_MNN_K,
            legacy_mnn: false,
            outgroup: OutgroupSpec::Off,
            outscale: DEFAULT_OUTSCALE,
            endpoints: Vec::new(),
            allow_dyads: false,
        }
    }
}

impl ClusterTreeBuilder {
    /// Creates a builder populated with default parameters.
    ///
    /// # Examples
    /// ```
    /// use lineage_core::{Aggregation, ClusterTreeBuilder, DistanceMethod, OutgroupSpec};
    ///
    /// let builder = ClusterTreeBuilder::new();
    /// assert_eq!(builder.aggregation(), Aggregation::Mean);
    /// assert_eq!(builder.distance_method(), DistanceMethod::Simple);
    /// assert_eq!(builder.mnn_k(), 50);
    /// assert_eq!(builder.outgroup(), OutgroupSpec::Off);
    /// assert_eq!(builder.outscale(), 1.5);
    /// ```
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Selects mean or median centroids.
    #[must_use]
    pub fn with_aggregation(mut self, aggregation: Aggregation) -> Self {
        self.aggregation = aggregation;
        self
    }

    /// Returns the configured centroid aggregation.
    #[must_use]
    pub fn aggregation(&self) -> Aggregation {
        self.aggregation
    }

    /// Selects the inter-cluster distance model.
    #[must_use]
    pub fn with_distance_method(mut self, method: DistanceMethod) -> Self {
        self.distance_method = method;
        self
    }

    /// Returns the configured distance model.
    #[must_use]
    pub fn distance_method(&self) -> DistanceMethod {
        self.distance_method
    }

    /// Overrides the neighbour count of the MNN distance model.
    #[must_use]
    pub fn with_mnn_k(mut self, k: usize) -> Self {
        self.mnn_k = k;
        self
    }

    /// Returns the configured MNN neighbour count.
    #[must_use]
    pub fn mnn_k(&self) -> usize {
        self.mnn_k
    }

    /// Deprecated switch that forces the MNN distance model.
    ///
    /// Prefer [`Self::with_distance_method`] with [`DistanceMethod::Mnn`].
    #[must_use]
    pub fn with_legacy_mnn(mut self, enabled: bool) -> Self {
        self.legacy_mnn = enabled;
        self
    }

    /// Configures the outgroup stage.
    #[must_use]
    pub fn with_outgroup(mut self, outgroup: OutgroupSpec) -> Self {
        self.outgroup = outgroup;
        self
    }

    /// Returns the configured outgroup stage.
    #[must_use]
    pub fn outgroup(&self) -> OutgroupSpec {
        self.outgroup
    }

    /// Overrides the multiplier used to derive `ω` automatically.
    #[must_use]
    pub fn with_outscale(mut self, outscale: f64) -> Self {
        self.outscale = outscale;
        self
    }

    /// Returns the configured outgroup multiplier.
    #[must_use]
    pub fn outscale(&self) -> f64 {
        self.outscale
    }

    /// Requires the named clusters to be leaves of the final graph.
    ///
    /// The search visits endpoints in the order given here; repeats are
    /// ignored.
    #[must_use]
    pub fn with_endpoints<I, S>(mut self, endpoints: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.endpoints = endpoints.into_iter().map(Into::into).collect();
        self
    }

    /// Allows two endpoints to pair with each other as an isolated dyad.
    #[must_use]
    pub fn with_dyads(mut self, allow: bool) -> Self {
        self.allow_dyads = allow;
        self
    }

    /// Validates the configuration and constructs a [`ClusterTree`].
    ///
    /// # Errors
    /// Returns [`LineageError::InvalidMnnK`] for `mnn_k == 0`,
    /// [`LineageError::InvalidOutscale`] for a non-finite or non-positive
    /// multiplier and [`LineageError::InvalidOutgroupThreshold`] for a bad
    /// explicit threshold.
    ///
    /// # Examples
    /// ```
    /// use lineage_core::{ClusterTreeBuilder, LineageError};
    ///
    /// let err = ClusterTreeBuilder::new().with_mnn_k(0).build().unwrap_err();
    /// assert_eq!(err, LineageError::InvalidMnnK { got: 0 });
    /// ```
    pub fn build(self) -> Result<ClusterTree> {
        let mnn_k = NonZeroUsize::new(self.mnn_k)
            .ok_or(LineageError::InvalidMnnK { got: self.mnn_k })?;
        if !(self.outscale.is_finite() && self.outscale > 0.0) {
            return Err(LineageError::InvalidOutscale { got: self.outscale });
        }
        let outgroup = self.outgroup.validate()?;

        let mut distance_method = self.distance_method;
        if self.legacy_mnn {
            warn!(
                requested = %self.distance_method,
                "legacy MNN switch is deprecated; use the `mnn` distance method instead"
            );
            distance_method = DistanceMethod::Mnn;
        }

        let mut endpoints: Vec<Arc<str>> = Vec::with_capacity(self.endpoints.len());
        for label in self.endpoints {
            if !endpoints.iter().any(|seen| **seen == *label) {
                endpoints.push(Arc::from(label));
            }
        }

        Ok(ClusterTree::new(
            self.aggregation,
            distance_method,
            mnn_k,
            outgroup,
            self.outscale,
            endpoints,
            self.allow_dyads,
        ))
    }
}
