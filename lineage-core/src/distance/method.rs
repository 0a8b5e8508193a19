//! Selection of the inter-cluster distance model.

use core::{fmt, str::FromStr};

use crate::error::LineageError;

/// Distance model used to compare clusters.
///
/// # Examples
/// ```
/// use lineage_core::DistanceMethod;
///
/// let method: DistanceMethod = "scaled.full".parse()?;
/// assert_eq!(method, DistanceMethod::ScaledFull);
/// assert_eq!(method.to_string(), "scaled.full");
/// # Ok::<(), lineage_core::LineageError>(())
/// ```
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum DistanceMethod {
    /// Euclidean distance between centroids.
    #[default]
    Simple,
    /// Centroid difference scaled by the summed per-dimension variances.
    ScaledDiagonal,
    /// Centroid difference scaled by the summed full covariance matrices.
    ScaledFull,
    /// Full scaling, falling back to diagonal for undersized clusters.
    Adaptive,
    /// Median distance between mutual-nearest-neighbour point pairs.
    Mnn,
}

impl DistanceMethod {
    /// All methods in declaration order.
    pub const ALL: [Self; 5] = [
        Self::Simple,
        Self::ScaledDiagonal,
        Self::ScaledFull,
        Self::Adaptive,
        Self::Mnn,
    ];

    /// Returns the reference name of the method.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Simple => "simple",
            Self::ScaledDiagonal => "scaled.diagonal",
            Self::ScaledFull => "scaled.full",
            Self::Adaptive => "adaptive",
            Self::Mnn => "mnn",
        }
    }

    /// Returns `true` when the method scales by cluster covariance.
    #[must_use]
    pub const fn uses_covariance(self) -> bool {
        matches!(self, Self::ScaledDiagonal | Self::ScaledFull | Self::Adaptive)
    }

    /// Returns `true` when the method needs the member points of each cluster.
    #[must_use]
    pub const fn requires_clusters(self) -> bool {
        !matches!(self, Self::Simple)
    }
}

impl fmt::Display for DistanceMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DistanceMethod {
    type Err = LineageError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let normalised = raw.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|method| method.as_str() == normalised)
            .ok_or_else(|| LineageError::UnknownDistanceMethod {
                name: raw.to_owned(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use rstest::rstest;

    #[rstest]
    #[case("simple", DistanceMethod::Simple)]
    #[case("scaled.diagonal", DistanceMethod::ScaledDiagonal)]
    #[case(" Scaled.Full ", DistanceMethod::ScaledFull)]
    #[case("adaptive", DistanceMethod::Adaptive)]
    #[case("MNN", DistanceMethod::Mnn)]
    fn parses_reference_names(#[case] raw: &str, #[case] expected: DistanceMethod) {
        assert_eq!(raw.parse::<DistanceMethod>(), Ok(expected));
    }

    #[test]
    fn rejects_unknown_names() {
        let err = "manhattan"
            .parse::<DistanceMethod>()
            .expect_err("unknown method must fail");
        assert_eq!(
            err,
            LineageError::UnknownDistanceMethod {
                name: "manhattan".to_owned()
            }
        );
    }
}
