//! Synthetic outgroup node used to split the spanning tree into a forest.
//!
//! The outgroup sits at distance `ω / 2` from every real node, so any pair
//! of real nodes further apart than `ω` is cheaper to join through it. Once
//! the outgroup is removed from the final graph, those pairs end up in
//! separate components.

use std::sync::Arc;

use tracing::debug;

use crate::{
    distance::DistanceMatrix,
    error::{LineageError, Result},
    mst::matrix_spanning_forest,
};

/// Base label given to the synthetic node.
const OUTGROUP_LABEL: &str = "outgroup";

/// Whether and how to insert an outgroup node.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum OutgroupSpec {
    /// No outgroup; the result is a single tree.
    #[default]
    Off,
    /// Derive `ω` as the median provisional MST edge weight times `outscale`.
    Auto,
    /// Use an explicit split threshold `ω`.
    Threshold(f64),
}

impl OutgroupSpec {
    pub(crate) fn validate(self) -> Result<Self> {
        match self {
            Self::Threshold(omega) if !(omega.is_finite() && omega > 0.0) => {
                Err(LineageError::InvalidOutgroupThreshold { got: omega })
            }
            other => Ok(other),
        }
    }
}

/// Matrix handed to the MST stage, possibly grown by one outgroup node.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct Augmented {
    pub(crate) matrix: DistanceMatrix,
    /// Index of the outgroup node, always the last one when present.
    pub(crate) outgroup: Option<usize>,
    pub(crate) threshold: Option<f64>,
}

/// Appends the outgroup node described by `spec` to `matrix`.
///
/// A single-node matrix has nothing to split and is returned unchanged.
pub(crate) fn augment(matrix: DistanceMatrix, spec: OutgroupSpec, outscale: f64) -> Result<Augmented> {
    let omega = match spec {
        OutgroupSpec::Off => None,
        _ if matrix.len() < 2 => None,
        OutgroupSpec::Threshold(omega) => Some(omega),
        OutgroupSpec::Auto => {
            let forest = matrix_spanning_forest(&matrix)?;
            let mut weights: Vec<f64> = forest.edges().iter().map(|edge| edge.weight()).collect();
            median(&mut weights).map(|middle| middle * outscale)
        }
    };
    let Some(omega) = omega.filter(|omega| *omega > 0.0) else {
        return Ok(Augmented {
            matrix,
            outgroup: None,
            threshold: None,
        });
    };

    let label = unique_label(&matrix);
    let augmented = matrix.extended(label, omega / 2.0);
    let outgroup = augmented.len() - 1;
    debug!(omega, outgroup, "outgroup node inserted");
    Ok(Augmented {
        matrix: augmented,
        outgroup: Some(outgroup),
        threshold: Some(omega),
    })
}

fn median(values: &mut [f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    values.sort_by(f64::total_cmp);
    let middle = values.len() / 2;
    Some(if values.len() % 2 == 0 {
        (values[middle - 1] + values[middle]) / 2.0
    } else {
        values[middle]
    })
}

fn unique_label(matrix: &DistanceMatrix) -> Arc<str> {
    if matrix.index_of(OUTGROUP_LABEL).is_none() {
        return Arc::from(OUTGROUP_LABEL);
    }
    (1_usize..)
        .map(|suffix| format!("{OUTGROUP_LABEL}.{suffix}"))
        .find(|candidate| matrix.index_of(candidate).is_none())
        .map_or_else(|| Arc::from(OUTGROUP_LABEL), Arc::from)
}

#[cfg(test)]
mod tests {
    use super::*;

    use rstest::rstest;

    fn line(labels: &[&str]) -> DistanceMatrix {
        // Nodes on a line at 0, 1, 3.
        DistanceMatrix::try_new(
            labels.iter().map(|label| (*label).to_owned()).collect(),
            vec![0.0, 1.0, 3.0, 1.0, 0.0, 2.0, 3.0, 2.0, 0.0],
        )
        .expect("valid matrix")
    }

    #[test]
    fn off_leaves_matrix_unchanged() {
        let matrix = line(&["a", "b", "c"]);
        let augmented = augment(matrix.clone(), OutgroupSpec::Off, 1.5).expect("off never fails");
        assert_eq!(augmented.matrix, matrix);
        assert_eq!(augmented.outgroup, None);
    }

    #[test]
    fn auto_threshold_uses_median_mst_weight() {
        let augmented =
            augment(line(&["a", "b", "c"]), OutgroupSpec::Auto, 2.0).expect("auto succeeds");
        // MST weights {1, 2}: median 1.5, ω = 3.
        assert_eq!(augmented.threshold, Some(3.0));
        assert_eq!(augmented.outgroup, Some(3));
        assert_eq!(augmented.matrix.get(3, 0), 1.5);
        assert_eq!(augmented.matrix.get(1, 3), 1.5);
        assert_eq!(augmented.matrix.get(0, 2), 3.0);
    }

    #[rstest]
    #[case::free(&["a", "b", "c"], "outgroup")]
    #[case::taken(&["outgroup", "b", "c"], "outgroup.1")]
    #[case::twice(&["outgroup", "outgroup.1", "c"], "outgroup.2")]
    fn outgroup_label_is_unique(#[case] labels: &[&str], #[case] expected: &str) {
        let augmented = augment(line(labels), OutgroupSpec::Threshold(1.0), 1.5)
            .expect("explicit threshold succeeds");
        assert_eq!(&*augmented.matrix.labels()[3], expected);
    }

    #[rstest]
    #[case(0.0)]
    #[case(-1.0)]
    #[case(f64::INFINITY)]
    fn rejects_invalid_thresholds(#[case] omega: f64) {
        let err = OutgroupSpec::Threshold(omega)
            .validate()
            .expect_err("threshold must be rejected");
        assert!(matches!(err, LineageError::InvalidOutgroupThreshold { .. }));
    }
}
