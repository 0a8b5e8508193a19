//! Edge confidence from MST sensitivity to edge removal.
//!
//! For an MST edge `(u, v)` of weight `W`, the gain is the increase in total
//! tree weight when the edge is deleted from the full graph and the MST is
//! rebuilt, divided by `W + offset · 1e-8` where `offset` is the lightest
//! MST edge. Edges that cannot be rerouted score `+∞`.

use tracing::debug;

use crate::{
    distance::DistanceMatrix,
    error::Result,
    mst::{MinimumSpanningForest, MstEdge, SortedEdges, matrix_edges},
};

/// Scale applied to the lightest MST edge when normalising gains.
const OFFSET_SCALE: f64 = 1e-8;

/// An MST edge paired with its confidence.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct ScoredEdge {
    pub(crate) edge: MstEdge,
    pub(crate) gain: f64,
}

/// The spanning forest of a matrix together with every edge's gain.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct ScoredForest {
    pub(crate) forest: MinimumSpanningForest,
    pub(crate) edges: Vec<ScoredEdge>,
}

/// Builds the MST of `matrix` and scores each of its edges.
pub(crate) fn score(matrix: &DistanceMatrix) -> Result<ScoredForest> {
    let sorted = SortedEdges::new(matrix.len(), &matrix_edges(matrix))?;
    let forest = sorted.spanning_forest(None);
    let degrees = full_degrees(&sorted);
    let total = forest.total_weight();
    let offset = forest
        .edges()
        .iter()
        .map(MstEdge::weight)
        .min_by(f64::total_cmp)
        .unwrap_or(0.0);

    let mut rebuilds = 0_u64;
    let edges = forest
        .edges()
        .iter()
        .map(|edge| {
            let forced = degrees[edge.source()] <= 1 || degrees[edge.target()] <= 1;
            let gain = match sorted.position_of(edge) {
                Some(position) if !forced => {
                    rebuilds += 1;
                    let rerouted = sorted.spanning_forest(Some(position));
                    if rerouted.component_count() > forest.component_count() {
                        f64::INFINITY
                    } else {
                        let increase = (rerouted.total_weight() - total).max(0.0);
                        increase / (edge.weight() + offset * OFFSET_SCALE)
                    }
                }
                _ => f64::INFINITY,
            };
            ScoredEdge { edge: *edge, gain }
        })
        .collect();

    record_rebuilds(rebuilds);
    debug!(
        edges = forest.edges().len(),
        components = forest.component_count(),
        rebuilds,
        "edge confidence computed"
    );
    Ok(ScoredForest { forest, edges })
}

fn full_degrees(sorted: &SortedEdges) -> Vec<usize> {
    let mut degrees = vec![0_usize; sorted.node_count()];
    for edge in sorted.edges() {
        degrees[edge.source()] += 1;
        degrees[edge.target()] += 1;
    }
    degrees
}

#[cfg(feature = "metrics")]
fn record_rebuilds(rebuilds: u64) {
    metrics::counter!("lineage_confidence_mst_rebuilds_total").increment(rebuilds);
}

#[cfg(not(feature = "metrics"))]
fn record_rebuilds(_rebuilds: u64) {}
