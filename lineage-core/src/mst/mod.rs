//! Minimum spanning tree (MST) construction.
//!
//! This module provides a Kruskal implementation over weighted undirected
//! edges. Edges are sorted by `(weight, source, target, sequence)` and
//! accepted greedily with a union-find cycle check, so the output is fully
//! deterministic: among equal weights the edge with the lower endpoint ids
//! wins, and the insertion sequence breaks any remaining tie.

mod union_find;

use std::cmp::Ordering;

use crate::distance::DistanceMatrix;

pub(crate) use self::union_find::DisjointSet;

/// Errors returned while computing a minimum spanning tree/forest.
#[derive(Clone, Debug, thiserror::Error, PartialEq)]
#[non_exhaustive]
pub enum MstError {
    /// The caller requested an MST for an empty graph.
    #[error("cannot compute an MST for an empty graph")]
    EmptyGraph,
    /// An edge referenced a node id that is not present in the graph.
    #[error("edge references node {node}, but node_count is {node_count}")]
    InvalidNodeId {
        /// The invalid node id referenced by an edge.
        node: usize,
        /// The number of nodes in the graph.
        node_count: usize,
    },
    /// An edge contained a non-finite weight.
    #[error("edge ({left}, {right}) has non-finite weight")]
    NonFiniteWeight {
        /// The left endpoint id (as provided).
        left: usize,
        /// The right endpoint id (as provided).
        right: usize,
    },
}

impl MstError {
    /// Returns a stable, machine-readable error code for the variant.
    #[must_use]
    pub const fn code(&self) -> MstErrorCode {
        match self {
            Self::EmptyGraph => MstErrorCode::EmptyGraph,
            Self::InvalidNodeId { .. } => MstErrorCode::InvalidNodeId,
            Self::NonFiniteWeight { .. } => MstErrorCode::NonFiniteWeight,
        }
    }
}

/// Machine-readable error codes for [`MstError`].
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum MstErrorCode {
    /// The caller requested an MST for an empty graph.
    EmptyGraph,
    /// An edge referenced a node id that is not present in the graph.
    InvalidNodeId,
    /// An edge contained a non-finite weight.
    NonFiniteWeight,
}

impl MstErrorCode {
    /// Returns the symbolic identifier for logging and metrics surfaces.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::EmptyGraph => "EMPTY_GRAPH",
            Self::InvalidNodeId => "INVALID_NODE_ID",
            Self::NonFiniteWeight => "NON_FINITE_WEIGHT",
        }
    }
}

/// An undirected weighted edge offered to the MST builder.
///
/// # Examples
/// ```
/// use lineage_core::WeightedEdge;
///
/// let edge = WeightedEdge::new(2, 0, 1.5, 7);
/// assert_eq!((edge.source(), edge.target()), (2, 0));
/// assert_eq!(edge.weight(), 1.5);
/// ```
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct WeightedEdge {
    source: usize,
    target: usize,
    weight: f64,
    sequence: u64,
}

impl WeightedEdge {
    /// Creates an edge with an explicit insertion sequence number.
    #[must_use]
    pub const fn new(source: usize, target: usize, weight: f64, sequence: u64) -> Self {
        Self {
            source,
            target,
            weight,
            sequence,
        }
    }

    /// Returns the first endpoint as provided.
    #[must_use]
    #[rustfmt::skip]
    pub const fn source(&self) -> usize { self.source }

    /// Returns the second endpoint as provided.
    #[must_use]
    #[rustfmt::skip]
    pub const fn target(&self) -> usize { self.target }

    /// Returns the edge weight.
    #[must_use]
    #[rustfmt::skip]
    pub const fn weight(&self) -> f64 { self.weight }

    /// Returns the insertion sequence number.
    #[must_use]
    #[rustfmt::skip]
    pub const fn sequence(&self) -> u64 { self.sequence }
}

/// A single MST edge in canonical undirected form (`source <= target`).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MstEdge {
    source: usize,
    target: usize,
    weight: f64,
    sequence: u64,
}

impl MstEdge {
    /// Returns the smaller endpoint id.
    #[must_use]
    #[rustfmt::skip]
    pub const fn source(&self) -> usize { self.source }

    /// Returns the larger endpoint id.
    #[must_use]
    #[rustfmt::skip]
    pub const fn target(&self) -> usize { self.target }

    /// Returns the edge weight.
    #[must_use]
    #[rustfmt::skip]
    pub const fn weight(&self) -> f64 { self.weight }

    /// Returns the deterministic tie-break sequence associated with the edge.
    #[must_use]
    #[rustfmt::skip]
    pub const fn sequence(&self) -> u64 { self.sequence }

    /// Returns `true` when `node` is one of the edge's endpoints.
    #[must_use]
    pub const fn touches(&self, node: usize) -> bool {
        self.source == node || self.target == node
    }
}

impl Eq for MstEdge {}

impl Ord for MstEdge {
    fn cmp(&self, other: &Self) -> Ordering {
        self.weight
            .total_cmp(&other.weight)
            .then_with(|| self.source.cmp(&other.source))
            .then_with(|| self.target.cmp(&other.target))
            .then_with(|| self.sequence.cmp(&other.sequence))
    }
}

impl PartialOrd for MstEdge {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// The output of a minimum spanning forest computation.
///
/// When the input graph is connected, the forest is a minimum spanning tree.
#[derive(Clone, Debug, PartialEq)]
pub struct MinimumSpanningForest {
    edges: Vec<MstEdge>,
    component_count: usize,
}

impl MinimumSpanningForest {
    /// Returns the MST/forest edges in ascending `(weight, source, target)` order.
    #[must_use]
    #[rustfmt::skip]
    pub fn edges(&self) -> &[MstEdge] { &self.edges }

    /// Returns the number of connected components in the resulting forest.
    #[must_use]
    #[rustfmt::skip]
    pub const fn component_count(&self) -> usize { self.component_count }

    /// Returns `true` when the forest spans a single connected component.
    #[must_use]
    pub const fn is_tree(&self) -> bool {
        self.component_count == 1
    }

    /// Returns the sum of all edge weights.
    #[must_use]
    pub fn total_weight(&self) -> f64 {
        self.edges.iter().map(MstEdge::weight).sum()
    }
}

/// A validated, sorted edge list ready for repeated Kruskal passes.
///
/// The edge-confidence estimator rebuilds the MST once per tree edge with
/// that edge removed; sorting and validating once up front keeps each pass
/// linear in the number of edges.
#[derive(Clone, Debug)]
pub(crate) struct SortedEdges {
    node_count: usize,
    edges: Vec<MstEdge>,
}

impl SortedEdges {
    pub(crate) fn new<'a>(
        node_count: usize,
        edges: impl IntoIterator<Item = &'a WeightedEdge>,
    ) -> Result<Self, MstError> {
        if node_count == 0 {
            return Err(MstError::EmptyGraph);
        }
        let mut list = Vec::new();
        for edge in edges {
            if let Some(canonical) = validate_and_canonicalize_edge(edge, node_count)? {
                list.push(canonical);
            }
        }
        list.sort_unstable();
        Ok(Self {
            node_count,
            edges: list,
        })
    }

    pub(crate) const fn node_count(&self) -> usize {
        self.node_count
    }

    pub(crate) fn edges(&self) -> &[MstEdge] {
        &self.edges
    }

    /// Runs Kruskal's algorithm, optionally ignoring one edge by position.
    pub(crate) fn spanning_forest(&self, skip: Option<usize>) -> MinimumSpanningForest {
        let mut components = DisjointSet::new(self.node_count);
        let mut forest_edges = Vec::with_capacity(self.node_count.saturating_sub(1));

        for (position, edge) in self.edges.iter().enumerate() {
            if skip == Some(position) {
                continue;
            }
            if components.try_union(edge.source, edge.target) {
                forest_edges.push(*edge);
                if components.components() == 1 {
                    break;
                }
            }
        }

        MinimumSpanningForest {
            edges: forest_edges,
            component_count: components.components(),
        }
    }

    /// Returns the position of the canonical edge `(source, target)`.
    pub(crate) fn position_of(&self, edge: &MstEdge) -> Option<usize> {
        self.edges
            .iter()
            .position(|candidate| candidate.source == edge.source && candidate.target == edge.target)
    }
}

/// Computes a minimum spanning forest using Kruskal's algorithm.
///
/// The input edges are interpreted as undirected and are canonicalised to
/// `(min(u, v), max(u, v))`. Self-edges are ignored, and when the same pair
/// appears more than once only the lightest copy is considered.
///
/// # Errors
///
/// Returns an error when:
/// - `node_count == 0`
/// - an edge references a node id `>= node_count`
/// - an edge weight is non-finite
///
/// # Examples
/// ```
/// use lineage_core::{WeightedEdge, kruskal};
///
/// let edges = [
///     WeightedEdge::new(0, 1, 1.0, 0),
///     WeightedEdge::new(1, 2, 2.0, 1),
///     WeightedEdge::new(0, 2, 5.0, 2),
/// ];
/// let forest = kruskal(3, &edges)?;
/// assert!(forest.is_tree());
/// assert_eq!(forest.total_weight(), 3.0);
/// # Ok::<(), lineage_core::MstError>(())
/// ```
pub fn kruskal(node_count: usize, edges: &[WeightedEdge]) -> Result<MinimumSpanningForest, MstError> {
    Ok(SortedEdges::new(node_count, edges)?.spanning_forest(None))
}

/// Computes the minimum spanning forest of the graph encoded by `matrix`.
///
/// Every strictly positive off-diagonal entry is an edge; zero entries mean
/// "no edge". Insertion sequence follows the row-major upper triangle.
///
/// # Errors
/// Returns [`MstError::EmptyGraph`] for an empty matrix.
pub fn matrix_spanning_forest(matrix: &DistanceMatrix) -> Result<MinimumSpanningForest, MstError> {
    kruskal(matrix.len(), &matrix_edges(matrix))
}

/// Lists the edges encoded by a distance matrix.
pub(crate) fn matrix_edges(matrix: &DistanceMatrix) -> Vec<WeightedEdge> {
    let size = matrix.len();
    let mut edges = Vec::new();
    let mut sequence = 0_u64;
    for row in 0..size {
        for column in (row + 1)..size {
            let weight = matrix.get(row, column);
            if weight > 0.0 {
                edges.push(WeightedEdge::new(row, column, weight, sequence));
                sequence = sequence.saturating_add(1);
            }
        }
    }
    edges
}

fn validate_and_canonicalize_edge(
    edge: &WeightedEdge,
    node_count: usize,
) -> Result<Option<MstEdge>, MstError> {
    let source = edge.source();
    let target = edge.target();

    if source >= node_count {
        return Err(MstError::InvalidNodeId {
            node: source,
            node_count,
        });
    }
    if target >= node_count {
        return Err(MstError::InvalidNodeId {
            node: target,
            node_count,
        });
    }

    let weight = edge.weight();
    if !weight.is_finite() {
        return Err(MstError::NonFiniteWeight {
            left: source,
            right: target,
        });
    }

    if source == target {
        return Ok(None);
    }

    let (source, target) = if source <= target {
        (source, target)
    } else {
        (target, source)
    };

    Ok(Some(MstEdge {
        source,
        target,
        weight,
        sequence: edge.sequence(),
    }))
}

#[cfg(test)]
mod tests;
